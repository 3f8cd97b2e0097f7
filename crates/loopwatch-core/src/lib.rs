#![forbid(unsafe_code)]
//! loopwatch-core library.
//!
//! Shared data model for production-flow cycle analysis: validated
//! transition records, canonical cycles and their statistics, the ranked
//! result handed to reporting, configuration, and the error taxonomy.
//! Timestamp parsing, recovery and run segmentation for station exports
//! live here too.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums for library failures; `anyhow::Result`
//!   only where files are read.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod model;
pub mod quality;
pub mod runs;
pub mod severity;
pub mod timestring;

pub use config::{AnalysisConfig, SearchBound, SearchLimits};
pub use error::{
    AnalysisError, ConfigError, CycleLimitExceeded, CycleShapeError, ErrorCode,
    InvalidRecordError, InvariantViolation,
};
pub use model::cycle::{Cycle, CycleStats, EdgeTally};
pub use model::record::{RawTransitionRow, TransitionRecord, records_from_rows};
pub use model::result::{AnalysisResult, RankedCycle};
pub use severity::SeverityWeighting;
