#![forbid(unsafe_code)]
//! loopwatch-engine library.
//!
//! Detects rework loops in production-flow data: builds a transition graph
//! from records, enumerates its elementary cycles, attaches frequency and
//! duration statistics, and ranks the cycles by severity.
//!
//! ```text
//! records ─► graph::TransitionGraph ─► enumerate ─► aggregate ─► rank ─► AnalysisResult
//! ```
//!
//! [`pipeline::analyze`] runs all four stages.
//!
//! # Conventions
//!
//! - **Errors**: typed errors from `loopwatch-core`; recoverable conditions
//!   are reported on the result, not returned as `Err`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod aggregate;
pub mod enumerate;
pub mod graph;
pub mod pipeline;
pub mod rank;

pub use aggregate::{AggregatedCycle, aggregate};
pub use enumerate::{CycleSet, EnumerateError, enumerate};
pub use graph::{EdgeSamples, TransitionGraph};
pub use pipeline::{AnalysisReport, analyze, analyze_at, analyze_rows};
pub use rank::{RunSummary, rank, severity_order};
