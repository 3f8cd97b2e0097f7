use std::fmt;

use chrono::NaiveDateTime;

use crate::config::SearchBound;
use crate::model::cycle::Cycle;

/// Machine-readable error codes for reporting layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidConfig,
    InvalidRecord,
    UnparseableTimestamp,
    MalformedCycle,
    CycleLimitExceeded,
    InvariantViolation,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidConfig => "E1001",
            Self::InvalidRecord => "E2001",
            Self::UnparseableTimestamp => "E2002",
            Self::MalformedCycle => "E2003",
            Self::CycleLimitExceeded => "E4001",
            Self::InvariantViolation => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidConfig => "Invalid analysis configuration",
            Self::InvalidRecord => "Transition record rejected",
            Self::UnparseableTimestamp => "Transition timestamp could not be parsed",
            Self::MalformedCycle => "Malformed cycle",
            Self::CycleLimitExceeded => "Cycle search bound reached",
            Self::InvariantViolation => "Internal invariant violated",
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidConfig => {
                Some("Search bounds must be positive and severity weights finite and non-negative.")
            }
            Self::InvalidRecord => Some("Fix the source row; the rest of the run is unaffected."),
            Self::UnparseableTimestamp => {
                Some("Use dd/mm/yyyy hh:mm:ss or yyyy-mm-dd hh:mm:ss timestamps.")
            }
            Self::MalformedCycle => Some("A cycle needs at least one station and no repeats."),
            Self::CycleLimitExceeded => Some(
                "Results are partial. Raise max_cycles_explored/max_search_steps or accept the partial set.",
            ),
            Self::InvariantViolation => Some("This is a bug. Report it with the input dataset."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single transition record that cannot take part in the analysis.
///
/// Recovered locally: the builder skips the record and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRecordError {
    #[error("item {item_id} left {from} -> {to} at {left} before entering at {entered}")]
    NegativeDuration {
        item_id: String,
        from: String,
        to: String,
        entered: NaiveDateTime,
        left: NaiveDateTime,
    },
    #[error("item {item_id} has an empty {field} station")]
    EmptyStation { item_id: String, field: &'static str },
    #[error("item {item_id} has unparseable {field} timestamp {value:?}")]
    UnparseableTimestamp {
        item_id: String,
        field: &'static str,
        value: String,
    },
}

impl InvalidRecordError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NegativeDuration { .. } | Self::EmptyStation { .. } => ErrorCode::InvalidRecord,
            Self::UnparseableTimestamp { .. } => ErrorCode::UnparseableTimestamp,
        }
    }

    /// The work item the rejected record belonged to.
    #[must_use]
    pub fn item_id(&self) -> &str {
        match self {
            Self::NegativeDuration { item_id, .. }
            | Self::EmptyStation { item_id, .. }
            | Self::UnparseableTimestamp { item_id, .. } => item_id,
        }
    }
}

/// A station sequence that is not an elementary cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleShapeError {
    #[error("a cycle must contain at least one station")]
    Empty,
    #[error("station {0} appears more than once")]
    RepeatedStation(String),
}

impl CycleShapeError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::MalformedCycle
    }
}

/// Enumeration stopped at a configured bound.
///
/// Recoverable: `partial` holds every cycle found before the bound, in
/// discovery order, so the caller can report it or retry with other limits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cycle search stopped at {limit} with {} cycles found", .partial.len())]
pub struct CycleLimitExceeded {
    pub limit: SearchBound,
    pub partial: Vec<Cycle>,
}

impl CycleLimitExceeded {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::CycleLimitExceeded
    }
}

/// Graph/cycle bookkeeping disagreed with itself. Always a bug, never bad input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("cycle [{cycle}] references missing edge {from} -> {to}")]
    MissingEdge {
        cycle: String,
        from: String,
        to: String,
    },
    #[error("cycle search produced a malformed cycle: {0}")]
    MalformedCycle(#[from] CycleShapeError),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    ZeroBound { field: &'static str },
    #[error("severity weight {field} must be finite and non-negative, got {value}")]
    InvalidWeight { field: &'static str, value: f64 },
    #[error("severity weights cannot all be zero")]
    AllWeightsZero,
}

/// Errors that abort an analysis run.
///
/// Recoverable conditions (skipped records, search bounds) are reported on
/// the result instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl AnalysisError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Config(_) => ErrorCode::InvalidConfig,
            Self::Invariant(_) => ErrorCode::InvariantViolation,
        }
    }
}
