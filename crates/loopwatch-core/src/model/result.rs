//! The ranked report handed to presentation and persistence layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SearchBound;
use crate::model::cycle::{Cycle, CycleStats};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCycle {
    /// 1-based position in the report.
    pub rank: usize,
    pub cycle: Cycle,
    pub stats: CycleStats,
}

/// Immutable outcome of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Cycles ordered by severity, most severe first.
    pub cycles: Vec<RankedCycle>,
    /// Records handed to the run, valid or not.
    pub transitions_processed: usize,
    /// Records rejected during graph construction.
    pub transitions_skipped: usize,
    pub distinct_cycles: usize,
    /// Content hash of the transition graph the cycles came from.
    pub graph_hash: String,
    pub analyzed_at: DateTime<Utc>,
    /// Set when enumeration stopped early; `cycles` is then a partial set.
    pub limit_exceeded: Option<SearchBound>,
}

impl AnalysisResult {
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.limit_exceeded.is_some()
    }

    /// The `n` most severe cycles.
    #[must_use]
    pub fn top(&self, n: usize) -> &[RankedCycle] {
        &self.cycles[..n.min(self.cycles.len())]
    }

    /// Cycles with at least one known traversal.
    pub fn realized(&self) -> impl Iterator<Item = &RankedCycle> {
        self.cycles.iter().filter(|entry| entry.stats.realized)
    }

    #[must_use]
    pub fn find(&self, cycle: &Cycle) -> Option<&RankedCycle> {
        self.cycles.iter().find(|entry| entry.cycle.is_rotation_of(cycle))
    }
}
