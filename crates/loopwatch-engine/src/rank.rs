//! Result ranking.
//!
//! Aggregated cycles are ordered by:
//!
//! 1. `severity_score`, descending
//! 2. `occurrence_count`, descending
//! 3. cycle length, ascending
//! 4. canonical station sequence, ascending
//!
//! Distinct canonical cycles never compare equal, so the order is total and
//! the report is reproducible.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use loopwatch_core::{AnalysisResult, RankedCycle, SearchBound};
use tracing::instrument;

use crate::aggregate::AggregatedCycle;

/// Run-level facts the ranker stamps onto the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub transitions_processed: usize,
    pub transitions_skipped: usize,
    pub graph_hash: String,
    pub analyzed_at: DateTime<Utc>,
    pub limit_exceeded: Option<SearchBound>,
}

/// Severity order between two aggregated cycles; `Less` ranks first.
#[must_use]
pub fn severity_order(a: &AggregatedCycle, b: &AggregatedCycle) -> Ordering {
    b.stats
        .severity_score
        .total_cmp(&a.stats.severity_score)
        .then_with(|| b.stats.occurrence_count.cmp(&a.stats.occurrence_count))
        .then_with(|| a.cycle.len().cmp(&b.cycle.len()))
        .then_with(|| a.cycle.stations().cmp(b.cycle.stations()))
}

/// Sort `aggregated` by severity and wrap it in an [`AnalysisResult`].
#[must_use]
#[instrument(skip_all, fields(cycles = aggregated.len()))]
pub fn rank(mut aggregated: Vec<AggregatedCycle>, summary: RunSummary) -> AnalysisResult {
    aggregated.sort_by(severity_order);

    let distinct_cycles = aggregated.len();
    let cycles = aggregated
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| RankedCycle {
            rank: idx + 1,
            cycle: entry.cycle,
            stats: entry.stats,
        })
        .collect();

    AnalysisResult {
        cycles,
        transitions_processed: summary.transitions_processed,
        transitions_skipped: summary.transitions_skipped,
        distinct_cycles,
        graph_hash: summary.graph_hash,
        analyzed_at: summary.analyzed_at,
        limit_exceeded: summary.limit_exceeded,
    }
}
