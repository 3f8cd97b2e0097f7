//! Per-cycle statistics.
//!
//! For each cycle the aggregator looks up every edge of the loop (closing
//! edge included) and folds their tallies into [`CycleStats`]:
//!
//! - `occurrence_count` is the minimum traversal count over the loop's
//!   edges. A loop cannot have happened more often than its least-traveled
//!   edge.
//! - `total_duration_secs` is the sum of mean edge durations times the
//!   occurrence count; `average_duration_secs` divides it back out.
//! - `severity_score` comes from the configured [`SeverityWeighting`].
//!
//! Cycles are derived from the same graph, so a missing edge means the
//! graph and the cycle set disagree. That is reported as an
//! [`InvariantViolation`], never skipped.

use loopwatch_core::{Cycle, CycleStats, EdgeTally, InvariantViolation, SeverityWeighting};
use serde::Serialize;
use tracing::{error, instrument};

use crate::enumerate::CycleSet;
use crate::graph::{EdgeSamples, TransitionGraph};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedCycle {
    pub cycle: Cycle,
    pub stats: CycleStats,
}

/// Compute statistics for every cycle in `cycles`, in set order.
///
/// # Errors
///
/// Returns [`InvariantViolation::MissingEdge`] if a cycle uses an edge that
/// is not in `graph`.
#[instrument(skip_all, fields(cycles = cycles.len()))]
pub fn aggregate(
    graph: &TransitionGraph,
    cycles: &CycleSet,
    weighting: &SeverityWeighting,
) -> Result<Vec<AggregatedCycle>, InvariantViolation> {
    cycles
        .iter()
        .map(|cycle| aggregate_cycle(graph, cycle, weighting))
        .collect()
}

/// Statistics for a single cycle.
///
/// # Errors
///
/// Same as [`aggregate`].
pub fn aggregate_cycle(
    graph: &TransitionGraph,
    cycle: &Cycle,
    weighting: &SeverityWeighting,
) -> Result<AggregatedCycle, InvariantViolation> {
    let tallies = cycle
        .edges()
        .map(|(from, to)| {
            graph.edge(from, to).map(EdgeSamples::tally).ok_or_else(|| {
                let violation = InvariantViolation::MissingEdge {
                    cycle: cycle.to_string(),
                    from: from.to_string(),
                    to: to.to_string(),
                };
                error!("{violation}");
                violation
            })
        })
        .collect::<Result<Vec<EdgeTally>, _>>()?;

    Ok(AggregatedCycle {
        cycle: cycle.clone(),
        stats: CycleStats::from_edges(&tallies, cycle.len(), weighting),
    })
}
