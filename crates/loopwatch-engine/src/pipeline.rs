//! End-to-end analysis: build → enumerate → aggregate → rank.
//!
//! One call is one self-contained unit of work. It owns its graph, shares
//! no state with other runs, and can be moved to a worker thread as a whole.

use chrono::{DateTime, Utc};
use loopwatch_core::{
    AnalysisConfig, AnalysisError, AnalysisResult, InvalidRecordError, RawTransitionRow,
    TransitionRecord, records_from_rows,
};
use tracing::{info, info_span, warn};

use crate::aggregate::aggregate;
use crate::enumerate::{EnumerateError, enumerate};
use crate::graph::TransitionGraph;
use crate::rank::{RunSummary, rank};

/// The ranked result plus every record the run had to skip.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    pub skipped: Vec<InvalidRecordError>,
}

impl AnalysisReport {
    /// No skipped records and no search bound reached.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && !self.result.is_partial()
    }
}

/// Analyze `records`, stamping the result with the current time.
///
/// # Errors
///
/// See [`analyze_at`].
pub fn analyze(
    records: &[TransitionRecord],
    config: &AnalysisConfig,
) -> Result<AnalysisReport, AnalysisError> {
    analyze_at(records, config, Utc::now())
}

/// Analyze `records` with an explicit `analyzed_at` timestamp.
///
/// Skipped records and search bounds are recoverable and reported on the
/// returned [`AnalysisReport`]; when a bound is hit, the cycles found up to
/// it are still aggregated and ranked.
///
/// # Errors
///
/// - [`AnalysisError::Config`] if `config` fails validation.
/// - [`AnalysisError::Invariant`] if graph and cycles disagree (a bug).
pub fn analyze_at(
    records: &[TransitionRecord],
    config: &AnalysisConfig,
    analyzed_at: DateTime<Utc>,
) -> Result<AnalysisReport, AnalysisError> {
    let _span = info_span!("analyze", records = records.len()).entered();

    config.validate()?;

    let (graph, skipped) = TransitionGraph::build_with_rejections(records);

    let (cycles, limit_exceeded) = match enumerate(&graph, &config.search_limits()) {
        Ok(cycles) => (cycles, None),
        Err(EnumerateError::LimitExceeded(exceeded)) => {
            warn!("reporting partial cycle set: {exceeded}");
            (exceeded.partial.into_iter().collect(), Some(exceeded.limit))
        }
        Err(EnumerateError::Invariant(violation)) => return Err(violation.into()),
    };

    let aggregated = aggregate(&graph, &cycles, &config.severity)?;

    let result = rank(
        aggregated,
        RunSummary {
            transitions_processed: records.len(),
            transitions_skipped: skipped.len(),
            graph_hash: graph.content_hash().to_string(),
            analyzed_at,
            limit_exceeded,
        },
    );

    info!(
        cycles = result.distinct_cycles,
        skipped = skipped.len(),
        partial = result.is_partial(),
        "analysis complete"
    );

    Ok(AnalysisReport { result, skipped })
}

/// Validate raw rows at the boundary, then analyze what parsed.
///
/// Rows with unparseable timestamps join the skipped list and count toward
/// `transitions_processed` and `transitions_skipped`.
///
/// # Errors
///
/// See [`analyze_at`].
pub fn analyze_rows<I>(
    rows: I,
    config: &AnalysisConfig,
    analyzed_at: DateTime<Utc>,
) -> Result<AnalysisReport, AnalysisError>
where
    I: IntoIterator<Item = RawTransitionRow>,
{
    let (records, mut unparsed) = records_from_rows(rows);
    let mut report = analyze_at(&records, config, analyzed_at)?;

    report.result.transitions_processed += unparsed.len();
    report.result.transitions_skipped += unparsed.len();
    unparsed.append(&mut report.skipped);
    report.skipped = unparsed;

    Ok(report)
}
