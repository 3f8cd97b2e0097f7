//! Timestamp quality checks for station exports.
//!
//! Two passes over timestamp series that come straight out of a historian:
//!
//! - [`recover_series`] parses a text column, treating null-like tokens as
//!   missing and repairing two common export faults before giving up:
//!   hour overflow (`25:00:00` rolls into the next day) and day overflow
//!   (`32/01/2024` is clamped to the last day of the month). The returned
//!   [`TimestampQuality`] counts what was valid, repaired, null or lost.
//! - [`match_series`] checks that several stations were sampled on the same
//!   clock: the longest series is the reference and every other series is
//!   compared to it row by row.

use chrono::{Months, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::timestring::parse_timestamp;

/// Text that stands for "no value" in historian exports (case-insensitive).
const NULL_TOKENS: &[&str] = &["", "null", "none", "nan", "n/a", "na"];

/// Row differences at or below this many seconds are clock jitter.
pub const MATCH_TOLERANCE_SECS: f64 = 0.001;

#[must_use]
pub fn is_null_token(raw: &str) -> bool {
    let text = raw.trim();
    NULL_TOKENS.iter().any(|token| text.eq_ignore_ascii_case(token))
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

/// How a timestamp was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recovery {
    /// Parsed as written.
    Exact,
    /// Hour field ≥ 24, rolled into the following day(s).
    HourOverflow,
    /// Day past the end of the month, clamped to the last day.
    DayOverflow,
}

/// Why a row produced no timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    Null,
    Unparseable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampFault {
    /// 0-based row in the input column.
    pub row: usize,
    pub value: String,
    pub kind: FaultKind,
}

/// Parse one timestamp, repairing overflowed fields if plain parsing fails.
///
/// # Errors
///
/// Returns [`FaultKind::Null`] for null-like text and
/// [`FaultKind::Unparseable`] when no layout or repair applies.
pub fn recover_timestamp(raw: &str) -> Result<(NaiveDateTime, Recovery), FaultKind> {
    if is_null_token(raw) {
        return Err(FaultKind::Null);
    }
    let text = raw.trim();

    if let Ok(ts) = parse_timestamp(text) {
        return Ok((ts, Recovery::Exact));
    }
    if let Some(ts) = repair_hour_overflow(text) {
        return Ok((ts, Recovery::HourOverflow));
    }
    if let Some(ts) = repair_day_overflow(text) {
        return Ok((ts, Recovery::DayOverflow));
    }
    Err(FaultKind::Unparseable)
}

/// `dd/mm/YYYY HH:MM:SS` with `HH >= 24`.
fn repair_hour_overflow(text: &str) -> Option<NaiveDateTime> {
    let (date, time) = text.split_once(' ')?;
    let mut fields = time.splitn(3, ':');
    let hour: u32 = fields.next()?.parse().ok()?;
    let minute: u32 = fields.next()?.parse().ok()?;
    let second: u32 = fields.next()?.parse().ok()?;
    if hour < 24 {
        return None;
    }

    let day = NaiveDate::parse_from_str(date, "%d/%m/%Y").ok()?;
    let day = day.checked_add_signed(TimeDelta::days(i64::from(hour / 24)))?;
    day.and_hms_opt(hour % 24, minute, second)
}

/// `dd/mm/YYYY ...` with a day past the end of a valid month.
fn repair_day_overflow(text: &str) -> Option<NaiveDateTime> {
    let (date, rest) = text.split_once(' ').unwrap_or((text, ""));
    let mut fields = date.splitn(3, '/');
    let day: u32 = fields.next()?.parse().ok()?;
    let month: u32 = fields.next()?.parse().ok()?;
    let year: i32 = fields.next()?.parse().ok()?;

    let last = last_day_of_month(year, month)?;
    if day <= last {
        return None;
    }

    let fixed = format!("{last:02}/{month:02}/{year:04} {rest}");
    parse_timestamp(&fixed).ok()
}

fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    use chrono::Datelike;

    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    next.pred_opt().map(|d| d.day())
}

/// Quality summary of one timestamp column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimestampQuality {
    pub total_rows: usize,
    /// Rows that produced a timestamp, repaired ones included.
    pub valid_count: usize,
    pub hour_overflow_repairs: usize,
    pub day_overflow_repairs: usize,
    pub null_count: usize,
    pub invalid_count: usize,
    pub earliest: Option<NaiveDateTime>,
    pub latest: Option<NaiveDateTime>,
    pub faults: Vec<TimestampFault>,
}

impl TimestampQuality {
    /// Share of rows without a timestamp, in percent; `0.0` for no rows.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn data_loss_percent(&self) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        (self.null_count + self.invalid_count) as f64 / self.total_rows as f64 * 100.0
    }

    #[must_use]
    pub const fn repaired_count(&self) -> usize {
        self.hour_overflow_repairs + self.day_overflow_repairs
    }
}

/// Parsed column plus its quality report.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredSeries {
    /// One entry per input row; `None` where the row was null or lost.
    pub timestamps: Vec<Option<NaiveDateTime>>,
    pub quality: TimestampQuality,
}

/// Parse a whole timestamp column, recovering what can be recovered.
#[must_use]
pub fn recover_series<S: AsRef<str>>(values: &[S]) -> RecoveredSeries {
    let mut quality = TimestampQuality {
        total_rows: values.len(),
        ..TimestampQuality::default()
    };
    let mut timestamps = Vec::with_capacity(values.len());

    for (row, value) in values.iter().enumerate() {
        let value = value.as_ref();
        match recover_timestamp(value) {
            Ok((ts, recovery)) => {
                quality.valid_count += 1;
                match recovery {
                    Recovery::Exact => {}
                    Recovery::HourOverflow => quality.hour_overflow_repairs += 1,
                    Recovery::DayOverflow => quality.day_overflow_repairs += 1,
                }
                quality.earliest = Some(quality.earliest.map_or(ts, |e| e.min(ts)));
                quality.latest = Some(quality.latest.map_or(ts, |l| l.max(ts)));
                timestamps.push(Some(ts));
            }
            Err(kind) => {
                match kind {
                    FaultKind::Null => quality.null_count += 1,
                    FaultKind::Unparseable => quality.invalid_count += 1,
                }
                quality.faults.push(TimestampFault {
                    row,
                    value: value.to_string(),
                    kind,
                });
                timestamps.push(None);
            }
        }
    }

    if quality.invalid_count > 0 {
        warn!(
            invalid = quality.invalid_count,
            nulls = quality.null_count,
            loss_pct = quality.data_loss_percent(),
            "timestamp column has unrecoverable rows"
        );
    } else {
        debug!(
            rows = quality.total_rows,
            repaired = quality.repaired_count(),
            nulls = quality.null_count,
            "timestamp column checked"
        );
    }

    RecoveredSeries {
        timestamps,
        quality,
    }
}

// ---------------------------------------------------------------------------
// Cross-series matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowMismatch {
    /// 0-based row index.
    pub row: usize,
    pub reference: NaiveDateTime,
    pub other: NaiveDateTime,
    /// Absolute difference.
    pub difference_secs: f64,
}

impl RowMismatch {
    /// Differences up to [`MATCH_TOLERANCE_SECS`] are still reported, but
    /// flagged as jitter.
    #[must_use]
    pub fn is_jitter(&self) -> bool {
        self.difference_secs <= MATCH_TOLERANCE_SECS
    }
}

/// Row-by-row comparison of one series against the reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesComparison {
    pub compared_rows: usize,
    pub mismatches: Vec<RowMismatch>,
    /// Rows the reference has beyond the end of the other series.
    pub extra_reference_rows: usize,
    /// Rows the other series has beyond the end of the reference.
    pub extra_other_rows: usize,
}

impl SeriesComparison {
    #[must_use]
    pub fn matches(&self) -> bool {
        self.mismatches.is_empty() && self.extra_reference_rows == 0 && self.extra_other_rows == 0
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mismatch_percent(&self) -> f64 {
        if self.compared_rows == 0 {
            return 0.0;
        }
        self.mismatches.len() as f64 / self.compared_rows as f64 * 100.0
    }

    #[must_use]
    pub fn max_difference_secs(&self) -> f64 {
        self.mismatches
            .iter()
            .map(|m| m.difference_secs)
            .fold(0.0, f64::max)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_difference_secs(&self) -> f64 {
        if self.mismatches.is_empty() {
            return 0.0;
        }
        self.mismatches.iter().map(|m| m.difference_secs).sum::<f64>() / self.mismatches.len() as f64
    }
}

/// Compare `other` to `reference` row by row.
#[must_use]
pub fn compare_series(reference: &[NaiveDateTime], other: &[NaiveDateTime]) -> SeriesComparison {
    let mismatches = reference
        .iter()
        .zip(other)
        .enumerate()
        .filter(|(_, (r, o))| r != o)
        .map(|(row, (&r, &o))| RowMismatch {
            row,
            reference: r,
            other: o,
            difference_secs: secs((r - o).abs()),
        })
        .collect();

    SeriesComparison {
        compared_rows: reference.len().min(other.len()),
        mismatches,
        extra_reference_rows: reference.len().saturating_sub(other.len()),
        extra_other_rows: other.len().saturating_sub(reference.len()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeMatchError {
    #[error("need at least 2 non-empty series to compare, got {usable}")]
    TooFewSeries { usable: usize },
}

/// Result of [`match_series`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeMatchReport {
    pub reference: String,
    pub reference_rows: usize,
    /// Every other non-empty series, in input order.
    pub comparisons: Vec<(String, SeriesComparison)>,
    /// Series skipped because they hold no timestamps.
    pub empty: Vec<String>,
}

impl TimeMatchReport {
    #[must_use]
    pub fn all_match(&self) -> bool {
        self.comparisons.iter().all(|(_, c)| c.matches())
    }
}

/// Check that named timestamp series line up.
///
/// The longest series (first one on a tie) is the reference.
///
/// # Errors
///
/// Returns [`TimeMatchError::TooFewSeries`] when fewer than two series hold
/// any timestamps.
pub fn match_series(series: &[(&str, &[NaiveDateTime])]) -> Result<TimeMatchReport, TimeMatchError> {
    let (usable, empty): (Vec<&(&str, &[NaiveDateTime])>, Vec<_>) = series.iter().partition(|(_, ts)| !ts.is_empty());
    if usable.len() < 2 {
        return Err(TimeMatchError::TooFewSeries {
            usable: usable.len(),
        });
    }

    let mut reference = usable[0];
    for &candidate in &usable[1..] {
        if candidate.1.len() > reference.1.len() {
            reference = candidate;
        }
    }

    let comparisons: Vec<(String, SeriesComparison)> = usable
        .iter()
        .filter(|(name, _)| *name != reference.0)
        .map(|(name, ts)| ((*name).to_string(), compare_series(reference.1, ts)))
        .collect();

    for (name, comparison) in &comparisons {
        if !comparison.matches() {
            warn!(
                series = %name,
                reference = %reference.0,
                mismatches = comparison.mismatches.len(),
                extra_reference = comparison.extra_reference_rows,
                extra_other = comparison.extra_other_rows,
                "timestamp series out of step"
            );
        }
    }

    Ok(TimeMatchReport {
        reference: reference.0.to_string(),
        reference_rows: reference.1.len(),
        comparisons,
        empty: empty.iter().map(|(name, _)| (*name).to_string()).collect(),
    })
}

#[allow(clippy::cast_precision_loss)]
fn secs(delta: TimeDelta) -> f64 {
    delta.num_microseconds().map_or_else(
        || delta.num_milliseconds() as f64 / 1_000.0,
        |us| us as f64 / 1_000_000.0,
    )
}
