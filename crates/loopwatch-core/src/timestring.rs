//! Station timestamp parsing.
//!
//! Line historians export timestamps as text. Day-first layouts are tried
//! first, then ISO, then month-first as a last resort, so `03/04/2024` is
//! always 3 April.

use chrono::NaiveDateTime;

const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
];

const ISO_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const MONTH_FIRST_FORMATS: &[&str] = &["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M:%S%.f"];

/// Layout used when timestamps are written back out for reports.
pub const REPORT_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    #[error("timestamp is empty")]
    Empty,
    #[error("unrecognized timestamp {0:?}")]
    Unrecognized(String),
}

/// Parse a station timestamp in any supported layout.
///
/// # Errors
///
/// Returns [`TimestampError`] when the text is blank or matches no layout.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, TimestampError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(TimestampError::Empty);
    }

    DAY_FIRST_FORMATS
        .iter()
        .chain(ISO_FORMATS)
        .chain(MONTH_FIRST_FORMATS)
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .ok_or_else(|| TimestampError::Unrecognized(text.to_string()))
}

#[must_use]
pub fn format_report(ts: &NaiveDateTime) -> String {
    ts.format(REPORT_FORMAT).to_string()
}
