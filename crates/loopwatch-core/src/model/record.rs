//! Transition records and their validation at the input boundary.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::InvalidRecordError;
use crate::timestring::parse_timestamp;

/// One observed movement of a work item between two stations.
///
/// Owned by the data source; the engine only reads it. Validation happens
/// through [`TransitionRecord::duration`], which the graph builder calls once
/// per record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub item_id: String,
    pub from_station: String,
    pub to_station: String,
    pub timestamp_entered: NaiveDateTime,
    pub timestamp_left: NaiveDateTime,
}

impl TransitionRecord {
    #[must_use]
    pub fn new(
        item_id: impl Into<String>,
        from_station: impl Into<String>,
        to_station: impl Into<String>,
        timestamp_entered: NaiveDateTime,
        timestamp_left: NaiveDateTime,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            from_station: from_station.into(),
            to_station: to_station.into(),
            timestamp_entered,
            timestamp_left,
        }
    }

    /// Immediate rework at a single station.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.from_station == self.to_station
    }

    /// Time spent on this transition.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRecordError`] if either station is empty or the item
    /// left before it entered.
    pub fn duration(&self) -> Result<TimeDelta, InvalidRecordError> {
        for (field, station) in [("from", &self.from_station), ("to", &self.to_station)] {
            if station.trim().is_empty() {
                return Err(InvalidRecordError::EmptyStation {
                    item_id: self.item_id.clone(),
                    field,
                });
            }
        }

        let duration = self.timestamp_left - self.timestamp_entered;
        if duration < TimeDelta::zero() {
            return Err(InvalidRecordError::NegativeDuration {
                item_id: self.item_id.clone(),
                from: self.from_station.clone(),
                to: self.to_station.clone(),
                entered: self.timestamp_entered,
                left: self.timestamp_left,
            });
        }

        Ok(duration)
    }

    /// [`TransitionRecord::duration`] in fractional seconds.
    ///
    /// # Errors
    ///
    /// Same conditions as [`TransitionRecord::duration`].
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_secs(&self) -> Result<f64, InvalidRecordError> {
        self.duration()
            .map(|d| d.num_milliseconds() as f64 / 1_000.0)
    }
}

/// A transition row as the persistence layer hands it over: timestamps are
/// still text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransitionRow {
    pub item_id: String,
    pub from_station: String,
    pub to_station: String,
    pub entered: String,
    pub left: String,
}

impl TryFrom<RawTransitionRow> for TransitionRecord {
    type Error = InvalidRecordError;

    fn try_from(row: RawTransitionRow) -> Result<Self, Self::Error> {
        let parse = |field: &'static str, value: &str| {
            parse_timestamp(value).map_err(|_| InvalidRecordError::UnparseableTimestamp {
                item_id: row.item_id.clone(),
                field,
                value: value.to_string(),
            })
        };

        let entered = parse("entered", &row.entered)?;
        let left = parse("left", &row.left)?;

        Ok(Self {
            item_id: row.item_id,
            from_station: row.from_station,
            to_station: row.to_station,
            timestamp_entered: entered,
            timestamp_left: left,
        })
    }
}

/// Convert raw rows into records, keeping the rows that fail to parse as
/// rejections instead of aborting.
#[must_use]
pub fn records_from_rows<I>(rows: I) -> (Vec<TransitionRecord>, Vec<InvalidRecordError>)
where
    I: IntoIterator<Item = RawTransitionRow>,
{
    let mut records = Vec::new();
    let mut rejected = Vec::new();

    for row in rows {
        match TransitionRecord::try_from(row) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(code = %err.code(), "skipping transition row: {err}");
                rejected.push(err);
            }
        }
    }

    (records, rejected)
}
