//! Production-run segmentation.
//!
//! A station's sample timestamps are grouped into runs: consecutive samples
//! (after sorting) stay in the same run while the gap between them is at
//! most the configured threshold. A larger gap closes the run and starts a
//! new one.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::timestring::format_report;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionRun {
    /// 1-based, in chronological order.
    pub run_id: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub sample_count: usize,
}

/// One line of the run summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummaryRow {
    pub run_id: usize,
    pub start_time: String,
    pub end_time: String,
    /// `HH:MM:SS`, hours not wrapped at 24.
    pub total_time: String,
    pub samples_count: usize,
}

impl ProductionRun {
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    #[must_use]
    pub fn contains(&self, ts: &NaiveDateTime) -> bool {
        self.start <= *ts && *ts <= self.end
    }

    #[must_use]
    pub fn summary_row(&self) -> RunSummaryRow {
        RunSummaryRow {
            run_id: self.run_id,
            start_time: format_report(&self.start),
            end_time: format_report(&self.end),
            total_time: format_hms(self.duration()),
            samples_count: self.sample_count,
        }
    }
}

/// Split `timestamps` into runs separated by gaps strictly larger than `gap`.
///
/// Input order does not matter. An empty input yields no runs.
#[must_use]
pub fn segment_runs(timestamps: &[NaiveDateTime], gap: TimeDelta) -> Vec<ProductionRun> {
    let mut sorted = timestamps.to_vec();
    sorted.sort_unstable();

    let Some((&first, rest)) = sorted.split_first() else {
        return Vec::new();
    };

    let mut runs = Vec::new();
    let mut current = ProductionRun {
        run_id: 1,
        start: first,
        end: first,
        sample_count: 1,
    };

    for &ts in rest {
        if ts - current.end > gap {
            let next = ProductionRun {
                run_id: current.run_id + 1,
                start: ts,
                end: ts,
                sample_count: 1,
            };
            runs.push(std::mem::replace(&mut current, next));
        } else {
            current.end = ts;
            current.sample_count += 1;
        }
    }

    runs.push(current);
    runs
}

/// Map each timestamp (in input order) to the run that covers it.
#[must_use]
pub fn assign_run_ids(timestamps: &[NaiveDateTime], runs: &[ProductionRun]) -> Vec<Option<usize>> {
    timestamps
        .iter()
        .map(|ts| {
            runs.iter()
                .find(|run| run.contains(ts))
                .map(|run| run.run_id)
        })
        .collect()
}

/// Render a duration as `HH:MM:SS`, truncating sub-second precision.
#[must_use]
pub fn format_hms(duration: TimeDelta) -> String {
    let total = duration.num_seconds().max(0);
    let hours = total / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 20)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .expect("valid time")
    }

    #[test]
    fn empty_series_has_no_runs() {
        assert!(segment_runs(&[], TimeDelta::minutes(10)).is_empty());
    }

    #[test]
    fn gap_above_threshold_splits_runs() {
        let series = [at(8, 0), at(8, 5), at(8, 10), at(9, 0), at(9, 4)];
        let runs = segment_runs(&series, TimeDelta::minutes(10));

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].run_id, 1);
        assert_eq!(runs[0].sample_count, 3);
        assert_eq!(runs[0].duration(), TimeDelta::minutes(10));
        assert_eq!(runs[1].run_id, 2);
        assert_eq!(runs[1].start, at(9, 0));
        assert_eq!(runs[1].sample_count, 2);
    }

    #[test]
    fn gap_equal_to_threshold_does_not_split() {
        let runs = segment_runs(&[at(8, 0), at(8, 10)], TimeDelta::minutes(10));
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].sample_count, 2);
    }

    #[test]
    fn unsorted_input_is_sorted_first() {
        let runs = segment_runs(&[at(9, 0), at(8, 0), at(8, 1)], TimeDelta::minutes(10));
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].start, at(8, 0));
        assert_eq!(runs[0].end, at(8, 1));
    }

    #[test]
    fn timestamps_map_back_to_runs() {
        let series = [at(9, 0), at(8, 0), at(8, 3)];
        let runs = segment_runs(&series, TimeDelta::minutes(10));
        assert_eq!(assign_run_ids(&series, &runs), [Some(2), Some(1), Some(1)]);
        assert_eq!(assign_run_ids(&[at(12, 0)], &runs), [None]);
    }

    #[test]
    fn summary_row_formats_times() {
        let run = ProductionRun {
            run_id: 4,
            start: at(6, 0),
            end: at(7, 30),
            sample_count: 91,
        };
        let row = run.summary_row();
        assert_eq!(row.start_time, "20/05/2024 06:00:00");
        assert_eq!(row.end_time, "20/05/2024 07:30:00");
        assert_eq!(row.total_time, "01:30:00");
        assert_eq!(row.samples_count, 91);
    }

    #[test]
    fn hms_does_not_wrap_days() {
        assert_eq!(format_hms(TimeDelta::hours(26) + TimeDelta::seconds(5)), "26:00:05");
        assert_eq!(format_hms(TimeDelta::zero()), "00:00:00");
    }
}
