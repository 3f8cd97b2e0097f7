//! Elementary cycles and the statistics attached to them.
//!
//! A [`Cycle`] is a station sequence `[s0, …, sk-1]` with an implicit closing
//! edge `sk-1 → s0`. All stations are distinct. Rotations of the same loop
//! describe the same cycle; [`Cycle::canonical`] picks the rotation that
//! starts at the smallest station identifier.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CycleShapeError;
use crate::severity::SeverityWeighting;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Cycle {
    stations: Vec<String>,
}

#[allow(clippy::len_without_is_empty)]
impl Cycle {
    /// Build a cycle from its station sequence, in the order traversed.
    ///
    /// The sequence is kept as given; call [`Cycle::canonical`] to normalize
    /// the starting point.
    ///
    /// # Errors
    ///
    /// Returns [`CycleShapeError`] for an empty sequence or a repeated station.
    pub fn new(stations: Vec<String>) -> Result<Self, CycleShapeError> {
        if stations.is_empty() {
            return Err(CycleShapeError::Empty);
        }

        let mut seen = HashSet::with_capacity(stations.len());
        if let Some(repeat) = stations.iter().find(|s| !seen.insert(s.as_str())) {
            return Err(CycleShapeError::RepeatedStation(repeat.clone()));
        }

        Ok(Self { stations })
    }

    /// Rotate so the smallest station comes first. Idempotent.
    #[must_use]
    pub fn canonical(mut self) -> Self {
        let start = self
            .stations
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.cmp(b))
            .map_or(0, |(idx, _)| idx);
        self.stations.rotate_left(start);
        self
    }

    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.stations
            .first()
            .is_some_and(|first| self.stations.iter().all(|s| first <= s))
    }

    /// Whether `other` is the same loop entered at a different station.
    #[must_use]
    pub fn is_rotation_of(&self, other: &Self) -> bool {
        self.clone().canonical() == other.clone().canonical()
    }

    #[must_use]
    pub fn stations(&self) -> &[String] {
        &self.stations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.stations.len() == 1
    }

    #[must_use]
    pub fn contains(&self, station: &str) -> bool {
        self.stations.iter().any(|s| s == station)
    }

    /// Consecutive station pairs, closing edge last.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.stations
            .iter()
            .zip(self.stations.iter().cycle().skip(1))
            .map(|(from, to)| (from.as_str(), to.as_str()))
    }
}

impl TryFrom<Vec<String>> for Cycle {
    type Error = CycleShapeError;

    fn try_from(stations: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(stations)
    }
}

impl From<Cycle> for Vec<String> {
    fn from(cycle: Cycle) -> Self {
        cycle.stations
    }
}

/// Renders the closed loop, e.g. `A -> B -> C -> A`.
impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for station in &self.stations {
            write!(f, "{station} -> ")?;
        }
        match self.stations.first() {
            Some(first) => write!(f, "{first}"),
            None => Ok(()),
        }
    }
}

/// Traversal summary of one graph edge, as seen by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeTally {
    pub traversals: usize,
    pub mean_duration_secs: f64,
}

/// Per-cycle statistics. Computed once per run and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleStats {
    /// Bottleneck count: the least-traveled edge of the loop.
    pub occurrence_count: usize,
    pub total_duration_secs: f64,
    pub average_duration_secs: f64,
    pub severity_score: f64,
    /// `false` when the loop exists structurally but no traversal is known.
    pub realized: bool,
}

impl CycleStats {
    /// Derive the statistics of a cycle of `length` stations from the tallies
    /// of its edges (closing edge included).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_edges(edges: &[EdgeTally], length: usize, weighting: &SeverityWeighting) -> Self {
        let occurrence_count = edges.iter().map(|e| e.traversals).min().unwrap_or(0);
        let loop_secs: f64 = edges.iter().map(|e| e.mean_duration_secs).sum();

        let total_duration_secs = loop_secs * occurrence_count as f64;
        let average_duration_secs = if occurrence_count == 0 {
            0.0
        } else {
            total_duration_secs / occurrence_count as f64
        };

        Self {
            occurrence_count,
            total_duration_secs,
            average_duration_secs,
            severity_score: weighting.score(occurrence_count, length),
            realized: occurrence_count > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(ids: &[&str]) -> Cycle {
        Cycle::new(ids.iter().map(ToString::to_string).collect()).expect("valid cycle")
    }

    #[test]
    fn rejects_empty_and_repeated() {
        assert_eq!(Cycle::new(Vec::new()), Err(CycleShapeError::Empty));
        assert_eq!(
            Cycle::new(vec!["A".into(), "B".into(), "A".into()]),
            Err(CycleShapeError::RepeatedStation("A".into()))
        );
    }

    #[test]
    fn canonical_starts_at_smallest_station() {
        let c = cycle(&["C", "A", "B"]).canonical();
        assert_eq!(c.stations(), ["A", "B", "C"]);
        assert!(c.is_canonical());
    }

    #[test]
    fn canonical_preserves_direction() {
        let c = cycle(&["B", "C", "A"]).canonical();
        assert_eq!(c, cycle(&["A", "B", "C"]));
        assert_ne!(cycle(&["A", "C", "B"]).canonical(), c);
    }

    #[test]
    fn rotations_are_the_same_cycle() {
        let a = cycle(&["S2", "S3", "S1"]);
        let b = cycle(&["S1", "S2", "S3"]);
        assert!(a.is_rotation_of(&b));
        assert!(!a.is_rotation_of(&cycle(&["S1", "S3", "S2"])));
    }

    #[test]
    fn edges_include_closing_pair() {
        let triangle = cycle(&["A", "B", "C"]);
        let edges: Vec<_> = triangle.edges().collect();
        assert_eq!(edges, [("A", "B"), ("B", "C"), ("C", "A")]);

        let single = cycle(&["A"]);
        let self_loop: Vec<_> = single.edges().collect();
        assert_eq!(self_loop, [("A", "A")]);
    }

    #[test]
    fn display_closes_the_loop() {
        assert_eq!(cycle(&["A", "B"]).to_string(), "A -> B -> A");
        assert_eq!(cycle(&["Q"]).to_string(), "Q -> Q");
    }

    #[test]
    fn serde_rejects_malformed_sequences() {
        let ok: Cycle = serde_json::from_str(r#"["A","B"]"#).expect("valid");
        assert_eq!(ok, cycle(&["A", "B"]));
        assert!(serde_json::from_str::<Cycle>(r#"["A","A"]"#).is_err());
        assert!(serde_json::from_str::<Cycle>("[]").is_err());
    }

    #[test]
    fn stats_use_bottleneck_count() {
        let edges = [
            EdgeTally {
                traversals: 4,
                mean_duration_secs: 2.0,
            },
            EdgeTally {
                traversals: 2,
                mean_duration_secs: 3.0,
            },
        ];
        let stats = CycleStats::from_edges(&edges, 2, &SeverityWeighting::default());

        assert_eq!(stats.occurrence_count, 2);
        assert!((stats.total_duration_secs - 10.0).abs() < 1e-9);
        assert!((stats.average_duration_secs - 5.0).abs() < 1e-9);
        assert!((stats.severity_score - 4.0).abs() < 1e-9);
        assert!(stats.realized);
    }

    #[test]
    fn untraversed_edge_yields_unrealized_cycle() {
        let edges = [
            EdgeTally {
                traversals: 3,
                mean_duration_secs: 1.0,
            },
            EdgeTally {
                traversals: 0,
                mean_duration_secs: 0.0,
            },
        ];
        let stats = CycleStats::from_edges(&edges, 2, &SeverityWeighting::Logarithmic);

        assert_eq!(stats.occurrence_count, 0);
        assert!(stats.average_duration_secs.abs() < f64::EPSILON);
        assert!(stats.severity_score.abs() < f64::EPSILON);
        assert!(!stats.realized);
    }
}
