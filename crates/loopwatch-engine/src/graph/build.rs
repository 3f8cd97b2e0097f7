//! Transition graph construction.
//!
//! # Overview
//!
//! Turns a flat list of [`TransitionRecord`]s into a petgraph directed graph
//! keyed by station identifier. Each distinct `(from_station, to_station)`
//! pair becomes one edge carrying every duration observed for it, so the
//! traversal count of an edge is always the number of its samples.
//!
//! ## Node Order
//!
//! Stations are inserted in ascending identifier order, so `NodeIndex`
//! order equals station order. The enumerator relies on this for its
//! deterministic search order.
//!
//! ## Rejected Records
//!
//! A record with an empty station or a negative duration is logged at
//! `warn` and skipped; the rest of the input still builds.
//!
//! ## Cache Invalidation
//!
//! [`TransitionGraph::content_hash`] is a BLAKE3 hash of the sorted edge list
//! including duration samples, independent of record order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use loopwatch_core::{EdgeTally, InvalidRecordError, TransitionRecord};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::{debug, instrument, warn};

// ---------------------------------------------------------------------------
// EdgeSamples
// ---------------------------------------------------------------------------

/// Observed durations (seconds) for one `(from, to)` station pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeSamples {
    durations_secs: Vec<f64>,
}

impl EdgeSamples {
    #[must_use]
    pub fn traversal_count(&self) -> usize {
        self.durations_secs.len()
    }

    #[must_use]
    pub fn durations_secs(&self) -> &[f64] {
        &self.durations_secs
    }

    #[must_use]
    pub fn total_secs(&self) -> f64 {
        self.durations_secs.iter().sum()
    }

    /// Mean duration, `0.0` for an edge without samples.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_secs(&self) -> f64 {
        if self.durations_secs.is_empty() {
            0.0
        } else {
            self.total_secs() / self.durations_secs.len() as f64
        }
    }

    #[must_use]
    pub fn tally(&self) -> EdgeTally {
        EdgeTally {
            traversals: self.traversal_count(),
            mean_duration_secs: self.mean_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// TransitionGraph
// ---------------------------------------------------------------------------

/// Directed transition graph: nodes are station ids, an edge `A → B` means
/// some item moved from A to B.
///
/// Immutable once built.
#[derive(Debug)]
pub struct TransitionGraph {
    graph: DiGraph<String, EdgeSamples>,
    node_map: HashMap<String, NodeIndex>,
    content_hash: String,
    transitions_used: usize,
}

impl TransitionGraph {
    /// Build a graph, logging and dropping invalid records.
    #[must_use]
    pub fn build(records: &[TransitionRecord]) -> Self {
        Self::build_with_rejections(records).0
    }

    /// Build a graph and return the records that were skipped alongside it.
    #[instrument(skip(records), fields(records = records.len()))]
    pub fn build_with_rejections(records: &[TransitionRecord]) -> (Self, Vec<InvalidRecordError>) {
        let mut samples: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();
        let mut stations: BTreeSet<&str> = BTreeSet::new();
        let mut rejected = Vec::new();

        for record in records {
            match record.duration_secs() {
                Ok(secs) => {
                    stations.insert(record.from_station.as_str());
                    stations.insert(record.to_station.as_str());
                    samples
                        .entry((record.from_station.as_str(), record.to_station.as_str()))
                        .or_default()
                        .push(secs);
                }
                Err(err) => {
                    warn!(code = %err.code(), "skipping transition record: {err}");
                    rejected.push(err);
                }
            }
        }

        let content_hash = compute_edge_hash(&samples);

        let mut graph = DiGraph::<String, EdgeSamples>::with_capacity(stations.len(), samples.len());
        let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(stations.len());

        // Ascending insertion keeps NodeIndex order == station order.
        for station in stations {
            let idx = graph.add_node(station.to_string());
            node_map.insert(station.to_string(), idx);
        }

        let mut transitions_used = 0;
        for ((from, to), durations_secs) in samples {
            transitions_used += durations_secs.len();
            graph.add_edge(node_map[from], node_map[to], EdgeSamples { durations_secs });
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            skipped = rejected.len(),
            "transition graph built"
        );

        (
            Self {
                graph,
                node_map,
                content_hash,
                transitions_used,
            },
            rejected,
        )
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct `(from, to)` station pairs.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of valid records folded into the edges.
    #[must_use]
    pub const fn transitions_used(&self) -> usize {
        self.transitions_used
    }

    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    #[must_use]
    pub fn node_index(&self, station: &str) -> Option<NodeIndex> {
        self.node_map.get(station).copied()
    }

    #[must_use]
    pub fn station(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }

    /// Station ids in ascending order.
    pub fn stations(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_weights().map(String::as_str)
    }

    #[must_use]
    pub fn edge(&self, from: &str, to: &str) -> Option<&EdgeSamples> {
        let from = self.node_index(from)?;
        let to = self.node_index(to)?;
        self.graph
            .find_edge(from, to)
            .and_then(|edge| self.graph.edge_weight(edge))
    }

    /// All edges as `(from, to, samples)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &EdgeSamples)> + '_ {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].as_str(),
                self.graph[edge.target()].as_str(),
                edge.weight(),
            )
        })
    }

    /// Successors of `idx` in ascending station order.
    #[must_use]
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut next: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        next.sort_unstable();
        next.dedup();
        next
    }

    #[must_use]
    pub fn has_self_loop(&self, idx: NodeIndex) -> bool {
        self.graph.find_edge(idx, idx).is_some()
    }

    pub(crate) const fn digraph(&self) -> &DiGraph<String, EdgeSamples> {
        &self.graph
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// BLAKE3 over the sorted edge list, each edge followed by its sorted samples.
fn compute_edge_hash(samples: &BTreeMap<(&str, &str), Vec<f64>>) -> String {
    let mut hasher = blake3::Hasher::new();
    for ((from, to), durations) in samples {
        hasher.update(from.as_bytes());
        hasher.update(b"\x00");
        hasher.update(to.as_bytes());
        hasher.update(b"\x00");

        let mut sorted = durations.clone();
        sorted.sort_unstable_by(f64::total_cmp);
        for secs in sorted {
            hasher.update(&secs.to_bits().to_le_bytes());
        }
        hasher.update(b"\x01");
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
