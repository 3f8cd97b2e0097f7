//! Elementary cycle enumeration.
//!
//! # Algorithm
//!
//! Johnson's circuit search, run per strongly connected component:
//!
//! 1. Components come from [`ordered_components`], smallest station first.
//! 2. Within a component, every member `s` (ascending) is a candidate start
//!    node. The search from `s` is confined to the strongly connected
//!    component of `s` in the subgraph induced by members `≥ s`; when that is
//!    `s` alone, `s` is skipped. Each circuit is therefore found exactly
//!    once, from its smallest station, which is already its canonical
//!    rotation, and a long loop is walked once rather than once per member.
//! 3. A blocked flag plus a blocked map (Johnson's `B` sets) keep the search
//!    from re-exploring dead ends. The scope walks, the DFS and the unblock
//!    cascade all use explicit stacks, so deep components cannot overflow
//!    the call stack.
//!
//! Self-loops are not part of the circuit search; every node is checked for
//! a self-edge directly, including nodes that also sit in larger components.
//!
//! # Bounds
//!
//! Dense graphs have combinatorially many circuits. The search counts every
//! circuit-search edge examination against `max_steps` and every new cycle against
//! `max_cycles`, and stops with [`CycleLimitExceeded`] carrying the cycles
//! found so far when either bound is crossed.

use std::collections::HashSet;

use loopwatch_core::{
    Cycle, CycleLimitExceeded, InvariantViolation, SearchBound, SearchLimits,
};
use petgraph::graph::NodeIndex;
use tracing::{debug, instrument, warn};

use crate::graph::{Component, TransitionGraph, ordered_components};

// ---------------------------------------------------------------------------
// CycleSet
// ---------------------------------------------------------------------------

/// Canonical cycles in discovery order, without rotational duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSet {
    cycles: Vec<Cycle>,
    seen: HashSet<Cycle>,
}

impl CycleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalize and insert. Returns `false` if the loop was already present.
    pub fn insert(&mut self, cycle: Cycle) -> bool {
        let cycle = cycle.canonical();
        if self.seen.contains(&cycle) {
            return false;
        }
        self.seen.insert(cycle.clone());
        self.cycles.push(cycle);
        true
    }

    #[must_use]
    pub fn contains(&self, cycle: &Cycle) -> bool {
        self.seen.contains(&cycle.clone().canonical())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cycle> {
        self.cycles.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Cycle> {
        self.cycles
    }
}

impl FromIterator<Cycle> for CycleSet {
    fn from_iter<I: IntoIterator<Item = Cycle>>(iter: I) -> Self {
        let mut set = Self::new();
        for cycle in iter {
            set.insert(cycle);
        }
        set
    }
}

impl<'a> IntoIterator for &'a CycleSet {
    type Item = &'a Cycle;
    type IntoIter = std::slice::Iter<'a, Cycle>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnumerateError {
    /// Recoverable: a search bound was hit.
    #[error(transparent)]
    LimitExceeded(#[from] CycleLimitExceeded),
    /// Fatal: the search produced something that is not an elementary cycle.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

enum Halt {
    Bound(SearchBound),
    Invariant(InvariantViolation),
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Enumerate all elementary cycles of `graph`, canonicalized and deduplicated.
///
/// Pure function of the graph: identical graphs yield identical sets in
/// identical order.
///
/// # Errors
///
/// - [`EnumerateError::LimitExceeded`] when a bound in `limits` is crossed;
///   the error carries the partial set.
/// - [`EnumerateError::Invariant`] if the search emits a malformed cycle.
#[instrument(skip(graph), fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn enumerate(graph: &TransitionGraph, limits: &SearchLimits) -> Result<CycleSet, EnumerateError> {
    let mut search = Search::new(graph, *limits);

    match search.run() {
        Ok(()) => {
            debug!(
                cycles = search.found.len(),
                steps = search.steps,
                "cycle enumeration complete"
            );
            Ok(search.found)
        }
        Err(Halt::Bound(limit)) => {
            warn!(
                %limit,
                cycles = search.found.len(),
                steps = search.steps,
                "cycle enumeration stopped at search bound"
            );
            Err(CycleLimitExceeded {
                limit,
                partial: search.found.into_vec(),
            }
            .into())
        }
        Err(Halt::Invariant(violation)) => {
            tracing::error!("cycle enumeration invariant violated: {violation}");
            Err(violation.into())
        }
    }
}

// ---------------------------------------------------------------------------
// Search state
// ---------------------------------------------------------------------------

struct Search<'g> {
    graph: &'g TransitionGraph,
    limits: SearchLimits,
    found: CycleSet,
    steps: u64,
}

/// A component re-indexed `0..n` in ascending station order, self-edges removed.
struct ComponentView {
    members: Vec<NodeIndex>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
}

/// Per-component buffers, reused across start nodes and reset by touched entry.
struct Scratch {
    blocked: Vec<bool>,
    blocked_map: Vec<Vec<usize>>,
    in_scope: Vec<bool>,
    reaches_start: Vec<bool>,
}

struct Frame {
    node: usize,
    next: usize,
    closed: bool,
}

impl<'g> Search<'g> {
    fn new(graph: &'g TransitionGraph, limits: SearchLimits) -> Self {
        Self {
            graph,
            limits,
            found: CycleSet::new(),
            steps: 0,
        }
    }

    fn run(&mut self) -> Result<(), Halt> {
        for component in ordered_components(self.graph) {
            let mut view = component.is_cyclic().then(|| {
                let view = ComponentView::new(self.graph, &component);
                let scratch = Scratch::new(view.members.len());
                (view, scratch)
            });

            for (local, &node) in component.members.iter().enumerate() {
                if self.graph.has_self_loop(node) {
                    self.tick()?;
                    self.emit(vec![node])?;
                }
                if let Some((view, scratch)) = &mut view {
                    let scope = view.scope_of(local, scratch);
                    if scope.is_empty() {
                        continue;
                    }
                    let outcome = self.circuits_from(view, local, scratch);
                    scratch.reset(&scope);
                    outcome?;
                }
            }
        }
        Ok(())
    }

    fn tick(&mut self) -> Result<(), Halt> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(Halt::Bound(SearchBound::Steps(self.limits.max_steps)));
        }
        Ok(())
    }

    fn emit(&mut self, path: Vec<NodeIndex>) -> Result<(), Halt> {
        let stations: Vec<String> = path
            .into_iter()
            .filter_map(|idx| self.graph.station(idx).map(ToString::to_string))
            .collect();
        let cycle = Cycle::new(stations).map_err(|e| Halt::Invariant(e.into()))?;

        if self.found.contains(&cycle) {
            return Ok(());
        }
        if self.found.len() >= self.limits.max_cycles {
            return Err(Halt::Bound(SearchBound::Cycles(self.limits.max_cycles)));
        }
        self.found.insert(cycle);
        Ok(())
    }

    /// All circuits through `start` inside its scope (see
    /// [`ComponentView::scope_of`]), which must already be marked in
    /// `scratch.in_scope`.
    fn circuits_from(
        &mut self,
        view: &ComponentView,
        start: usize,
        scratch: &mut Scratch,
    ) -> Result<(), Halt> {
        let mut path: Vec<usize> = vec![start];
        let mut frames: Vec<Frame> = vec![Frame {
            node: start,
            next: 0,
            closed: false,
        }];
        scratch.blocked[start] = true;

        while let Some(frame) = frames.last_mut() {
            let v = frame.node;

            if let Some(&w) = view.successors[v].get(frame.next) {
                frame.next += 1;
                self.tick()?;

                if !scratch.in_scope[w] {
                    continue;
                }
                if w == start {
                    frame.closed = true;
                    self.emit(view.to_nodes(&path))?;
                } else if !scratch.blocked[w] {
                    scratch.blocked[w] = true;
                    path.push(w);
                    frames.push(Frame {
                        node: w,
                        next: 0,
                        closed: false,
                    });
                }
                continue;
            }

            // All successors of `v` explored.
            let closed = frame.closed;
            frames.pop();
            path.pop();

            if closed {
                unblock(v, &mut scratch.blocked, &mut scratch.blocked_map);
                if let Some(parent) = frames.last_mut() {
                    parent.closed = true;
                }
            } else {
                for &w in &view.successors[v] {
                    if scratch.in_scope[w] && !scratch.blocked_map[w].contains(&v) {
                        scratch.blocked_map[w].push(v);
                    }
                }
            }
        }

        Ok(())
    }
}

impl ComponentView {
    fn new(graph: &TransitionGraph, component: &Component) -> Self {
        let members = component.members.clone();
        let successors: Vec<Vec<usize>> = members
            .iter()
            .map(|&node| {
                graph
                    .successors(node)
                    .into_iter()
                    .filter(|&next| next != node)
                    .filter_map(|next| members.binary_search(&next).ok())
                    .collect()
            })
            .collect();

        let mut predecessors = vec![Vec::new(); members.len()];
        for (from, targets) in successors.iter().enumerate() {
            for &to in targets {
                predecessors[to].push(from);
            }
        }

        Self {
            members,
            successors,
            predecessors,
        }
    }

    /// The strongly connected component containing `start` in the subgraph
    /// induced by members `>= start`, marked in `scratch.in_scope`.
    ///
    /// Returns an empty list (and marks nothing) when that component is just
    /// `start`, since no circuit of length >= 2 can then begin there.
    ///
    /// Nodes that reach `start` are collected first by a backward walk; the
    /// forward walk from `start` then only enters those. Both walks use
    /// explicit stacks.
    fn scope_of(&self, start: usize, scratch: &mut Scratch) -> Vec<usize> {
        let mut reaching = vec![start];
        let mut pending = vec![start];
        scratch.reaches_start[start] = true;
        while let Some(u) = pending.pop() {
            for &p in &self.predecessors[u] {
                if p > start && !scratch.reaches_start[p] {
                    scratch.reaches_start[p] = true;
                    reaching.push(p);
                    pending.push(p);
                }
            }
        }

        let mut scope = Vec::new();
        if reaching.len() > 1 {
            scope.push(start);
            scratch.in_scope[start] = true;
            pending.push(start);
            while let Some(u) = pending.pop() {
                for &w in &self.successors[u] {
                    if scratch.reaches_start[w] && !scratch.in_scope[w] {
                        scratch.in_scope[w] = true;
                        scope.push(w);
                        pending.push(w);
                    }
                }
            }
        }

        for &u in &reaching {
            scratch.reaches_start[u] = false;
        }
        if scope.len() == 1 {
            scratch.in_scope[start] = false;
            scope.clear();
        }
        scope
    }

    fn to_nodes(&self, path: &[usize]) -> Vec<NodeIndex> {
        path.iter().map(|&local| self.members[local]).collect()
    }
}

impl Scratch {
    fn new(len: usize) -> Self {
        Self {
            blocked: vec![false; len],
            blocked_map: vec![Vec::new(); len],
            in_scope: vec![false; len],
            reaches_start: vec![false; len],
        }
    }

    /// Clear everything a search over `scope` may have touched.
    fn reset(&mut self, scope: &[usize]) {
        for &u in scope {
            self.blocked[u] = false;
            self.blocked_map[u].clear();
            self.in_scope[u] = false;
        }
    }
}

/// Clear `node`'s block and cascade through the blocked map.
fn unblock(node: usize, blocked: &mut [bool], blocked_map: &mut [Vec<usize>]) {
    let mut pending = vec![node];
    while let Some(u) = pending.pop() {
        if !blocked[u] {
            continue;
        }
        blocked[u] = false;
        pending.extend(
            std::mem::take(&mut blocked_map[u])
                .into_iter()
                .filter(|&w| blocked[w]),
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};
    use loopwatch_core::TransitionRecord;

    fn graph(edges: &[(&str, &str)]) -> TransitionGraph {
        let t0 = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid time");
        let records: Vec<TransitionRecord> = edges
            .iter()
            .map(|(from, to)| TransitionRecord::new("i", *from, *to, t0, t0 + TimeDelta::seconds(1)))
            .collect();
        TransitionGraph::build(&records)
    }

    fn unbounded() -> SearchLimits {
        SearchLimits {
            max_cycles: usize::MAX,
            max_steps: u64::MAX,
        }
    }

    fn listed(set: &CycleSet) -> Vec<Vec<&str>> {
        set.iter()
            .map(|c| c.stations().iter().map(String::as_str).collect())
            .collect()
    }

    fn complete_graph(n: usize) -> TransitionGraph {
        let names: Vec<String> = (0..n).map(|i| format!("S{i:02}")).collect();
        let mut edges = Vec::new();
        for a in &names {
            for b in &names {
                if a != b {
                    edges.push((a.as_str(), b.as_str()));
                }
            }
        }
        graph(&edges)
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let set = enumerate(&graph(&[("A", "B"), ("B", "C"), ("A", "C")]), &unbounded())
            .expect("enumerate");
        assert!(set.is_empty());
    }

    #[test]
    fn two_cycle_is_found_once() {
        let set = enumerate(&graph(&[("B", "A"), ("A", "B")]), &unbounded()).expect("enumerate");
        assert_eq!(listed(&set), [vec!["A", "B"]]);
    }

    #[test]
    fn self_loop_is_length_one_cycle() {
        let set = enumerate(&graph(&[("A", "A")]), &unbounded()).expect("enumerate");
        assert_eq!(listed(&set), [vec!["A"]]);
    }

    #[test]
    fn self_loop_inside_larger_component_is_reported() {
        let set = enumerate(&graph(&[("A", "B"), ("B", "A"), ("B", "B")]), &unbounded())
            .expect("enumerate");
        assert_eq!(listed(&set), [vec!["A", "B"], vec!["B"]]);
    }

    #[test]
    fn overlapping_cycles_are_all_enumerated_in_order() {
        // A→B→C→A, A→C→A, B→C→B (no B→A, so A→C→B is not a loop)
        let set = enumerate(
            &graph(&[("A", "B"), ("B", "C"), ("C", "A"), ("A", "C"), ("C", "B")]),
            &unbounded(),
        )
        .expect("enumerate");

        assert_eq!(
            listed(&set),
            [vec!["A", "B", "C"], vec!["A", "C"], vec!["B", "C"]]
        );
        assert!(set.iter().all(Cycle::is_canonical));
    }

    #[test]
    fn separate_components_are_searched_in_station_order() {
        let set = enumerate(
            &graph(&[("X", "Y"), ("Y", "X"), ("C", "D"), ("D", "C"), ("D", "X")]),
            &unbounded(),
        )
        .expect("enumerate");
        assert_eq!(listed(&set), [vec!["C", "D"], vec!["X", "Y"]]);
    }

    #[test]
    fn complete_graph_cycle_count_matches_formula() {
        // K4 has C(4,2)*1! + C(4,3)*2! + C(4,4)*3! = 6 + 8 + 6 = 20 circuits.
        let set = enumerate(&complete_graph(4), &unbounded()).expect("enumerate");
        assert_eq!(set.len(), 20);
    }

    #[test]
    fn cycle_bound_returns_partial_set() {
        let limits = SearchLimits {
            max_cycles: 5,
            max_steps: u64::MAX,
        };
        let err = enumerate(&complete_graph(4), &limits).expect_err("bound must trip");
        let EnumerateError::LimitExceeded(exceeded) = err else {
            panic!("expected limit error");
        };
        assert_eq!(exceeded.limit, SearchBound::Cycles(5));
        assert_eq!(exceeded.partial.len(), 5);

        let full = enumerate(&complete_graph(4), &unbounded())
            .expect("enumerate")
            .into_vec();
        assert_eq!(exceeded.partial.as_slice(), &full[..5]);
    }

    #[test]
    fn cycle_bound_equal_to_count_is_not_exceeded() {
        let limits = SearchLimits {
            max_cycles: 20,
            max_steps: u64::MAX,
        };
        assert_eq!(enumerate(&complete_graph(4), &limits).map(|s| s.len()), Ok(20));
    }

    #[test]
    fn step_bound_stops_dense_search() {
        let limits = SearchLimits {
            max_cycles: usize::MAX,
            max_steps: 50,
        };
        let err = enumerate(&complete_graph(6), &limits).expect_err("bound must trip");
        assert!(matches!(
            err,
            EnumerateError::LimitExceeded(CycleLimitExceeded {
                limit: SearchBound::Steps(50),
                ..
            })
        ));
    }

    #[test]
    fn long_ring_does_not_recurse() {
        let names: Vec<String> = (0..5_000).map(|i| format!("N{i:05}")).collect();
        let mut edges: Vec<(&str, &str)> = names.windows(2).map(|w| (w[0].as_str(), w[1].as_str())).collect();
        edges.push((names[names.len() - 1].as_str(), names[0].as_str()));

        let set = enumerate(&graph(&edges), &unbounded()).expect("enumerate");
        assert_eq!(set.len(), 1);
        assert_eq!(set.iter().next().map(Cycle::len), Some(5_000));
    }

    #[test]
    fn single_loop_costs_one_walk() {
        let names: Vec<String> = (0..4_000).map(|i| format!("N{i:05}")).collect();
        let mut edges: Vec<(&str, &str)> = names.windows(2).map(|w| (w[0].as_str(), w[1].as_str())).collect();
        edges.push((names[names.len() - 1].as_str(), names[0].as_str()));

        // One examination per ring edge; later start nodes have a trivial scope.
        let limits = SearchLimits {
            max_cycles: usize::MAX,
            max_steps: 4_000,
        };
        let set = enumerate(&graph(&edges), &limits).expect("ring stays within a linear step budget");
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn start_scope_excludes_nodes_that_cannot_return() {
        // From B, the only way back to B passes through A (< B), so B has an
        // empty scope; A still finds both loops.
        let set = enumerate(
            &graph(&[("A", "B"), ("B", "C"), ("C", "A"), ("B", "A")]),
            &unbounded(),
        )
        .expect("enumerate");
        assert_eq!(listed(&set), [vec!["A", "B"], vec!["A", "B", "C"]]);
    }

    #[test]
    fn cycle_set_collapses_rotations() {
        let a = Cycle::new(vec!["B".into(), "C".into(), "A".into()]).expect("cycle");
        let b = Cycle::new(vec!["C".into(), "A".into(), "B".into()]).expect("cycle");

        let set: CycleSet = [a.clone(), b].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert!(set.contains(&a));
        assert_eq!(listed(&set), [vec!["A", "B", "C"]]);
    }
}
