//! Strongly connected components in deterministic order.
//!
//! Cycles never cross an SCC boundary, so the enumerator searches one
//! component at a time. Components come from petgraph's Kosaraju pass,
//! whose DFS walks keep their own stacks, so a component of any depth is
//! safe on a small thread stack. Its output order depends on petgraph
//! internals; here members are sorted and components are ordered by their
//! smallest station.

use petgraph::algo::kosaraju_scc;
use petgraph::graph::NodeIndex;

use crate::graph::build::TransitionGraph;

/// One SCC, members in ascending station order (never empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub members: Vec<NodeIndex>,
}

impl Component {
    /// `true` if the component can hold a cycle of length ≥ 2.
    #[must_use]
    pub fn is_cyclic(&self) -> bool {
        self.members.len() > 1
    }
}

#[must_use]
pub fn ordered_components(graph: &TransitionGraph) -> Vec<Component> {
    let mut components: Vec<Component> = kosaraju_scc(graph.digraph())
        .into_iter()
        .map(|mut members| {
            members.sort_unstable();
            Component { members }
        })
        .collect();

    components.sort_unstable_by_key(|component| component.members[0]);
    components
}

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

    fn names(graph: &TransitionGraph, component: &Component) -> Vec<String> {
        component
            .members
            .iter()
            .filter_map(|&idx| graph.station(idx).map(ToString::to_string))
            .collect()
    }

    #[test]
    fn components_are_sorted_by_smallest_member() {
        let g = graph(&[("D", "C"), ("C", "D"), ("B", "A"), ("A", "B"), ("A", "E")]);
        let components = ordered_components(&g);

        let listed: Vec<Vec<String>> = components.iter().map(|c| names(&g, c)).collect();
        assert_eq!(listed, [vec!["A", "B"], vec!["C", "D"], vec!["E"]]);
        assert!(components[0].is_cyclic());
        assert!(!components[2].is_cyclic());
    }

    #[test]
    fn long_ring_is_one_component_on_a_small_stack() {
        let names: Vec<String> = (0..20_000).map(|i| format!("R{i:05}")).collect();
        let mut edges: Vec<(&str, &str)> = names
            .windows(2)
            .map(|w| (w[0].as_str(), w[1].as_str()))
            .collect();
        edges.push((names[names.len() - 1].as_str(), names[0].as_str()));
        let g = graph(&edges);

        let components = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(move || ordered_components(&g).len())
            .expect("spawn")
            .join()
            .expect("no stack overflow");
        assert_eq!(components, 1);
    }

    #[test]
    fn acyclic_graph_is_all_singletons() {
        let g = graph(&[("A", "B"), ("B", "C")]);
        assert!(ordered_components(&g).iter().all(|c| !c.is_cyclic()));
    }
}
