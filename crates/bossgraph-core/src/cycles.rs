//! Cycle diagnostics for anchor relations.
//!
//! The closure engine tolerates cycles, but a reporting line that loops back
//! on itself is almost always a data problem worth surfacing. This module
//! lists them without affecting the closure.
//!
//! # Edge Direction
//!
//! Graph edges run `id → parent_id`, the same way as [`Edge`].
//!
//! [`Edge`]: crate::edge::Edge

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;
use std::hash::Hash;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::edge::AnchorSet;

/// Find every cycle in the anchor relation.
///
/// Each entry is the sorted member list of one strongly connected component
/// with more than one member. Self-loops are reported as one-member cycles.
/// The outer list is sorted.
#[must_use]
pub fn find_cycles<K>(anchors: &AnchorSet<K>) -> Vec<Vec<K>>
where
    K: Clone + Eq + Hash + Ord,
{
    let graph = build_graph(anchors);

    let mut cycles: Vec<Vec<K>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|node| graph.find_edge(*node, *node).is_some())
        })
        .map(|component| {
            let mut members: Vec<K> = component
                .into_iter()
                .map(|idx| graph[idx].clone())
                .collect();
            members.sort_unstable();
            members
        })
        .collect();

    cycles.sort_unstable();
    cycles
}

/// `true` if the anchor relation is a forest (no cycles, no self-loops).
#[must_use]
pub fn is_acyclic<K>(anchors: &AnchorSet<K>) -> bool
where
    K: Clone + Eq + Hash,
{
    let graph = build_graph(anchors);
    !petgraph::algo::is_cyclic_directed(&graph)
}

fn build_graph<K>(anchors: &AnchorSet<K>) -> DiGraph<K, ()>
where
    K: Clone + Eq + Hash,
{
    let mut graph = DiGraph::<K, ()>::new();
    let mut node_map: HashMap<K, NodeIndex> = HashMap::new();

    for edge in anchors.iter() {
        let child = *node_map
            .entry(edge.id.clone())
            .or_insert_with(|| graph.add_node(edge.id.clone()));
        let parent = *node_map
            .entry(edge.parent_id.clone())
            .or_insert_with(|| graph.add_node(edge.parent_id.clone()));
        graph.add_edge(child, parent, ());
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchors(pairs: &[(&'static str, &'static str)]) -> AnchorSet<&'static str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn tree_has_no_cycles() {
        let set = anchors(&[("A", "B"), ("B", "C"), ("D", "C")]);
        assert!(find_cycles(&set).is_empty());
        assert!(is_acyclic(&set));
    }

    #[test]
    fn empty_relation_is_acyclic() {
        let set = AnchorSet::<u32>::default();
        assert!(find_cycles(&set).is_empty());
        assert!(is_acyclic(&set));
    }

    #[test]
    fn three_cycle_is_one_component() {
        let set = anchors(&[("C", "A"), ("A", "B"), ("B", "C"), ("X", "A")]);
        assert_eq!(find_cycles(&set), vec![vec!["A", "B", "C"]]);
        assert!(!is_acyclic(&set));
    }

    #[test]
    fn self_loop_is_reported() {
        let set = anchors(&[("A", "A"), ("B", "A")]);
        assert_eq!(find_cycles(&set), vec![vec!["A"]]);
        assert!(!is_acyclic(&set));
    }

    #[test]
    fn multiple_cycles_sorted() {
        let set = anchors(&[("Y", "Z"), ("Z", "Y"), ("A", "B"), ("B", "A"), ("Q", "Q")]);
        assert_eq!(
            find_cycles(&set),
            vec![vec!["A", "B"], vec!["Q"], vec!["Y", "Z"]]
        );
    }
}
