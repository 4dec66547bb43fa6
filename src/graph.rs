//! Reference graph module.
//!
//! Provides the `ReferenceGraph` type, which records which stats a stat
//! reads while it is computed: stats named in its effect formulas, the
//! ability a skill is based on, and the proficiency bonus skill. The
//! scheduler uses it to find dependency cycles before evaluating anything,
//! so cycle handling does not depend on the order stats are visited in.

use crate::node::NodeId;
use crate::stat_id::StatId;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Directed graph of stat references.
///
/// An edge `from -> to` means computing `from` reads `to`.
///
/// # Examples
///
/// ```rust
/// use charstat::graph::ReferenceGraph;
/// use charstat::node::NodeId;
/// use charstat::StatId;
///
/// let mut graph = ReferenceGraph::new();
/// graph.add_node(NodeId(0), StatId::from_str("armor"));
/// graph.add_node(NodeId(1), StatId::from_str("dexterity"));
/// graph.add_node(NodeId(2), StatId::from_str("shield"));
///
/// // armor reads dexterity: no cycle
/// graph.add_edge(NodeId(0), NodeId(1));
/// assert!(graph.cycles().is_empty());
///
/// // armor <-> shield
/// graph.add_edge(NodeId(0), NodeId(2));
/// graph.add_edge(NodeId(2), NodeId(0));
/// assert_eq!(graph.cycles().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReferenceGraph {
    graph: DiGraph<(NodeId, StatId), ()>,
    node_map: HashMap<NodeId, NodeIndex>,
}

/// A set of stats that reference each other, directly or transitively.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cycle {
    /// Members sorted by arena index.
    pub nodes: Vec<NodeId>,
    /// Member names in the same order as `nodes`.
    pub stats: Vec<StatId>,
}

impl std::fmt::Display for Cycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.stats.iter().map(StatId::as_str).collect();
        write!(f, "{}", names.join(" <-> "))
    }
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if it doesn't exist and return its graph index.
    pub fn add_node(&mut self, node: NodeId, stat: StatId) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&node) {
            idx
        } else {
            let idx = self.graph.add_node((node, stat));
            self.node_map.insert(node, idx);
            idx
        }
    }

    /// Record that computing `from` reads `to`.
    ///
    /// Both nodes must have been added first; unknown nodes are ignored.
    /// Repeated references are stored once.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        let (Some(&from_idx), Some(&to_idx)) = (self.node_map.get(&from), self.node_map.get(&to))
        else {
            return;
        };
        self.graph.update_edge(from_idx, to_idx, ());
    }

    pub fn contains_edge(&self, from: NodeId, to: NodeId) -> bool {
        match (self.node_map.get(&from), self.node_map.get(&to)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Find every dependency cycle.
    ///
    /// A cycle is a strongly connected component with more than one
    /// member, or a single stat that references itself. The result is
    /// sorted, so it is the same for any insertion order.
    pub fn cycles(&self) -> Vec<Cycle> {
        let mut cycles: Vec<Cycle> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&idx| self.graph.contains_edge(idx, idx))
            })
            .map(|component| {
                let mut members: Vec<(NodeId, StatId)> = component
                    .into_iter()
                    .map(|idx| self.graph[idx].clone())
                    .collect();
                members.sort_by_key(|(node, _)| *node);
                let (nodes, stats): (Vec<NodeId>, Vec<StatId>) = members.into_iter().unzip();
                Cycle { nodes, stats }
            })
            .collect();
        cycles.sort();
        cycles
    }
}
