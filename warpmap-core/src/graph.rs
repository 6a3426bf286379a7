//! Layered route graph with id-keyed adjacency.
//!
//! Edges are stored only as target ids on each node; traversals resolve ids
//! against the node map as they go, so there is a single source of truth for
//! connectivity.
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use thiserror::Error;

use crate::node::{NodeId, NodeRole, RouteNode};

/// Structural defects detected in a route graph.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("expected exactly one start node, found {0}")]
    StartCount(usize),
    #[error("expected exactly one end node, found {0}")]
    EndCount(usize),
    #[error("start node {id} sits on layer {layer} instead of layer 0")]
    StartLayer { id: NodeId, layer: u32 },
    #[error("end node {id} sits on layer {layer} instead of the final layer")]
    EndLayer { id: NodeId, layer: u32 },
    #[error("layer {0} has no nodes")]
    EmptyLayer(usize),
    #[error("node {id} is not indexed under its layer {layer}")]
    LayerIndex { id: NodeId, layer: u32 },
    #[error("edge {from} -> {to} points at a missing node")]
    DanglingEdge { from: NodeId, to: NodeId },
    #[error("edge {from} -> {to} jumps from layer {from_layer} to layer {to_layer}")]
    LayerSkip {
        from: NodeId,
        to: NodeId,
        from_layer: u32,
        to_layer: u32,
    },
    #[error("node {0} has no incoming edge")]
    MissingIncoming(NodeId),
    #[error("node {0} has no outgoing edge")]
    MissingOutgoing(NodeId),
    #[error("node {0} is unreachable from the start node")]
    Unreachable(NodeId),
}

/// A completed warp map: one start, one end, and intermediate layers between.
///
/// The public surface is read-only. Only the generator and snapshot restore
/// insert edges, before the graph is handed out.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGraph {
    nodes: BTreeMap<NodeId, RouteNode>,
    layers: Vec<Vec<NodeId>>,
    start: NodeId,
    end: NodeId,
}

impl RouteGraph {
    /// Assemble a graph from nodes already grouped by layer.
    pub(crate) fn from_parts(
        nodes: BTreeMap<NodeId, RouteNode>,
        layers: Vec<Vec<NodeId>>,
        start: NodeId,
        end: NodeId,
    ) -> Self {
        Self {
            nodes,
            layers,
            start,
            end,
        }
    }

    /// Insert `from -> to`. Returns false for duplicates or unknown sources.
    pub(crate) fn add_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        self.nodes
            .get_mut(&from)
            .is_some_and(|node| node.connect(to))
    }

    #[must_use]
    pub const fn start(&self) -> NodeId {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NodeId {
        self.end
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&RouteNode> {
        self.nodes.get(&id)
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Iterate nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &RouteNode> {
        self.nodes.values()
    }

    /// Node ids of one layer in index order.
    #[must_use]
    pub fn layer(&self, layer: usize) -> Option<&[NodeId]> {
        self.layers.get(layer).map(Vec::as_slice)
    }

    #[must_use]
    pub fn layers(&self) -> &[Vec<NodeId>] {
        &self.layers
    }

    /// Total layer count, start and end included.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(RouteNode::out_degree).sum()
    }

    /// Outgoing targets of `id`; empty for unknown ids.
    #[must_use]
    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(RouteNode::outgoing)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn in_degree(&self, id: NodeId) -> usize {
        self.nodes
            .values()
            .filter(|node| node.connects_to(id))
            .count()
    }

    /// In-degree of every node, computed in one sweep.
    #[must_use]
    pub fn in_degrees(&self) -> BTreeMap<NodeId, usize> {
        let mut degrees: BTreeMap<NodeId, usize> =
            self.nodes.keys().map(|&id| (id, 0)).collect();
        for node in self.nodes.values() {
            for target in node.outgoing() {
                if let Some(count) = degrees.get_mut(target) {
                    *count += 1;
                }
            }
        }
        degrees
    }

    /// Breadth-first set of nodes reachable from `origin`, origin included.
    #[must_use]
    pub fn reachable_from(&self, origin: NodeId) -> BTreeSet<NodeId> {
        let mut visited = BTreeSet::new();
        if !self.contains(origin) {
            return visited;
        }
        let mut queue = VecDeque::from([origin]);
        visited.insert(origin);
        while let Some(current) = queue.pop_front() {
            for &next in self.successors(current) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        visited
    }

    /// Breadth-first search that stops as soon as `target` is found.
    #[must_use]
    pub fn has_path(&self, origin: NodeId, target: NodeId) -> bool {
        if !self.contains(origin) || !self.contains(target) {
            return false;
        }
        if origin == target {
            return true;
        }
        let mut visited = BTreeSet::from([origin]);
        let mut queue = VecDeque::from([origin]);
        while let Some(current) = queue.pop_front() {
            for &next in self.successors(current) {
                if next == target {
                    return true;
                }
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// Verify the structural guarantees every completed map must satisfy.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.check_terminals()?;
        self.check_layer_index()?;
        self.check_edges()?;
        self.check_degrees()?;

        let reached = self.reachable_from(self.start);
        if let Some(&missing) = self.nodes.keys().find(|id| !reached.contains(id)) {
            return Err(InvariantViolation::Unreachable(missing));
        }
        Ok(())
    }

    fn check_terminals(&self) -> Result<(), InvariantViolation> {
        let starts = self.count_role(NodeRole::Start);
        if starts != 1 {
            return Err(InvariantViolation::StartCount(starts));
        }
        let ends = self.count_role(NodeRole::End);
        if ends != 1 {
            return Err(InvariantViolation::EndCount(ends));
        }

        let start = self
            .node(self.start)
            .filter(|node| node.role() == NodeRole::Start)
            .ok_or(InvariantViolation::StartCount(0))?;
        if start.layer() != 0 {
            return Err(InvariantViolation::StartLayer {
                id: start.id(),
                layer: start.layer(),
            });
        }

        let end = self
            .node(self.end)
            .filter(|node| node.role() == NodeRole::End)
            .ok_or(InvariantViolation::EndCount(0))?;
        let last_layer = self.layers.len().saturating_sub(1);
        if end.layer() as usize != last_layer {
            return Err(InvariantViolation::EndLayer {
                id: end.id(),
                layer: end.layer(),
            });
        }
        Ok(())
    }

    fn count_role(&self, role: NodeRole) -> usize {
        self.nodes.values().filter(|node| node.role() == role).count()
    }

    fn check_layer_index(&self) -> Result<(), InvariantViolation> {
        if let Some(empty) = self.layers.iter().position(Vec::is_empty) {
            return Err(InvariantViolation::EmptyLayer(empty));
        }
        for node in self.nodes.values() {
            let indexed = self
                .layers
                .get(node.layer() as usize)
                .is_some_and(|ids| ids.contains(&node.id()));
            if !indexed {
                return Err(InvariantViolation::LayerIndex {
                    id: node.id(),
                    layer: node.layer(),
                });
            }
        }
        Ok(())
    }

    fn check_edges(&self) -> Result<(), InvariantViolation> {
        for node in self.nodes.values() {
            for &target_id in node.outgoing() {
                let target = self
                    .node(target_id)
                    .ok_or(InvariantViolation::DanglingEdge {
                        from: node.id(),
                        to: target_id,
                    })?;
                if target.layer() != node.layer() + 1 {
                    return Err(InvariantViolation::LayerSkip {
                        from: node.id(),
                        to: target_id,
                        from_layer: node.layer(),
                        to_layer: target.layer(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_degrees(&self) -> Result<(), InvariantViolation> {
        let in_degrees = self.in_degrees();
        for node in self.nodes.values() {
            let id = node.id();
            if id != self.start && in_degrees.get(&id).copied().unwrap_or(0) == 0 {
                return Err(InvariantViolation::MissingIncoming(id));
            }
            if id != self.end && node.out_degree() == 0 {
                return Err(InvariantViolation::MissingOutgoing(id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::node::Position;

    const DIAMOND_EDGES: [(u32, u32); 4] = [(0, 1), (0, 2), (1, 3), (2, 3)];

    /// Hand-built diamond: start -> {a, b} -> end, with the given edges.
    pub(crate) fn diamond_with_edges(edges: &[(u32, u32)]) -> RouteGraph {
        let start = RouteNode::new(NodeId(0), 0, 0, Position::new(0.05, 0.5), NodeRole::Start);
        let a = RouteNode::new(NodeId(1), 1, 0, Position::new(0.5, 0.1), NodeRole::Intermediate);
        let b = RouteNode::new(NodeId(2), 1, 1, Position::new(0.5, 0.9), NodeRole::Intermediate);
        let end = RouteNode::new(NodeId(3), 2, 0, Position::new(0.95, 0.5), NodeRole::End);
        let nodes = [start, a, b, end]
            .into_iter()
            .map(|node| (node.id(), node))
            .collect();
        let layers = vec![vec![NodeId(0)], vec![NodeId(1), NodeId(2)], vec![NodeId(3)]];
        let mut graph = RouteGraph::from_parts(nodes, layers, NodeId(0), NodeId(3));
        for &(from, to) in edges {
            graph.add_edge(NodeId(from), NodeId(to));
        }
        graph
    }

    pub(crate) fn diamond() -> RouteGraph {
        diamond_with_edges(&DIAMOND_EDGES)
    }

    #[test]
    fn diamond_satisfies_invariants() {
        let graph = diamond();
        graph.check_invariants().expect("diamond is valid");
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.layer_count(), 3);
        assert_eq!(graph.in_degree(NodeId(3)), 2);
        assert_eq!(graph.in_degrees().get(&NodeId(0)), Some(&0));
    }

    #[test]
    fn add_edge_ignores_duplicates_and_unknown_sources() {
        let mut graph = diamond();
        assert!(!graph.add_edge(NodeId(0), NodeId(1)));
        assert!(!graph.add_edge(NodeId(42), NodeId(1)));
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn reachability_helpers_follow_direction() {
        let graph = diamond();
        let from_a = graph.reachable_from(NodeId(1));
        assert_eq!(from_a, BTreeSet::from([NodeId(1), NodeId(3)]));
        assert!(graph.has_path(NodeId(0), NodeId(3)));
        assert!(!graph.has_path(NodeId(1), NodeId(2)));
        assert!(!graph.has_path(NodeId(3), NodeId(0)));
        assert!(graph.reachable_from(NodeId(99)).is_empty());
    }

    #[test]
    fn detects_missing_incoming() {
        let graph = diamond_with_edges(&[(0, 1), (1, 3), (2, 3)]);
        assert_eq!(
            graph.check_invariants(),
            Err(InvariantViolation::MissingIncoming(NodeId(2)))
        );
    }

    #[test]
    fn detects_layer_skip() {
        let mut graph = diamond();
        graph.add_edge(NodeId(0), NodeId(3));
        assert!(matches!(
            graph.check_invariants(),
            Err(InvariantViolation::LayerSkip { from, to, .. })
                if from == NodeId(0) && to == NodeId(3)
        ));
    }

    #[test]
    fn detects_dangling_edge() {
        let mut graph = diamond();
        graph.add_edge(NodeId(1), NodeId(77));
        assert_eq!(
            graph.check_invariants(),
            Err(InvariantViolation::DanglingEdge {
                from: NodeId(1),
                to: NodeId(77)
            })
        );
    }

    #[test]
    fn detects_missing_outgoing() {
        let graph = diamond_with_edges(&[(0, 1), (0, 2), (1, 3)]);
        assert_eq!(
            graph.check_invariants(),
            Err(InvariantViolation::MissingOutgoing(NodeId(2)))
        );
    }
}
