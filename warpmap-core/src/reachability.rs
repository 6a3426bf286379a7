//! Player position tracking and movement legality over a finished route graph.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;

use crate::constants::LOG_TARGET_REACHABILITY;
use crate::graph::RouteGraph;
use crate::node::NodeId;

/// Rejected movement requests. State is never changed when one is returned.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("no direct route from {from} to {to}")]
    IllegalMove { from: NodeId, to: NodeId },
    #[error("node {0} is not part of this map")]
    UnknownNode(NodeId),
}

/// Result of a legal move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// The move landed on the end node; the sector is complete.
    Arrived,
}

impl MoveOutcome {
    #[must_use]
    pub const fn is_arrival(self) -> bool {
        matches!(self, Self::Arrived)
    }
}

/// How a node relates to the player's current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeAvailability {
    Current,
    /// Already passed through on the way to the current node.
    Visited,
    /// One legal move away.
    Adjacent,
    Reachable,
    Unreachable,
}

impl NodeAvailability {
    /// Whether the player can still get to this node.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Current | Self::Adjacent | Self::Reachable)
    }
}

/// Tracks where the player is on a shared graph and answers movement queries.
///
/// Queries borrow immutably and recompute from the graph each call;
/// [`ReachabilityService::advance_to`] is the only mutating operation.
#[derive(Debug, Clone)]
pub struct ReachabilityService {
    graph: Arc<RouteGraph>,
    current: NodeId,
    path: Vec<NodeId>,
}

impl ReachabilityService {
    /// Place the player on the graph's start node.
    #[must_use]
    pub fn new(graph: Arc<RouteGraph>) -> Self {
        let start = graph.start();
        Self {
            graph,
            current: start,
            path: vec![start],
        }
    }

    /// Place the player on an arbitrary node, with no recorded history.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::UnknownNode`] when `current` is not in the graph.
    pub fn with_current(graph: Arc<RouteGraph>, current: NodeId) -> Result<Self, MoveError> {
        if !graph.contains(current) {
            return Err(MoveError::UnknownNode(current));
        }
        Ok(Self {
            graph,
            current,
            path: vec![current],
        })
    }

    /// Replay a recorded path from the start node. The last entry becomes the
    /// current node; an empty path leaves the player on the start node.
    ///
    /// # Errors
    ///
    /// Fails if any entry is unknown, the path does not begin at the start
    /// node, or consecutive entries are not linked.
    pub fn with_path(graph: Arc<RouteGraph>, path: &[NodeId]) -> Result<Self, MoveError> {
        let Some((&first, rest)) = path.split_first() else {
            return Ok(Self::new(graph));
        };
        let start = graph.start();
        if first != start {
            if !graph.contains(first) {
                return Err(MoveError::UnknownNode(first));
            }
            return Err(MoveError::IllegalMove {
                from: start,
                to: first,
            });
        }
        let mut service = Self::new(graph);
        for &step in rest {
            service.advance_to(step)?;
        }
        Ok(service)
    }

    #[must_use]
    pub const fn graph(&self) -> &Arc<RouteGraph> {
        &self.graph
    }

    #[must_use]
    pub const fn current(&self) -> NodeId {
        self.current
    }

    /// Nodes visited so far, ending with the current node.
    #[must_use]
    pub fn path(&self) -> &[NodeId] {
        &self.path
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current == self.graph.end()
    }

    /// Nodes one legal move away.
    #[must_use]
    pub fn adjacent(&self) -> &[NodeId] {
        self.graph.successors(self.current)
    }

    #[must_use]
    pub fn is_directly_connected(&self, target: NodeId) -> bool {
        self.adjacent().contains(&target)
    }

    /// Whether any directed path leads from the current node to `target`.
    /// The current node is reachable from itself.
    #[must_use]
    pub fn is_reachable(&self, target: NodeId) -> bool {
        self.graph.has_path(self.current, target)
    }

    /// Every node reachable from the current node, including itself.
    #[must_use]
    pub fn reachable_set(&self) -> BTreeSet<NodeId> {
        self.graph.reachable_from(self.current)
    }

    #[must_use]
    pub fn availability(&self, target: NodeId) -> NodeAvailability {
        if target == self.current {
            NodeAvailability::Current
        } else if self.path.contains(&target) {
            NodeAvailability::Visited
        } else if self.is_directly_connected(target) {
            NodeAvailability::Adjacent
        } else if self.is_reachable(target) {
            NodeAvailability::Reachable
        } else {
            NodeAvailability::Unreachable
        }
    }

    /// Availability of every node, computed from a single traversal.
    #[must_use]
    pub fn availability_map(&self) -> BTreeMap<NodeId, NodeAvailability> {
        let reachable = self.reachable_set();
        let visited: BTreeSet<NodeId> = self.path.iter().copied().collect();
        self.graph
            .nodes()
            .map(|node| {
                let id = node.id();
                let availability = if id == self.current {
                    NodeAvailability::Current
                } else if visited.contains(&id) {
                    NodeAvailability::Visited
                } else if self.is_directly_connected(id) {
                    NodeAvailability::Adjacent
                } else if reachable.contains(&id) {
                    NodeAvailability::Reachable
                } else {
                    NodeAvailability::Unreachable
                };
                (id, availability)
            })
            .collect()
    }

    /// Move along one outgoing edge.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::UnknownNode`] for ids outside the graph and
    /// [`MoveError::IllegalMove`] when `target` is not directly connected.
    pub fn advance_to(&mut self, target: NodeId) -> Result<MoveOutcome, MoveError> {
        if !self.graph.contains(target) {
            return Err(MoveError::UnknownNode(target));
        }
        if !self.is_directly_connected(target) {
            log::debug!(
                target: LOG_TARGET_REACHABILITY,
                "rejected move {} -> {target}",
                self.current
            );
            return Err(MoveError::IllegalMove {
                from: self.current,
                to: target,
            });
        }

        log::trace!(
            target: LOG_TARGET_REACHABILITY,
            "moved {} -> {target}",
            self.current
        );
        self.current = target;
        self.path.push(target);
        if target == self.graph.end() {
            Ok(MoveOutcome::Arrived)
        } else {
            Ok(MoveOutcome::Moved)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{diamond, diamond_with_edges};

    fn service() -> ReachabilityService {
        ReachabilityService::new(Arc::new(diamond()))
    }

    #[test]
    fn starts_on_start_node() {
        let svc = service();
        assert_eq!(svc.current(), NodeId(0));
        assert_eq!(svc.path(), &[NodeId(0)]);
        assert!(!svc.is_complete());
        assert_eq!(svc.adjacent(), &[NodeId(1), NodeId(2)]);
    }

    #[test]
    fn direct_connection_implies_reachable() {
        let svc = service();
        for id in [NodeId(1), NodeId(2)] {
            assert!(svc.is_directly_connected(id));
            assert!(svc.is_reachable(id));
        }
        assert!(!svc.is_directly_connected(NodeId(3)));
        assert!(svc.is_reachable(NodeId(3)));
        assert!(svc.is_reachable(NodeId(0)));
    }

    #[test]
    fn illegal_move_leaves_state_unchanged() {
        let mut svc = service();
        assert_eq!(
            svc.advance_to(NodeId(3)),
            Err(MoveError::IllegalMove {
                from: NodeId(0),
                to: NodeId(3)
            })
        );
        assert_eq!(svc.advance_to(NodeId(40)), Err(MoveError::UnknownNode(NodeId(40))));
        assert_eq!(svc.current(), NodeId(0));
        assert_eq!(svc.path().len(), 1);
    }

    #[test]
    fn moves_until_arrival() {
        let mut svc = service();
        assert_eq!(svc.advance_to(NodeId(2)), Ok(MoveOutcome::Moved));
        assert!(!svc.is_reachable(NodeId(1)));
        assert_eq!(svc.availability(NodeId(1)), NodeAvailability::Unreachable);
        let outcome = svc.advance_to(NodeId(3)).expect("legal move");
        assert!(outcome.is_arrival());
        assert!(svc.is_complete());
        assert_eq!(svc.path(), &[NodeId(0), NodeId(2), NodeId(3)]);
        assert!(svc.adjacent().is_empty());
        assert!(matches!(
            svc.advance_to(NodeId(0)),
            Err(MoveError::IllegalMove { .. })
        ));
    }

    #[test]
    fn availability_map_matches_single_queries() {
        let mut svc = service();
        svc.advance_to(NodeId(1)).expect("legal move");
        let map = svc.availability_map();
        assert_eq!(map.len(), 4);
        for (&id, &availability) in &map {
            assert_eq!(svc.availability(id), availability);
        }
        assert_eq!(map[&NodeId(0)], NodeAvailability::Visited);
        assert_eq!(map[&NodeId(1)], NodeAvailability::Current);
        assert_eq!(map[&NodeId(2)], NodeAvailability::Unreachable);
        assert_eq!(map[&NodeId(3)], NodeAvailability::Adjacent);
        assert!(map[&NodeId(3)].is_open());
        assert!(!map[&NodeId(0)].is_open());
    }

    #[test]
    fn reachable_set_respects_direction() {
        let graph = Arc::new(diamond_with_edges(&[(0, 1), (0, 2), (1, 3), (2, 3)]));
        let svc = ReachabilityService::with_current(graph, NodeId(2)).expect("known node");
        assert_eq!(svc.reachable_set(), BTreeSet::from([NodeId(2), NodeId(3)]));
    }

    #[test]
    fn restore_rejects_foreign_ids_and_broken_paths() {
        let graph = Arc::new(diamond());
        assert_eq!(
            ReachabilityService::with_current(Arc::clone(&graph), NodeId(9)).err(),
            Some(MoveError::UnknownNode(NodeId(9)))
        );
        assert!(matches!(
            ReachabilityService::with_path(Arc::clone(&graph), &[NodeId(0), NodeId(3)]),
            Err(MoveError::IllegalMove { .. })
        ));
        let restored =
            ReachabilityService::with_path(Arc::clone(&graph), &[NodeId(0), NodeId(1)])
                .expect("valid path");
        assert_eq!(restored.current(), NodeId(1));
        let fresh = ReachabilityService::with_path(graph, &[]).expect("empty path");
        assert_eq!(fresh.current(), NodeId(0));
    }

    #[test]
    fn recorded_paths_must_begin_at_start() {
        let graph = Arc::new(diamond());
        assert_eq!(
            ReachabilityService::with_path(Arc::clone(&graph), &[NodeId(1), NodeId(3)]).err(),
            Some(MoveError::IllegalMove {
                from: NodeId(0),
                to: NodeId(1)
            })
        );
        assert_eq!(
            ReachabilityService::with_path(graph, &[NodeId(7)]).err(),
            Some(MoveError::UnknownNode(NodeId(7)))
        );
    }

    #[test]
    fn service_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReachabilityService>();
    }
}
