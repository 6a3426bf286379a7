//! Id-referenced serialization of route graphs and sessions.
//!
//! Edges are stored only as lists of target ids. Restoring loads every record
//! into an id map first and resolves edge lists against it afterwards, so
//! record order in the document does not matter.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::{MapConfig, MapConfigError};
use crate::constants::SNAPSHOT_VERSION;
use crate::graph::{InvariantViolation, RouteGraph};
use crate::node::{EdgeList, NodeCategory, NodeId, NodeRole, Position, RouteNode};
use crate::reachability::MoveError;

/// Errors raised while restoring a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("node {0} appears more than once")]
    DuplicateNode(NodeId),
    #[error("edge {from} -> {to} references an unknown node")]
    DanglingEdge { from: NodeId, to: NodeId },
    #[error("terminal node {0} is missing")]
    MissingTerminal(NodeId),
    #[error("node {id} claims layer {layer}, deeper than the snapshot has nodes")]
    LayerOutOfRange { id: NodeId, layer: u32 },
    #[error("restored graph is invalid: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("restored path is invalid: {0}")]
    Path(#[from] MoveError),
    #[error("restored config is invalid: {0}")]
    Config(#[from] MapConfigError),
    #[error("snapshot json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flat, serializable form of a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub layer: u32,
    pub index_in_layer: u32,
    pub position: Position,
    pub role: NodeRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<NodeCategory>,
    #[serde(default)]
    pub hazard: bool,
    #[serde(default)]
    pub outgoing_edge_ids: EdgeList,
}

impl NodeRecord {
    fn capture(node: &RouteNode) -> Self {
        Self {
            id: node.id(),
            layer: node.layer(),
            index_in_layer: node.index_in_layer(),
            position: node.position(),
            role: node.role(),
            category: node.category(),
            hazard: node.is_hazard(),
            outgoing_edge_ids: node.outgoing().iter().copied().collect(),
        }
    }

    fn to_node(&self) -> RouteNode {
        let node = RouteNode::new(
            self.id,
            self.layer,
            self.index_in_layer,
            self.position,
            self.role,
        )
        .with_hazard(self.hazard);
        match self.category {
            Some(category) => node.with_category(category),
            None => node,
        }
    }
}

/// Serializable form of a whole route graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub version: u32,
    pub start: NodeId,
    pub end: NodeId,
    pub nodes: Vec<NodeRecord>,
}

impl GraphSnapshot {
    #[must_use]
    pub fn capture(graph: &RouteGraph) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            start: graph.start(),
            end: graph.end(),
            nodes: graph.nodes().map(NodeRecord::capture).collect(),
        }
    }

    /// Rebuild the graph and check all structural invariants.
    ///
    /// # Errors
    ///
    /// Returns an error for version mismatches, duplicate or dangling ids,
    /// missing terminals, or a graph that fails its invariants.
    pub fn restore(&self) -> Result<RouteGraph, SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        // Every layer holds at least one node, so no layer index can reach the node count.
        let mut nodes = BTreeMap::new();
        for record in &self.nodes {
            if record.layer as usize >= self.nodes.len() {
                return Err(SnapshotError::LayerOutOfRange {
                    id: record.id,
                    layer: record.layer,
                });
            }
            if nodes.insert(record.id, record.to_node()).is_some() {
                return Err(SnapshotError::DuplicateNode(record.id));
            }
        }
        for terminal in [self.start, self.end] {
            if !nodes.contains_key(&terminal) {
                return Err(SnapshotError::MissingTerminal(terminal));
            }
        }

        let layer_total = nodes.values().map(RouteNode::layer).max().unwrap_or(0) as usize + 1;
        let mut layers: Vec<Vec<NodeId>> = vec![Vec::new(); layer_total];
        let mut ordered: Vec<&RouteNode> = nodes.values().collect();
        ordered.sort_by_key(|node| (node.layer(), node.index_in_layer()));
        for node in ordered {
            layers[node.layer() as usize].push(node.id());
        }

        let mut graph = RouteGraph::from_parts(nodes, layers, self.start, self.end);
        for record in &self.nodes {
            for &target in &record.outgoing_edge_ids {
                if !graph.contains(target) {
                    return Err(SnapshotError::DanglingEdge {
                        from: record.id,
                        to: target,
                    });
                }
                graph.add_edge(record.id, target);
            }
        }
        graph.check_invariants()?;
        Ok(graph)
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl RouteGraph {
    #[must_use]
    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::capture(self)
    }

    /// # Errors
    ///
    /// See [`GraphSnapshot::restore`].
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Result<Self, SnapshotError> {
        snapshot.restore()
    }
}

/// Persistable state of a session: the active sector's map plus the path taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub user_seed: u64,
    pub sector: u32,
    pub config: MapConfig,
    pub graph: GraphSnapshot,
    pub path: Vec<NodeId>,
}

impl SessionSnapshot {
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}
