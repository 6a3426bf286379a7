//! Route node primitives shared by the graph, generator, and snapshots.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Outgoing adjacency stored inline for the common small fan-out.
pub type EdgeList = SmallVec<[NodeId; 4]>;

/// Stable identifier of a node within one route graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Start,
    End,
    Intermediate,
}

/// Gameplay tag carried by intermediate nodes; meaningless to graph algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Combat,
    Station,
    Event,
}

impl NodeCategory {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Combat => "combat",
            Self::Station => "station",
            Self::Event => "event",
        }
    }
}

/// Normalized presentation coordinate in `[0, 1] x [0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn is_normalized(self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// A single stop on the warp map.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteNode {
    id: NodeId,
    layer: u32,
    index_in_layer: u32,
    position: Position,
    role: NodeRole,
    category: Option<NodeCategory>,
    hazard: bool,
    outgoing: EdgeList,
}

impl RouteNode {
    #[must_use]
    pub fn new(
        id: NodeId,
        layer: u32,
        index_in_layer: u32,
        position: Position,
        role: NodeRole,
    ) -> Self {
        Self {
            id,
            layer,
            index_in_layer,
            position,
            role,
            category: None,
            hazard: false,
            outgoing: EdgeList::new(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: NodeCategory) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn with_hazard(mut self, hazard: bool) -> Self {
        self.hazard = hazard;
        self
    }

    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub const fn layer(&self) -> u32 {
        self.layer
    }

    #[must_use]
    pub const fn index_in_layer(&self) -> u32 {
        self.index_in_layer
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub const fn role(&self) -> NodeRole {
        self.role
    }

    #[must_use]
    pub const fn category(&self) -> Option<NodeCategory> {
        self.category
    }

    #[must_use]
    pub const fn is_hazard(&self) -> bool {
        self.hazard
    }

    /// Outgoing edge targets in insertion order.
    #[must_use]
    pub fn outgoing(&self) -> &[NodeId] {
        &self.outgoing
    }

    #[must_use]
    pub fn out_degree(&self) -> usize {
        self.outgoing.len()
    }

    #[must_use]
    pub fn connects_to(&self, target: NodeId) -> bool {
        self.outgoing.contains(&target)
    }

    /// Adds an edge if it is not already present. Returns whether it was added.
    pub(crate) fn connect(&mut self, target: NodeId) -> bool {
        if self.connects_to(target) {
            return false;
        }
        self.outgoing.push(target);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RouteNode {
        RouteNode::new(NodeId(3), 1, 0, Position::new(0.3, 0.5), NodeRole::Intermediate)
    }

    #[test]
    fn connect_rejects_duplicates_and_keeps_order() {
        let mut node = sample();
        assert!(node.connect(NodeId(7)));
        assert!(node.connect(NodeId(5)));
        assert!(!node.connect(NodeId(7)));
        assert_eq!(node.outgoing(), &[NodeId(7), NodeId(5)]);
        assert_eq!(node.out_degree(), 2);
        assert!(node.connects_to(NodeId(5)));
        assert!(!node.connects_to(NodeId(4)));
    }

    #[test]
    fn builders_set_tags() {
        let node = sample().with_category(NodeCategory::Station).with_hazard(true);
        assert_eq!(node.category(), Some(NodeCategory::Station));
        assert!(node.is_hazard());
        assert_eq!(node.role(), NodeRole::Intermediate);
        assert_eq!(NodeCategory::Station.label(), "station");
    }

    #[test]
    fn node_id_serializes_transparently() {
        assert_eq!(serde_json::to_string(&NodeId(12)).unwrap(), "12");
        assert_eq!(NodeId(12).to_string(), "#12");
    }

    #[test]
    fn position_normalization_bounds() {
        assert!(Position::new(0.0, 1.0).is_normalized());
        assert!(!Position::new(1.2, 0.5).is_normalized());
    }
}
