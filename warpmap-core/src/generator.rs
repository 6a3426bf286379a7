//! Procedural construction of layered warp maps.
//!
//! Generation runs in three phases: lay out nodes layer by layer, wire each
//! adjacent pair of layers with coverage plus windowed extra edges, and then
//! repair any node a breadth-first sweep from the start could not reach.
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::config::{MapConfig, MapConfigError};
use crate::constants::{
    LAYOUT_BOTTOM_MARGIN, LAYOUT_CENTER_Y, LAYOUT_LEFT_MARGIN, LAYOUT_RIGHT_MARGIN,
    LAYOUT_TOP_MARGIN, LOG_TARGET_GENERATOR, LONE_NODE_RELATIVE_POSITION,
};
use crate::graph::RouteGraph;
use crate::node::{NodeCategory, NodeId, NodeRole, Position, RouteNode};

/// Builds route graphs from a validated [`MapConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGraphGenerator {
    config: MapConfig,
}

impl RouteGraphGenerator {
    /// Validate the configuration and wrap it in a generator.
    ///
    /// # Errors
    ///
    /// Returns the first configuration violation.
    pub fn new(config: MapConfig) -> Result<Self, MapConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Generate from the four positional sizing inputs with default tunables.
    ///
    /// # Errors
    ///
    /// Returns an error if the sizing inputs are invalid.
    pub fn generate_with<R: Rng + ?Sized>(
        layer_count: u32,
        min_nodes_per_layer: u32,
        max_nodes_per_layer: u32,
        event_node_probability: f64,
        rng: &mut R,
    ) -> Result<RouteGraph, MapConfigError> {
        let config = MapConfig::sized(
            layer_count,
            min_nodes_per_layer,
            max_nodes_per_layer,
            event_node_probability,
        );
        Ok(Self::new(config)?.generate(rng))
    }

    #[must_use]
    pub const fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Build a complete graph. Deterministic for a given RNG stream.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> RouteGraph {
        let mut graph = self.lay_out(rng);
        self.connect(&mut graph, rng);
        let repaired = repair_connectivity(&mut graph);

        log::debug!(
            target: LOG_TARGET_GENERATOR,
            "generated warp map: {} layers, {} nodes, {} edges, {} repaired",
            graph.layer_count(),
            graph.node_count(),
            graph.edge_count(),
            repaired
        );
        debug_assert!(
            graph.check_invariants().is_ok(),
            "generator produced an invalid graph: {:?}",
            graph.check_invariants()
        );
        graph
    }

    fn lay_out<R: Rng + ?Sized>(&self, rng: &mut R) -> RouteGraph {
        let cfg = &self.config;
        let last_layer = cfg.layer_count + 1;
        let mut layout = Layout::with_capacity(cfg.total_layers() as usize);

        let start = layout.push_layer(1, |id, _| {
            RouteNode::new(
                id,
                0,
                0,
                Position::new(LAYOUT_LEFT_MARGIN, LAYOUT_CENTER_Y),
                NodeRole::Start,
            )
        })[0];

        for layer in 1..=cfg.layer_count {
            let count = self.layer_size(layer, rng);
            let hazard = self.layer_hazard(layer, rng);
            let x = layer_x(layer, last_layer);
            let mut categories = Vec::with_capacity(count as usize);
            for _ in 0..count {
                categories.push(self.roll_category(layer, rng));
            }
            layout.push_layer(count, |id, index| {
                RouteNode::new(
                    id,
                    layer,
                    index,
                    Position::new(x, layer_y(index, count)),
                    NodeRole::Intermediate,
                )
                .with_category(categories[index as usize])
                .with_hazard(hazard)
            });
        }

        let end = layout.push_layer(1, |id, _| {
            RouteNode::new(
                id,
                last_layer,
                0,
                Position::new(LAYOUT_RIGHT_MARGIN, LAYOUT_CENTER_Y),
                NodeRole::End,
            )
        })[0];

        layout.finish(start, end)
    }

    fn layer_size<R: Rng + ?Sized>(&self, layer: u32, rng: &mut R) -> u32 {
        let cfg = &self.config;
        let count = rng.gen_range(cfg.min_nodes_per_layer..=cfg.max_nodes_per_layer);
        match cfg.edge_layer_max_nodes {
            Some(cap) if layer == 1 || layer == cfg.layer_count => count.min(cap),
            _ => count,
        }
    }

    fn layer_hazard<R: Rng + ?Sized>(&self, layer: u32, rng: &mut R) -> bool {
        let cfg = &self.config;
        match &cfg.hazard_layers {
            Some(flags) => flags.get(layer as usize - 1).copied().unwrap_or(false),
            None => {
                cfg.hazard_layer_probability > 0.0 && rng.gen_bool(cfg.hazard_layer_probability)
            }
        }
    }

    fn roll_category<R: Rng + ?Sized>(&self, layer: u32, rng: &mut R) -> NodeCategory {
        let cfg = &self.config;
        if rng.gen_bool(cfg.event_node_probability) {
            return NodeCategory::Event;
        }
        let station_share = if layer == cfg.layer_count {
            cfg.final_layer_station_share
        } else {
            cfg.station_share
        };
        if rng.gen_bool(station_share) {
            NodeCategory::Station
        } else {
            NodeCategory::Combat
        }
    }

    fn connect<R: Rng + ?Sized>(&self, graph: &mut RouteGraph, rng: &mut R) {
        let layers = graph.layers().to_vec();
        let (Some(first), Some(last)) = (layers.get(1), layers.get(layers.len() - 2)) else {
            return;
        };

        let (start, end) = (graph.start(), graph.end());
        for &target in first {
            graph.add_edge(start, target);
        }
        for pair in layers[1..layers.len() - 1].windows(2) {
            self.connect_pair(graph, &pair[0], &pair[1], rng);
        }
        for &source in last {
            graph.add_edge(source, end);
        }
    }

    fn connect_pair<R: Rng + ?Sized>(
        &self,
        graph: &mut RouteGraph,
        current: &[NodeId],
        next: &[NodeId],
        rng: &mut R,
    ) {
        // Backward coverage: every next-layer node gains an incoming edge.
        for (j, &target) in next.iter().enumerate() {
            let source = current[map_index(j, next.len(), current.len())];
            graph.add_edge(source, target);
        }

        // Forward coverage: every current-layer node gains an outgoing edge.
        for (i, &source) in current.iter().enumerate() {
            if graph.successors(source).is_empty() {
                let target = next[map_index(i, current.len(), next.len())];
                graph.add_edge(source, target);
            }
        }

        for (i, &source) in current.iter().enumerate() {
            let (lo, hi) = branch_window(i, current.len(), next.len());
            let extra = rng.gen_range(0..=self.config.max_extra_edges);
            for _ in 0..extra {
                let pick = rng.gen_range(lo..=hi);
                graph.add_edge(source, next[pick]);
            }
        }
    }
}

/// Validate `config` and build one graph from `rng`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
pub fn generate_graph<R: Rng + ?Sized>(
    config: &MapConfig,
    rng: &mut R,
) -> Result<RouteGraph, MapConfigError> {
    Ok(RouteGraphGenerator::new(config.clone())?.generate(rng))
}

/// Link every node a sweep from the start misses to its closest visited parent.
///
/// Layers are processed in order, so the previous layer is always fully
/// visited by the time a node is repaired. Returns the number of edges added.
pub(crate) fn repair_connectivity(graph: &mut RouteGraph) -> usize {
    let layers = graph.layers().to_vec();
    let mut visited = graph.reachable_from(graph.start());
    let mut repaired = 0;

    for (layer_index, layer) in layers.iter().enumerate().skip(1) {
        for &orphan in layer {
            if visited.contains(&orphan) {
                continue;
            }
            let Some(parent) = closest_visited(graph, &layers[layer_index - 1], &visited, orphan)
            else {
                log::error!(
                    target: LOG_TARGET_GENERATOR,
                    "no visited parent available for node {orphan} on layer {layer_index}"
                );
                continue;
            };
            graph.add_edge(parent, orphan);
            repaired += 1;
            log::trace!(
                target: LOG_TARGET_GENERATOR,
                "repaired unreachable node {orphan} via {parent}"
            );
            expand_visited(graph, orphan, &mut visited);
        }
    }
    repaired
}

fn closest_visited(
    graph: &RouteGraph,
    candidates: &[NodeId],
    visited: &BTreeSet<NodeId>,
    orphan: NodeId,
) -> Option<NodeId> {
    let orphan_y = graph.node(orphan)?.position().y;
    candidates
        .iter()
        .filter(|id| visited.contains(id))
        .filter_map(|&id| graph.node(id).map(|node| (id, (node.position().y - orphan_y).abs())))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

fn expand_visited(graph: &RouteGraph, origin: NodeId, visited: &mut BTreeSet<NodeId>) {
    visited.insert(origin);
    let mut queue = VecDeque::from([origin]);
    while let Some(current) = queue.pop_front() {
        for &next in graph.successors(current) {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
}

/// Map an index in a layer of `from_len` nodes onto a layer of `to_len` nodes
/// by relative position.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn map_index(index: usize, from_len: usize, to_len: usize) -> usize {
    let relative = if from_len > 1 {
        index as f64 / (from_len - 1) as f64
    } else {
        LONE_NODE_RELATIVE_POSITION
    };
    let last = to_len.saturating_sub(1);
    ((relative * last as f64).round() as usize).min(last)
}

/// Contiguous window of next-layer indices a current-layer node may branch into.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn branch_window(index: usize, current_len: usize, next_len: usize) -> (usize, usize) {
    let segment = next_len as f64 / current_len as f64;
    let last = next_len.saturating_sub(1);
    let lo = ((index as f64 * segment).floor() as usize).min(last);
    let hi = (((index + 1) as f64 * segment).ceil() as usize)
        .saturating_sub(1)
        .min(last);
    if lo > hi { (hi, hi) } else { (lo, hi) }
}

#[allow(clippy::cast_precision_loss)]
fn layer_x(layer: u32, last_layer: u32) -> f32 {
    let t = layer as f32 / last_layer as f32;
    LAYOUT_LEFT_MARGIN + (LAYOUT_RIGHT_MARGIN - LAYOUT_LEFT_MARGIN) * t
}

#[allow(clippy::cast_precision_loss)]
fn layer_y(index: u32, count: u32) -> f32 {
    if count <= 1 {
        return LAYOUT_CENTER_Y;
    }
    let t = index as f32 / (count - 1) as f32;
    LAYOUT_TOP_MARGIN + (LAYOUT_BOTTOM_MARGIN - LAYOUT_TOP_MARGIN) * t
}

/// Node allocation in creation order; ids are dense and start at zero.
struct Layout {
    nodes: BTreeMap<NodeId, RouteNode>,
    layers: Vec<Vec<NodeId>>,
    next_id: u32,
}

impl Layout {
    fn with_capacity(layers: usize) -> Self {
        Self {
            nodes: BTreeMap::new(),
            layers: Vec::with_capacity(layers),
            next_id: 0,
        }
    }

    /// Push a layer of `count` nodes built by `build(id, index_in_layer)`.
    fn push_layer(
        &mut self,
        count: u32,
        mut build: impl FnMut(NodeId, u32) -> RouteNode,
    ) -> &[NodeId] {
        let mut ids = Vec::with_capacity(count as usize);
        for index in 0..count {
            let id = NodeId(self.next_id);
            self.next_id += 1;
            self.nodes.insert(id, build(id, index));
            ids.push(id);
        }
        self.layers.push(ids);
        self.layers.last().map_or(&[], Vec::as_slice)
    }

    fn finish(self, start: NodeId, end: NodeId) -> RouteGraph {
        RouteGraph::from_parts(self.nodes, self.layers, start, end)
    }
}
