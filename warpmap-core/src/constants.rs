//! Centralized layout and tuning constants for warp map generation.
//!
//! These values define the deterministic geometry and default balance of
//! every generated route graph.

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_TARGET_GENERATOR: &str = "warpmap::generator";
pub(crate) const LOG_TARGET_REACHABILITY: &str = "warpmap::reachability";
pub(crate) const LOG_TARGET_SESSION: &str = "warpmap::session";

// Normalized layout --------------------------------------------------------
pub(crate) const LAYOUT_LEFT_MARGIN: f32 = 0.05;
pub(crate) const LAYOUT_RIGHT_MARGIN: f32 = 0.95;
pub(crate) const LAYOUT_TOP_MARGIN: f32 = 0.1;
pub(crate) const LAYOUT_BOTTOM_MARGIN: f32 = 0.9;
pub(crate) const LAYOUT_CENTER_Y: f32 = 0.5;
/// Relative position given to the only node of a single-node layer.
pub(crate) const LONE_NODE_RELATIVE_POSITION: f64 = 0.5;

// Sizing defaults ----------------------------------------------------------
pub(crate) const DEFAULT_LAYER_COUNT: u32 = 6;
pub(crate) const DEFAULT_MIN_NODES_PER_LAYER: u32 = 1;
pub(crate) const DEFAULT_MAX_NODES_PER_LAYER: u32 = 4;
/// Largest layer count whose start and end layers still fit a `u32` index.
pub(crate) const MAX_LAYER_COUNT: u32 = u32::MAX - 2;

// Branching defaults -------------------------------------------------------
pub(crate) const DEFAULT_MAX_EXTRA_EDGES: u32 = 3;
pub(crate) const MAX_EXTRA_EDGES_CAP: u32 = 8;

// Category and hazard defaults ---------------------------------------------
pub(crate) const DEFAULT_EVENT_NODE_PROBABILITY: f64 = 0.2;
pub(crate) const DEFAULT_STATION_SHARE: f64 = 0.4;
pub(crate) const DEFAULT_FINAL_LAYER_STATION_SHARE: f64 = 0.8;
pub(crate) const DEFAULT_HAZARD_LAYER_PROBABILITY: f64 = 0.0;

// Seed derivation ----------------------------------------------------------
pub(crate) const SECTOR_STREAM_TAG: &[u8] = b"warpmap-sector";
pub(crate) const SNAPSHOT_VERSION: u32 = 1;
