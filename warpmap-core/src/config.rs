//! Map sizing and branching configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_EVENT_NODE_PROBABILITY, DEFAULT_FINAL_LAYER_STATION_SHARE,
    DEFAULT_HAZARD_LAYER_PROBABILITY, DEFAULT_LAYER_COUNT, DEFAULT_MAX_EXTRA_EDGES,
    DEFAULT_MAX_NODES_PER_LAYER, DEFAULT_MIN_NODES_PER_LAYER, DEFAULT_STATION_SHARE,
    MAX_EXTRA_EDGES_CAP, MAX_LAYER_COUNT,
};

/// Errors raised when map configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum MapConfigError {
    #[error("layer count must be between 1 and {max} (got {value})")]
    LayerCount { value: u32, max: u32 },
    #[error("{field} must be at least 1")]
    NodeBound { field: &'static str },
    #[error("minimum nodes per layer {min} exceeds maximum {max}")]
    NodeBoundsInverted { min: u32, max: u32 },
    #[error("{field} must be between 0.00 and 1.00 (got {value:.2})")]
    Probability { field: &'static str, value: f64 },
    #[error("max extra edges must be at most {max} (got {value})")]
    ExtraEdges { value: u32, max: u32 },
    #[error("edge layer node cap must be at least 1")]
    EdgeLayerCap,
    #[error("hazard layers must list one flag per layer: expected {expected}, got {found}")]
    HazardLayers { expected: u32, found: usize },
    #[error("failed to parse map config: {0}")]
    Parse(String),
}

/// Sizing rules and tunables for a single generated warp map.
///
/// Intermediate layers are numbered `1..=layer_count`; the start node sits at
/// layer 0 and the end node at `layer_count + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "MapConfig::default_layer_count")]
    pub layer_count: u32,
    #[serde(default = "MapConfig::default_min_nodes")]
    pub min_nodes_per_layer: u32,
    #[serde(default = "MapConfig::default_max_nodes")]
    pub max_nodes_per_layer: u32,
    /// Chance that an intermediate node is tagged as an event.
    #[serde(default = "MapConfig::default_event_probability")]
    pub event_node_probability: f64,
    /// Share of non-event nodes tagged as stations.
    #[serde(default = "MapConfig::default_station_share")]
    pub station_share: f64,
    /// Station share used in the final intermediate layer.
    #[serde(default = "MapConfig::default_final_layer_station_share")]
    pub final_layer_station_share: f64,
    /// Chance that an intermediate layer is flagged hazardous.
    #[serde(default = "MapConfig::default_hazard_probability")]
    pub hazard_layer_probability: f64,
    /// Caller-supplied hazard flags, one per intermediate layer. Overrides
    /// `hazard_layer_probability` when present.
    #[serde(default)]
    pub hazard_layers: Option<Vec<bool>>,
    /// Upper bound for random extra edges added per node.
    #[serde(default = "MapConfig::default_max_extra_edges")]
    pub max_extra_edges: u32,
    /// Optional cap on node count for the layers touching start and end.
    #[serde(default)]
    pub edge_layer_max_nodes: Option<u32>,
}

impl MapConfig {
    const fn default_layer_count() -> u32 {
        DEFAULT_LAYER_COUNT
    }

    const fn default_min_nodes() -> u32 {
        DEFAULT_MIN_NODES_PER_LAYER
    }

    const fn default_max_nodes() -> u32 {
        DEFAULT_MAX_NODES_PER_LAYER
    }

    const fn default_event_probability() -> f64 {
        DEFAULT_EVENT_NODE_PROBABILITY
    }

    const fn default_station_share() -> f64 {
        DEFAULT_STATION_SHARE
    }

    const fn default_final_layer_station_share() -> f64 {
        DEFAULT_FINAL_LAYER_STATION_SHARE
    }

    const fn default_hazard_probability() -> f64 {
        DEFAULT_HAZARD_LAYER_PROBABILITY
    }

    const fn default_max_extra_edges() -> u32 {
        DEFAULT_MAX_EXTRA_EDGES
    }

    /// Build a configuration from the four positional generator inputs,
    /// keeping every other tunable at its default.
    #[must_use]
    pub fn sized(
        layer_count: u32,
        min_nodes_per_layer: u32,
        max_nodes_per_layer: u32,
        event_node_probability: f64,
    ) -> Self {
        Self {
            layer_count,
            min_nodes_per_layer,
            max_nodes_per_layer,
            event_node_probability,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON, filling missing fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the result fails validation.
    pub fn from_json(json: &str) -> Result<Self, MapConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| MapConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check sizing bounds and probabilities.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), MapConfigError> {
        if self.layer_count == 0 || self.layer_count > MAX_LAYER_COUNT {
            return Err(MapConfigError::LayerCount {
                value: self.layer_count,
                max: MAX_LAYER_COUNT,
            });
        }
        for (field, value) in [
            ("min_nodes_per_layer", self.min_nodes_per_layer),
            ("max_nodes_per_layer", self.max_nodes_per_layer),
        ] {
            if value == 0 {
                return Err(MapConfigError::NodeBound { field });
            }
        }
        if self.min_nodes_per_layer > self.max_nodes_per_layer {
            return Err(MapConfigError::NodeBoundsInverted {
                min: self.min_nodes_per_layer,
                max: self.max_nodes_per_layer,
            });
        }
        for (field, value) in [
            ("event_node_probability", self.event_node_probability),
            ("station_share", self.station_share),
            ("final_layer_station_share", self.final_layer_station_share),
            ("hazard_layer_probability", self.hazard_layer_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MapConfigError::Probability { field, value });
            }
        }
        if self.max_extra_edges > MAX_EXTRA_EDGES_CAP {
            return Err(MapConfigError::ExtraEdges {
                value: self.max_extra_edges,
                max: MAX_EXTRA_EDGES_CAP,
            });
        }
        if self.edge_layer_max_nodes == Some(0) {
            return Err(MapConfigError::EdgeLayerCap);
        }
        if let Some(flags) = &self.hazard_layers
            && flags.len() != self.layer_count as usize
        {
            return Err(MapConfigError::HazardLayers {
                expected: self.layer_count,
                found: flags.len(),
            });
        }
        Ok(())
    }

    /// Number of layers including start and end.
    #[must_use]
    pub const fn total_layers(&self) -> u32 {
        self.layer_count + 2
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            layer_count: Self::default_layer_count(),
            min_nodes_per_layer: Self::default_min_nodes(),
            max_nodes_per_layer: Self::default_max_nodes(),
            event_node_probability: Self::default_event_probability(),
            station_share: Self::default_station_share(),
            final_layer_station_share: Self::default_final_layer_station_share(),
            hazard_layer_probability: Self::default_hazard_probability(),
            hazard_layers: None,
            max_extra_edges: Self::default_max_extra_edges(),
            edge_layer_max_nodes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        MapConfig::default().validate().expect("defaults are valid");
    }

    #[test]
    fn missing_fields_use_defaults() {
        let cfg = MapConfig::from_json("{}").expect("deserialize");
        assert_eq!(cfg, MapConfig::default());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let cfg = MapConfig::from_json(r#"{"layer_count": 3, "max_nodes_per_layer": 2}"#)
            .expect("deserialize");
        assert_eq!(cfg.layer_count, 3);
        assert_eq!(cfg.max_nodes_per_layer, 2);
        assert_eq!(cfg.min_nodes_per_layer, DEFAULT_MIN_NODES_PER_LAYER);
        assert_eq!(cfg.total_layers(), 5);
    }

    #[test]
    fn rejects_zero_layers() {
        let cfg = MapConfig::sized(0, 1, 2, 0.1);
        assert!(matches!(
            cfg.validate(),
            Err(MapConfigError::LayerCount { value: 0, .. })
        ));
    }

    #[test]
    fn rejects_empty_layers() {
        let cfg = MapConfig::sized(3, 0, 2, 0.1);
        assert!(matches!(
            cfg.validate(),
            Err(MapConfigError::NodeBound { field, .. }) if field == "min_nodes_per_layer"
        ));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let cfg = MapConfig::sized(3, 4, 2, 0.1);
        assert_eq!(
            cfg.validate(),
            Err(MapConfigError::NodeBoundsInverted { min: 4, max: 2 })
        );
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let cfg = MapConfig::sized(3, 1, 2, 1.5);
        assert!(matches!(
            cfg.validate(),
            Err(MapConfigError::Probability { field, .. }) if field == "event_node_probability"
        ));
        let cfg = MapConfig {
            hazard_layer_probability: -0.1,
            ..MapConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(MapConfigError::Probability { field, .. }) if field == "hazard_layer_probability"
        ));
    }

    #[test]
    fn rejects_zero_edge_layer_cap_and_excess_extra_edges() {
        let cfg = MapConfig {
            edge_layer_max_nodes: Some(0),
            ..MapConfig::default()
        };
        assert_eq!(cfg.validate(), Err(MapConfigError::EdgeLayerCap));
        let cfg = MapConfig {
            max_extra_edges: MAX_EXTRA_EDGES_CAP + 1,
            ..MapConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(MapConfigError::ExtraEdges { .. })
        ));
    }

    #[test]
    fn large_maps_within_u32_range_are_valid() {
        MapConfig::sized(65, 1, 2, 0.1).validate().expect("65 layers");
        MapConfig::sized(3, 1, 33, 0.1).validate().expect("33 nodes per layer");
        let cfg = MapConfig::sized(u32::MAX, 1, 2, 0.1);
        assert_eq!(
            cfg.validate(),
            Err(MapConfigError::LayerCount {
                value: u32::MAX,
                max: MAX_LAYER_COUNT
            })
        );
        assert_eq!(MapConfig::sized(MAX_LAYER_COUNT, 1, 1, 0.0).total_layers(), u32::MAX);
    }

    #[test]
    fn hazard_layers_must_cover_every_layer() {
        let cfg = MapConfig {
            hazard_layers: Some(vec![true, false, true]),
            ..MapConfig::sized(3, 1, 2, 0.1)
        };
        cfg.validate().expect("one flag per layer");
        let cfg = MapConfig {
            hazard_layers: Some(vec![true]),
            ..MapConfig::sized(3, 1, 2, 0.1)
        };
        assert_eq!(
            cfg.validate(),
            Err(MapConfigError::HazardLayers {
                expected: 3,
                found: 1
            })
        );
        let parsed = MapConfig::from_json(r#"{"layer_count": 2, "hazard_layers": [false, true]}"#)
            .expect("deserialize");
        assert_eq!(parsed.hazard_layers, Some(vec![false, true]));
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        assert!(matches!(
            MapConfig::from_json("{ layer_count: }"),
            Err(MapConfigError::Parse(_))
        ));
    }
}
