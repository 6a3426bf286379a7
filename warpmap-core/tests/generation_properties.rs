use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;
use warpmap_core::{
    MapConfig, NodeCategory, NodeRole, RouteGraph, RouteGraphGenerator, generate_graph,
};

const SEEDS_PER_SHAPE: u64 = 24;

fn sweep_shapes() -> Vec<MapConfig> {
    let mut shapes = Vec::new();
    for layer_count in [1, 2, 3, 6, 12] {
        for (min, max) in [(1, 1), (1, 4), (2, 2), (3, 6), (5, 8)] {
            shapes.push(MapConfig::sized(layer_count, min, max, 0.25));
        }
    }
    shapes.push(MapConfig {
        max_extra_edges: 0,
        ..MapConfig::sized(8, 1, 6, 0.1)
    });
    shapes.push(MapConfig {
        edge_layer_max_nodes: Some(3),
        hazard_layer_probability: 0.5,
        ..MapConfig::sized(7, 2, 8, 0.3)
    });
    shapes
}

fn assert_structure(graph: &RouteGraph, config: &MapConfig) {
    graph.check_invariants().expect("generated graph satisfies invariants");

    let reached = graph.reachable_from(graph.start());
    assert_eq!(reached.len(), graph.node_count(), "every node reachable");

    assert_eq!(graph.layer_count(), config.total_layers() as usize);
    for node in graph.nodes() {
        for &target in node.outgoing() {
            let target_layer = graph.node(target).expect("edge target exists").layer();
            assert_eq!(target_layer, node.layer() + 1, "edges only advance one layer");
        }
        match node.role() {
            NodeRole::End => assert_eq!(node.out_degree(), 0),
            _ => assert!(node.out_degree() >= 1),
        }
        if node.role() != NodeRole::Start {
            assert!(graph.in_degree(node.id()) >= 1);
        }
        let unique: BTreeSet<_> = node.outgoing().iter().collect();
        assert_eq!(unique.len(), node.out_degree(), "no duplicate edges");
    }

    for layer in 1..=config.layer_count as usize {
        let size = graph.layer(layer).expect("intermediate layer").len() as u32;
        assert!(size >= 1);
        assert!(size <= config.max_nodes_per_layer);
    }
}

#[test]
fn seed_sweep_keeps_every_node_reachable() {
    for config in sweep_shapes() {
        for seed in 0..SEEDS_PER_SHAPE {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let graph = generate_graph(&config, &mut rng).expect("valid config");
            assert_structure(&graph, &config);
        }
    }
}

#[test]
fn node_ids_follow_creation_order() {
    let mut rng = SmallRng::seed_from_u64(3);
    let graph = generate_graph(&MapConfig::sized(5, 1, 5, 0.2), &mut rng).unwrap();
    let mut expected = 0;
    for layer in graph.layers() {
        for id in layer {
            assert_eq!(id.get(), expected);
            expected += 1;
        }
    }
    assert_eq!(graph.start().get(), 0);
    assert_eq!(graph.end().get() as usize, graph.node_count() - 1);
}

#[test]
fn identical_seeds_give_identical_graphs() {
    let config = MapConfig::sized(6, 1, 4, 0.2);
    for seed in [0_u64, 1, 42, 0xDEAD_BEEF] {
        let a = generate_graph(&config, &mut SmallRng::seed_from_u64(seed)).unwrap();
        let b = generate_graph(&config, &mut SmallRng::seed_from_u64(seed)).unwrap();
        assert_eq!(a, b);
        for (left, right) in a.nodes().zip(b.nodes()) {
            assert_eq!(left.position(), right.position());
            assert_eq!(left.outgoing(), right.outgoing());
        }
    }
}

#[test]
fn default_config_mixes_categories() {
    let config = MapConfig {
        layer_count: 10,
        min_nodes_per_layer: 3,
        max_nodes_per_layer: 5,
        ..MapConfig::default()
    };
    let mut seen = BTreeSet::new();
    for seed in 0..8 {
        let graph = generate_graph(&config, &mut SmallRng::seed_from_u64(seed)).unwrap();
        seen.extend(graph.nodes().filter_map(|node| node.category()));
    }
    assert_eq!(
        seen,
        BTreeSet::from([NodeCategory::Combat, NodeCategory::Station, NodeCategory::Event])
    );
}

#[test]
fn positional_constructor_matches_config_path() {
    let via_config =
        generate_graph(&MapConfig::sized(4, 2, 3, 0.1), &mut SmallRng::seed_from_u64(8)).unwrap();
    let via_args =
        RouteGraphGenerator::generate_with(4, 2, 3, 0.1, &mut SmallRng::seed_from_u64(8)).unwrap();
    assert_eq!(via_config, via_args);
}
