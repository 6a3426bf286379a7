use std::fmt;

use clap::ValueEnum;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use warpmap_core::{NodeId, RouteGraph};

const CENTRE_Y: f32 = 0.5;

/// Built-in route choices for automated walks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum WalkPolicy {
    /// Always take the first outgoing edge
    First,
    /// Pick uniformly among outgoing edges
    Random,
    /// Prefer the node closest to the vertical centre of the map
    Centre,
}

impl WalkPolicy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Random => "random",
            Self::Centre => "centre",
        }
    }

    #[must_use]
    pub fn walker(self, seed: u64) -> Walker {
        Walker {
            policy: self,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl fmt::Display for WalkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stateful chooser driven by a [`WalkPolicy`].
pub struct Walker {
    policy: WalkPolicy,
    rng: ChaCha8Rng,
}

impl Walker {
    /// Select the next node among `options`, or `None` when there are none.
    pub fn choose(&mut self, graph: &RouteGraph, options: &[NodeId]) -> Option<NodeId> {
        if options.is_empty() {
            return None;
        }
        match self.policy {
            WalkPolicy::First => options.first().copied(),
            WalkPolicy::Random => options.get(self.rng.gen_range(0..options.len())).copied(),
            WalkPolicy::Centre => options
                .iter()
                .filter_map(|&id| {
                    graph
                        .node(id)
                        .map(|node| (id, (node.position().y - CENTRE_Y).abs()))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(id, _)| id),
        }
    }
}
