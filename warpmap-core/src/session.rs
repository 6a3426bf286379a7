//! Player sessions spanning successive sectors of one seed.
//!
//! Each sector's map is generated from its own seed stream, so any sector can
//! be rebuilt from the user seed and sector index alone.
use std::sync::Arc;

use crate::config::{MapConfig, MapConfigError};
use crate::constants::{LOG_TARGET_SESSION, SNAPSHOT_VERSION};
use crate::generator::RouteGraphGenerator;
use crate::graph::RouteGraph;
use crate::node::NodeId;
use crate::reachability::{MoveError, MoveOutcome, ReachabilityService};
use crate::rng::CountingRng;
use crate::seed::sector_code_for_seed;
use crate::snapshot::{GraphSnapshot, SessionSnapshot, SnapshotError};

/// High-level session wrapper binding a generator configuration to the
/// player's progress through successive sectors.
#[derive(Debug, Clone)]
pub struct WarpSession {
    generator: RouteGraphGenerator,
    user_seed: u64,
    sector: u32,
    reachability: ReachabilityService,
}

impl WarpSession {
    /// Start a session on sector 0 of `user_seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: MapConfig, user_seed: u64) -> Result<Self, MapConfigError> {
        let generator = RouteGraphGenerator::new(config)?;
        let graph = Self::build_map(&generator, user_seed, 0);
        Ok(Self {
            generator,
            user_seed,
            sector: 0,
            reachability: ReachabilityService::new(graph),
        })
    }

    fn build_map(generator: &RouteGraphGenerator, user_seed: u64, sector: u32) -> Arc<RouteGraph> {
        let mut rng = CountingRng::for_sector(user_seed, sector);
        let graph = generator.generate(&mut rng);
        log::debug!(
            target: LOG_TARGET_SESSION,
            "sector {sector} of seed {user_seed:#x} built with {} draws",
            rng.draws()
        );
        Arc::new(graph)
    }

    /// Move the player along one edge of the current map.
    ///
    /// # Errors
    ///
    /// Propagates [`MoveError`] from the reachability service; the session is
    /// unchanged on error.
    pub fn advance_to(&mut self, target: NodeId) -> Result<MoveOutcome, MoveError> {
        let outcome = self.reachability.advance_to(target)?;
        if outcome.is_arrival() {
            log::info!(
                target: LOG_TARGET_SESSION,
                "arrived at end of sector {} after {} jumps",
                self.sector,
                self.reachability.path().len() - 1
            );
        }
        Ok(outcome)
    }

    /// Discard the current map and generate the next sector's map.
    /// Returns the new sector index.
    pub fn open_next_sector(&mut self) -> u32 {
        if !self.reachability.is_complete() {
            log::warn!(
                target: LOG_TARGET_SESSION,
                "leaving sector {} before reaching its end",
                self.sector
            );
        }
        self.sector = self.sector.saturating_add(1);
        let graph = Self::build_map(&self.generator, self.user_seed, self.sector);
        self.reachability = ReachabilityService::new(graph);
        self.sector
    }

    /// Deterministically restart the session on sector 0 of a new seed.
    pub fn reseed(&mut self, user_seed: u64) {
        self.user_seed = user_seed;
        self.sector = 0;
        let graph = Self::build_map(&self.generator, user_seed, 0);
        self.reachability = ReachabilityService::new(graph);
    }

    #[must_use]
    pub const fn reachability(&self) -> &ReachabilityService {
        &self.reachability
    }

    #[must_use]
    pub fn graph(&self) -> &RouteGraph {
        self.reachability.graph()
    }

    #[must_use]
    pub const fn config(&self) -> &MapConfig {
        self.generator.config()
    }

    #[must_use]
    pub const fn user_seed(&self) -> u64 {
        self.user_seed
    }

    #[must_use]
    pub const fn sector(&self) -> u32 {
        self.sector
    }

    /// Shareable code for the session seed, if it has one.
    ///
    /// Only seeds that came from a sector code have one; a code is never
    /// returned unless decoding it yields this session's seed again.
    #[must_use]
    pub fn sector_code(&self) -> Option<String> {
        sector_code_for_seed(self.user_seed)
    }

    #[must_use]
    pub fn to_snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            user_seed: self.user_seed,
            sector: self.sector,
            config: self.config().clone(),
            graph: GraphSnapshot::capture(self.graph()),
            path: self.reachability.path().to_vec(),
        }
    }

    /// Rebuild a session from a snapshot, replaying its recorded path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config, graph, or path in the snapshot is invalid.
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        let generator = RouteGraphGenerator::new(snapshot.config.clone())?;
        let graph = Arc::new(snapshot.graph.restore()?);
        let reachability = ReachabilityService::with_path(graph, &snapshot.path)?;
        Ok(Self {
            generator,
            user_seed: snapshot.user_seed,
            sector: snapshot.sector,
            reachability,
        })
    }
}
