//! Warp Map Engine
//!
//! Platform-agnostic generation of layered warp route maps and tracking of a
//! player's legal moves across them. This crate carries no UI or storage
//! backend; hosts plug persistence in through [`MapStorage`].

pub mod config;
mod constants;
pub mod generator;
pub mod graph;
pub mod node;
pub mod reachability;
pub mod rng;
pub mod seed;
pub mod session;
pub mod snapshot;

// Re-export commonly used types
pub use config::{MapConfig, MapConfigError};
pub use generator::{RouteGraphGenerator, generate_graph};
pub use graph::{InvariantViolation, RouteGraph};
pub use node::{EdgeList, NodeCategory, NodeId, NodeRole, Position, RouteNode};
pub use reachability::{MoveError, MoveOutcome, NodeAvailability, ReachabilityService};
pub use rng::{CountingRng, derive_stream_seed, sector_seed};
pub use seed::{
    decode_sector_code, encode_sector_code, generate_code_from_entropy, sector_code_for_seed,
};
pub use session::WarpSession;
pub use snapshot::{GraphSnapshot, NodeRecord, SessionSnapshot, SnapshotError};

use anyhow::Context;

/// Trait for abstracting save/load operations.
/// Platform-specific implementations should provide this
pub trait MapStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a session snapshot under `slot`
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    fn save_session(&self, slot: &str, snapshot: &SessionSnapshot) -> Result<(), Self::Error>;

    /// Load the snapshot stored under `slot`, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    fn load_session(&self, slot: &str) -> Result<Option<SessionSnapshot>, Self::Error>;

    /// Delete a saved session
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_session(&self, slot: &str) -> Result<(), Self::Error>;
}

/// Entry point for hosts: opens sessions and persists them through storage.
pub struct WarpMapEngine<S>
where
    S: MapStorage,
{
    config: MapConfig,
    storage: S,
}

impl<S> WarpMapEngine<S>
where
    S: MapStorage,
{
    /// Create an engine that opens every session with `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: MapConfig, storage: S) -> Result<Self, MapConfigError> {
        config.validate()?;
        Ok(Self { config, storage })
    }

    #[must_use]
    pub const fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Start a new session for `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is rejected by the generator.
    pub fn open_session(&self, seed: u64) -> Result<WarpSession, MapConfigError> {
        WarpSession::new(self.config.clone(), seed)
    }

    /// Start a new session from a shared sector code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code cannot be parsed.
    pub fn open_session_from_code(&self, code: &str) -> anyhow::Result<WarpSession> {
        let seed = decode_sector_code(code)
            .with_context(|| format!("invalid sector code {code:?}"))?;
        Ok(self.open_session(seed)?)
    }

    /// Save a session
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub fn save_session(&self, slot: &str, session: &WarpSession) -> Result<(), S::Error> {
        self.storage.save_session(slot, &session.to_snapshot())
    }

    /// Load and validate a saved session
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded or fails validation.
    pub fn load_session(&self, slot: &str) -> anyhow::Result<Option<WarpSession>> {
        let Some(snapshot) = self.storage.load_session(slot)? else {
            return Ok(None);
        };
        let session = WarpSession::from_snapshot(&snapshot)
            .with_context(|| format!("saved session {slot:?} is corrupt"))?;
        Ok(Some(session))
    }

    /// Delete a saved session
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_session(&self, slot: &str) -> Result<(), S::Error> {
        self.storage.delete_session(slot)
    }
}
