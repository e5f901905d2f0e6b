//! Error type for the scenario lifecycle.

use circle_sim::SimError;

use crate::config::ConfigError;
use crate::scene::SceneError;

/// Errors that end a scenario run.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// A simulator call failed.
    #[error("simulator error: {0}")]
    Sim(#[from] SimError),

    /// Scene bookkeeping failed.
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),

    /// The configuration is unusable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A configured spawn point index does not exist on the map.
    #[error("spawn point index {index} out of range (map has {available})")]
    SpawnPointOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of spawn points on the map.
        available: usize,
    },

    /// No blueprint matches the actor filter.
    #[error("no blueprints match filter {filter:?}")]
    NoBlueprints {
        /// The filter that matched nothing.
        filter: String,
    },
}
