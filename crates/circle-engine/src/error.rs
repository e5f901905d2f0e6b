//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the run so
//! `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: circle_core::config::ConfigError,
    },

    /// Serving or connecting to the simulator failed.
    #[error("simulator error: {source}")]
    Sim {
        /// The underlying simulator error.
        #[from]
        source: circle_sim::SimError,
    },

    /// The scenario run failed.
    #[error("scenario error: {source}")]
    Scenario {
        /// The underlying scenario error.
        #[from]
        source: circle_core::error::ScenarioError,
    },

    /// Writing the spawn point listing failed.
    #[error("output error: {message}")]
    Output {
        /// Description of the output failure.
        message: String,
    },
}
