//! Error types for the `circle-sim` crate.
//!
//! A spawn that fails because the pose is occupied is not an error; it is
//! reported as `Ok(None)` by [`ActorWorld::try_spawn_actor`]. Everything
//! here is a failure of the simulator connection or a misuse of its API.
//!
//! [`ActorWorld::try_spawn_actor`]: crate::api::ActorWorld::try_spawn_actor

use circle_types::ActorId;

use crate::client::Endpoint;

/// Errors that can occur while talking to a simulator.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Nothing is serving the requested endpoint.
    #[error("connection refused: no simulator serving {endpoint}")]
    ConnectionRefused {
        /// The endpoint that was dialed.
        endpoint: Endpoint,
    },

    /// An endpoint is already being served.
    #[error("endpoint {endpoint} is already in use")]
    EndpointInUse {
        /// The contested endpoint.
        endpoint: Endpoint,
    },

    /// The simulator did not answer within the client timeout.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        /// The call that timed out.
        operation: &'static str,
        /// The client timeout in milliseconds.
        timeout_ms: u128,
    },

    /// The simulator went away mid-call.
    #[error("simulator disconnected during {operation}")]
    Disconnected {
        /// The call that was in flight.
        operation: &'static str,
    },

    /// The referenced actor does not exist.
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    /// The blueprint is not part of the simulator's library.
    #[error("unknown blueprint: {0}")]
    UnknownBlueprint(String),

    /// The simulator ran out of actor identifiers.
    #[error("actor id space exhausted")]
    ActorIdsExhausted,

    /// A client or simulator setting is unusable.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong.
        reason: String,
    },
}
