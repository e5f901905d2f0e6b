//! Connection factory and world handle.
//!
//! [`Client::connect`] dials an endpoint on a [`SimulatorHub`] and checks
//! the simulator answers. [`Client::world`] hands out a [`World`], the
//! cloneable handle the scenario logic drives. Every call made through a
//! [`World`] is bounded by the client timeout.

use std::time::Duration;

use circle_types::{ActorBlueprint, ActorId, ActorSnapshot, Transform};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use crate::api::ActorWorld;
use crate::blueprint::BlueprintLibrary;
use crate::error::SimError;
use crate::map::TownMap;
use crate::server::{Request, SimulatorHub};

/// A `host:port` pair a simulator is served on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Host name or address.
    pub host: String,
    /// Port.
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_owned(),
            port,
        }
    }
}

impl core::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A connection to a simulator.
#[derive(Debug, Clone)]
pub struct Client {
    endpoint: Endpoint,
    timeout: Duration,
    sender: mpsc::Sender<Request>,
}

impl Client {
    /// Connect to the simulator served on `host:port`.
    ///
    /// The connection is verified with a version handshake bounded by
    /// `timeout`, which also bounds every later call.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ConnectionRefused`] if nothing serves the
    /// endpoint, [`SimError::InvalidConfig`] for a zero timeout, and
    /// [`SimError::Timeout`] if the handshake is not answered in time.
    pub async fn connect(
        hub: &SimulatorHub,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<Self, SimError> {
        if timeout.is_zero() {
            return Err(SimError::InvalidConfig {
                reason: "client timeout must be positive".to_owned(),
            });
        }

        let endpoint = Endpoint::new(host, port);
        let Some(sender) = hub.dial(&endpoint).await else {
            return Err(SimError::ConnectionRefused { endpoint });
        };

        let client = Self {
            endpoint,
            timeout,
            sender,
        };
        let version = client.world().server_version().await?;
        info!(
            endpoint = %client.endpoint,
            timeout_ms = client.timeout.as_millis(),
            server_version = version,
            "connected to simulator"
        );
        Ok(client)
    }

    /// The endpoint this client is connected to.
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Per-call timeout.
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// A handle to the simulator's world.
    pub fn world(&self) -> World {
        World {
            sender: self.sender.clone(),
            timeout: self.timeout,
        }
    }
}

/// A handle to a served world.
#[derive(Debug, Clone)]
pub struct World {
    sender: mpsc::Sender<Request>,
    timeout: Duration,
}

impl World {
    /// Send a request built around a fresh reply channel and wait for the
    /// answer, bounded by the client timeout.
    async fn call<T>(
        &self,
        operation: &'static str,
        request: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T, SimError> {
        let (reply, answer) = oneshot::channel();
        let exchange = async {
            self.sender
                .send(request(reply))
                .await
                .map_err(|_err| SimError::Disconnected { operation })?;
            answer
                .await
                .map_err(|_err| SimError::Disconnected { operation })
        };
        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_elapsed| SimError::Timeout {
                operation,
                timeout_ms: self.timeout.as_millis(),
            })?
    }

    /// The simulator's version string.
    pub async fn server_version(&self) -> Result<String, SimError> {
        self.call("server_version", |reply| Request::Version { reply })
            .await
    }

    /// One live actor, if it exists.
    pub async fn actor(&self, id: ActorId) -> Result<Option<ActorSnapshot>, SimError> {
        self.call("actor", |reply| Request::Actor { id, reply }).await
    }

    /// Teleport an actor.
    pub async fn set_transform(&self, id: ActorId, transform: Transform) -> Result<(), SimError> {
        self.call("set_transform", |reply| Request::SetTransform {
            id,
            transform,
            reply,
        })
        .await?
    }
}

impl ActorWorld for World {
    async fn map(&self) -> Result<TownMap, SimError> {
        self.call("map", |reply| Request::Map { reply }).await
    }

    async fn blueprint_library(&self) -> Result<BlueprintLibrary, SimError> {
        self.call("blueprint_library", |reply| Request::Blueprints { reply })
            .await
    }

    async fn try_spawn_actor(
        &self,
        blueprint: &ActorBlueprint,
        transform: &Transform,
    ) -> Result<Option<ActorSnapshot>, SimError> {
        let blueprint = blueprint.clone();
        let transform = *transform;
        self.call("try_spawn_actor", |reply| Request::TrySpawn {
            blueprint,
            transform,
            reply,
        })
        .await?
    }

    async fn actors(&self, filter: &str) -> Result<Vec<ActorSnapshot>, SimError> {
        let filter = filter.to_owned();
        self.call("actors", |reply| Request::Actors { filter, reply })
            .await
    }

    async fn destroy_actor(&self, id: ActorId) -> Result<bool, SimError> {
        self.call("destroy_actor", |reply| Request::Destroy { id, reply })
            .await
    }

    async fn set_autopilot(&self, id: ActorId, enabled: bool) -> Result<(), SimError> {
        self.call("set_autopilot", |reply| Request::SetAutopilot {
            id,
            enabled,
            reply,
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_display() {
        assert_eq!(Endpoint::new("127.0.0.1", 2000).to_string(), "127.0.0.1:2000");
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_call_times_out() {
        // The receiver is kept alive but never read.
        let (sender, _requests) = mpsc::channel(1);
        let world = World {
            sender,
            timeout: Duration::from_millis(250),
        };

        let result = world.server_version().await;
        assert!(matches!(
            result,
            Err(SimError::Timeout {
                operation: "server_version",
                timeout_ms: 250
            })
        ));
    }

    #[tokio::test]
    async fn closed_channel_is_disconnected() {
        let (sender, requests) = mpsc::channel(1);
        drop(requests);
        let world = World {
            sender,
            timeout: Duration::from_secs(1),
        };

        let result = world.actors("*").await;
        assert!(matches!(
            result,
            Err(SimError::Disconnected { operation: "actors" })
        ));
    }

    #[tokio::test]
    async fn zero_timeout_is_rejected() {
        let hub = SimulatorHub::new();
        let result = Client::connect(&hub, "127.0.0.1", 2000, Duration::ZERO).await;
        assert!(matches!(result, Err(SimError::InvalidConfig { .. })));
    }
}
