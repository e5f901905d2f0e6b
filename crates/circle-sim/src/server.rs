//! Serving local worlds on endpoints.
//!
//! A [`SimulatorHub`] maps `host:port` endpoints to running simulators.
//! Each served [`LocalWorld`] lives on its own task, which interleaves
//! fixed simulation steps with requests arriving over a channel. Requests
//! are answered in arrival order, between steps.

use std::collections::BTreeMap;

use circle_types::{ActorBlueprint, ActorId, ActorSnapshot, Transform};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::blueprint::BlueprintLibrary;
use crate::client::Endpoint;
use crate::error::SimError;
use crate::map::TownMap;
use crate::world::LocalWorld;

/// Version string reported to connecting clients.
pub const SERVER_VERSION: &str = concat!("circle-sim ", env!("CARGO_PKG_VERSION"));

/// Request queue depth per served world.
const REQUEST_QUEUE_DEPTH: usize = 64;

/// A call from a client to a served world.
#[derive(Debug)]
pub(crate) enum Request {
    Version {
        reply: oneshot::Sender<String>,
    },
    Map {
        reply: oneshot::Sender<TownMap>,
    },
    Blueprints {
        reply: oneshot::Sender<BlueprintLibrary>,
    },
    TrySpawn {
        blueprint: ActorBlueprint,
        transform: Transform,
        reply: oneshot::Sender<Result<Option<ActorSnapshot>, SimError>>,
    },
    Actors {
        filter: String,
        reply: oneshot::Sender<Vec<ActorSnapshot>>,
    },
    Actor {
        id: ActorId,
        reply: oneshot::Sender<Option<ActorSnapshot>>,
    },
    Destroy {
        id: ActorId,
        reply: oneshot::Sender<bool>,
    },
    SetAutopilot {
        id: ActorId,
        enabled: bool,
        reply: oneshot::Sender<Result<(), SimError>>,
    },
    SetTransform {
        id: ActorId,
        transform: Transform,
        reply: oneshot::Sender<Result<(), SimError>>,
    },
}

/// Registry of served simulators, keyed by endpoint.
#[derive(Debug, Default)]
pub struct SimulatorHub {
    endpoints: Mutex<BTreeMap<Endpoint, mpsc::Sender<Request>>>,
}

impl SimulatorHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `world` on `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EndpointInUse`] if the endpoint is already
    /// served, or [`SimError::InvalidConfig`] if the world's tunables are
    /// unusable.
    pub async fn serve(
        &self,
        endpoint: Endpoint,
        world: LocalWorld,
    ) -> Result<SimulatorHandle, SimError> {
        world.config().validate()?;

        let mut endpoints = self.endpoints.lock().await;
        if endpoints.get(&endpoint).is_some_and(|sender| !sender.is_closed()) {
            return Err(SimError::EndpointInUse { endpoint });
        }

        let (sender, receiver) = mpsc::channel(REQUEST_QUEUE_DEPTH);
        endpoints.insert(endpoint.clone(), sender);
        drop(endpoints);

        info!(
            %endpoint,
            map = world.map().name,
            step_ms = world.config().step_ms,
            seed = world.config().seed,
            "simulator serving"
        );
        let task = tokio::spawn(run_world(world, receiver, endpoint.clone()));
        Ok(SimulatorHandle { endpoint, task })
    }

    /// Stop accepting new connections on `endpoint`.
    ///
    /// Connected clients keep working until they drop their handles.
    /// Returns whether the endpoint was served.
    pub async fn close(&self, endpoint: &Endpoint) -> bool {
        self.endpoints.lock().await.remove(endpoint).is_some()
    }

    /// Open a request channel to the world on `endpoint`.
    pub(crate) async fn dial(&self, endpoint: &Endpoint) -> Option<mpsc::Sender<Request>> {
        self.endpoints
            .lock()
            .await
            .get(endpoint)
            .filter(|sender| !sender.is_closed())
            .cloned()
    }
}

/// A running simulator task.
#[derive(Debug)]
pub struct SimulatorHandle {
    endpoint: Endpoint,
    task: JoinHandle<()>,
}

impl SimulatorHandle {
    /// The endpoint this simulator is served on.
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Kill the simulator. In-flight and later calls fail with
    /// [`SimError::Disconnected`].
    pub fn stop(self) {
        self.task.abort();
    }
}

/// Step the world on a fixed interval and answer requests in between.
async fn run_world(mut world: LocalWorld, mut requests: mpsc::Receiver<Request>, endpoint: Endpoint) {
    let step = world.config().step();
    let mut ticker = tokio::time::interval(step);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => world.step(step),
            request = requests.recv() => match request {
                Some(request) => handle(&mut world, request),
                None => break,
            },
        }
    }

    info!(
        %endpoint,
        elapsed_secs = world.elapsed().as_secs_f64(),
        actors = world.actor_count(),
        "simulator stopped"
    );
}

/// Answer one request. A client that gave up waiting is ignored.
fn handle(world: &mut LocalWorld, request: Request) {
    match request {
        Request::Version { reply } => {
            let _ = reply.send(SERVER_VERSION.to_owned());
        }
        Request::Map { reply } => {
            let _ = reply.send(world.map().clone());
        }
        Request::Blueprints { reply } => {
            let _ = reply.send(world.blueprint_library().clone());
        }
        Request::TrySpawn {
            blueprint,
            transform,
            reply,
        } => {
            let result = world.try_spawn_actor(&blueprint, &transform);
            if let Ok(Some(ref actor)) = result {
                debug!(actor_id = %actor.id, type_id = actor.type_id, "actor spawned");
            }
            let _ = reply.send(result);
        }
        Request::Actors { filter, reply } => {
            let _ = reply.send(world.actors(&filter));
        }
        Request::Actor { id, reply } => {
            let _ = reply.send(world.actor(id).cloned());
        }
        Request::Destroy { id, reply } => {
            let existed = world.destroy_actor(id);
            debug!(actor_id = %id, existed, "actor destroyed");
            let _ = reply.send(existed);
        }
        Request::SetAutopilot { id, enabled, reply } => {
            let _ = reply.send(world.set_autopilot(id, enabled));
        }
        Request::SetTransform {
            id,
            transform,
            reply,
        } => {
            let _ = reply.send(world.set_transform(id, transform));
        }
    }
}
