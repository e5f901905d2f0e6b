//! The simulator operations the scenario logic depends on.
//!
//! [`ActorWorld`] is deliberately small: the lifecycle loop only needs to
//! read the map and blueprints, spawn, list, destroy, and hand vehicles to
//! the autopilot. [`World`](crate::client::World) implements it against a
//! served simulator; tests implement it in memory.

use circle_types::{ActorBlueprint, ActorId, ActorSnapshot, Transform};

use crate::blueprint::BlueprintLibrary;
use crate::error::SimError;
use crate::map::TownMap;

/// A handle to a simulation world.
#[allow(async_fn_in_trait)]
pub trait ActorWorld {
    /// The map, including its spawn points.
    async fn map(&self) -> Result<TownMap, SimError>;

    /// Every blueprint the world can spawn.
    async fn blueprint_library(&self) -> Result<BlueprintLibrary, SimError>;

    /// Try to spawn an actor at `transform`.
    ///
    /// Returns `Ok(None)` if the pose is occupied.
    async fn try_spawn_actor(
        &self,
        blueprint: &ActorBlueprint,
        transform: &Transform,
    ) -> Result<Option<ActorSnapshot>, SimError>;

    /// Live actors whose type id matches the wildcard `filter`.
    async fn actors(&self, filter: &str) -> Result<Vec<ActorSnapshot>, SimError>;

    /// Destroy an actor. Returns whether it was alive.
    async fn destroy_actor(&self, id: ActorId) -> Result<bool, SimError>;

    /// Enable or disable the autopilot for an actor.
    async fn set_autopilot(&self, id: ActorId, enabled: bool) -> Result<(), SimError>;
}
