//! The tracked set of actors spawned by one scenario run.
//!
//! [`Scene`] is the single source of truth for the population count. The
//! simulator's live list is authoritative about which actors exist, so the
//! scene is reconciled against it: actors that vanished from the simulator
//! (destroyed by someone else, or by a simulator reset) are dropped.

use std::collections::{BTreeMap, BTreeSet};

use circle_sim::{ActorWorld, SimError};
use circle_types::{ActorId, ActorSnapshot};
use tracing::{debug, warn};

/// Errors raised by scene bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The actor is not tracked by this scene.
    #[error("actor {0} is not in the scene")]
    ActorNotInScene(ActorId),

    /// The simulator call behind a scene operation failed.
    #[error("simulator error: {source}")]
    Sim {
        /// The underlying simulator error.
        #[from]
        source: SimError,
    },
}

/// What the scene remembers about a tracked actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedActor {
    /// Simulator id.
    pub id: ActorId,
    /// Blueprint type id.
    pub type_id: String,
    /// Spawn point index the actor was created at, if known.
    pub spawn_index: Option<usize>,
}

impl TrackedActor {
    /// Track a freshly spawned actor.
    pub fn from_snapshot(snapshot: &ActorSnapshot, spawn_index: Option<usize>) -> Self {
        Self {
            id: snapshot.id,
            type_id: snapshot.type_id.clone(),
            spawn_index,
        }
    }
}

/// A named scene on a map with its tracked actors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    name: String,
    map: String,
    actors: BTreeMap<ActorId, TrackedActor>,
}

impl Scene {
    /// An empty scene.
    pub fn new(name: &str, map: &str) -> Self {
        Self {
            name: name.to_owned(),
            map: map.to_owned(),
            actors: BTreeMap::new(),
        }
    }

    /// Scene name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Map name.
    pub fn map(&self) -> &str {
        &self.map
    }

    /// Number of tracked actors.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Whether no actors are tracked.
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Whether `id` is tracked.
    pub fn contains(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Tracked ids in ascending order.
    pub fn ids(&self) -> Vec<ActorId> {
        self.actors.keys().copied().collect()
    }

    /// Tracked actors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &TrackedActor> {
        self.actors.values()
    }

    /// Start tracking an actor. Returns `false` if it was already tracked.
    pub fn add_actor(&mut self, actor: TrackedActor) -> bool {
        if self.actors.contains_key(&actor.id) {
            return false;
        }
        self.actors.insert(actor.id, actor);
        true
    }

    /// Stop tracking an actor.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::ActorNotInScene`] if `id` is not tracked.
    pub fn remove_actor(&mut self, id: ActorId) -> Result<TrackedActor, SceneError> {
        self.actors.remove(&id).ok_or(SceneError::ActorNotInScene(id))
    }

    /// Stop tracking an actor and destroy it in the simulator.
    ///
    /// The actor leaves the scene even if the simulator no longer had it.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::ActorNotInScene`] if `id` is not tracked, or
    /// [`SceneError::Sim`] if the destroy call fails (the actor stays
    /// tracked in that case).
    pub async fn destroy_actor<W: ActorWorld>(
        &mut self,
        world: &W,
        id: ActorId,
    ) -> Result<TrackedActor, SceneError> {
        if !self.contains(id) {
            return Err(SceneError::ActorNotInScene(id));
        }
        let existed = world.destroy_actor(id).await?;
        if !existed {
            debug!(actor_id = %id, "actor was already gone from the simulator");
        }
        self.remove_actor(id)
    }

    /// Drop every tracked actor not in `live`. Returns the dropped ids.
    pub fn retain_live(&mut self, live: &BTreeSet<ActorId>) -> Vec<ActorId> {
        let stale: Vec<ActorId> = self
            .actors
            .keys()
            .filter(|id| !live.contains(*id))
            .copied()
            .collect();
        for id in &stale {
            self.actors.remove(id);
        }
        stale
    }

    /// Reconcile with the simulator's live actors matching `filter`.
    ///
    /// Returns the ids dropped as stale.
    ///
    /// # Errors
    ///
    /// Returns [`SimError`] if the live list cannot be fetched.
    pub async fn reconcile<W: ActorWorld>(
        &mut self,
        world: &W,
        filter: &str,
    ) -> Result<Vec<ActorId>, SimError> {
        let live: BTreeSet<ActorId> = world
            .actors(filter)
            .await?
            .into_iter()
            .map(|actor| actor.id)
            .collect();
        let stale = self.retain_live(&live);
        for id in &stale {
            warn!(
                scene = self.name,
                actor_id = %id,
                "tracked actor no longer exists in the simulator"
            );
        }
        Ok(stale)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use circle_types::{Location, Rotation, Transform};

    use super::*;
    use crate::testing::FakeWorld;

    fn tracked(raw: u32) -> TrackedActor {
        TrackedActor {
            id: ActorId::new(raw),
            type_id: "vehicle.audi.tt".to_owned(),
            spawn_index: Some(8),
        }
    }

    #[test]
    fn add_and_remove() {
        let mut scene = Scene::new("event-4", "Town03");
        assert!(scene.is_empty());
        assert!(scene.add_actor(tracked(1)));
        assert!(!scene.add_actor(tracked(1)));
        assert_eq!(scene.len(), 1);

        let removed = scene.remove_actor(ActorId::new(1)).unwrap();
        assert_eq!(removed.spawn_index, Some(8));
        assert!(scene.is_empty());
    }

    #[test]
    fn removing_untracked_actor_is_an_error() {
        let mut scene = Scene::new("event-4", "Town03");
        let result = scene.remove_actor(ActorId::new(5));
        assert!(matches!(result, Err(SceneError::ActorNotInScene(id)) if id == ActorId::new(5)));
    }

    #[test]
    fn retain_live_drops_missing_actors() {
        let mut scene = Scene::new("event-4", "Town03");
        for raw in 1..=4 {
            scene.add_actor(tracked(raw));
        }
        let live: BTreeSet<ActorId> = [ActorId::new(1), ActorId::new(3)].into_iter().collect();

        let stale = scene.retain_live(&live);
        assert_eq!(stale, vec![ActorId::new(2), ActorId::new(4)]);
        assert_eq!(scene.ids(), vec![ActorId::new(1), ActorId::new(3)]);
    }

    #[tokio::test]
    async fn reconcile_uses_the_simulator_as_authority() {
        let world = FakeWorld::new();
        let a = world.place("vehicle.audi.tt", Location::new(10.0, 0.0, 0.0));
        let b = world.place("vehicle.audi.tt", Location::new(20.0, 0.0, 0.0));

        let mut scene = Scene::new("event-4", "Town03");
        scene.add_actor(TrackedActor::from_snapshot(&a, None));
        scene.add_actor(TrackedActor::from_snapshot(&b, None));

        // Someone else removes `b`.
        assert!(world.destroy_actor(b.id).await.unwrap());

        let stale = scene.reconcile(&world, "vehicle.*").await.unwrap();
        assert_eq!(stale, vec![b.id]);
        assert!(scene.contains(a.id));
        assert!(!scene.contains(b.id));
    }

    #[tokio::test]
    async fn destroy_actor_removes_from_scene_and_simulator() {
        let world = FakeWorld::new();
        let a = world.place("vehicle.audi.tt", Location::new(10.0, 0.0, 0.0));
        let mut scene = Scene::new("event-4", "Town03");
        scene.add_actor(TrackedActor::from_snapshot(&a, Some(0)));

        scene.destroy_actor(&world, a.id).await.unwrap();
        assert!(scene.is_empty());
        assert!(world.live_ids().is_empty());

        let again = scene.destroy_actor(&world, a.id).await;
        assert!(matches!(again, Err(SceneError::ActorNotInScene(_))));
    }

    #[tokio::test]
    async fn destroy_of_vanished_actor_still_untracks_it() {
        let world = FakeWorld::new();
        let mut scene = Scene::new("event-4", "Town03");
        let ghost = ActorSnapshot {
            id: ActorId::new(77),
            type_id: "vehicle.audi.tt".to_owned(),
            transform: Transform::new(Location::ORIGIN, Rotation::default()),
            attributes: std::collections::BTreeMap::new(),
            autopilot: false,
        };
        scene.add_actor(TrackedActor::from_snapshot(&ghost, None));

        scene.destroy_actor(&world, ghost.id).await.unwrap();
        assert!(scene.is_empty());
    }
}
