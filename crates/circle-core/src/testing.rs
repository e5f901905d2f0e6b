//! In-memory [`ActorWorld`] for unit tests.

use std::cell::RefCell;
use std::collections::BTreeMap;

use circle_sim::{ActorWorld, BlueprintLibrary, SimError, TownMap};
use circle_types::{ActorBlueprint, ActorId, ActorSnapshot, Location, Rotation, Transform};

#[derive(Debug)]
struct FakeState {
    map: TownMap,
    library: BlueprintLibrary,
    actors: BTreeMap<ActorId, ActorSnapshot>,
    next_id: u32,
    spawn_log: Vec<Transform>,
    reject_spawns: bool,
}

/// A world that never moves anything on its own.
///
/// Spawns fail only when another actor sits on the same spot or when
/// rejection is switched on.
#[derive(Debug)]
pub(crate) struct FakeWorld {
    state: RefCell<FakeState>,
}

impl FakeWorld {
    pub(crate) fn new() -> Self {
        Self {
            state: RefCell::new(FakeState {
                map: TownMap::town03(),
                library: BlueprintLibrary::default_catalog(),
                actors: BTreeMap::new(),
                next_id: 1,
                spawn_log: Vec::new(),
                reject_spawns: false,
            }),
        }
    }

    /// Put an actor straight into the world, bypassing spawn checks.
    pub(crate) fn place(&self, type_id: &str, location: Location) -> ActorSnapshot {
        let mut state = self.state.borrow_mut();
        let id = ActorId::new(state.next_id);
        state.next_id = state.next_id.saturating_add(1);
        let snapshot = ActorSnapshot {
            id,
            type_id: type_id.to_owned(),
            transform: Transform::new(location, Rotation::default()),
            attributes: BTreeMap::new(),
            autopilot: false,
        };
        state.actors.insert(id, snapshot.clone());
        snapshot
    }

    pub(crate) fn move_to(&self, id: ActorId, location: Location) {
        if let Some(actor) = self.state.borrow_mut().actors.get_mut(&id) {
            actor.transform.location = location;
        }
    }

    pub(crate) fn live_ids(&self) -> Vec<ActorId> {
        self.state.borrow().actors.keys().copied().collect()
    }

    pub(crate) fn actor(&self, id: ActorId) -> Option<ActorSnapshot> {
        self.state.borrow().actors.get(&id).cloned()
    }

    pub(crate) fn spawn_log(&self) -> Vec<Transform> {
        self.state.borrow().spawn_log.clone()
    }

    pub(crate) fn reject_spawns(&self, reject: bool) {
        self.state.borrow_mut().reject_spawns = reject;
    }
}

impl ActorWorld for FakeWorld {
    async fn map(&self) -> Result<TownMap, SimError> {
        Ok(self.state.borrow().map.clone())
    }

    async fn blueprint_library(&self) -> Result<BlueprintLibrary, SimError> {
        Ok(self.state.borrow().library.clone())
    }

    async fn try_spawn_actor(
        &self,
        blueprint: &ActorBlueprint,
        transform: &Transform,
    ) -> Result<Option<ActorSnapshot>, SimError> {
        let mut state = self.state.borrow_mut();
        state.spawn_log.push(*transform);
        let occupied = state
            .actors
            .values()
            .any(|a| a.location().distance(&transform.location) < 1.0);
        if state.reject_spawns || occupied {
            return Ok(None);
        }
        let id = ActorId::new(state.next_id);
        state.next_id = state.next_id.saturating_add(1);
        let snapshot = ActorSnapshot {
            id,
            type_id: blueprint.id.clone(),
            transform: *transform,
            attributes: blueprint.attribute_values(),
            autopilot: false,
        };
        state.actors.insert(id, snapshot.clone());
        Ok(Some(snapshot))
    }

    async fn actors(&self, filter: &str) -> Result<Vec<ActorSnapshot>, SimError> {
        Ok(self
            .state
            .borrow()
            .actors
            .values()
            .filter(|a| circle_sim::filter::wildcard_match(filter, &a.type_id))
            .cloned()
            .collect())
    }

    async fn destroy_actor(&self, id: ActorId) -> Result<bool, SimError> {
        Ok(self.state.borrow_mut().actors.remove(&id).is_some())
    }

    async fn set_autopilot(&self, id: ActorId, enabled: bool) -> Result<(), SimError> {
        let mut state = self.state.borrow_mut();
        let actor = state.actors.get_mut(&id).ok_or(SimError::ActorNotFound(id))?;
        actor.autopilot = enabled;
        Ok(())
    }
}
