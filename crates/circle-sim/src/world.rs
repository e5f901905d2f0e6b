//! In-process simulated world.
//!
//! [`LocalWorld`] owns the map, the blueprint library and every live actor.
//! It is plain synchronous state; [`crate::server`] runs it on a task and
//! [`crate::client`] talks to it through channels.

use std::collections::BTreeMap;
use std::time::Duration;

use circle_types::{ActorBlueprint, ActorId, ActorSnapshot, Transform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::debug;

use crate::autopilot::Autopilot;
use crate::blueprint::BlueprintLibrary;
use crate::error::SimError;
use crate::filter::wildcard_match;
use crate::map::TownMap;

/// Tunables of the in-process simulator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocalWorldConfig {
    /// Seed for autopilot speeds and circulation arcs.
    #[serde(default)]
    pub seed: u64,

    /// Fixed simulation step in milliseconds.
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,

    /// A spawn fails if another actor is closer than this, in meters.
    #[serde(default = "default_spawn_clearance_m")]
    pub spawn_clearance_m: f64,

    /// Slowest autopilot cruise speed, in meters per second.
    #[serde(default = "default_min_speed_mps")]
    pub min_speed_mps: f64,

    /// Fastest autopilot cruise speed, in meters per second.
    #[serde(default = "default_max_speed_mps")]
    pub max_speed_mps: f64,
}

impl Default for LocalWorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            step_ms: default_step_ms(),
            spawn_clearance_m: default_spawn_clearance_m(),
            min_speed_mps: default_min_speed_mps(),
            max_speed_mps: default_max_speed_mps(),
        }
    }
}

impl LocalWorldConfig {
    /// The fixed step as a [`Duration`].
    pub const fn step(&self) -> Duration {
        Duration::from_millis(self.step_ms)
    }

    /// Check that the world can run with these tunables.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] for a zero step, a negative or
    /// non-finite clearance or speed, or an inverted speed range.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.step_ms == 0 {
            return Err(invalid_config("simulator.step_ms must be at least 1".to_owned()));
        }
        let clearance = self.spawn_clearance_m;
        if !clearance.is_finite() || clearance < 0.0 {
            return Err(invalid_config(format!(
                "simulator.spawn_clearance_m must be finite and non-negative, got {clearance}"
            )));
        }
        check_speed_range(self.min_speed_mps, self.max_speed_mps)
    }
}

fn check_speed_range(min: f64, max: f64) -> Result<(), SimError> {
    if !min.is_finite() || !max.is_finite() || min < 0.0 || max < 0.0 {
        return Err(invalid_config(format!(
            "simulator speeds must be finite and non-negative, got [{min}, {max}]"
        )));
    }
    if min > max {
        return Err(invalid_config(format!(
            "simulator.min_speed_mps ({min}) exceeds max_speed_mps ({max})"
        )));
    }
    Ok(())
}

const fn invalid_config(reason: String) -> SimError {
    SimError::InvalidConfig { reason }
}

const fn default_step_ms() -> u64 {
    50
}

const fn default_spawn_clearance_m() -> f64 {
    6.0
}

const fn default_min_speed_mps() -> f64 {
    8.0
}

const fn default_max_speed_mps() -> f64 {
    12.0
}

/// A live actor and, for vehicles under autopilot, its driver state.
#[derive(Debug, Clone)]
struct SimActor {
    snapshot: ActorSnapshot,
    autopilot: Option<Autopilot>,
}

/// The simulated world.
#[derive(Debug)]
pub struct LocalWorld {
    map: TownMap,
    library: BlueprintLibrary,
    actors: BTreeMap<ActorId, SimActor>,
    next_id: u32,
    rng: StdRng,
    elapsed: Duration,
    config: LocalWorldConfig,
}

impl LocalWorld {
    /// Create an empty world on the given map.
    pub fn new(config: LocalWorldConfig, map: TownMap, library: BlueprintLibrary) -> Self {
        Self {
            map,
            library,
            actors: BTreeMap::new(),
            next_id: 1,
            rng: StdRng::seed_from_u64(config.seed),
            elapsed: Duration::ZERO,
            config,
        }
    }

    /// An empty `Town03` world with the default blueprint catalog.
    pub fn town03(config: LocalWorldConfig) -> Self {
        Self::new(config, TownMap::town03(), BlueprintLibrary::default_catalog())
    }

    /// The map.
    pub const fn map(&self) -> &TownMap {
        &self.map
    }

    /// The blueprint library.
    pub const fn blueprint_library(&self) -> &BlueprintLibrary {
        &self.library
    }

    /// The simulator configuration.
    pub const fn config(&self) -> &LocalWorldConfig {
        &self.config
    }

    /// Simulated time since the world was created.
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of live actors.
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Try to spawn an actor.
    ///
    /// Returns `Ok(None)` when another actor is within the spawn clearance
    /// of `transform`.
    pub fn try_spawn_actor(
        &mut self,
        blueprint: &ActorBlueprint,
        transform: &Transform,
    ) -> Result<Option<ActorSnapshot>, SimError> {
        if self.library.find(&blueprint.id).is_none() {
            return Err(SimError::UnknownBlueprint(blueprint.id.clone()));
        }

        let clearance = self.config.spawn_clearance_m;
        let occupied = self
            .actors
            .values()
            .any(|actor| actor.snapshot.location().distance(&transform.location) < clearance);
        if occupied {
            debug!(
                type_id = blueprint.id,
                location = %transform.location,
                "spawn point occupied"
            );
            return Ok(None);
        }

        let id = ActorId::new(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(SimError::ActorIdsExhausted)?;

        let snapshot = ActorSnapshot {
            id,
            type_id: blueprint.id.clone(),
            transform: *transform,
            attributes: blueprint.attribute_values(),
            autopilot: false,
        };
        self.actors.insert(
            id,
            SimActor {
                snapshot: snapshot.clone(),
                autopilot: None,
            },
        );
        Ok(Some(snapshot))
    }

    /// Live actors whose type id matches the wildcard `filter`, by id.
    pub fn actors(&self, filter: &str) -> Vec<ActorSnapshot> {
        self.actors
            .values()
            .filter(|actor| wildcard_match(filter, &actor.snapshot.type_id))
            .map(|actor| actor.snapshot.clone())
            .collect()
    }

    /// One live actor.
    pub fn actor(&self, id: ActorId) -> Option<&ActorSnapshot> {
        self.actors.get(&id).map(|actor| &actor.snapshot)
    }

    /// Destroy an actor. Returns whether it existed.
    pub fn destroy_actor(&mut self, id: ActorId) -> bool {
        self.actors.remove(&id).is_some()
    }

    /// Hand an actor to (or take it from) the autopilot.
    pub fn set_autopilot(&mut self, id: ActorId, enabled: bool) -> Result<(), SimError> {
        let center = self.map.center;
        if !self.actors.contains_key(&id) {
            return Err(SimError::ActorNotFound(id));
        }
        let speed = if enabled { self.cruise_speed()? } else { 0.0 };
        let actor = self.actors.get_mut(&id).ok_or(SimError::ActorNotFound(id))?;
        actor.snapshot.autopilot = enabled;
        actor.autopilot = if enabled {
            Some(Autopilot::engage(&actor.snapshot.transform, &center, speed))
        } else {
            None
        };
        Ok(())
    }

    /// Teleport an actor. An engaged autopilot restarts from the new pose.
    pub fn set_transform(&mut self, id: ActorId, transform: Transform) -> Result<(), SimError> {
        let center = self.map.center;
        let actor = self.actors.get_mut(&id).ok_or(SimError::ActorNotFound(id))?;
        actor.snapshot.transform = transform;
        if let Some(pilot) = actor.autopilot {
            actor.autopilot = Some(Autopilot::engage(&transform, &center, pilot.speed_mps()));
        }
        Ok(())
    }

    /// Advance the simulation by `dt`.
    pub fn step(&mut self, dt: Duration) {
        let dt_secs = dt.as_secs_f64();
        let center = self.map.center;
        let radius = self.map.roundabout_radius;
        for actor in self.actors.values_mut() {
            if let Some(pilot) = actor.autopilot.as_mut() {
                pilot.advance(
                    &mut actor.snapshot.transform,
                    dt_secs,
                    &center,
                    radius,
                    &mut self.rng,
                );
            }
        }
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn cruise_speed(&mut self) -> Result<f64, SimError> {
        let (min, max) = (self.config.min_speed_mps, self.config.max_speed_mps);
        check_speed_range(min, max)?;
        if max > min {
            Ok(self.rng.random_range(min..=max))
        } else {
            Ok(min)
        }
    }
}
