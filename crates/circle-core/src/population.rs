//! The population controller.
//!
//! Keeps spawning randomized vehicles at randomly chosen spawn points until
//! the scene holds the configured number of agents. Occupied spawn points
//! are not errors; the attempt is simply skipped. Every attempt is followed
//! by a random pause.

use circle_sim::{ActorWorld, BlueprintLibrary, SimError, TownMap};
use circle_types::{ActorBlueprint, ActorId, ActorSnapshot, Transform};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, info};

use crate::blueprint::randomize_blueprint;
use crate::config::PopulationConfig;
use crate::error::ScenarioError;
use crate::pacing::SpawnPacing;
use crate::scene::{Scene, TrackedActor};

/// The spawn points a population may use, resolved against a map.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPlan {
    points: Vec<(usize, Transform)>,
}

impl SpawnPlan {
    /// Resolve `indices` against the map's spawn points.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::SpawnPointOutOfRange`] for the first index
    /// the map does not have.
    pub fn new(map: &TownMap, indices: &[usize]) -> Result<Self, ScenarioError> {
        let points = indices
            .iter()
            .map(|&index| {
                map.spawn_point(index)
                    .map(|transform| (index, *transform))
                    .ok_or_else(|| ScenarioError::SpawnPointOutOfRange {
                        index,
                        available: map.spawn_points().len(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { points })
    }

    /// Number of usable spawn points.
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether there are no usable spawn points.
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The configured indices, in configuration order.
    pub fn indices(&self) -> Vec<usize> {
        self.points.iter().map(|(index, _)| *index).collect()
    }

    /// Pick a spawn point uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(usize, Transform)> {
        self.points.choose(rng).copied()
    }
}

/// One spawn attempt and its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnAttempt {
    /// Spawn point index tried.
    pub spawn_index: usize,
    /// The actor created, or `None` if the point was occupied.
    pub actor: Option<ActorId>,
}

/// Outcome of one population pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationReport {
    /// Every attempt, in order.
    pub attempts: Vec<SpawnAttempt>,
}

impl PopulationReport {
    /// Actors created in this pass.
    pub fn spawned(&self) -> Vec<ActorId> {
        self.attempts.iter().filter_map(|attempt| attempt.actor).collect()
    }

    /// Attempts that hit an occupied spawn point.
    pub fn skipped(&self) -> usize {
        self.attempts
            .iter()
            .filter(|attempt| attempt.actor.is_none())
            .count()
    }

    /// The spawn point indices tried, in order.
    pub fn spawn_indices(&self) -> Vec<usize> {
        self.attempts.iter().map(|attempt| attempt.spawn_index).collect()
    }
}

/// Spawn one actor and hand it to the autopilot if it is a vehicle.
///
/// Returns `Ok(None)` if the spawn point is occupied.
///
/// # Errors
///
/// Returns [`SimError`] if a simulator call fails.
pub async fn spawn_actor<W: ActorWorld>(
    world: &W,
    blueprint: &ActorBlueprint,
    transform: &Transform,
) -> Result<Option<ActorSnapshot>, SimError> {
    let Some(mut actor) = world.try_spawn_actor(blueprint, transform).await? else {
        return Ok(None);
    };
    if actor.is_vehicle() {
        world.set_autopilot(actor.id, true).await?;
        actor.autopilot = true;
    }
    Ok(Some(actor))
}

/// Population controller state resolved against a world.
#[derive(Debug, Clone)]
pub struct Population {
    plan: SpawnPlan,
    library: BlueprintLibrary,
    role_name: String,
    max_agents: usize,
    max_attempts: usize,
    pacing: SpawnPacing,
}

impl Population {
    /// Fetch the map and blueprints from `world` and resolve `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::SpawnPointOutOfRange`] for an unknown spawn
    /// point, [`ScenarioError::NoBlueprints`] if the filter matches nothing,
    /// or [`ScenarioError::Sim`] if the world cannot be queried.
    pub async fn prepare<W: ActorWorld>(
        world: &W,
        config: &PopulationConfig,
    ) -> Result<Self, ScenarioError> {
        let map = world.map().await?;
        let library = world.blueprint_library().await?;
        Self::from_parts(&map, &library, config)
    }

    /// Resolve `config` against an already fetched map and library.
    ///
    /// # Errors
    ///
    /// See [`Population::prepare`].
    pub fn from_parts(
        map: &TownMap,
        library: &BlueprintLibrary,
        config: &PopulationConfig,
    ) -> Result<Self, ScenarioError> {
        let plan = SpawnPlan::new(map, &config.spawn_point_indices)?;
        let library = library.filter(&config.actor_filter);
        if library.is_empty() {
            return Err(ScenarioError::NoBlueprints {
                filter: config.actor_filter.clone(),
            });
        }
        Ok(Self {
            plan,
            library,
            role_name: config.role_name.clone(),
            max_agents: config.max_agents,
            max_attempts: config.max_attempts_per_cycle,
            pacing: SpawnPacing::from_config(config),
        })
    }

    /// The resolved spawn points.
    pub const fn plan(&self) -> &SpawnPlan {
        &self.plan
    }

    /// The blueprints agents are drawn from.
    pub const fn library(&self) -> &BlueprintLibrary {
        &self.library
    }

    /// Target number of live agents.
    pub const fn max_agents(&self) -> usize {
        self.max_agents
    }

    /// Spawn until `scene` holds `max_agents` actors.
    ///
    /// Stops early once `max_attempts_per_cycle` attempts were made, if
    /// that cap is set.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Sim`] if a simulator call fails.
    pub async fn populate<W, R>(
        &self,
        world: &W,
        scene: &mut Scene,
        rng: &mut R,
    ) -> Result<PopulationReport, ScenarioError>
    where
        W: ActorWorld,
        R: Rng + ?Sized,
    {
        let mut report = PopulationReport::default();
        while scene.len() < self.max_agents {
            if self.max_attempts > 0 && report.attempts.len() >= self.max_attempts {
                debug!(
                    attempts = report.attempts.len(),
                    tracked = scene.len(),
                    "spawn attempt cap reached"
                );
                break;
            }
            let Some((spawn_index, transform)) = self.plan.choose(rng) else {
                break;
            };
            let Some(blueprint) = randomize_blueprint(&self.library, &self.role_name, rng) else {
                break;
            };

            let spawned = spawn_actor(world, &blueprint, &transform).await?;
            let actor = spawned.map(|actor| {
                scene.add_actor(TrackedActor::from_snapshot(&actor, Some(spawn_index)));
                info!(
                    actor_id = %actor.id,
                    type_id = actor.type_id,
                    spawn_index,
                    tracked = scene.len(),
                    "spawned actor"
                );
                actor.id
            });
            if actor.is_none() {
                debug!(spawn_index, blueprint = blueprint.id, "spawn point occupied");
            }
            report.attempts.push(SpawnAttempt { spawn_index, actor });

            self.pacing.pause(rng).await;
        }
        Ok(report)
    }
}
