//! Distance-based eviction of tracked agents.
//!
//! A sweep is stateless: every tracked agent is measured against the zone
//! on each call, with no memory of earlier sweeps.

use std::collections::BTreeMap;

use circle_sim::ActorWorld;
use circle_types::{ActorId, ActorSnapshot, Location};
use tracing::{debug, info};

use crate::config::EvictionConfig;
use crate::error::ScenarioError;
use crate::scene::Scene;

/// A sphere agents must stay inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvictionZone {
    /// Centre of the zone.
    pub center: Location,
    /// Radius in meters. Agents exactly on the boundary are inside.
    pub radius: f64,
}

impl EvictionZone {
    /// Create a zone.
    pub const fn new(center: Location, radius: f64) -> Self {
        Self { center, radius }
    }

    /// The zone configured for the sweep.
    pub const fn from_config(config: &EvictionConfig) -> Self {
        Self::new(config.center, config.radius_m)
    }

    /// Euclidean distance from the centre to `location`.
    pub fn distance_to(&self, location: &Location) -> f64 {
        self.center.distance(location)
    }

    /// Whether `location` is within the radius.
    pub fn contains(&self, location: &Location) -> bool {
        self.distance_to(location) <= self.radius
    }
}

/// Whether `actor` is inside `zone`.
pub fn in_range(actor: &ActorSnapshot, zone: &EvictionZone) -> bool {
    let distance = zone.distance_to(&actor.location());
    debug!(actor_id = %actor.id, distance, radius = zone.radius, "actor distance");
    distance <= zone.radius
}

/// Outcome of one eviction sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    /// Agents destroyed for leaving the zone.
    pub evicted: Vec<ActorId>,
    /// Tracked agents the simulator no longer had.
    pub stale: Vec<ActorId>,
    /// Tracked agents left after the sweep.
    pub remaining: usize,
}

/// Destroy every tracked agent outside `zone` and drop stale ones.
///
/// `filter` selects the simulator's live list the scene is checked against.
///
/// # Errors
///
/// Returns [`ScenarioError::Sim`] if listing actors fails and
/// [`ScenarioError::Scene`] if a destroy call fails.
pub async fn evict_distant_agents<W: ActorWorld>(
    world: &W,
    scene: &mut Scene,
    zone: &EvictionZone,
    filter: &str,
) -> Result<EvictionReport, ScenarioError> {
    let live: BTreeMap<ActorId, ActorSnapshot> = world
        .actors(filter)
        .await?
        .into_iter()
        .map(|actor| (actor.id, actor))
        .collect();

    let mut report = EvictionReport::default();
    for id in scene.ids() {
        let Some(actor) = live.get(&id) else {
            scene.remove_actor(id)?;
            report.stale.push(id);
            continue;
        };
        if !in_range(actor, zone) {
            scene.destroy_actor(world, id).await?;
            info!(actor_id = %id, type_id = actor.type_id, "evicted distant actor");
            report.evicted.push(id);
        }
    }
    report.remaining = scene.len();
    Ok(report)
}

/// Destroy every live actor matching `filter`, tracked or not.
///
/// Returns the ids destroyed.
///
/// # Errors
///
/// Returns [`ScenarioError::Sim`] if a simulator call fails.
pub async fn remove_all_actors<W: ActorWorld>(
    world: &W,
    filter: &str,
) -> Result<Vec<ActorId>, ScenarioError> {
    let mut removed = Vec::new();
    for actor in world.actors(filter).await? {
        if world.destroy_actor(actor.id).await? {
            removed.push(actor.id);
        }
    }
    info!(filter, count = removed.len(), "removed existing actors");
    Ok(removed)
}
