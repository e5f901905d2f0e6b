//! The driver loop.
//!
//! Each cycle runs three phases against the world, in order:
//!
//! 1. **Reconcile**: drop tracked actors the simulator no longer has.
//! 2. **Populate**: spawn until the scene holds `max_agents` actors.
//! 3. **Evict**: destroy tracked actors outside the eviction zone.
//!
//! Any simulator failure ends the run with an error.

use chrono::{DateTime, Utc};
use circle_sim::ActorWorld;
use circle_types::RunId;
use tracing::{info, warn};

use crate::config::ScenarioConfig;
use crate::error::ScenarioError;
use crate::eviction::{EvictionZone, evict_distant_agents};
use crate::population::Population;
use crate::rng::ScenarioRng;
use crate::scene::Scene;

/// What one cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    /// Cycle number, starting at 1.
    pub cycle: u64,
    /// Tracked actors found missing from the simulator.
    pub stale: usize,
    /// Spawn attempts made.
    pub attempts: usize,
    /// Actors spawned.
    pub spawned: usize,
    /// Actors evicted for leaving the zone.
    pub evicted: usize,
    /// Tracked actors at the end of the cycle.
    pub tracked: usize,
}

/// Result of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// Identity of the run.
    pub run_id: RunId,
    /// When the run was prepared.
    pub started_at: DateTime<Utc>,
    /// Seed the scenario RNG started from.
    pub seed: u64,
    /// Number of cycles executed.
    pub total_cycles: u64,
    /// Actors spawned over the whole run.
    pub total_spawned: usize,
    /// Actors evicted over the whole run.
    pub total_evicted: usize,
    /// The last cycle's summary, if any cycle ran.
    pub final_summary: Option<CycleSummary>,
}

/// Drives the population and eviction cycle against a world.
#[derive(Debug)]
pub struct ScenarioRunner<W> {
    run_id: RunId,
    started_at: DateTime<Utc>,
    world: W,
    scene: Scene,
    population: Population,
    zone: EvictionZone,
    filter: String,
    max_cycles: u64,
    rng: ScenarioRng,
    cycles: u64,
    total_spawned: usize,
    total_evicted: usize,
    last_summary: Option<CycleSummary>,
}

impl<W: ActorWorld> ScenarioRunner<W> {
    /// Validate `config`, resolve it against `world`, and set up an empty
    /// scene.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Config`] for an invalid configuration and
    /// the errors of [`Population::prepare`].
    pub async fn prepare(
        world: W,
        config: &ScenarioConfig,
        rng: ScenarioRng,
    ) -> Result<Self, ScenarioError> {
        config.validate()?;

        let map = world.map().await?;
        if map.name != config.scenario.map {
            warn!(
                expected = config.scenario.map,
                actual = map.name,
                "simulator is running a different map"
            );
        }
        let library = world.blueprint_library().await?;
        let population = Population::from_parts(&map, &library, &config.population)?;

        let run_id = RunId::new();
        let started_at = Utc::now();
        info!(
            %run_id,
            %started_at,
            scene = config.scenario.name,
            map = map.name,
            seed = rng.seed(),
            max_agents = population.max_agents(),
            spawn_points = population.plan().len(),
            blueprints = population.library().len(),
            radius_m = config.eviction.radius_m,
            "scenario prepared"
        );

        Ok(Self {
            run_id,
            started_at,
            world,
            scene: Scene::new(&config.scenario.name, &map.name),
            population,
            zone: EvictionZone::from_config(&config.eviction),
            filter: config.population.actor_filter.clone(),
            max_cycles: config.runner.max_cycles,
            rng,
            cycles: 0,
            total_spawned: 0,
            total_evicted: 0,
            last_summary: None,
        })
    }

    /// Identity of this run.
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// The tracked actors.
    pub const fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The world being driven.
    pub const fn world(&self) -> &W {
        &self.world
    }

    /// Cycles completed so far.
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one reconcile, populate, evict cycle.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] if any simulator call fails.
    pub async fn run_cycle(&mut self) -> Result<CycleSummary, ScenarioError> {
        let cycle = self.cycles.saturating_add(1);

        let mut stale = self.scene.reconcile(&self.world, &self.filter).await?.len();
        let population = self
            .population
            .populate(&self.world, &mut self.scene, self.rng.rng_mut())
            .await?;
        let eviction =
            evict_distant_agents(&self.world, &mut self.scene, &self.zone, &self.filter).await?;
        stale = stale.saturating_add(eviction.stale.len());

        let summary = CycleSummary {
            cycle,
            stale,
            attempts: population.attempts.len(),
            spawned: population.spawned().len(),
            evicted: eviction.evicted.len(),
            tracked: self.scene.len(),
        };
        info!(
            run_id = %self.run_id,
            cycle,
            stale = summary.stale,
            attempts = summary.attempts,
            spawned = summary.spawned,
            evicted = summary.evicted,
            tracked = summary.tracked,
            "cycle complete"
        );

        self.cycles = cycle;
        self.total_spawned = self.total_spawned.saturating_add(summary.spawned);
        self.total_evicted = self.total_evicted.saturating_add(summary.evicted);
        self.last_summary = Some(summary);
        Ok(summary)
    }

    /// Run cycles until `max_cycles` is reached, or forever when it is 0.
    ///
    /// # Errors
    ///
    /// Returns the first [`ScenarioError`] a cycle raises.
    pub async fn run(mut self) -> Result<RunResult, ScenarioError> {
        while self.max_cycles == 0 || self.cycles < self.max_cycles {
            self.run_cycle().await?;
        }
        Ok(self.into_result())
    }

    fn into_result(self) -> RunResult {
        RunResult {
            run_id: self.run_id,
            started_at: self.started_at,
            seed: self.rng.seed(),
            total_cycles: self.cycles,
            total_spawned: self.total_spawned,
            total_evicted: self.total_evicted,
            final_summary: self.last_summary,
        }
    }
}

/// Log the outcome of a finished run.
pub fn log_run_end(result: &RunResult) {
    let elapsed = Utc::now().signed_duration_since(result.started_at);
    info!(
        run_id = %result.run_id,
        seed = result.seed,
        total_cycles = result.total_cycles,
        total_spawned = result.total_spawned,
        total_evicted = result.total_evicted,
        elapsed_secs = elapsed.num_seconds(),
        "scenario run ended"
    );

    if let Some(summary) = result.final_summary {
        info!(
            cycle = summary.cycle,
            tracked = summary.tracked,
            "final cycle summary"
        );
    } else {
        warn!("scenario ended with no cycles executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use circle_types::Location;

    use super::*;
    use crate::testing::FakeWorld;

    fn config(max_agents: usize, max_cycles: u64) -> ScenarioConfig {
        let mut config = ScenarioConfig::default();
        config.population.max_agents = max_agents;
        config.runner.max_cycles = max_cycles;
        config
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_after_max_cycles() {
        let runner = ScenarioRunner::prepare(FakeWorld::new(), &config(4, 3), ScenarioRng::from_seed(1))
            .await
            .unwrap();
        let result = runner.run().await.unwrap();
        assert_eq!(result.total_cycles, 3);
        assert_eq!(result.seed, 1);
        assert_eq!(result.total_spawned, 4);
        assert_eq!(result.total_evicted, 0);
        assert_eq!(result.clone(), result);
        assert_eq!(result.final_summary.unwrap().tracked, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_config_is_rejected_before_running() {
        let mut bad = config(4, 1);
        bad.population.pause_min_secs = 9.0;
        let result =
            ScenarioRunner::prepare(FakeWorld::new(), &bad, ScenarioRng::from_seed(1)).await;
        assert!(matches!(result, Err(ScenarioError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_spawn_point_is_rejected_before_running() {
        let mut bad = config(4, 1);
        bad.population.spawn_point_indices = vec![8, 9000];
        let result =
            ScenarioRunner::prepare(FakeWorld::new(), &bad, ScenarioRng::from_seed(1)).await;
        assert!(matches!(
            result,
            Err(ScenarioError::SpawnPointOutOfRange { index: 9000, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn externally_destroyed_agents_are_replaced() {
        let mut runner =
            ScenarioRunner::prepare(FakeWorld::new(), &config(3, 0), ScenarioRng::from_seed(7))
                .await
                .unwrap();
        let first = runner.run_cycle().await.unwrap();
        assert_eq!(first.tracked, 3);

        let victim = runner.scene().ids().first().copied().unwrap();
        runner.world().destroy_actor(victim).await.unwrap();

        let second = runner.run_cycle().await.unwrap();
        assert_eq!(second.stale, 1);
        assert!(second.spawned >= 1);
        assert!(!runner.scene().contains(victim));
        assert_eq!(second.tracked, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn distant_agents_are_evicted_at_the_end_of_a_cycle() {
        let mut runner =
            ScenarioRunner::prepare(FakeWorld::new(), &config(2, 0), ScenarioRng::from_seed(9))
                .await
                .unwrap();
        runner.run_cycle().await.unwrap();

        let wanderer = runner.scene().ids().first().copied().unwrap();
        runner
            .world()
            .move_to(wanderer, Location::new(0.0, 400.0, 0.0));

        // The sweep runs after populate, which has nothing to do.
        let summary = runner.run_cycle().await.unwrap();
        assert_eq!(summary.attempts, 0);
        assert_eq!(summary.evicted, 1);
        assert_eq!(summary.tracked, 1);
        assert!(runner.world().actor(wanderer).is_none());
        assert_eq!(runner.cycles(), 2);
    }

    #[test]
    fn log_run_end_handles_empty_runs() {
        log_run_end(&RunResult {
            run_id: RunId::new(),
            started_at: Utc::now(),
            seed: 0,
            total_cycles: 0,
            total_spawned: 0,
            total_evicted: 0,
            final_summary: None,
        });
    }
}
