//! Actor lifecycle loop for the traffic circle scenario.
//!
//! The scenario keeps a bounded population of autopilot vehicles around a
//! point of interest and evicts the ones that drive away. One cycle of the
//! driver loop reconciles the tracked scene with the simulator, spawns
//! until the population is full, then sweeps distant vehicles.
//!
//! # Modules
//!
//! - [`blueprint`] -- Random blueprint selection with color and role.
//! - [`config`] -- Scenario configuration loaded from `circle-config.yaml`.
//! - [`error`] -- [`ScenarioError`] and friends.
//! - [`eviction`] -- [`EvictionZone`] and the distance-based sweep.
//! - [`pacing`] -- Random pauses between spawn attempts.
//! - [`population`] -- The population controller.
//! - [`rng`] -- Seeded scenario randomness.
//! - [`runner`] -- [`ScenarioRunner`], the driver loop.
//! - [`scene`] -- [`Scene`], the tracked set of spawned actors.
//!
//! [`EvictionZone`]: eviction::EvictionZone
//! [`ScenarioError`]: error::ScenarioError
//! [`ScenarioRunner`]: runner::ScenarioRunner
//! [`Scene`]: scene::Scene

pub mod blueprint;
pub mod config;
pub mod error;
pub mod eviction;
pub mod pacing;
pub mod population;
pub mod rng;
pub mod runner;
pub mod scene;

#[cfg(test)]
mod testing;
