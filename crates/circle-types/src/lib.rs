//! Shared type definitions for the traffic circle scenario generator.
//!
//! Every crate in the workspace speaks in these types: the simulator
//! backend produces them, the scenario logic consumes them.
//!
//! # Modules
//!
//! - [`ids`] -- Strongly-typed identifiers for actors and scenario runs
//! - [`geometry`] -- Locations, rotations, and transforms (poses)
//! - [`actor`] -- Blueprints and actor snapshots

pub mod actor;
pub mod geometry;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use actor::{ActorBlueprint, ActorSnapshot, BlueprintAttribute};
pub use geometry::{Location, Rotation, Transform};
pub use ids::{ActorId, RunId};
