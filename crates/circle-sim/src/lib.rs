//! The driving simulator as seen by the scenario generator.
//!
//! The scenario logic never talks to a simulator directly; it goes through
//! the [`ActorWorld`] trait. This crate provides that trait, the [`Client`]
//! connection factory with its [`World`] handle, and an in-process backend
//! ([`LocalWorld`]) that simulates a town with a traffic circle and drives
//! spawned vehicles around it.
//!
//! # Modules
//!
//! - [`api`] -- The [`ActorWorld`] trait.
//! - [`autopilot`] -- Kinematic autopilot: approach, circulate, depart.
//! - [`blueprint`] -- Blueprint library and the default vehicle catalog.
//! - [`client`] -- [`Client::connect`] and the [`World`] handle.
//! - [`error`] -- [`SimError`].
//! - [`filter`] -- Wildcard matching for actor type filters.
//! - [`map`] -- Town map with the roundabout and its spawn points.
//! - [`server`] -- [`SimulatorHub`]: serves local worlds on endpoints.
//! - [`world`] -- [`LocalWorld`] state and stepping.

pub mod api;
pub mod autopilot;
pub mod blueprint;
pub mod client;
pub mod error;
pub mod filter;
pub mod map;
pub mod server;
pub mod world;

// Re-export primary types at crate root.
pub use api::ActorWorld;
pub use blueprint::BlueprintLibrary;
pub use client::{Client, Endpoint, World};
pub use error::SimError;
pub use map::TownMap;
pub use server::{SimulatorHandle, SimulatorHub};
pub use world::{LocalWorld, LocalWorldConfig};
