//! Strongly-typed identifiers.
//!
//! Actor identifiers are assigned by the simulator and are plain integers
//! on the simulator side; the newtype keeps them from being mixed up with
//! spawn point indices or counts. Scenario runs get a UUID v7 so that log
//! lines from one run can be correlated.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Simulator-assigned identifier of a spawned actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl ActorId {
    /// Wrap a raw simulator identifier.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Return the raw simulator identifier.
    pub const fn into_inner(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for ActorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ActorId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Unique identifier for one scenario run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RunId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
