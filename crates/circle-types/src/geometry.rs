//! Positions and poses in the simulator's world frame.
//!
//! Units follow the simulator: meters for locations, degrees for
//! rotations. The frame is right-handed in the ground plane with yaw
//! measured counter-clockwise from the +x axis.

use serde::{Deserialize, Serialize};

/// A point in the world frame, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    /// East-west coordinate.
    #[serde(default)]
    pub x: f64,
    /// North-south coordinate.
    #[serde(default)]
    pub y: f64,
    /// Height above the ground plane.
    #[serde(default)]
    pub z: f64,
}

impl Location {
    /// The world origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a location from its coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another location.
    pub fn distance(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx.mul_add(dx, dy.mul_add(dy, dz * dz)).sqrt()
    }

    /// Distance to another location ignoring height.
    pub fn planar_distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Bearing of this location as seen from `origin`, in radians.
    pub fn bearing_from(&self, origin: &Self) -> f64 {
        (self.y - origin.y).atan2(self.x - origin.x)
    }

    /// Return this location moved by the given offsets.
    #[must_use]
    pub fn translated(&self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Whether every coordinate is finite.
    pub const fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Location(x={:.2}, y={:.2}, z={:.2})", self.x, self.y, self.z)
    }
}

/// An orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    /// Nose up/down.
    #[serde(default)]
    pub pitch: f64,
    /// Heading, counter-clockwise from +x.
    #[serde(default)]
    pub yaw: f64,
    /// Bank.
    #[serde(default)]
    pub roll: f64,
}

impl Rotation {
    /// Create a rotation from its angles in degrees.
    pub const fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }

    /// A level rotation with the given heading.
    pub const fn from_yaw(yaw: f64) -> Self {
        Self::new(0.0, yaw, 0.0)
    }
}

impl core::fmt::Display for Rotation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Rotation(pitch={:.2}, yaw={:.2}, roll={:.2})",
            self.pitch, self.yaw, self.roll
        )
    }
}

/// A pose: location plus orientation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    /// Where.
    #[serde(default)]
    pub location: Location,
    /// Facing which way.
    #[serde(default)]
    pub rotation: Rotation,
}

impl Transform {
    /// Create a transform from a location and rotation.
    pub const fn new(location: Location, rotation: Rotation) -> Self {
        Self { location, rotation }
    }

    /// Unit vector in the ground plane along the heading.
    pub fn forward_vector(&self) -> (f64, f64) {
        let yaw = self.rotation.yaw.to_radians();
        (yaw.cos(), yaw.sin())
    }

    /// Move `distance` meters along the current heading.
    pub fn advance(&mut self, distance: f64) {
        let (fx, fy) = self.forward_vector();
        self.location = self.location.translated(fx * distance, fy * distance, 0.0);
    }
}

impl core::fmt::Display for Transform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Transform({}, {})", self.location, self.rotation)
    }
}
