//! Kinematic autopilot for vehicles on the traffic circle map.
//!
//! A driven vehicle goes through three phases:
//!
//! 1. **Approach** -- drive straight along the current heading until the
//!    circle's driving line is reached.
//! 2. **Circulate** -- follow the circle counter-clockwise for a random arc
//!    between a quarter and three quarters of a turn.
//! 3. **Depart** -- leave radially and keep driving straight.
//!
//! Vehicles spawned on an outbound lane start in the depart phase. Every
//! vehicle therefore leaves the area eventually, which is what keeps the
//! eviction sweep busy.

use core::f64::consts::{FRAC_PI_2, PI};

use circle_types::{Location, Rotation, Transform};
use rand::Rng;

use crate::map::normalize_degrees;

/// Current phase of a driven vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrivePhase {
    /// Heading toward the circle.
    Approach,
    /// On the circle; `remaining` radians to go before exiting.
    Circulate {
        /// Arc left to drive, in radians.
        remaining: f64,
    },
    /// Leaving the circle.
    Depart,
}

/// Per-vehicle autopilot state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Autopilot {
    phase: DrivePhase,
    speed_mps: f64,
}

impl Autopilot {
    /// Engage the autopilot for a vehicle at `transform`.
    ///
    /// The starting phase is chosen from the heading: facing the centre
    /// means approach, anything else means depart.
    pub fn engage(transform: &Transform, center: &Location, speed_mps: f64) -> Self {
        let (fx, fy) = transform.forward_vector();
        let to_center_x = center.x - transform.location.x;
        let to_center_y = center.y - transform.location.y;
        let phase = if fx.mul_add(to_center_x, fy * to_center_y) > 0.0 {
            DrivePhase::Approach
        } else {
            DrivePhase::Depart
        };
        Self { phase, speed_mps }
    }

    /// Current phase.
    pub const fn phase(&self) -> DrivePhase {
        self.phase
    }

    /// Cruise speed in meters per second.
    pub const fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    /// Advance the vehicle by `dt_secs` seconds of driving.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        transform: &mut Transform,
        dt_secs: f64,
        center: &Location,
        radius: f64,
        rng: &mut R,
    ) {
        let travel = self.speed_mps * dt_secs;
        match self.phase {
            DrivePhase::Approach => {
                transform.advance(travel);
                if transform.location.planar_distance(center) <= radius {
                    let angle = transform.location.bearing_from(center);
                    place_on_circle(transform, center, radius, angle);
                    self.phase = DrivePhase::Circulate {
                        remaining: rng.random_range(FRAC_PI_2..(PI + FRAC_PI_2)),
                    };
                }
            }
            DrivePhase::Circulate { remaining } => {
                let step = if radius > 0.0 { travel / radius } else { remaining };
                let angle = transform.location.bearing_from(center) + step.min(remaining);
                place_on_circle(transform, center, radius, angle);
                let left = remaining - step;
                if left <= 0.0 {
                    transform.rotation = Rotation::new(
                        transform.rotation.pitch,
                        normalize_degrees(angle.to_degrees()),
                        transform.rotation.roll,
                    );
                    self.phase = DrivePhase::Depart;
                } else {
                    self.phase = DrivePhase::Circulate { remaining: left };
                }
            }
            DrivePhase::Depart => transform.advance(travel),
        }
    }
}

/// Put the vehicle on the circle at `angle`, heading counter-clockwise.
fn place_on_circle(transform: &mut Transform, center: &Location, radius: f64, angle: f64) {
    transform.location = Location::new(
        angle.cos().mul_add(radius, center.x),
        angle.sin().mul_add(radius, center.y),
        transform.location.z,
    );
    transform.rotation = Rotation::new(
        transform.rotation.pitch,
        normalize_degrees((angle + FRAC_PI_2).to_degrees()),
        transform.rotation.roll,
    );
}
