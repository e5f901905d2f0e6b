//! Town map: a traffic circle at the origin fed by eight radial roads.
//!
//! The layout stands in for the roundabout district of `Town03`. Spawn
//! points sit on the radial roads in rings of increasing distance from the
//! circle, alternating between inbound lanes (heading toward the circle)
//! and outbound lanes (heading away). Every spawn point lies within 100 m
//! of the centre.

use core::f64::consts::TAU;

use circle_types::{Location, Rotation, Transform};
use serde::{Deserialize, Serialize};

/// Number of spawn points on the generated map.
pub const SPAWN_POINT_COUNT: u32 = 265;

/// Radius of the traffic circle's driving line, in meters.
pub const ROUNDABOUT_RADIUS_M: f64 = 20.0;

/// Number of radial roads feeding the circle.
const ARM_COUNT: u32 = 8;

/// Number of distance rings per lane.
const RINGS_PER_LANE: u32 = 12;

/// Distance from the centre to the first ring of spawn points.
const FIRST_RING_M: f64 = 30.0;

/// Spacing between consecutive rings.
const RING_SPACING_M: f64 = 5.5;

/// Lateral offset of a lane's centreline from the road axis.
const LANE_WIDTH_M: f64 = 3.5;

/// Spawn height above the road surface.
const SPAWN_HEIGHT_M: f64 = 0.5;

/// A drivable map with its spawn points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TownMap {
    /// Map name.
    pub name: String,
    /// Centre of the traffic circle.
    pub center: Location,
    /// Radius of the circle's driving line.
    pub roundabout_radius: f64,
    spawn_points: Vec<Transform>,
}

impl TownMap {
    /// The traffic circle map used by the scenario.
    pub fn town03() -> Self {
        let center = Location::ORIGIN;
        let spawn_points = (0..SPAWN_POINT_COUNT)
            .map(|index| spawn_point_at(center, index))
            .collect();
        Self {
            name: "Town03".to_owned(),
            center,
            roundabout_radius: ROUNDABOUT_RADIUS_M,
            spawn_points,
        }
    }

    /// All spawn points, indexed positionally.
    pub fn spawn_points(&self) -> &[Transform] {
        &self.spawn_points
    }

    /// The spawn point at `index`, if it exists.
    pub fn spawn_point(&self, index: usize) -> Option<&Transform> {
        self.spawn_points.get(index)
    }
}

/// Lay out spawn point `index`.
///
/// Points cycle through the arms first, so consecutive indices land on
/// different roads. Lanes alternate inbound, outbound, inbound (second
/// inbound lane, one lane width further out).
fn spawn_point_at(center: Location, index: u32) -> Transform {
    let arm = index % ARM_COUNT;
    let slot = index / ARM_COUNT;
    let ring = slot % RINGS_PER_LANE;
    let lane = slot / RINGS_PER_LANE;

    let bearing = TAU * f64::from(arm) / f64::from(ARM_COUNT);
    let distance = f64::from(ring).mul_add(RING_SPACING_M, FIRST_RING_M);
    let inbound = lane.is_multiple_of(2);

    // Right-hand traffic: inbound lanes sit to the left of the outward axis.
    let lateral = match lane {
        0 => LANE_WIDTH_M,
        1 => -LANE_WIDTH_M,
        _ => 2.0 * LANE_WIDTH_M,
    };

    let (radial_x, radial_y) = (bearing.cos(), bearing.sin());
    let (left_x, left_y) = (-radial_y, radial_x);
    let location = center.translated(
        radial_x.mul_add(distance, left_x * lateral),
        radial_y.mul_add(distance, left_y * lateral),
        SPAWN_HEIGHT_M,
    );

    let outward_yaw = bearing.to_degrees();
    let yaw = if inbound {
        normalize_degrees(outward_yaw + 180.0)
    } else {
        outward_yaw
    };

    Transform::new(location, Rotation::from_yaw(yaw))
}

/// Wrap an angle into `[-180, 180)`.
pub fn normalize_degrees(angle: f64) -> f64 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}
