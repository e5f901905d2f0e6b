//! Blueprint library and the default actor catalog.

use circle_types::actor::COLOR_ATTRIBUTE;
use circle_types::{ActorBlueprint, BlueprintAttribute};
use serde::{Deserialize, Serialize};

use crate::filter::wildcard_match;

/// Paint colors offered by most vehicle blueprints, as `"r,g,b"`.
const VEHICLE_COLORS: &[&str] = &[
    "17,37,103",
    "255,255,255",
    "0,0,0",
    "79,33,85",
    "155,0,0",
    "212,212,212",
    "62,85,107",
];

/// Vehicle type ids in the default catalog and whether they are paintable.
const VEHICLES: &[(&str, bool)] = &[
    ("vehicle.audi.a2", true),
    ("vehicle.audi.tt", true),
    ("vehicle.bmw.grandtourer", true),
    ("vehicle.chevrolet.impala", true),
    ("vehicle.citroen.c3", true),
    ("vehicle.dodge.charger_police", false),
    ("vehicle.jeep.wrangler_rubicon", true),
    ("vehicle.lincoln.mkz_2017", true),
    ("vehicle.mercedes.coupe", true),
    ("vehicle.mini.cooper_s", true),
    ("vehicle.nissan.micra", true),
    ("vehicle.tesla.model3", true),
    ("vehicle.toyota.prius", true),
    ("vehicle.carlamotors.firetruck", false),
];

/// Pedestrian type ids in the default catalog.
const WALKERS: &[&str] = &[
    "walker.pedestrian.0001",
    "walker.pedestrian.0002",
    "walker.pedestrian.0003",
];

/// The set of blueprints a simulator can spawn from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintLibrary {
    blueprints: Vec<ActorBlueprint>,
}

impl BlueprintLibrary {
    /// Build a library from a list of blueprints.
    pub const fn new(blueprints: Vec<ActorBlueprint>) -> Self {
        Self { blueprints }
    }

    /// The built-in catalog: paintable and non-paintable vehicles plus a
    /// few pedestrians.
    pub fn default_catalog() -> Self {
        let mut blueprints = Vec::with_capacity(VEHICLES.len().saturating_add(WALKERS.len()));
        for &(id, paintable) in VEHICLES {
            let mut blueprint = ActorBlueprint::new(id)
                .with_attribute("number_of_wheels", BlueprintAttribute::new("4"));
            if paintable {
                blueprint = blueprint.with_attribute(
                    COLOR_ATTRIBUTE,
                    BlueprintAttribute::with_recommendations(VEHICLE_COLORS),
                );
            }
            blueprints.push(blueprint);
        }
        for &id in WALKERS {
            blueprints.push(
                ActorBlueprint::new(id)
                    .with_attribute("is_invincible", BlueprintAttribute::new("false")),
            );
        }
        Self { blueprints }
    }

    /// Blueprints whose id matches the wildcard `pattern`.
    #[must_use]
    pub fn filter(&self, pattern: &str) -> Self {
        Self {
            blueprints: self
                .blueprints
                .iter()
                .filter(|bp| wildcard_match(pattern, &bp.id))
                .cloned()
                .collect(),
        }
    }

    /// Find a blueprint by exact id.
    pub fn find(&self, id: &str) -> Option<&ActorBlueprint> {
        self.blueprints.iter().find(|bp| bp.id == id)
    }

    /// All blueprints in catalog order.
    pub fn as_slice(&self) -> &[ActorBlueprint] {
        &self.blueprints
    }

    /// Number of blueprints.
    pub const fn len(&self) -> usize {
        self.blueprints.len()
    }

    /// Whether the library is empty.
    pub const fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_contains_vehicles_and_walkers() {
        let library = BlueprintLibrary::default_catalog();
        assert_eq!(library.len(), VEHICLES.len() + WALKERS.len());
        assert_eq!(library.filter("vehicle.*").len(), VEHICLES.len());
        assert_eq!(library.filter("walker.*").len(), WALKERS.len());
    }

    #[test]
    fn some_vehicles_are_not_paintable() {
        let vehicles = BlueprintLibrary::default_catalog().filter("vehicle.*");
        let paintable = vehicles
            .as_slice()
            .iter()
            .filter(|bp| bp.has_attribute(COLOR_ATTRIBUTE))
            .count();
        assert!(paintable > 0);
        assert!(paintable < vehicles.len());
    }

    #[test]
    fn filter_with_no_match_is_empty() {
        let library = BlueprintLibrary::default_catalog();
        assert!(library.filter("static.prop.*").is_empty());
    }

    #[test]
    fn find_by_exact_id() {
        let library = BlueprintLibrary::default_catalog();
        assert!(library.find("vehicle.tesla.model3").is_some());
        assert!(library.find("vehicle.tesla").is_none());
    }
}
