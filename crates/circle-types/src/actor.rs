//! Blueprints and actor snapshots.
//!
//! An [`ActorBlueprint`] is the template a spawn request is made from; an
//! [`ActorSnapshot`] is what the simulator reports back about a live actor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{Location, Transform};
use crate::ids::ActorId;

/// Attribute key for the paint color of a vehicle.
pub const COLOR_ATTRIBUTE: &str = "color";

/// Attribute key for the role an actor plays in the scenario.
pub const ROLE_NAME_ATTRIBUTE: &str = "role_name";

/// Marker in a type id that identifies a vehicle.
pub const VEHICLE_TAG: &str = "vehicle";

/// Whether `type_id` names a vehicle.
pub fn is_vehicle_type(type_id: &str) -> bool {
    type_id.contains(VEHICLE_TAG)
}

/// One configurable attribute of a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintAttribute {
    /// Current value.
    pub value: String,
    /// Values the simulator suggests for this attribute.
    #[serde(default)]
    pub recommended_values: Vec<String>,
}

impl BlueprintAttribute {
    /// An attribute with a value and no recommendations.
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
            recommended_values: Vec::new(),
        }
    }

    /// An attribute whose initial value is the first recommendation.
    pub fn with_recommendations(recommended: &[&str]) -> Self {
        Self {
            value: recommended.first().copied().unwrap_or_default().to_owned(),
            recommended_values: recommended.iter().map(|&v| v.to_owned()).collect(),
        }
    }
}

/// A template for spawning an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorBlueprint {
    /// Type id, e.g. `vehicle.tesla.model3`.
    pub id: String,
    /// Named attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, BlueprintAttribute>,
}

impl ActorBlueprint {
    /// A blueprint with the given id and a default `role_name`.
    pub fn new(id: &str) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(ROLE_NAME_ATTRIBUTE.to_owned(), BlueprintAttribute::new("none"));
        Self {
            id: id.to_owned(),
            attributes,
        }
    }

    /// Builder-style attribute insertion.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, attribute: BlueprintAttribute) -> Self {
        self.attributes.insert(name.to_owned(), attribute);
        self
    }

    /// Whether the blueprint carries the named attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Look up an attribute.
    pub fn attribute(&self, name: &str) -> Option<&BlueprintAttribute> {
        self.attributes.get(name)
    }

    /// Set an attribute's value, creating it if absent.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        self.attributes
            .entry(name.to_owned())
            .and_modify(|attr| value.clone_into(&mut attr.value))
            .or_insert_with(|| BlueprintAttribute::new(value));
    }

    /// Whether this blueprint spawns a vehicle.
    pub fn is_vehicle(&self) -> bool {
        is_vehicle_type(&self.id)
    }

    /// Flatten attributes to their current values.
    pub fn attribute_values(&self) -> BTreeMap<String, String> {
        self.attributes
            .iter()
            .map(|(name, attr)| (name.clone(), attr.value.clone()))
            .collect()
    }
}

/// What the simulator reports about a live actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    /// Simulator-assigned id.
    pub id: ActorId,
    /// Blueprint type id the actor was spawned from.
    pub type_id: String,
    /// Current pose.
    pub transform: Transform,
    /// Attribute values fixed at spawn time.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Whether the simulator is driving this actor.
    #[serde(default)]
    pub autopilot: bool,
}

impl ActorSnapshot {
    /// Current location.
    pub const fn location(&self) -> Location {
        self.transform.location
    }

    /// Whether the actor's type contains `vehicle`.
    pub fn is_vehicle(&self) -> bool {
        is_vehicle_type(&self.type_id)
    }

    /// The `role_name` attribute, if set.
    pub fn role_name(&self) -> Option<&str> {
        self.attributes.get(ROLE_NAME_ATTRIBUTE).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rotation;

    #[test]
    fn new_blueprint_has_role_name() {
        let bp = ActorBlueprint::new("vehicle.audi.tt");
        assert!(bp.has_attribute(ROLE_NAME_ATTRIBUTE));
        assert!(!bp.has_attribute(COLOR_ATTRIBUTE));
        assert!(bp.is_vehicle());
    }

    #[test]
    fn set_attribute_overwrites_and_keeps_recommendations() {
        let mut bp = ActorBlueprint::new("vehicle.audi.tt").with_attribute(
            COLOR_ATTRIBUTE,
            BlueprintAttribute::with_recommendations(&["255,0,0", "0,0,255"]),
        );
        assert_eq!(
            bp.attribute(COLOR_ATTRIBUTE).map(|a| a.value.as_str()),
            Some("255,0,0")
        );

        bp.set_attribute(COLOR_ATTRIBUTE, "0,0,255");
        let color = bp.attribute(COLOR_ATTRIBUTE);
        assert_eq!(color.map(|a| a.value.as_str()), Some("0,0,255"));
        assert_eq!(color.map(|a| a.recommended_values.len()), Some(2));
    }

    #[test]
    fn set_attribute_creates_missing() {
        let mut bp = ActorBlueprint::new("walker.pedestrian.0001");
        bp.set_attribute("speed", "1.4");
        assert_eq!(bp.attribute_values().get("speed").map(String::as_str), Some("1.4"));
        assert!(!bp.is_vehicle());
    }

    #[test]
    fn snapshot_reports_role_and_kind() {
        let mut attributes = BTreeMap::new();
        attributes.insert(ROLE_NAME_ATTRIBUTE.to_owned(), "autopilot".to_owned());
        let snapshot = ActorSnapshot {
            id: ActorId::new(1),
            type_id: "vehicle.tesla.model3".to_owned(),
            transform: Transform::new(Location::new(1.0, 2.0, 0.0), Rotation::default()),
            attributes,
            autopilot: true,
        };
        assert!(snapshot.is_vehicle());
        assert_eq!(snapshot.role_name(), Some("autopilot"));
        assert_eq!(snapshot.location(), Location::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn blueprints_and_snapshots_agree_on_vehicles() {
        for type_id in ["vehicle.audi.tt", "static.prop.vehicle_barrier", "walker.pedestrian.0001"] {
            let snapshot = ActorSnapshot {
                id: ActorId::new(1),
                type_id: type_id.to_owned(),
                transform: Transform::default(),
                attributes: BTreeMap::new(),
                autopilot: false,
            };
            assert_eq!(ActorBlueprint::new(type_id).is_vehicle(), snapshot.is_vehicle(), "{type_id}");
        }
        assert!(is_vehicle_type("static.prop.vehicle_barrier"));
        assert!(!is_vehicle_type("walker.pedestrian.0001"));
    }
}
