//! Random blueprint selection.

use circle_sim::BlueprintLibrary;
use circle_types::ActorBlueprint;
use circle_types::actor::{COLOR_ATTRIBUTE, ROLE_NAME_ATTRIBUTE};
use rand::Rng;
use rand::seq::IndexedRandom;

/// Pick a blueprint at random, paint it, and tag its role.
///
/// If the chosen blueprint has a `color` attribute, one of its recommended
/// values is picked at random. `role_name` is always set to `role_name`.
/// Returns `None` only for an empty library.
pub fn randomize_blueprint<R: Rng + ?Sized>(
    library: &BlueprintLibrary,
    role_name: &str,
    rng: &mut R,
) -> Option<ActorBlueprint> {
    let mut blueprint = library.as_slice().choose(rng)?.clone();

    let color = blueprint
        .attribute(COLOR_ATTRIBUTE)
        .and_then(|attr| attr.recommended_values.choose(rng))
        .cloned();
    if let Some(color) = color {
        blueprint.set_attribute(COLOR_ATTRIBUTE, &color);
    }

    blueprint.set_attribute(ROLE_NAME_ATTRIBUTE, role_name);
    Some(blueprint)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use circle_types::BlueprintAttribute;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn empty_library_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(randomize_blueprint(&BlueprintLibrary::default(), "autopilot", &mut rng).is_none());
    }

    #[test]
    fn role_name_is_always_set() {
        let mut rng = StdRng::seed_from_u64(2);
        let library = BlueprintLibrary::default_catalog().filter("vehicle.*");
        for _ in 0..50 {
            let bp = randomize_blueprint(&library, "autopilot", &mut rng).unwrap();
            assert_eq!(
                bp.attribute(ROLE_NAME_ATTRIBUTE).map(|a| a.value.as_str()),
                Some("autopilot")
            );
            assert!(bp.is_vehicle());
        }
    }

    #[test]
    fn color_comes_from_recommendations() {
        let mut rng = StdRng::seed_from_u64(3);
        let library = BlueprintLibrary::new(vec![ActorBlueprint::new("vehicle.audi.tt").with_attribute(
            COLOR_ATTRIBUTE,
            BlueprintAttribute::with_recommendations(&["1,1,1", "2,2,2", "3,3,3"]),
        )]);

        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..60 {
            let bp = randomize_blueprint(&library, "autopilot", &mut rng).unwrap();
            let color = bp.attribute(COLOR_ATTRIBUTE).unwrap();
            assert!(color.recommended_values.contains(&color.value));
            seen.insert(color.value.clone());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn unpaintable_blueprint_gets_no_color() {
        let mut rng = StdRng::seed_from_u64(4);
        let library = BlueprintLibrary::new(vec![ActorBlueprint::new("vehicle.carlamotors.firetruck")]);
        let bp = randomize_blueprint(&library, "autopilot", &mut rng).unwrap();
        assert!(!bp.has_attribute(COLOR_ATTRIBUTE));
    }
}
