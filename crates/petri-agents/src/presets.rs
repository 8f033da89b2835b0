//! Built-in species profiles.
//!
//! These reproduce the classic tuning of the four species. Any of them can
//! be replaced wholesale through the `species` list in `petri-config.yaml`.

use petri_types::{ActionKind, Rgb, ShapeKind, Species};

use crate::engine::RuleSet;
use crate::error::RuleError;
use crate::rule::{BehaviorRule, Bounds};
use crate::species::{DEFAULT_MAX_AGE, GrowthPolicy, SpeciesProfile, SplitPolicy, SquishPolicy};

/// Fraction of an eaten cell's mass turned into energy.
pub const MASS_YIELD: f64 = 1.0 / 12.0;

/// Mass of food pellets dropped by the passive feeder.
pub const FEED_PELLET_MASS: f64 = 35.0;

/// Yellow.
pub const AGAR_COLOR: Rgb = Rgb::new(255, 255, 0);
/// Lawn green.
pub const GRAZER_COLOR: Rgb = Rgb::new(124, 252, 0);
/// Hot pink.
pub const PREDATOR_COLOR: Rgb = Rgb::new(255, 105, 180);
/// Forest green.
pub const PLANT_COLOR: Rgb = Rgb::new(34, 139, 34);

/// The built-in profile for `species`.
pub fn profile(species: Species) -> SpeciesProfile {
    match species {
        Species::Agar => agar(),
        Species::Grazer => grazer(),
        Species::Predator => predator(),
        Species::Plant => plant(),
    }
}

/// Food pellet: blind, motionless, immortal.
pub fn agar() -> SpeciesProfile {
    SpeciesProfile {
        species: Species::Agar,
        rules: rules(vec![BehaviorRule::builder(ActionKind::Sleep).priority(1).build()]),
        mass: FEED_PELLET_MASS,
        energy: 25.0,
        health: 0,
        friction: 0.0,
        vision: 0.0,
        max_age: None,
        color: AGAR_COLOR,
        shape: ShapeKind::Circle,
        quiet: true,
        growth: GrowthPolicy::None,
        split: SplitPolicy::None,
        squish: SquishPolicy::None,
    }
}

/// Herbivore.
pub fn grazer() -> SpeciesProfile {
    SpeciesProfile {
        species: Species::Grazer,
        rules: rules(vec![
            BehaviorRule::builder(ActionKind::Eat)
                .target(Species::Agar)
                .engulfed()
                .mass_yield(MASS_YIELD)
                .priority(1)
                .build(),
            BehaviorRule::builder(ActionKind::Clone)
                .self_energy(Bounds::at_least(150.0))
                .self_mass(Bounds::at_least(140.0))
                .priority(2)
                .build(),
            BehaviorRule::builder(ActionKind::Evade)
                .target(Species::Predator)
                .distance(Bounds::at_least(45.0))
                .relative_mass(Bounds::at_most(-100.0))
                .cost(0.25)
                .priority(1)
                .build(),
            BehaviorRule::builder(ActionKind::Pursue)
                .target(Species::Agar)
                .cost(0.25)
                .priority(2)
                .build(),
            BehaviorRule::builder(ActionKind::Nibble)
                .target(Species::Plant)
                .touching()
                .target_mass(Bounds::at_least(50.0))
                .cooldown(5)
                .priority(1)
                .build(),
            BehaviorRule::builder(ActionKind::Pursue)
                .target(Species::Plant)
                .target_mass(Bounds::at_least(50.0))
                .cost(0.25)
                .priority(3)
                .build(),
            BehaviorRule::builder(ActionKind::Sleep)
                .self_energy(Bounds::at_most(10.0))
                .cost(0.1)
                .priority(4)
                .build(),
            BehaviorRule::builder(ActionKind::Wander)
                .cost(0.25)
                .priority(5)
                .build(),
        ]),
        mass: 50.0,
        energy: 75.0,
        health: 100,
        friction: 0.85,
        vision: 50.0,
        max_age: Some(DEFAULT_MAX_AGE),
        color: GRAZER_COLOR,
        shape: ShapeKind::Circle,
        quiet: false,
        growth: GrowthPolicy::Threshold {
            photosynthesis: 0.0,
            grow_above: 75.0,
            grow_below_mass: 150.0,
            grow_step: 20.0,
            grow_cost: 3.0,
            grow_chance: 1.0,
            shrink_below: 25.0,
            shrink_above_mass: 30.0,
            shrink_step: 20.0,
            shrink_refund: 1.0,
        },
        split: SplitPolicy::Halve { cost: 20.0 },
        squish: SquishPolicy::SameSpecies {
            min_age: 3,
            min_mass: 35.0,
        },
    }
}

/// Carnivore.
pub fn predator() -> SpeciesProfile {
    SpeciesProfile {
        species: Species::Predator,
        rules: rules(vec![
            BehaviorRule::builder(ActionKind::Eat)
                .target(Species::Agar)
                .engulfed()
                .mass_yield(MASS_YIELD)
                .priority(1)
                .build(),
            BehaviorRule::builder(ActionKind::Eat)
                .target(Species::Grazer)
                .engulfed()
                .relative_mass(Bounds::at_least(3.0))
                .mass_yield(MASS_YIELD)
                .priority(1)
                .build(),
            BehaviorRule::builder(ActionKind::Clone)
                .self_energy(Bounds::at_least(150.0))
                .self_mass(Bounds::at_least(200.0))
                .priority(2)
                .build(),
            BehaviorRule::builder(ActionKind::Hunt)
                .target(Species::Grazer)
                .distance(Bounds::between(10.0, 40.0))
                .relative_mass(Bounds::at_least(3.0))
                .self_energy(Bounds::at_least(20.0))
                .priority(3)
                .build(),
            BehaviorRule::builder(ActionKind::Pursue)
                .target(Species::Grazer)
                .relative_mass(Bounds::at_least(3.0))
                .priority(4)
                .build(),
            BehaviorRule::builder(ActionKind::Pursue)
                .target(Species::Agar)
                .priority(5)
                .build(),
            BehaviorRule::builder(ActionKind::Wander).priority(6).build(),
        ]),
        mass: 100.0,
        energy: 100.0,
        health: 100,
        friction: 0.8,
        vision: 70.0,
        max_age: Some(DEFAULT_MAX_AGE),
        color: PREDATOR_COLOR,
        shape: ShapeKind::Circle,
        quiet: true,
        growth: GrowthPolicy::Threshold {
            photosynthesis: 0.0,
            grow_above: 90.0,
            grow_below_mass: 200.0,
            grow_step: 20.0,
            grow_cost: 8.0,
            grow_chance: 1.0,
            shrink_below: 20.0,
            shrink_above_mass: 50.0,
            shrink_step: 20.0,
            shrink_refund: 7.0,
        },
        split: SplitPolicy::Halve { cost: 20.0 },
        squish: SquishPolicy::SameSpecies {
            min_age: 3,
            min_mass: 35.0,
        },
    }
}

/// Stationary photosynthesizer.
pub fn plant() -> SpeciesProfile {
    SpeciesProfile {
        species: Species::Plant,
        rules: rules(vec![
            BehaviorRule::builder(ActionKind::Clone)
                .max_population(3)
                .self_mass(Bounds::at_least(450.0))
                .self_energy(Bounds::at_least(175.0))
                .priority(1)
                .build(),
            BehaviorRule::builder(ActionKind::Sleep).priority(2).build(),
        ]),
        mass: 100.0,
        energy: 100.0,
        health: 100,
        friction: 0.0,
        vision: 100.0,
        max_age: Some(DEFAULT_MAX_AGE),
        color: PLANT_COLOR,
        shape: ShapeKind::Square,
        quiet: false,
        growth: GrowthPolicy::Threshold {
            photosynthesis: 0.5,
            grow_above: 200.0,
            grow_below_mass: 750.0,
            grow_step: 20.0,
            grow_cost: 2.0,
            grow_chance: 0.5,
            shrink_below: 30.0,
            shrink_above_mass: 30.0,
            shrink_step: 20.0,
            shrink_refund: 2.0,
        },
        split: SplitPolicy::Seed {
            energy_cost: 100.0,
            mass_cost: 35.0,
            seed_mass: 35.0,
            seed_energy: 25.0,
            scatter: 0.5,
        },
        squish: SquishPolicy::All {
            min_age: 1,
            own_species_factor: 3.0,
        },
    }
}

/// Collect preset rules, logging and dropping any that fail to build.
fn rules(built: Vec<Result<BehaviorRule, RuleError>>) -> RuleSet {
    built
        .into_iter()
        .filter_map(|rule| {
            rule.inspect_err(|err| tracing::error!(error = %err, "invalid preset rule"))
                .ok()
        })
        .collect()
}
