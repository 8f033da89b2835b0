//! Species profiles and the policies that parameterize them.
//!
//! Every cell of a species shares one [`SpeciesProfile`] through an `Arc`:
//! the rule set, the starting stats, and three policy enums describing how
//! the species grows, splits, and pushes its neighbours around. Profiles
//! can be built in code (see [`crate::presets`]) or loaded from YAML as a
//! [`SpeciesConfig`].

use petri_types::{Rgb, ShapeKind, Species};
use serde::{Deserialize, Serialize};

use crate::engine::RuleSet;
use crate::error::RuleError;
use crate::rule::{BehaviorRule, RuleConfig};

/// Age after which non-immortal presets may die of old age.
pub const DEFAULT_MAX_AGE: u64 = 3000;

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// How a species converts surplus energy into mass, and back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GrowthPolicy {
    /// Step growth above an energy threshold, step shrink below another.
    Threshold {
        /// Energy gained every tick before thresholds are checked.
        #[serde(default)]
        photosynthesis: f64,
        /// Grow while energy is strictly above this.
        grow_above: f64,
        /// ... and mass strictly below this.
        grow_below_mass: f64,
        /// Mass added per growth step.
        grow_step: f64,
        /// Energy spent per growth step.
        grow_cost: f64,
        /// Probability a growth step happens when eligible.
        #[serde(default = "certain")]
        grow_chance: f64,
        /// Shrink while energy is strictly below this.
        shrink_below: f64,
        /// ... and mass strictly above this.
        shrink_above_mass: f64,
        /// Mass removed per shrink step.
        shrink_step: f64,
        /// Energy recovered per shrink step.
        shrink_refund: f64,
    },
    /// Mass never changes on its own.
    None,
}

const fn certain() -> f64 {
    1.0
}

/// What the `clone` action does for a species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Pay `cost`, then divide energy and mass evenly with an identical
    /// child at the same position and velocity.
    Halve {
        /// Energy paid before halving.
        cost: f64,
    },
    /// Drop a small seed next to the parent.
    Seed {
        /// Energy the parent pays.
        energy_cost: f64,
        /// Mass the parent loses.
        mass_cost: f64,
        /// Mass of the seed.
        seed_mass: f64,
        /// Energy of the seed.
        seed_energy: f64,
        /// Maximum offset of the seed from the parent on each axis.
        scatter: f64,
    },
    /// `clone` does nothing.
    None,
}

/// Which touching cells a species pushes out of its way.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SquishPolicy {
    /// Push cells of the same species once older than `min_age` and
    /// heavier than `min_mass`.
    SameSpecies {
        /// Pusher must be strictly older.
        min_age: u64,
        /// Pusher must be strictly heavier.
        min_mass: f64,
    },
    /// Push everything once older than `min_age`; cells of the pusher's own
    /// species are pushed `own_species_factor` times farther.
    All {
        /// Pusher must be strictly older.
        min_age: u64,
        /// Distance multiplier for the pusher's own species.
        own_species_factor: f64,
    },
    /// Never push.
    None,
}

impl SquishPolicy {
    /// Whether a cell of this age and mass pushes at all.
    pub fn is_active(&self, age: u64, mass: f64) -> bool {
        match *self {
            Self::SameSpecies { min_age, min_mass } => age > min_age && mass > min_mass,
            Self::All { min_age, .. } => age > min_age,
            Self::None => false,
        }
    }

    /// Distance multiplier for pushing a cell of species `other`, or `None`
    /// when `other` is left alone.
    pub fn push_factor(&self, own: Species, other: Species) -> Option<f64> {
        match *self {
            Self::SameSpecies { .. } => (own == other).then_some(1.0),
            Self::All {
                own_species_factor,
                ..
            } => Some(if own == other { own_species_factor } else { 1.0 }),
            Self::None => None,
        }
    }
}

impl GrowthPolicy {
    /// Reject non-finite parameters and a `grow_chance` outside `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidValue`] naming the first bad field.
    pub fn validated(self) -> Result<Self, RuleError> {
        if let Self::Threshold {
            photosynthesis,
            grow_above,
            grow_below_mass,
            grow_step,
            grow_cost,
            grow_chance,
            shrink_below,
            shrink_above_mass,
            shrink_step,
            shrink_refund,
        } = self
        {
            all_finite(&[
                ("photosynthesis", photosynthesis),
                ("grow_above", grow_above),
                ("grow_below_mass", grow_below_mass),
                ("grow_step", grow_step),
                ("grow_cost", grow_cost),
                ("grow_chance", grow_chance),
                ("shrink_below", shrink_below),
                ("shrink_above_mass", shrink_above_mass),
                ("shrink_step", shrink_step),
                ("shrink_refund", shrink_refund),
            ])?;
            if !(0.0..=1.0).contains(&grow_chance) {
                return Err(RuleError::InvalidValue {
                    field: "grow_chance",
                    value: grow_chance,
                });
            }
        }
        Ok(self)
    }
}

impl SplitPolicy {
    /// Reject non-finite parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidValue`] naming the first bad field.
    pub fn validated(self) -> Result<Self, RuleError> {
        match self {
            Self::Halve { cost } => all_finite(&[("cost", cost)])?,
            Self::Seed {
                energy_cost,
                mass_cost,
                seed_mass,
                seed_energy,
                scatter,
            } => all_finite(&[
                ("energy_cost", energy_cost),
                ("mass_cost", mass_cost),
                ("seed_mass", seed_mass),
                ("seed_energy", seed_energy),
                ("scatter", scatter),
            ])?,
            Self::None => {}
        }
        Ok(self)
    }
}

impl SquishPolicy {
    /// Reject non-finite parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidValue`] naming the first bad field.
    pub fn validated(self) -> Result<Self, RuleError> {
        match self {
            Self::SameSpecies { min_mass, .. } => all_finite(&[("min_mass", min_mass)])?,
            Self::All {
                own_species_factor, ..
            } => all_finite(&[("own_species_factor", own_species_factor)])?,
            Self::None => {}
        }
        Ok(self)
    }
}

fn all_finite(fields: &[(&'static str, f64)]) -> Result<(), RuleError> {
    for &(field, value) in fields {
        finite(field, value)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Everything that distinguishes one species from another.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesProfile {
    /// Species tag.
    pub species: Species,
    /// Behavior rules in selection order.
    pub rules: RuleSet,
    /// Mass of a freshly seeded cell.
    pub mass: f64,
    /// Energy of a freshly spawned cell.
    pub energy: f64,
    /// Cosmetic health.
    pub health: u32,
    /// Velocity multiplier applied every tick.
    pub friction: f64,
    /// Base vision range; zero means blind.
    pub vision: f64,
    /// Age limit, `None` for immortal.
    pub max_age: Option<u64>,
    /// Fill color.
    pub color: Rgb,
    /// Sprite outline.
    pub shape: ShapeKind,
    /// Suppress lifecycle events for this species.
    pub quiet: bool,
    /// Growth and shrink behavior.
    pub growth: GrowthPolicy,
    /// Clone behavior.
    pub split: SplitPolicy,
    /// Overlap resolution.
    pub squish: SquishPolicy,
}

/// A species profile as written in `petri-config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    /// Which species this replaces.
    pub species: Species,
    /// Behavior rules, in any order.
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    /// Starting mass.
    pub mass: f64,
    /// Starting energy.
    pub energy: f64,
    /// Cosmetic health.
    #[serde(default)]
    pub health: u32,
    /// Friction coefficient.
    #[serde(default)]
    pub friction: f64,
    /// Base vision range.
    #[serde(default)]
    pub vision: f64,
    /// Age limit.
    #[serde(default)]
    pub max_age: Option<u64>,
    /// Fill color.
    pub color: Rgb,
    /// Sprite outline.
    #[serde(default = "circle")]
    pub shape: ShapeKind,
    /// Suppress lifecycle events.
    #[serde(default)]
    pub quiet: bool,
    /// Growth policy.
    #[serde(default = "no_growth")]
    pub growth: GrowthPolicy,
    /// Split policy.
    #[serde(default = "no_split")]
    pub split: SplitPolicy,
    /// Squish policy.
    #[serde(default = "no_squish")]
    pub squish: SquishPolicy,
}

const fn circle() -> ShapeKind {
    ShapeKind::Circle
}

const fn no_growth() -> GrowthPolicy {
    GrowthPolicy::None
}

const fn no_split() -> SplitPolicy {
    SplitPolicy::None
}

const fn no_squish() -> SquishPolicy {
    SquishPolicy::None
}

fn finite(field: &'static str, value: f64) -> Result<f64, RuleError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RuleError::InvalidValue { field, value })
    }
}

impl TryFrom<SpeciesConfig> for SpeciesProfile {
    type Error = RuleError;

    fn try_from(config: SpeciesConfig) -> Result<Self, Self::Error> {
        let rules = config
            .rules
            .into_iter()
            .map(BehaviorRule::try_from)
            .collect::<Result<RuleSet, _>>()?;
        let mass = finite("mass", config.mass)?;
        if mass <= 0.0 {
            return Err(RuleError::InvalidValue { field: "mass", value: mass });
        }
        let vision = finite("vision", config.vision)?;
        if vision < 0.0 {
            return Err(RuleError::InvalidValue {
                field: "vision",
                value: vision,
            });
        }
        Ok(Self {
            species: config.species,
            rules,
            mass,
            energy: finite("energy", config.energy)?,
            health: config.health,
            friction: finite("friction", config.friction)?,
            vision,
            max_age: config.max_age,
            color: config.color,
            shape: config.shape,
            quiet: config.quiet,
            growth: config.growth.validated()?,
            split: config.split.validated()?,
            squish: config.squish.validated()?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use petri_types::ActionKind;

    #[test]
    fn same_species_squish_thresholds_are_strict() {
        let policy = SquishPolicy::SameSpecies {
            min_age: 3,
            min_mass: 35.0,
        };
        assert!(!policy.is_active(3, 50.0));
        assert!(!policy.is_active(4, 35.0));
        assert!(policy.is_active(4, 35.5));
        assert_eq!(policy.push_factor(Species::Grazer, Species::Grazer), Some(1.0));
        assert_eq!(policy.push_factor(Species::Grazer, Species::Agar), None);
    }

    #[test]
    fn all_squish_pushes_own_kind_farther() {
        let policy = SquishPolicy::All {
            min_age: 1,
            own_species_factor: 3.0,
        };
        assert!(policy.is_active(2, 0.0));
        assert_eq!(policy.push_factor(Species::Plant, Species::Plant), Some(3.0));
        assert_eq!(policy.push_factor(Species::Plant, Species::Grazer), Some(1.0));
        assert!(!SquishPolicy::None.is_active(100, 1000.0));
    }

    #[test]
    fn species_config_from_yaml() {
        let yaml = r"
species: Grazer
mass: 40
energy: 60
friction: 0.9
vision: 30
max_age: 500
color: { r: 10, g: 200, b: 10 }
growth:
  kind: threshold
  grow_above: 70
  grow_below_mass: 120
  grow_step: 10
  grow_cost: 2
  shrink_below: 20
  shrink_above_mass: 20
  shrink_step: 10
  shrink_refund: 1
split: { kind: halve, cost: 15 }
squish: { kind: same_species, min_age: 3, min_mass: 35 }
rules:
  - action: wander
    priority: 3
  - action: eat
    target: Agar
    engulfed: true
";
        let config: SpeciesConfig = serde_yml::from_str(yaml).unwrap();
        let profile = SpeciesProfile::try_from(config).unwrap();
        assert_eq!(profile.species, Species::Grazer);
        assert_eq!(profile.max_age, Some(500));
        assert_eq!(profile.shape, ShapeKind::Circle);
        assert_eq!(profile.rules.len(), 2);
        assert_eq!(profile.rules.get(0).unwrap().action(), ActionKind::Eat);
        assert!(matches!(
            profile.growth,
            GrowthPolicy::Threshold { grow_chance, .. } if (grow_chance - 1.0).abs() < f64::EPSILON
        ));
        assert_eq!(profile.split, SplitPolicy::Halve { cost: 15.0 });
    }

    #[test]
    fn species_config_rejects_bad_rule() {
        let yaml = r"
species: Predator
mass: 100
energy: 100
color: { r: 255, g: 105, b: 180 }
rules:
  - action: hunt
";
        let config: SpeciesConfig = serde_yml::from_str(yaml).unwrap();
        let err = SpeciesProfile::try_from(config).unwrap_err();
        assert!(matches!(err, RuleError::MissingTarget { .. }));
    }

    #[test]
    fn species_config_rejects_zero_mass() {
        let yaml = "species: Agar\nmass: 0\nenergy: 25\ncolor: { r: 255, g: 255, b: 0 }\n";
        let config: SpeciesConfig = serde_yml::from_str(yaml).unwrap();
        assert!(SpeciesProfile::try_from(config).is_err());
    }

    const PLANT_BASE: &str =
        "species: Plant\nmass: 100\nenergy: 100\ncolor: { r: 34, g: 139, b: 34 }\n";

    fn rejected_field(policy_yaml: &str) -> &'static str {
        let config: SpeciesConfig =
            serde_yml::from_str(&format!("{PLANT_BASE}{policy_yaml}")).unwrap();
        match SpeciesProfile::try_from(config).unwrap_err() {
            RuleError::InvalidValue { field, .. } => field,
            _ => "<not an invalid value>",
        }
    }

    #[test]
    fn species_config_rejects_nan_grow_chance() {
        let field = rejected_field(
            "growth:
  kind: threshold
  grow_above: 200
  grow_below_mass: 750
  grow_step: 20
  grow_cost: 2
  grow_chance: .nan
  shrink_below: 30
  shrink_above_mass: 30
  shrink_step: 20
  shrink_refund: 2
",
        );
        assert_eq!(field, "grow_chance");
    }

    #[test]
    fn species_config_rejects_grow_chance_above_one() {
        let field = rejected_field(
            "growth:
  kind: threshold
  grow_above: 200
  grow_below_mass: 750
  grow_step: 20
  grow_cost: 2
  grow_chance: 1.5
  shrink_below: 30
  shrink_above_mass: 30
  shrink_step: 20
  shrink_refund: 2
",
        );
        assert_eq!(field, "grow_chance");
    }

    #[test]
    fn species_config_rejects_infinite_seed_scatter() {
        let field = rejected_field(
            "split:
  kind: seed
  energy_cost: 100
  mass_cost: 35
  seed_mass: 35
  seed_energy: 25
  scatter: .inf
",
        );
        assert_eq!(field, "scatter");
    }

    #[test]
    fn species_config_rejects_nan_squish_factor() {
        let field =
            rejected_field("squish: { kind: all, min_age: 1, own_species_factor: .nan }\n");
        assert_eq!(field, "own_species_factor");
    }

    #[test]
    fn presets_pass_policy_validation() {
        for species in Species::ALL {
            let profile = crate::presets::profile(species);
            assert_eq!(profile.growth.validated().unwrap(), profile.growth);
            assert_eq!(profile.split.validated().unwrap(), profile.split);
            assert_eq!(profile.squish.validated().unwrap(), profile.squish);
        }
    }
}
