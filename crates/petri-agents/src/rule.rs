//! Declarative behavior rules.
//!
//! A [`BehaviorRule`] says "perform this action, on a target of this species,
//! when these conditions hold". Rules are built through [`RuleBuilder`] or
//! deserialized as a [`RuleConfig`]; both paths validate the rule once and
//! hand back a value that can no longer be misconfigured.
//!
//! All bounds are inclusive.

use petri_types::{ActionCategory, ActionKind, Species};
use serde::{Deserialize, Serialize};

use crate::error::RuleError;

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// An optional inclusive `[min, max]` interval.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    /// Lower bound, if any.
    pub min: Option<f64>,
    /// Upper bound, if any.
    pub max: Option<f64>,
}

impl Bounds {
    /// No constraint at all.
    pub const ANY: Self = Self {
        min: None,
        max: None,
    };

    /// `value >= min`.
    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// `value <= max`.
    pub const fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    /// `min <= value <= max`.
    pub const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Whether `value` lies inside the interval.
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    /// Whether neither end is set.
    pub const fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    fn validated(self, field: &'static str) -> Result<Self, RuleError> {
        for value in [self.min, self.max].into_iter().flatten() {
            if !value.is_finite() {
                return Err(RuleError::InvalidValue { field, value });
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max)
            && min > max
        {
            return Err(RuleError::InvertedBounds { field, min, max });
        }
        Ok(self)
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// Constraints a candidate target must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpec {
    /// Required species.
    pub species: Species,
    /// Target mass.
    pub mass: Bounds,
    /// Centre-to-centre distance from the acting cell.
    pub distance: Bounds,
    /// `self.mass - target.mass`.
    pub relative_mass: Bounds,
    /// Target must overlap the acting cell's outline.
    pub touching: bool,
    /// Target's centre must lie inside the acting cell.
    pub engulfed: bool,
}

impl TargetSpec {
    /// Whether either hitbox flag is set.
    pub const fn needs_contact(&self) -> bool {
        self.touching || self.engulfed
    }
}

/// A validated behavior rule.
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorRule {
    action: ActionKind,
    priority: u32,
    target: Option<TargetSpec>,
    self_mass: Bounds,
    self_energy: Bounds,
    max_population: Option<u32>,
    energy_cost: f64,
    cooldown: u32,
    mass_yield: f64,
}

impl BehaviorRule {
    /// Start building a rule for `action`.
    pub const fn builder(action: ActionKind) -> RuleBuilder {
        RuleBuilder::new(action)
    }

    /// The action performed when this rule fires.
    pub const fn action(&self) -> ActionKind {
        self.action
    }

    /// Category derived from the action.
    pub const fn category(&self) -> ActionCategory {
        self.action.category()
    }

    /// Lower fires first.
    pub const fn priority(&self) -> u32 {
        self.priority
    }

    /// Target constraints, `None` when the rule needs no target.
    pub const fn target(&self) -> Option<&TargetSpec> {
        self.target.as_ref()
    }

    /// Acting cell's own mass bounds.
    pub const fn self_mass(&self) -> Bounds {
        self.self_mass
    }

    /// Acting cell's own energy bounds.
    pub const fn self_energy(&self) -> Bounds {
        self.self_energy
    }

    /// Maximum visible same-species population, self included.
    pub const fn max_population(&self) -> Option<u32> {
        self.max_population
    }

    /// Energy subtracted after acting.
    pub const fn energy_cost(&self) -> f64 {
        self.energy_cost
    }

    /// Ticks the rule stays unavailable after firing.
    pub const fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Fraction of an eaten target's mass converted to energy.
    pub const fn mass_yield(&self) -> f64 {
        self.mass_yield
    }
}

/// Builder for [`BehaviorRule`].
#[derive(Debug, Clone)]
#[must_use]
pub struct RuleBuilder {
    action: ActionKind,
    priority: u32,
    species: Option<Species>,
    target_mass: Bounds,
    distance: Bounds,
    relative_mass: Bounds,
    touching: bool,
    engulfed: bool,
    self_mass: Bounds,
    self_energy: Bounds,
    max_population: Option<u32>,
    energy_cost: f64,
    cooldown: u32,
    mass_yield: f64,
}

impl RuleBuilder {
    const fn new(action: ActionKind) -> Self {
        Self {
            action,
            priority: 1,
            species: None,
            target_mass: Bounds::ANY,
            distance: Bounds::ANY,
            relative_mass: Bounds::ANY,
            touching: false,
            engulfed: false,
            self_mass: Bounds::ANY,
            self_energy: Bounds::ANY,
            max_population: None,
            energy_cost: 0.0,
            cooldown: 0,
            mass_yield: 0.0,
        }
    }

    /// Set the priority (default 1).
    pub const fn priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Require a target of `species`.
    pub const fn target(mut self, species: Species) -> Self {
        self.species = Some(species);
        self
    }

    /// Constrain the target's mass.
    pub const fn target_mass(mut self, bounds: Bounds) -> Self {
        self.target_mass = bounds;
        self
    }

    /// Constrain the distance to the target.
    pub const fn distance(mut self, bounds: Bounds) -> Self {
        self.distance = bounds;
        self
    }

    /// Constrain `self.mass - target.mass`.
    pub const fn relative_mass(mut self, bounds: Bounds) -> Self {
        self.relative_mass = bounds;
        self
    }

    /// Accept targets that touch the acting cell.
    pub const fn touching(mut self) -> Self {
        self.touching = true;
        self
    }

    /// Accept targets engulfed by the acting cell.
    pub const fn engulfed(mut self) -> Self {
        self.engulfed = true;
        self
    }

    /// Constrain the acting cell's mass.
    pub const fn self_mass(mut self, bounds: Bounds) -> Self {
        self.self_mass = bounds;
        self
    }

    /// Constrain the acting cell's energy.
    pub const fn self_energy(mut self, bounds: Bounds) -> Self {
        self.self_energy = bounds;
        self
    }

    /// Only fire while fewer than `max` same-species cells are visible,
    /// counting the acting cell.
    pub const fn max_population(mut self, max: u32) -> Self {
        self.max_population = Some(max);
        self
    }

    /// Energy spent each time the rule fires.
    pub const fn cost(mut self, energy: f64) -> Self {
        self.energy_cost = energy;
        self
    }

    /// Ticks before the rule may fire again.
    pub const fn cooldown(mut self, ticks: u32) -> Self {
        self.cooldown = ticks;
        self
    }

    /// Fraction of an eaten target's mass turned into energy.
    pub const fn mass_yield(mut self, fraction: f64) -> Self {
        self.mass_yield = fraction;
        self
    }

    /// Validate and produce the rule.
    ///
    /// # Errors
    ///
    /// - [`RuleError::MissingTarget`] if the action needs a target and none
    ///   was given.
    /// - [`RuleError::InvertedBounds`] if any bound pair is inverted.
    /// - [`RuleError::InvalidValue`] for non-finite numbers or a negative
    ///   mass yield.
    pub fn build(self) -> Result<BehaviorRule, RuleError> {
        if self.action.needs_target() && self.species.is_none() {
            return Err(RuleError::MissingTarget {
                action: self.action,
            });
        }
        if !self.energy_cost.is_finite() {
            return Err(RuleError::InvalidValue {
                field: "energy_cost",
                value: self.energy_cost,
            });
        }
        if !self.mass_yield.is_finite() || self.mass_yield < 0.0 {
            return Err(RuleError::InvalidValue {
                field: "mass_yield",
                value: self.mass_yield,
            });
        }

        let target = match self.species {
            Some(species) => Some(TargetSpec {
                species,
                mass: self.target_mass.validated("target_mass")?,
                distance: self.distance.validated("distance")?,
                relative_mass: self.relative_mass.validated("relative_mass")?,
                touching: self.touching,
                engulfed: self.engulfed,
            }),
            None => None,
        };

        Ok(BehaviorRule {
            action: self.action,
            priority: self.priority,
            target,
            self_mass: self.self_mass.validated("self_mass")?,
            self_energy: self.self_energy.validated("self_energy")?,
            max_population: self.max_population,
            energy_cost: self.energy_cost,
            cooldown: self.cooldown,
            mass_yield: self.mass_yield,
        })
    }
}

// ---------------------------------------------------------------------------
// Configuration form
// ---------------------------------------------------------------------------

/// A rule as written in `petri-config.yaml`.
///
/// The action is named by string and parsed in [`TryFrom`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Action name, e.g. `"pursue"`.
    pub action: String,
    /// Lower fires first.
    #[serde(default = "default_priority")]
    pub priority: u32,
    /// Target species, if the action needs one.
    #[serde(default)]
    pub target: Option<Species>,
    /// Target mass bounds.
    #[serde(default)]
    pub target_mass: Bounds,
    /// Distance bounds.
    #[serde(default)]
    pub distance: Bounds,
    /// Relative mass bounds.
    #[serde(default)]
    pub relative_mass: Bounds,
    /// Target must touch.
    #[serde(default)]
    pub touching: bool,
    /// Target must be engulfed.
    #[serde(default)]
    pub engulfed: bool,
    /// Own mass bounds.
    #[serde(default)]
    pub self_mass: Bounds,
    /// Own energy bounds.
    #[serde(default)]
    pub self_energy: Bounds,
    /// Maximum visible same-species population.
    #[serde(default)]
    pub max_population: Option<u32>,
    /// Energy cost.
    #[serde(default)]
    pub cost: f64,
    /// Cooldown in ticks.
    #[serde(default)]
    pub cooldown: u32,
    /// Mass-to-energy fraction for `eat`.
    #[serde(default)]
    pub mass_yield: f64,
}

const fn default_priority() -> u32 {
    1
}

impl TryFrom<RuleConfig> for BehaviorRule {
    type Error = RuleError;

    fn try_from(config: RuleConfig) -> Result<Self, Self::Error> {
        let action: ActionKind = config.action.parse()?;
        let mut builder = Self::builder(action)
            .priority(config.priority)
            .target_mass(config.target_mass)
            .distance(config.distance)
            .relative_mass(config.relative_mass)
            .self_mass(config.self_mass)
            .self_energy(config.self_energy)
            .cost(config.cost)
            .cooldown(config.cooldown)
            .mass_yield(config.mass_yield);
        if let Some(species) = config.target {
            builder = builder.target(species);
        }
        if config.touching {
            builder = builder.touching();
        }
        if config.engulfed {
            builder = builder.engulfed();
        }
        if let Some(max) = config.max_population {
            builder = builder.max_population(max);
        }
        builder.build()
    }
}
