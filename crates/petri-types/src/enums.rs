//! Enumeration types for the Petri simulation.
//!
//! Species, action kinds and death causes are closed enums. Configuration
//! names them by string; the string form is parsed once, when the
//! configuration is loaded, and never compared at runtime afterwards.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A string did not name any known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {kind}: {value:?}")]
pub struct UnknownVariant {
    /// Which enumeration was being parsed (e.g. "species").
    pub kind: &'static str,
    /// The offending input.
    pub value: String,
}

// ---------------------------------------------------------------------------
// Species
// ---------------------------------------------------------------------------

/// The species tag carried by every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Species {
    /// Passive food pellet. Does nothing, exists to be eaten.
    Agar,
    /// Small herbivore that eats agar, nibbles plants and flees predators.
    Grazer,
    /// Hunter of grazers.
    Predator,
    /// Stationary photosynthesizer that spreads seeds.
    Plant,
}

impl Species {
    /// Every species, in declaration order.
    pub const ALL: [Self; 4] = [Self::Agar, Self::Grazer, Self::Predator, Self::Plant];

    /// Human-readable name used in event text.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Agar => "Agar",
            Self::Grazer => "Grazer",
            Self::Predator => "Predator",
            Self::Plant => "Plant",
        }
    }
}

impl core::fmt::Display for Species {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Species {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|species| species.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant {
                kind: "species",
                value: s.to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Broad grouping of actions, derived from [`ActionKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ActionCategory {
    /// Steering: changes the persisted target point and velocity.
    Move,
    /// Energy gain from another cell.
    Eat,
    /// Produces offspring.
    Reproduce,
    /// Does nothing beyond paying the rule's energy cost.
    Passive,
}

/// The concrete action a behavior rule performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ActionKind {
    /// Steer straight at the target.
    Pursue,
    /// Steer to the point mirrored through self, away from the target.
    Evade,
    /// Pursue with a burst multiplier.
    Hunt,
    /// Drift towards a persisted random point.
    Wander,
    /// Consume the target whole.
    Eat,
    /// Take a small bite of the target without killing it.
    Nibble,
    /// Divide via the species split policy.
    Clone,
    /// Do nothing.
    Sleep,
}

impl ActionKind {
    /// Every action kind, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Pursue,
        Self::Evade,
        Self::Hunt,
        Self::Wander,
        Self::Eat,
        Self::Nibble,
        Self::Clone,
        Self::Sleep,
    ];

    /// The category this kind belongs to.
    pub const fn category(self) -> ActionCategory {
        match self {
            Self::Pursue | Self::Evade | Self::Hunt | Self::Wander => ActionCategory::Move,
            Self::Eat | Self::Nibble => ActionCategory::Eat,
            Self::Clone => ActionCategory::Reproduce,
            Self::Sleep => ActionCategory::Passive,
        }
    }

    /// Whether this kind only makes sense with a target cell.
    pub const fn needs_target(self) -> bool {
        matches!(
            self,
            Self::Pursue | Self::Evade | Self::Hunt | Self::Eat | Self::Nibble
        )
    }

    /// Lowercase configuration name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pursue => "pursue",
            Self::Evade => "evade",
            Self::Hunt => "hunt",
            Self::Wander => "wander",
            Self::Eat => "eat",
            Self::Nibble => "nibble",
            Self::Clone => "clone",
            Self::Sleep => "sleep",
        }
    }
}

impl core::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownVariant {
                kind: "action",
                value: s.to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Death
// ---------------------------------------------------------------------------

/// Why a cell died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum DeathCause {
    /// Another cell ate it.
    Eaten,
    /// Energy fell to zero or below.
    Starvation,
    /// Passed its maximum age and lost the per-tick roll.
    OldAge,
}

impl DeathCause {
    /// Whether the dead cell's mass is left behind as food.
    pub const fn leaves_corpse(self) -> bool {
        !matches!(self, Self::Eaten)
    }
}

impl core::fmt::Display for DeathCause {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Eaten => write!(f, "eaten"),
            Self::Starvation => write!(f, "starvation"),
            Self::OldAge => write!(f, "old_age"),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Outline a renderer should draw for a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    /// Circle of the cell's radius.
    Circle,
    /// Axis-aligned square, see [`crate::snapshot::square_side`].
    Square,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn action_categories() {
        assert_eq!(ActionKind::Hunt.category(), ActionCategory::Move);
        assert_eq!(ActionKind::Wander.category(), ActionCategory::Move);
        assert_eq!(ActionKind::Nibble.category(), ActionCategory::Eat);
        assert_eq!(ActionKind::Clone.category(), ActionCategory::Reproduce);
        assert_eq!(ActionKind::Sleep.category(), ActionCategory::Passive);
    }

    #[test]
    fn wander_and_clone_need_no_target() {
        assert!(!ActionKind::Wander.needs_target());
        assert!(!ActionKind::Clone.needs_target());
        assert!(!ActionKind::Sleep.needs_target());
        assert!(ActionKind::Evade.needs_target());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Pursue".parse::<ActionKind>().unwrap(), ActionKind::Pursue);
        assert_eq!(" grazer ".parse::<Species>().unwrap(), Species::Grazer);
    }

    #[test]
    fn unknown_action_is_rejected() {
        let err = "graze".parse::<ActionKind>().unwrap_err();
        assert_eq!(err.kind, "action");
        assert_eq!(err.value, "graze");
    }

    #[test]
    fn only_eaten_leaves_no_corpse() {
        assert!(!DeathCause::Eaten.leaves_corpse());
        assert!(DeathCause::Starvation.leaves_corpse());
        assert!(DeathCause::OldAge.leaves_corpse());
    }
}
