//! Read-only payloads handed to observers of the simulation.
//!
//! A [`Snapshot`] is built once per tick and never mutated after it is
//! published. [`LifecycleEvent`]s are the human-facing narration of births,
//! growth and deaths.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{DeathCause, ShapeKind, Species};
use crate::ids::CellId;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Build a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Side of the square drawn for a cell of radius `radius`.
///
/// Squares are inscribed in a circle a third larger than the cell.
pub fn square_side(radius: f64) -> f64 {
    let diameter = (radius / 0.75) * 2.0;
    (diameter * diameter / 2.0).sqrt()
}

/// Everything a renderer needs to draw one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CellSprite {
    /// The cell's id.
    pub id: CellId,
    /// The cell's species.
    pub species: Species,
    /// Centre x.
    pub x: f64,
    /// Centre y.
    pub y: f64,
    /// Radius, derived from mass.
    pub radius: f64,
    /// Fill color.
    pub color: Rgb,
    /// Outline to draw.
    pub shape: ShapeKind,
}

impl CellSprite {
    /// Side length when drawn as a square, `None` for circles.
    pub fn side(&self) -> Option<f64> {
        match self.shape {
            ShapeKind::Square => Some(square_side(self.radius)),
            ShapeKind::Circle => None,
        }
    }
}

/// Immutable view of the arena between ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Snapshot {
    /// Ticks completed when this snapshot was built; 0 before the first.
    pub tick: u64,
    /// Achieved ticks per second, as last measured by the runner.
    pub tick_rate: f64,
    /// Live cells, in arena order.
    pub cells: Vec<CellSprite>,
}

impl Snapshot {
    /// Number of sprites of the given species.
    pub fn count(&self, species: Species) -> usize {
        self.cells.iter().filter(|c| c.species == species).count()
    }
}

// ---------------------------------------------------------------------------
// Lifecycle events
// ---------------------------------------------------------------------------

/// What happened to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifecycleEventKind {
    /// Born by seeding, cloning or corpse drop.
    Spawned,
    /// Gained mass.
    Grew,
    /// Lost mass to feed itself.
    Starving,
    /// Died.
    Died {
        /// Cause of death.
        cause: DeathCause,
    },
}

impl core::fmt::Display for LifecycleEventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Spawned => write!(f, "spawned"),
            Self::Grew => write!(f, "grew"),
            Self::Starving => write!(f, "is starving"),
            Self::Died {
                cause: DeathCause::Eaten,
            } => write!(f, "was eaten"),
            Self::Died {
                cause: DeathCause::Starvation,
            } => write!(f, "starved"),
            Self::Died {
                cause: DeathCause::OldAge,
            } => write!(f, "died of old age"),
        }
    }
}

/// A narrated lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LifecycleEvent {
    /// Tick the event happened on.
    pub tick: u64,
    /// The cell concerned.
    pub cell: CellId,
    /// Its species.
    pub species: Species,
    /// Its age in ticks when it happened.
    pub age: u64,
    /// What happened.
    pub kind: LifecycleEventKind,
}

impl core::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} #{} {} at age {}",
            self.species, self.cell, self.kind, self.age
        )
    }
}
