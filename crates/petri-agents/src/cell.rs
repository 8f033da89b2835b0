//! The cell: one agent in the arena.
//!
//! A [`Cell`] carries its own physical and energetic state plus a shared
//! reference to its [`SpeciesProfile`]. Death is a state, not a removal:
//! [`Cell::kill`] flips the cell to [`LifeState::Dead`] and the arena sweeps
//! dead cells out after the tick.

use std::sync::Arc;

use petri_types::{
    ActionKind, CellId, CellSprite, DeathCause, LifecycleEvent, LifecycleEventKind, Species, Vec2,
};
use tracing::debug;

use crate::cooldown::Cooldowns;
use crate::engine::{Candidate, Observer};
use crate::species::SpeciesProfile;

/// Divisor turning mass into extra vision range.
const VISION_PER_MASS: f64 = 3.5;

/// Whether a cell is still taking part in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeState {
    /// Acting normally.
    Alive,
    /// Dead; removed during the sweep that ends the current tick.
    Dead(DeathCause),
}

/// One agent.
#[derive(Debug, Clone)]
pub struct Cell {
    /// Unique id.
    pub id: CellId,
    /// Species tag.
    pub species: Species,
    /// Centre position.
    pub position: Vec2,
    /// Velocity, added to the position every tick.
    pub velocity: Vec2,
    /// Mass; drives the radius.
    pub mass: f64,
    /// Energy; may go negative until the starvation check.
    pub energy: f64,
    /// Cosmetic health.
    pub health: u32,
    /// Velocity multiplier applied every tick.
    pub friction: f64,
    /// Base vision range.
    pub vision: f64,
    /// Ticks lived.
    pub age: u64,
    /// Age limit, `None` for immortal.
    pub max_age: Option<u64>,
    /// Point the cell was last steering for.
    pub target: Vec2,
    /// Displacement to `target` when it was chosen.
    pub heading: Vec2,
    /// Action performed on the last update.
    pub behavior: ActionKind,
    /// Rules cooling down.
    pub cooldowns: Cooldowns,
    life: LifeState,
    profile: Arc<SpeciesProfile>,
}

impl Cell {
    /// A fresh cell at `position` with the profile's starting stats.
    pub fn new(id: CellId, profile: Arc<SpeciesProfile>, position: Vec2) -> Self {
        Self {
            id,
            species: profile.species,
            position,
            velocity: Vec2::ZERO,
            mass: profile.mass,
            energy: profile.energy,
            health: profile.health,
            friction: profile.friction,
            vision: profile.vision,
            age: 0,
            max_age: profile.max_age,
            target: position,
            heading: Vec2::ZERO,
            behavior: ActionKind::Sleep,
            cooldowns: Cooldowns::new(),
            life: LifeState::Alive,
            profile,
        }
    }

    /// Override the starting mass.
    #[must_use]
    pub const fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    /// Override the starting energy.
    #[must_use]
    pub const fn with_energy(mut self, energy: f64) -> Self {
        self.energy = energy;
        self
    }

    /// Override the starting velocity.
    #[must_use]
    pub const fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// The shared species profile.
    pub fn profile(&self) -> &Arc<SpeciesProfile> {
        &self.profile
    }

    /// Current life state.
    pub const fn life(&self) -> LifeState {
        self.life
    }

    /// Whether the cell is alive.
    pub const fn is_alive(&self) -> bool {
        matches!(self.life, LifeState::Alive)
    }

    /// Cause of death, if dead.
    pub const fn death_cause(&self) -> Option<DeathCause> {
        match self.life {
            LifeState::Alive => None,
            LifeState::Dead(cause) => Some(cause),
        }
    }

    /// Kill the cell. Returns `false`, and changes nothing, if it was
    /// already dead.
    pub fn kill(&mut self, cause: DeathCause) -> bool {
        if let LifeState::Dead(previous) = self.life {
            debug!(
                cell = %self.id,
                species = %self.species,
                %previous,
                ignored = %cause,
                "kill on an already dead cell"
            );
            return false;
        }
        self.life = LifeState::Dead(cause);
        true
    }

    /// Radius of a disc whose area equals the mass.
    pub fn radius(&self) -> f64 {
        (self.mass.max(0.0) / core::f64::consts::PI).sqrt()
    }

    /// How far the cell sees; zero when blind.
    pub fn vision_range(&self) -> f64 {
        if self.vision > 0.0 {
            self.vision + self.mass / VISION_PER_MASS
        } else {
            0.0
        }
    }

    /// The view of this cell the rule engine decides with.
    pub const fn observer(&self) -> Observer {
        Observer {
            species: self.species,
            position: self.position,
            mass: self.mass,
            energy: self.energy,
        }
    }

    /// This cell as a potential target, living at `index` in the arena.
    ///
    /// Contact flags start cleared; the arena sets them from its spatial
    /// queries with [`Candidate::in_contact`].
    pub const fn candidate(&self, index: usize) -> Candidate {
        Candidate {
            index,
            id: self.id,
            species: self.species,
            position: self.position,
            mass: self.mass,
            touching: false,
            engulfed: false,
        }
    }

    /// Drawable descriptor.
    pub fn sprite(&self) -> CellSprite {
        CellSprite {
            id: self.id,
            species: self.species,
            x: self.position.x,
            y: self.position.y,
            radius: self.radius(),
            color: self.profile.color,
            shape: self.profile.shape,
        }
    }

    /// A lifecycle event about this cell, or `None` for quiet species.
    pub fn event(&self, tick: u64, kind: LifecycleEventKind) -> Option<LifecycleEvent> {
        (!self.profile.quiet).then_some(LifecycleEvent {
            tick,
            cell: self.id,
            species: self.species,
            age: self.age,
            kind,
        })
    }
}
