//! Fixtures shared by the unit tests of this crate.

#![allow(clippy::unwrap_used, clippy::missing_const_for_fn)]

use std::sync::Arc;

use petri_types::{IdGenerator, LifecycleEvent, Species, Vec2};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::cell::Cell;
use crate::context::{TickContext, Walls};
use crate::presets;
use crate::species::SpeciesProfile;

/// Owns everything a [`TickContext`] borrows.
pub struct Harness {
    pub rng: SmallRng,
    pub ids: IdGenerator,
    pub spawned: Vec<Cell>,
    pub events: Vec<LifecycleEvent>,
    pub walls: Walls,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::seed_from_u64(42),
            ids: IdGenerator::new(),
            spawned: Vec::new(),
            events: Vec::new(),
            walls: Walls::new(400.0, 400.0),
        }
    }

    pub fn ctx(&mut self) -> TickContext<'_, SmallRng> {
        TickContext {
            rng: &mut self.rng,
            ids: &mut self.ids,
            walls: self.walls,
            tick: 1,
            food: Arc::new(presets::agar()),
            spawned: &mut self.spawned,
            events: &mut self.events,
        }
    }

    pub fn cell(&mut self, species: Species, x: f64, y: f64) -> Cell {
        self.cell_with(Arc::new(presets::profile(species)), x, y)
    }

    pub fn cell_with(&mut self, profile: Arc<SpeciesProfile>, x: f64, y: f64) -> Cell {
        let id = self.ids.next_id().unwrap();
        Cell::new(id, profile, Vec2::new(x, y))
    }
}

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
