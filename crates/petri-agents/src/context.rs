//! Shared state threaded through one tick of cell updates.
//!
//! The arena owns the RNG, the id generator and the output buffers; a
//! [`TickContext`] borrows them for the duration of a tick so that action
//! resolution and lifecycle steps can spawn cells and narrate events
//! without touching the arena itself.

use std::sync::Arc;

use petri_types::{CellId, IdGenerator, LifecycleEvent, LifecycleEventKind, Vec2};
use rand::Rng;

use crate::cell::Cell;
use crate::error::AgentError;
use crate::species::SpeciesProfile;

/// Distance between the arena edge and the walls cells bounce off.
pub const WALL_MARGIN: f64 = 15.0;

/// The playable rectangle, inset by [`WALL_MARGIN`] on every side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Walls {
    /// Arena width.
    pub width: f64,
    /// Arena height.
    pub height: f64,
}

impl Walls {
    /// Walls for an arena of the given size.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Top-left wall corner.
    pub const fn min(&self) -> Vec2 {
        Vec2::new(WALL_MARGIN, WALL_MARGIN)
    }

    /// Bottom-right wall corner. Never above-left of [`min`](Self::min),
    /// even for arenas narrower than twice the margin.
    pub fn max(&self) -> Vec2 {
        Vec2::new(
            (self.width - WALL_MARGIN).max(WALL_MARGIN),
            (self.height - WALL_MARGIN).max(WALL_MARGIN),
        )
    }

    /// `point` moved onto the nearest position inside the walls.
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min(), self.max())
    }

    /// Uniformly random point inside the walls.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        let (lo, hi) = (self.min(), self.max());
        Vec2::new(rng.random_range(lo.x..=hi.x), rng.random_range(lo.y..=hi.y))
    }
}

/// Everything a cell update may read or append to besides the cells.
pub struct TickContext<'a, R: Rng + ?Sized> {
    /// The simulation's single RNG.
    pub rng: &'a mut R,
    /// Id source for offspring and food.
    pub ids: &'a mut IdGenerator,
    /// Arena walls.
    pub walls: Walls,
    /// Tick being computed.
    pub tick: u64,
    /// Profile used for corpse pellets.
    pub food: Arc<SpeciesProfile>,
    /// Cells created this tick; they join the arena after the tick.
    pub spawned: &'a mut Vec<Cell>,
    /// Lifecycle events emitted this tick.
    pub events: &'a mut Vec<LifecycleEvent>,
}

impl<R: Rng + ?Sized> TickContext<'_, R> {
    /// Take the next cell id.
    pub fn next_id(&mut self) -> Result<CellId, AgentError> {
        Ok(self.ids.next_id()?)
    }

    /// Record `kind` for `cell` unless its species is quiet.
    pub fn record(&mut self, cell: &Cell, kind: LifecycleEventKind) {
        if let Some(event) = cell.event(self.tick, kind) {
            self.events.push(event);
        }
    }

    /// Queue a newborn cell and announce it.
    pub fn spawn(&mut self, cell: Cell) {
        self.record(&cell, LifecycleEventKind::Spawned);
        self.spawned.push(cell);
    }
}

impl<R: Rng + ?Sized> core::fmt::Debug for TickContext<'_, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TickContext")
            .field("walls", &self.walls)
            .field("tick", &self.tick)
            .field("spawned", &self.spawned.len())
            .field("events", &self.events.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn clamp_to_walls() {
        let walls = Walls::new(100.0, 400.0);
        let p = walls.clamp(Vec2::new(-50.0, 1000.0));
        assert!((p.x - 15.0).abs() < f64::EPSILON);
        assert!((p.y - 385.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tiny_arena_does_not_invert() {
        let walls = Walls::new(10.0, 10.0);
        let p = walls.clamp(Vec2::new(3.0, 3.0));
        assert!((p.x - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn random_points_stay_inside() {
        let walls = Walls::new(200.0, 120.0);
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..500 {
            let p = walls.random_point(&mut rng);
            assert!(p.x >= 15.0 && p.x <= 185.0);
            assert!(p.y >= 15.0 && p.y <= 105.0);
        }
    }
}
