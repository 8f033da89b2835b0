//! The tick cycle.
//!
//! A tick walks the live set once, in collection order:
//!
//! 1. **Act**: for every cell that is still alive, age it, query what it
//!    sees, ask its rule set for a decision, resolve the decision, then run
//!    physics, squish and the rest of the lifecycle.
//! 2. **Feed**: drop up to `feed_rate` agar pellets at random.
//! 3. **Join**: offspring, corpse pellets and food enter the live set. They
//!    do not act on the tick they were born.
//! 4. **Sweep**: swap-remove every dead cell.
//! 5. **Advance** the tick counter.
//! 6. **Publish**: build a fresh [`Snapshot`](petri_types::Snapshot) stamped
//!    with the number of completed ticks, so the seeding snapshot is 0 and
//!    the one after the first tick is 1.
//!
//! [`Arena::run_tick`] runs all of it at once. The runner instead calls
//! [`Arena::step_cell`] per cell and [`Arena::finish_tick`] at the end so it
//! can honour pause and stop between cells.

use std::collections::BTreeMap;
use std::sync::Arc;

use petri_agents::presets::FEED_PELLET_MASS;
use petri_agents::{
    AgentError, Candidate, Cell, Decision, apply_physics, grow_older, push_apart, resolve, settle,
    squish_factor,
};
use petri_types::{CellId, DeathCause, IdExhausted, LifecycleEvent, Species};
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::arena::Arena;
use crate::config::ConfigError;
use crate::spatial;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A cell update failed.
    #[error("cell {cell} failed to update: {source}")]
    Agent {
        /// The cell being updated.
        cell: CellId,
        /// The underlying agent error.
        source: AgentError,
    },

    /// The id generator ran dry.
    #[error("id allocation failed: {source}")]
    Ids {
        /// The underlying id error.
        #[from]
        source: IdExhausted,
    },

    /// The arena could not be built from configuration.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// The tick counter would overflow.
    #[error("tick counter overflow")]
    TickOverflow,
}

/// A cell removed by the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeathRecord {
    /// The dead cell.
    pub cell: CellId,
    /// Its species.
    pub species: Species,
    /// Age at death.
    pub age: u64,
    /// What killed it.
    pub cause: DeathCause,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Live cells per species after the sweep.
    pub population: BTreeMap<Species, usize>,
    /// Offspring and corpse pellets that joined the arena.
    pub births: usize,
    /// Food pellets dropped by the feeder.
    pub fed: usize,
    /// Cells removed by the sweep.
    pub deaths: Vec<DeathRecord>,
    /// Lifecycle events, in the order they happened.
    pub events: Vec<LifecycleEvent>,
}

impl TickSummary {
    /// Live cells of one species.
    pub fn count(&self, species: Species) -> usize {
        self.population.get(&species).copied().unwrap_or(0)
    }

    /// Live cells of every species.
    pub fn total(&self) -> usize {
        self.population.values().fold(0_usize, |acc, n| acc.saturating_add(*n))
    }

    /// Whether nothing but food is left.
    pub fn is_extinct(&self) -> bool {
        self.population
            .iter()
            .all(|(species, n)| *species == Species::Agar || *n == 0)
    }
}

impl Arena {
    /// Run one whole tick.
    ///
    /// # Errors
    ///
    /// Returns [`TickError`] if a cell update or id allocation fails; the
    /// tick is left half done.
    pub fn run_tick(&mut self) -> Result<TickSummary, TickError> {
        for index in 0..self.cells.len() {
            self.step_cell(index)?;
        }
        self.finish_tick()
    }

    /// Update the cell at `index`. Dead cells and out-of-range indices are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Agent`] if the cell's update fails.
    pub fn step_cell(&mut self, index: usize) -> Result<(), TickError> {
        let (walls, tick) = (self.walls, self.tick);
        let food = self.profile(Species::Agar);

        let Some(me) = self.cells.get_mut(index) else {
            return Ok(());
        };
        if !me.is_alive() {
            return Ok(());
        }
        let id = me.id;
        let failed = |source: AgentError| TickError::Agent { cell: id, source };
        grow_older(me).map_err(failed)?;

        let decision = self.decide(index);
        debug!(cell = %id, action = %decision.action, rule = ?decision.rule, "Decided");

        let target = decision.target.map(|t| t.index);
        if let Some((me, target)) = with_target(&mut self.cells, index, target) {
            let mut ctx = self.bench.context(walls, tick, Arc::clone(&food));
            resolve(&decision, me, target, &mut ctx).map_err(failed)?;
            apply_physics(me, &walls);
        }

        self.squish(index);

        if let Some(me) = self.cells.get_mut(index) {
            let mut ctx = self.bench.context(walls, tick, food);
            settle(me, &mut ctx).map_err(failed)?;
        }
        Ok(())
    }

    /// Close the tick: feed, join, sweep, advance, publish.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Ids`] if food cannot be given ids, or
    /// [`TickError::TickOverflow`].
    pub fn finish_tick(&mut self) -> Result<TickSummary, TickError> {
        let births = self.bench.pending.len();
        let fed = self.feed()?;
        self.cells.append(&mut self.bench.pending);

        let deaths = self.sweep();
        let events = std::mem::take(&mut self.bench.events);

        let mut population: BTreeMap<Species, usize> =
            Species::ALL.into_iter().map(|s| (s, 0)).collect();
        for cell in &self.cells {
            if let Some(n) = population.get_mut(&cell.species) {
                *n = n.saturating_add(1);
            }
        }

        let summary = TickSummary {
            tick: self.tick,
            population,
            births,
            fed,
            deaths,
            events,
        };
        self.tick = self.tick.checked_add(1).ok_or(TickError::TickOverflow)?;
        self.snapshot = Arc::new(self.build_snapshot());
        debug!(
            tick = summary.tick,
            cells = self.cells.len(),
            births,
            fed,
            deaths = summary.deaths.len(),
            "Tick complete"
        );
        Ok(summary)
    }

    /// Ask the rule set of the cell at `index` what to do.
    fn decide(&self, index: usize) -> Decision {
        let Some(me) = self.cells.get(index) else {
            return Decision::fallback();
        };
        let touching = spatial::touching(&self.cells, index);
        let engulfed = spatial::engulfed(&self.cells, index);
        let visible: Vec<Candidate> = spatial::in_range(&self.cells, index, me.vision_range())
            .into_iter()
            .filter_map(|i| {
                let cell = self.cells.get(i)?;
                Some(cell.candidate(i).in_contact(touching.contains(&i), engulfed.contains(&i)))
            })
            .collect();
        me.profile()
            .rules
            .select(&me.observer(), &visible, &me.cooldowns)
    }

    /// Push every touching cell the cell at `index` squishes.
    fn squish(&mut self, index: usize) {
        for other in spatial::touching(&self.cells, index) {
            if let Some((me, other)) = pair_mut(&mut self.cells, index, other)
                && let Some(factor) = squish_factor(me, other)
            {
                push_apart(me.position, me.radius(), other, factor);
            }
        }
    }

    /// Drop `uniform(0..=feed_rate)` food pellets inside the walls.
    fn feed(&mut self) -> Result<usize, TickError> {
        let food = self.profile(Species::Agar);
        let count = self.bench.rng.random_range(0..=self.feed_rate);
        let mut ctx = self.bench.context(self.walls, self.tick, Arc::clone(&food));
        let mut fed = 0_usize;
        for _ in 0..count {
            let position = self.walls.random_point(&mut *ctx.rng);
            let pellet = Cell::new(ctx.ids.next_id()?, Arc::clone(&food), position)
                .with_mass(FEED_PELLET_MASS);
            ctx.spawn(pellet);
            fed = fed.saturating_add(1);
        }
        Ok(fed)
    }

    /// Swap-remove dead cells, returning what was removed.
    fn sweep(&mut self) -> Vec<DeathRecord> {
        let mut deaths = Vec::new();
        let mut index = 0_usize;
        while let Some(cell) = self.cells.get(index) {
            if let Some(cause) = cell.death_cause() {
                deaths.push(DeathRecord {
                    cell: cell.id,
                    species: cell.species,
                    age: cell.age,
                    cause,
                });
                self.cells.swap_remove(index);
            } else {
                index = index.saturating_add(1);
            }
        }
        deaths
    }
}

/// Mutable access to two distinct cells.
fn pair_mut(cells: &mut [Cell], a: usize, b: usize) -> Option<(&mut Cell, &mut Cell)> {
    use core::cmp::Ordering;
    match a.cmp(&b) {
        Ordering::Less => {
            let (low, high) = cells.split_at_mut_checked(b)?;
            Some((low.get_mut(a)?, high.first_mut()?))
        }
        Ordering::Greater => {
            let (low, high) = cells.split_at_mut_checked(a)?;
            Some((high.first_mut()?, low.get_mut(b)?))
        }
        Ordering::Equal => None,
    }
}

/// The acting cell, and its target if it has a distinct one.
fn with_target(
    cells: &mut [Cell],
    me: usize,
    target: Option<usize>,
) -> Option<(&mut Cell, Option<&mut Cell>)> {
    match target {
        Some(t) if t != me => pair_mut(cells, me, t).map(|(me, t)| (me, Some(t))),
        _ => cells.get_mut(me).map(|me| (me, None)),
    }
}
