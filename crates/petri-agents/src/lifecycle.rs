//! Per-tick lifecycle steps applied to a cell after it acts.
//!
//! The arena drives one cell through, in order:
//!
//! 1. [`grow_older`] (before the rule engine runs)
//! 2. action resolution ([`crate::actions::resolve`])
//! 3. [`apply_physics`]
//! 4. squish, via [`squish_factor`] and [`push_apart`] for each touching cell
//! 5. [`settle`]: growth, old age, starvation, corpse drop, cooldowns
//!
//! Death is checked exactly once per tick, here, after acting; energy may sit
//! below zero between the two.

use petri_types::{DeathCause, LifecycleEventKind, Vec2};
use rand::Rng;

use crate::cell::Cell;
use crate::context::{TickContext, Walls};
use crate::error::AgentError;
use crate::species::GrowthPolicy;

/// Velocity a cell is given, pointing inwards, when it hits a wall.
pub const WALL_REBOUND: f64 = 1.0;

/// Gap added beyond touching distance when one cell pushes another away.
pub const SQUISH_EPSILON: f64 = 0.01;

/// Per-tick probability that a cell past its maximum age dies.
pub const OLD_AGE_CHANCE: f64 = 0.06;

/// Corpse mass converted into one food pellet.
pub const CORPSE_SLICE: f64 = 40.0;

/// Mass of a corpse pellet.
pub const PELLET_MASS: f64 = 20.0;

/// Energy of a corpse pellet.
pub const PELLET_ENERGY: f64 = 10.0;

/// Maximum per-axis offset of a pellet from the corpse.
pub const PELLET_SCATTER: f64 = 2.0;

/// Result of one growth step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthChange {
    /// Mass went up.
    Grew,
    /// Mass went down to pay for energy.
    Shrank,
}

/// Age the cell by one tick.
pub fn grow_older(me: &mut Cell) -> Result<(), AgentError> {
    me.age = me
        .age
        .checked_add(1)
        .ok_or_else(|| AgentError::ArithmeticOverflow {
            context: format!("age of cell #{}", me.id),
        })?;
    Ok(())
}

/// Friction, integration, and wall collision.
///
/// A cell crossing a wall is put back on it and given a fixed inward
/// velocity of [`WALL_REBOUND`] on that axis; this is not a reflection.
pub fn apply_physics(me: &mut Cell, walls: &Walls) {
    me.velocity = me.velocity.scale(me.friction);
    me.position = me.position.plus(me.velocity);

    let (lo, hi) = (walls.min(), walls.max());
    if me.position.x < lo.x {
        me.position.x = lo.x;
        me.velocity.x = WALL_REBOUND;
    } else if me.position.x > hi.x {
        me.position.x = hi.x;
        me.velocity.x = -WALL_REBOUND;
    }
    if me.position.y < lo.y {
        me.position.y = lo.y;
        me.velocity.y = WALL_REBOUND;
    } else if me.position.y > hi.y {
        me.position.y = hi.y;
        me.velocity.y = -WALL_REBOUND;
    }
}

/// How far `me` pushes `other` if they touch, or `None` if it leaves it be.
pub fn squish_factor(me: &Cell, other: &Cell) -> Option<f64> {
    let policy = me.profile().squish;
    if !policy.is_active(me.age, me.mass) {
        return None;
    }
    policy.push_factor(me.species, other.species)
}

/// Place `other` just outside a pusher at `centre` with radius `radius`.
///
/// The new centre distance is `(radius + other.radius) * factor` plus
/// [`SQUISH_EPSILON`]. Coincident centres push along +x.
pub fn push_apart(centre: Vec2, radius: f64, other: &mut Cell, factor: f64) {
    let direction = centre.to(other.position).unit().unwrap_or(Vec2::UNIT_X);
    let reach = (radius + other.radius()).mul_add(factor, SQUISH_EPSILON);
    other.position = centre.plus(direction.scale(reach));
}

/// Growth, old age, starvation, corpse drop and cooldown bookkeeping.
pub fn settle<R: Rng + ?Sized>(
    me: &mut Cell,
    ctx: &mut TickContext<'_, R>,
) -> Result<(), AgentError> {
    match grow(me, &mut *ctx.rng) {
        Some(GrowthChange::Grew) => ctx.record(me, LifecycleEventKind::Grew),
        Some(GrowthChange::Shrank) => ctx.record(me, LifecycleEventKind::Starving),
        None => {}
    }

    if past_max_age(me, &mut *ctx.rng) {
        die(me, DeathCause::OldAge, ctx);
    }
    if me.is_alive() && me.energy <= 0.0 {
        die(me, DeathCause::Starvation, ctx);
    }
    if me.death_cause().is_some_and(DeathCause::leaves_corpse) {
        drop_corpse(me, ctx)?;
    }

    me.cooldowns.tick();
    Ok(())
}

/// Apply the species growth policy once.
pub fn grow<R: Rng + ?Sized>(me: &mut Cell, rng: &mut R) -> Option<GrowthChange> {
    let GrowthPolicy::Threshold {
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
    } = me.profile().growth
    else {
        return None;
    };

    me.energy += photosynthesis;
    if me.energy > grow_above && me.mass < grow_below_mass && roll(rng, grow_chance) {
        me.mass += grow_step;
        me.energy -= grow_cost;
        Some(GrowthChange::Grew)
    } else if me.energy < shrink_below && me.mass > shrink_above_mass {
        me.mass -= shrink_step;
        me.energy += shrink_refund;
        Some(GrowthChange::Shrank)
    } else {
        None
    }
}

/// Whether a cell past its age limit loses this tick's roll.
fn past_max_age<R: Rng + ?Sized>(me: &Cell, rng: &mut R) -> bool {
    me.max_age
        .is_some_and(|max| me.age > max && me.is_alive() && rng.random_bool(OLD_AGE_CHANCE))
}

fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    chance >= 1.0 || rng.random_bool(chance.clamp(0.0, 1.0))
}

fn die<R: Rng + ?Sized>(me: &mut Cell, cause: DeathCause, ctx: &mut TickContext<'_, R>) {
    if me.kill(cause) {
        ctx.record(me, LifecycleEventKind::Died { cause });
    }
}

/// Break a corpse into food pellets, [`CORPSE_SLICE`] mass per pellet.
///
/// Returns the number of pellets; a corpse with positive mass always drops
/// at least one.
pub fn drop_corpse<R: Rng + ?Sized>(
    me: &mut Cell,
    ctx: &mut TickContext<'_, R>,
) -> Result<usize, AgentError> {
    let mut dropped = 0_usize;
    while me.mass > 0.0 {
        me.mass -= CORPSE_SLICE;
        let offset = Vec2::new(
            ctx.rng.random_range(-PELLET_SCATTER..=PELLET_SCATTER),
            ctx.rng.random_range(-PELLET_SCATTER..=PELLET_SCATTER),
        );
        let pellet = Cell::new(ctx.next_id()?, ctx.food.clone(), me.position.plus(offset))
            .with_mass(PELLET_MASS)
            .with_energy(PELLET_ENERGY);
        ctx.spawn(pellet);
        dropped = dropped.saturating_add(1);
    }
    Ok(dropped)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use petri_types::{ActionKind, Species};

    use super::*;
    use crate::testing::{Harness, close};

    #[test]
    fn physics_applies_friction_then_moves() {
        let mut h = Harness::new();
        let mut me = h.cell(Species::Grazer, 100.0, 100.0).with_velocity(Vec2::new(2.0, -4.0));
        apply_physics(&mut me, &h.walls);
        assert!(close(me.velocity.x, 1.7));
        assert!(close(me.velocity.y, -3.4));
        assert!(close(me.position.x, 101.7));
        assert!(close(me.position.y, 96.6));
    }

    #[test]
    fn wall_hit_clamps_and_rebounds() {
        let mut h = Harness::new();
        let mut me = h.cell(Species::Grazer, 16.0, 384.0).with_velocity(Vec2::new(-10.0, 10.0));
        apply_physics(&mut me, &h.walls);
        assert!(close(me.position.x, 15.0));
        assert!(close(me.velocity.x, WALL_REBOUND));
        assert!(close(me.position.y, 385.0));
        assert!(close(me.velocity.y, -WALL_REBOUND));
    }

    #[test]
    fn push_apart_lands_just_outside() {
        let mut h = Harness::new();
        let me = h.cell(Species::Grazer, 100.0, 100.0);
        let mut other = h.cell(Species::Grazer, 103.0, 104.0);
        push_apart(me.position, me.radius(), &mut other, 1.0);
        let gap = me.position.distance(other.position);
        assert!(close(gap, me.radius() + other.radius() + SQUISH_EPSILON));
        // Direction preserved.
        let dir = me.position.to(other.position).unit().unwrap();
        assert!(close(dir.x, 0.6) && close(dir.y, 0.8));
    }

    #[test]
    fn coincident_centres_push_along_x() {
        let mut h = Harness::new();
        let me = h.cell(Species::Grazer, 100.0, 100.0);
        let mut other = h.cell(Species::Grazer, 100.0, 100.0);
        push_apart(me.position, me.radius(), &mut other, 1.0);
        assert!(other.position.x > 100.0);
        assert!(close(other.position.y, 100.0));
    }

    #[test]
    fn squish_respects_policy() {
        let mut h = Harness::new();
        let mut grazer = h.cell(Species::Grazer, 100.0, 100.0);
        let other_grazer = h.cell(Species::Grazer, 101.0, 100.0);
        let agar = h.cell(Species::Agar, 101.0, 100.0);
        assert_eq!(squish_factor(&grazer, &other_grazer), None);
        grazer.age = 4;
        assert_eq!(squish_factor(&grazer, &other_grazer), Some(1.0));
        assert_eq!(squish_factor(&grazer, &agar), None);

        let mut plant = h.cell(Species::Plant, 100.0, 100.0);
        plant.age = 2;
        let seedling = h.cell(Species::Plant, 100.0, 101.0);
        assert_eq!(squish_factor(&plant, &seedling), Some(3.0));
        assert_eq!(squish_factor(&plant, &agar), Some(1.0));
    }

    #[test]
    fn grazer_grows_when_well_fed() {
        let mut h = Harness::new();
        let mut me = h.cell(Species::Grazer, 100.0, 100.0).with_energy(80.0);
        assert_eq!(grow(&mut me, &mut h.rng), Some(GrowthChange::Grew));
        assert!(close(me.mass, 70.0));
        assert!(close(me.energy, 77.0));
    }

    #[test]
    fn grazer_shrinks_when_hungry() {
        let mut h = Harness::new();
        let mut me = h.cell(Species::Grazer, 100.0, 100.0).with_energy(10.0);
        assert_eq!(grow(&mut me, &mut h.rng), Some(GrowthChange::Shrank));
        assert!(close(me.mass, 30.0));
        assert!(close(me.energy, 11.0));
        // At 30 mass it can shrink no further.
        me.energy = 10.0;
        assert_eq!(grow(&mut me, &mut h.rng), None);
    }

    #[test]
    fn plant_photosynthesizes() {
        let mut h = Harness::new();
        let mut me = h.cell(Species::Plant, 100.0, 100.0);
        assert_eq!(grow(&mut me, &mut h.rng), None);
        assert!(close(me.energy, 100.5));
    }

    #[test]
    fn starvation_leaves_a_corpse() {
        let mut h = Harness::new();
        let mut me = h.cell(Species::Grazer, 100.0, 100.0).with_energy(0.0).with_mass(30.0);
        settle(&mut me, &mut h.ctx()).unwrap();
        assert_eq!(me.death_cause(), Some(DeathCause::Starvation));
        assert_eq!(h.spawned.len(), 1);
        let pellet = h.spawned.first().unwrap();
        assert_eq!(pellet.species, Species::Agar);
        assert!(close(pellet.mass, PELLET_MASS));
        assert!(close(pellet.energy, PELLET_ENERGY));
        assert!(pellet.position.distance(me.position) <= PELLET_SCATTER * 2.0_f64.sqrt());
        // One starved event; agar pellets are quiet.
        assert_eq!(h.events.len(), 1);
    }

    #[test]
    fn corpse_pellets_cover_mass() {
        let mut h = Harness::new();
        let mut me = h.cell(Species::Predator, 100.0, 100.0).with_mass(130.0);
        me.kill(DeathCause::OldAge);
        let pellets = drop_corpse(&mut me, &mut h.ctx()).unwrap();
        assert_eq!(pellets, 4);
        assert_eq!(h.spawned.len(), 4);
    }

    #[test]
    fn eaten_cells_leave_nothing() {
        let mut h = Harness::new();
        let mut me = h.cell(Species::Grazer, 100.0, 100.0);
        me.kill(DeathCause::Eaten);
        settle(&mut me, &mut h.ctx()).unwrap();
        assert!(h.spawned.is_empty());
    }

    #[test]
    fn immortal_cells_never_age_out() {
        let mut h = Harness::new();
        let mut agar = h.cell(Species::Agar, 100.0, 100.0);
        agar.age = 1_000_000;
        for _ in 0..200 {
            settle(&mut agar, &mut h.ctx()).unwrap();
        }
        assert!(agar.is_alive());
    }

    #[test]
    fn old_cells_eventually_die() {
        let mut h = Harness::new();
        let mut me = h.cell(Species::Plant, 100.0, 100.0).with_energy(150.0);
        me.age = 3001;
        for _ in 0..500 {
            settle(&mut me, &mut h.ctx()).unwrap();
            if !me.is_alive() {
                break;
            }
        }
        assert_eq!(me.death_cause(), Some(DeathCause::OldAge));
    }

    #[test]
    fn cooldowns_tick_in_settle() {
        let mut h = Harness::new();
        let mut me = h.cell(Species::Grazer, 100.0, 100.0);
        me.behavior = ActionKind::Nibble;
        me.cooldowns.start(2, 1);
        settle(&mut me, &mut h.ctx()).unwrap();
        assert!(me.cooldowns.is_empty());
    }

    #[test]
    fn age_increments() {
        let mut h = Harness::new();
        let mut me = h.cell(Species::Grazer, 100.0, 100.0);
        grow_older(&mut me).unwrap();
        assert_eq!(me.age, 1);
        me.age = u64::MAX;
        assert!(grow_older(&mut me).is_err());
    }
}
