//! Action resolution: applying a [`Decision`] to the acting cell.
//!
//! Movement actions pick a target point, clamp it inside the walls, and
//! nudge the velocity along the unit heading. Eating actions move energy
//! between two cells. `clone` defers to the species [`SplitPolicy`]. After
//! any action the rule's energy cost is paid and its cooldown started.

use petri_types::{ActionKind, CellId, DeathCause, LifecycleEventKind, Vec2};
use rand::Rng;
use tracing::debug;

use crate::cell::Cell;
use crate::context::TickContext;
use crate::engine::Decision;
use crate::error::AgentError;
use crate::species::SplitPolicy;

/// Energy a nibble moves from target to eater.
pub const NIBBLE_ENERGY: f64 = 8.0;

/// Velocity gained per tick by ordinary movement.
pub const MOVE_SCALAR: f64 = 1.0;

/// Velocity gained per tick while hunting.
pub const HUNT_SCALAR: f64 = 3.0;

/// Half-width of the square a fresh wander point is drawn from.
pub const WANDER_RANGE: f64 = 100.0;

/// Maximum per-axis jitter applied to a continued wander point.
pub const WANDER_JITTER: f64 = 3.0;

/// A wander target closer than this is considered reached.
pub const WANDER_ARRIVAL: f64 = 5.0;

/// What resolving a decision did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActionOutcome {
    /// Energy gained from another cell.
    pub energy_gained: f64,
    /// Target killed by this action.
    pub killed: Option<CellId>,
    /// Offspring produced.
    pub offspring: Option<CellId>,
}

/// Apply `decision` to `me`, and to `target` when the action needs one.
///
/// A target-requiring decision arriving without its target degrades to a
/// sleep; the rule's cost and cooldown still apply.
pub fn resolve<R: Rng + ?Sized>(
    decision: &Decision,
    me: &mut Cell,
    target: Option<&mut Cell>,
    ctx: &mut TickContext<'_, R>,
) -> Result<ActionOutcome, AgentError> {
    let mut outcome = ActionOutcome::default();
    let mut action = decision.action;

    match (action, target) {
        (ActionKind::Pursue, Some(t)) => steer(me, t.position, MOVE_SCALAR, ctx),
        (ActionKind::Hunt, Some(t)) => steer(me, t.position, HUNT_SCALAR, ctx),
        (ActionKind::Evade, Some(t)) => {
            let away = me.position.scale(2.0).minus(t.position);
            steer(me, away, MOVE_SCALAR, ctx);
        }
        (ActionKind::Wander, _) => {
            let point = wander_point(me, &mut *ctx.rng);
            steer(me, point, MOVE_SCALAR, ctx);
        }
        (ActionKind::Eat, Some(t)) => {
            let gained = t.mass.mul_add(mass_yield(decision, me), t.energy);
            me.energy += gained;
            outcome.energy_gained = gained;
            if t.kill(DeathCause::Eaten) {
                ctx.record(t, LifecycleEventKind::Died {
                    cause: DeathCause::Eaten,
                });
                outcome.killed = Some(t.id);
            }
        }
        (ActionKind::Nibble, Some(t)) => {
            me.energy += NIBBLE_ENERGY;
            t.energy -= NIBBLE_ENERGY;
            outcome.energy_gained = NIBBLE_ENERGY;
        }
        (ActionKind::Clone, _) => {
            outcome.offspring = split(me, ctx)?;
        }
        (ActionKind::Sleep, _) => {}
        (kind, None) => {
            debug!(cell = %me.id, action = %kind, "target vanished, sleeping instead");
            action = ActionKind::Sleep;
        }
    }

    let paid = decision.rule.and_then(|index| {
        me.profile()
            .rules
            .get(index)
            .map(|rule| (index, rule.energy_cost(), rule.cooldown()))
    });
    if let Some((index, cost, cooldown)) = paid {
        me.energy -= cost;
        me.cooldowns.start(index, cooldown);
    }
    me.behavior = action;

    Ok(outcome)
}

fn mass_yield(decision: &Decision, me: &Cell) -> f64 {
    decision
        .rule
        .and_then(|i| me.profile().rules.get(i))
        .map_or(0.0, crate::rule::BehaviorRule::mass_yield)
}

/// Point a wandering cell heads for this tick.
///
/// A cell that was not wandering, or has reached its previous point, draws a
/// fresh one within [`WANDER_RANGE`]; otherwise the previous point drifts by
/// up to [`WANDER_JITTER`] per axis.
pub fn wander_point<R: Rng + ?Sized>(me: &Cell, rng: &mut R) -> Vec2 {
    let continuing = me.behavior == ActionKind::Wander
        && me.position.distance(me.target) >= WANDER_ARRIVAL;
    if continuing {
        me.target.plus(Vec2::new(
            rng.random_range(-WANDER_JITTER..=WANDER_JITTER),
            rng.random_range(-WANDER_JITTER..=WANDER_JITTER),
        ))
    } else {
        me.position.plus(Vec2::new(
            rng.random_range(-WANDER_RANGE..=WANDER_RANGE),
            rng.random_range(-WANDER_RANGE..=WANDER_RANGE),
        ))
    }
}

/// Set the target point (clamped inside the walls) and accelerate towards it.
fn steer<R: Rng + ?Sized>(me: &mut Cell, point: Vec2, scalar: f64, ctx: &TickContext<'_, R>) {
    let point = ctx.walls.clamp(point);
    me.target = point;
    me.heading = me.position.to(point);
    if let Some(unit) = me.heading.unit() {
        me.velocity = me.velocity.plus(unit.scale(scalar));
    }
}

/// Divide `me` according to its species split policy.
fn split<R: Rng + ?Sized>(
    me: &mut Cell,
    ctx: &mut TickContext<'_, R>,
) -> Result<Option<CellId>, AgentError> {
    let policy = me.profile().split;
    let child = match policy {
        SplitPolicy::Halve { cost } => {
            me.energy = (me.energy - cost) / 2.0;
            me.mass /= 2.0;
            Cell::new(ctx.next_id()?, me.profile().clone(), me.position)
                .with_mass(me.mass)
                .with_energy(me.energy)
                .with_velocity(me.velocity)
        }
        SplitPolicy::Seed {
            energy_cost,
            mass_cost,
            seed_mass,
            seed_energy,
            scatter,
        } => {
            me.energy -= energy_cost;
            me.mass -= mass_cost;
            let reach = scatter.abs();
            let offset = Vec2::new(
                ctx.rng.random_range(-reach..=reach),
                ctx.rng.random_range(-reach..=reach),
            );
            Cell::new(ctx.next_id()?, me.profile().clone(), me.position.plus(offset))
                .with_mass(seed_mass)
                .with_energy(seed_energy)
                .with_velocity(me.velocity)
        }
        SplitPolicy::None => return Ok(None),
    };
    let id = child.id;
    ctx.spawn(child);
    Ok(Some(id))
}
