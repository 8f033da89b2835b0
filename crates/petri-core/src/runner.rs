//! The paced async loop that drives an arena.
//!
//! [`run_simulation`] borrows the arena for the length of a run and steps it
//! tick by tick with:
//!
//! - **Pause/resume**: checked before every cell update, not just per tick
//! - **Clean stop**: checked at the same point; a half-computed tick is
//!   abandoned
//! - **Bounded runs**: stop after `max_ticks`, or when only food is left
//! - **Paced ticks**: each tick takes at least the tick budget; overruns by
//!   the simulation or the snapshot consumer are logged, never fatal
//!
//! After each tick the fresh snapshot is published and the runner waits,
//! bounded by the budget, for the consumer to acknowledge the previous one.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::arena::Arena;
use crate::channel::{AckWait, SnapshotPublisher};
use crate::operator::{OperatorState, SimulationEndReason};
use crate::tick::{TickError, TickSummary};

/// Overruns at or below this are not worth a warning.
pub const LAG_THRESHOLD: Duration = Duration::from_millis(1);

/// Failures that end a run early.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// What a finished run reports.
#[derive(Debug)]
pub struct SimulationResult {
    /// Why the run stopped.
    pub end_reason: SimulationEndReason,
    /// Summary of the last completed tick.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks completed by this run.
    pub total_ticks: u64,
}

/// Observer of completed ticks.
///
/// Receives the tick summary and the arena as it stands after the sweep.
pub trait TickCallback: Send {
    /// Sees the summary and the arena right after `summary.tick` finished.
    fn on_tick(&mut self, summary: &TickSummary, arena: &Arena);
}

/// Ignores every tick.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _arena: &Arena) {}
}

// ---------------------------------------------------------------------------
// Pacing
// ---------------------------------------------------------------------------

/// Which side of the hand-off held the tick up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bottleneck {
    /// Computing the tick took longest.
    Simulation,
    /// Consuming the previous snapshot took longest.
    Renderer,
}

impl fmt::Display for Bottleneck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulation => f.write_str("simulation"),
            Self::Renderer => f.write_str("renderer"),
        }
    }
}

/// A tick budget overrun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lag {
    /// The slower side.
    pub side: Bottleneck,
    /// Time beyond the budget.
    pub lost: Duration,
}

/// How to finish one tick's time slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    /// Time left to sleep before the next tick.
    pub sleep: Duration,
    /// Overrun worth reporting, if any.
    pub lag: Option<Lag>,
    /// Ticks per second achieved, `0.0` if the cycle took no time at all.
    pub tick_rate: f64,
}

/// Work out sleep, lag and tick rate from the budget and the time each side
/// spent.
pub fn pace(budget: Duration, simulation: Duration, renderer: Duration) -> Pacing {
    let (side, worst) = if renderer > simulation {
        (Bottleneck::Renderer, renderer)
    } else {
        (Bottleneck::Simulation, simulation)
    };
    let lost = worst.saturating_sub(budget);
    let cycle = budget.max(worst);
    Pacing {
        sleep: budget.saturating_sub(worst),
        lag: (lost > LAG_THRESHOLD).then_some(Lag { side, lost }),
        tick_rate: if cycle.is_zero() {
            0.0
        } else {
            cycle.as_secs_f64().recip()
        },
    }
}

// ---------------------------------------------------------------------------
// Run loop
// ---------------------------------------------------------------------------

/// Drive `arena` until the tick limit, extinction or a stop.
///
/// # Arguments
///
/// * `arena` - The seeded arena
/// * `publisher` - Snapshot hand-off to the consumer
/// * `operator` - Shared operator control state
/// * `callback` - Called after each tick
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably.
pub async fn run_simulation(
    arena: &mut Arena,
    publisher: &mut SnapshotPublisher,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = operator.max_ticks(),
        tick_budget_ms = operator.tick_budget_ms(),
        cells = arena.len(),
        "Simulation starting"
    );
    publisher.publish(arena.snapshot());
    let mut last_publish = Instant::now();

    loop {
        if checkpoint(operator, arena.tick()).await {
            return Ok(stopped(operator, last_summary, total_ticks).await);
        }

        // --- Act, cell by cell ---
        let started = Instant::now();
        for index in 0..arena.len() {
            if checkpoint(operator, arena.tick()).await {
                return Ok(stopped(operator, last_summary, total_ticks).await);
            }
            arena.step_cell(index)?;
        }
        let summary = arena.finish_tick()?;
        let simulation_time = started.elapsed();
        total_ticks = total_ticks.saturating_add(1);

        // --- Hand off ---
        publisher.publish(arena.snapshot());
        let budget = Duration::from_millis(operator.tick_budget_ms());
        // The snapshot published before this tick is stamped `summary.tick`.
        let renderer_time = if budget.is_zero() {
            Duration::ZERO
        } else {
            match publisher.wait_for_ack(summary.tick, budget).await {
                AckWait::Acknowledged(ack) => ack.render_time,
                AckWait::TimedOut => last_publish.elapsed(),
                AckWait::Closed => Duration::ZERO,
            }
        };
        last_publish = Instant::now();

        // --- Pace ---
        let pacing = pace(budget, simulation_time, renderer_time);
        if let Some(lag) = pacing.lag {
            warn!(
                tick = summary.tick,
                lagging = %lag.side,
                lost_ms = lag.lost.as_millis(),
                "{} is lagging",
                lag.side
            );
        }
        operator.record_tick_rate(pacing.tick_rate);
        arena.set_tick_rate(pacing.tick_rate);
        debug!(
            tick = summary.tick,
            simulation_us = simulation_time.as_micros(),
            renderer_us = renderer_time.as_micros(),
            tick_rate = pacing.tick_rate,
            "Tick paced"
        );

        // --- Notify callback ---
        callback.on_tick(&summary, arena);

        // --- Check extinction ---
        if summary.is_extinct() {
            info!(tick = summary.tick, "Only food left -- extinction");
            return Ok(ended(operator, SimulationEndReason::Extinction, summary, total_ticks).await);
        }

        // --- Check tick limit ---
        if operator.tick_limit_reached(arena.tick()) {
            info!(
                tick = summary.tick,
                max_ticks = operator.max_ticks(),
                "Tick limit reached"
            );
            return Ok(
                ended(operator, SimulationEndReason::MaxTicksReached, summary, total_ticks).await,
            );
        }

        last_summary = Some(summary);

        if !pacing.sleep.is_zero() {
            tokio::time::sleep(pacing.sleep).await;
        }
    }
}

/// Block while paused; report whether a stop was requested.
async fn checkpoint(operator: &OperatorState, tick: u64) -> bool {
    if operator.is_paused() && !operator.is_stop_requested() {
        info!(tick, "Simulation paused, waiting for resume...");
        operator.wait_if_paused().await;
        if !operator.is_stop_requested() {
            info!(tick, "Simulation resumed");
        }
    }
    operator.is_stop_requested()
}

async fn stopped(
    operator: &OperatorState,
    final_summary: Option<TickSummary>,
    total_ticks: u64,
) -> SimulationResult {
    info!("Operator stop requested");
    let end_reason = SimulationEndReason::OperatorStop;
    operator.set_end_reason(end_reason).await;
    SimulationResult {
        end_reason,
        final_summary,
        total_ticks,
    }
}

async fn ended(
    operator: &OperatorState,
    end_reason: SimulationEndReason,
    summary: TickSummary,
    total_ticks: u64,
) -> SimulationResult {
    operator.set_end_reason(end_reason).await;
    SimulationResult {
        end_reason,
        final_summary: Some(summary),
        total_ticks,
    }
}

/// Log how and when the run ended.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        final_cells = result.final_summary.as_ref().map(TickSummary::total),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            population = ?summary.population,
            deaths = summary.deaths.len(),
            "Final tick summary"
        );
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use petri_types::{Species, Vec2};

    use super::*;
    use crate::arena;
    use crate::channel::snapshot_channel;

    fn arena_with(species: &[Species]) -> Arena {
        let mut arena = Arena::new(400.0, 400.0, Some(5), arena::catalog(&[]).unwrap(), 0);
        for (i, s) in species.iter().enumerate() {
            let x = 40.0 + 60.0 * f64::from(u32::try_from(i).unwrap());
            arena.spawn(*s, Vec2::new(x, 200.0)).unwrap();
        }
        arena
    }

    struct CountCallback {
        count: u64,
    }

    impl TickCallback for CountCallback {
        fn on_tick(&mut self, _summary: &TickSummary, _arena: &Arena) {
            self.count = self.count.saturating_add(1);
        }
    }

    #[test]
    fn pace_sleeps_out_the_budget() {
        let p = pace(
            Duration::from_millis(30),
            Duration::from_millis(10),
            Duration::from_millis(4),
        );
        assert_eq!(p.sleep, Duration::from_millis(20));
        assert_eq!(p.lag, None);
        assert!((p.tick_rate - 1000.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn pace_blames_the_slower_side() {
        let p = pace(
            Duration::from_millis(10),
            Duration::from_millis(5),
            Duration::from_millis(25),
        );
        assert_eq!(p.sleep, Duration::ZERO);
        assert_eq!(
            p.lag,
            Some(Lag {
                side: Bottleneck::Renderer,
                lost: Duration::from_millis(15),
            })
        );
        assert!((p.tick_rate - 40.0).abs() < 1e-9);

        let p = pace(Duration::from_millis(10), Duration::from_millis(20), Duration::ZERO);
        assert_eq!(p.lag.map(|l| l.side), Some(Bottleneck::Simulation));
    }

    #[test]
    fn pace_ignores_sub_millisecond_overrun() {
        let p = pace(Duration::from_millis(10), Duration::from_micros(10_900), Duration::ZERO);
        assert_eq!(p.lag, None);
    }

    #[test]
    fn uncapped_zero_cycle_has_no_rate() {
        let p = pace(Duration::ZERO, Duration::ZERO, Duration::ZERO);
        assert!(p.tick_rate.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut arena = arena_with(&[Species::Grazer, Species::Plant]);
        let (mut publisher, _consumer) = snapshot_channel(arena.snapshot());
        let operator = Arc::new(OperatorState::new(0, 5));
        let mut cb = CountCallback { count: 0 };

        let result = run_simulation(&mut arena, &mut publisher, &operator, &mut cb)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(cb.count, 5);
        assert_eq!(arena.tick(), 5);
        assert_eq!(operator.end_reason().await, Some(SimulationEndReason::MaxTicksReached));
    }

    #[tokio::test]
    async fn operator_stop() {
        let mut arena = arena_with(&[Species::Grazer]);
        let (mut publisher, _consumer) = snapshot_channel(arena.snapshot());
        let operator = Arc::new(OperatorState::new(0, 0));
        operator.request_stop();

        let result = run_simulation(&mut arena, &mut publisher, &operator, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
    }

    #[tokio::test]
    async fn extinction_stops_simulation() {
        let mut arena = arena_with(&[Species::Agar, Species::Agar]);
        let (mut publisher, _consumer) = snapshot_channel(arena.snapshot());
        let operator = Arc::new(OperatorState::new(0, 0));

        let result = run_simulation(&mut arena, &mut publisher, &operator, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::Extinction);
        assert_eq!(result.total_ticks, 1);
    }

    #[tokio::test]
    async fn stop_while_paused_exits_cleanly() {
        let mut arena = arena_with(&[Species::Grazer]);
        let (mut publisher, _consumer) = snapshot_channel(arena.snapshot());
        let operator = Arc::new(OperatorState::new(0, 0));
        operator.pause();

        let stopper = {
            let operator = Arc::clone(&operator);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                operator.request_stop();
            })
        };
        let result = run_simulation(&mut arena, &mut publisher, &operator, &mut NoOpCallback)
            .await
            .unwrap();
        stopper.await.unwrap();

        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(arena.tick(), 0);
    }

    #[tokio::test]
    async fn acknowledging_consumer_sees_every_tick_it_acks() {
        let mut arena = arena_with(&[Species::Plant, Species::Grazer]);
        let (mut publisher, mut consumer) = snapshot_channel(arena.snapshot());
        let operator = Arc::new(OperatorState::new(2, 4));

        let reader = tokio::spawn(async move {
            let mut last = None;
            while let Some(snapshot) = consumer.next().await {
                consumer.ack(snapshot.tick, Duration::ZERO);
                last = Some(snapshot.tick);
            }
            last
        });

        let result = run_simulation(&mut arena, &mut publisher, &operator, &mut NoOpCallback)
            .await
            .unwrap();
        drop(publisher);

        assert_eq!(result.total_ticks, 4);
        assert_eq!(reader.await.unwrap(), Some(4));
        assert!(operator.tick_rate() > 0.0);
    }

    #[tokio::test]
    async fn seed_ack_does_not_cover_snapshot_one() {
        let mut arena = arena_with(&[Species::Plant]);
        let (mut publisher, mut consumer) = snapshot_channel(arena.snapshot());

        let seed = consumer.next().await.unwrap();
        consumer.ack(seed.tick, Duration::ZERO);
        assert!(matches!(
            publisher.wait_for_ack(0, Duration::from_millis(50)).await,
            AckWait::Acknowledged(_)
        ));

        arena.run_tick().unwrap();
        publisher.publish(arena.snapshot());
        assert_eq!(
            publisher.wait_for_ack(1, Duration::from_millis(10)).await,
            AckWait::TimedOut
        );
    }

    #[tokio::test]
    async fn first_tick_waits_for_the_seed_ack() {
        let mut arena = arena_with(&[Species::Plant]);
        let (mut publisher, mut consumer) = snapshot_channel(arena.snapshot());
        let operator = Arc::new(OperatorState::new(200, 1));

        let reader = tokio::spawn(async move {
            let first = consumer.next().await.unwrap();
            tokio::time::sleep(Duration::from_millis(30)).await;
            consumer.ack(first.tick, Duration::from_millis(30));
        });

        let started = Instant::now();
        let result = run_simulation(&mut arena, &mut publisher, &operator, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.total_ticks, 1);
        reader.await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn seed_only_ack_lets_the_tick_one_wait_time_out() {
        let mut arena = arena_with(&[Species::Plant]);
        let (mut publisher, mut consumer) = snapshot_channel(arena.snapshot());
        let operator = Arc::new(OperatorState::new(60, 2));

        let seed = consumer.next().await.unwrap();
        assert_eq!(seed.tick, 0);
        consumer.ack(seed.tick, Duration::ZERO);

        let started = Instant::now();
        let result = run_simulation(&mut arena, &mut publisher, &operator, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.total_ticks, 2);
        assert_eq!(consumer.latest().tick, 2);
        assert!(started.elapsed() >= Duration::from_millis(60));
    }
}
