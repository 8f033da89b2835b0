//! Pause, stop and pacing controls shared between the run loop and its owner.
//!
//! The binary wires Ctrl-C to [`OperatorState::request_stop`]. Pausing,
//! retuning the tick budget and stopping never tear down the arena.
//!
//! All control fields are atomics so the run loop can poll them before every
//! cell without taking a lock.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::SimulationConfig;

/// Largest tick budget the operator may set, in milliseconds.
pub const MAX_TICK_BUDGET_MS: u64 = 1000;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// An operator issued a stop command.
    OperatorStop,
    /// Nothing but food is left in the arena.
    Extinction,
}

/// Controls shared by the run loop and whoever drives it.
#[derive(Debug)]
pub struct OperatorState {
    /// Held before the next cell update.
    paused: AtomicBool,

    /// Wakes the run loop on resume or stop.
    wake: Notify,

    /// Set once by `request_stop`.
    stop_requested: AtomicBool,

    /// Minimum wall time per tick in milliseconds (runtime-adjustable).
    tick_budget_ms: AtomicU64,

    /// Last measured ticks per second, stored as `f64` bits.
    tick_rate_bits: AtomicU64,

    /// Wall-clock time when the operator state was created.
    started_at: DateTime<Utc>,

    /// Maximum number of ticks (0 = unlimited).
    max_ticks: u64,

    /// Set when the run loop exits.
    end_reason: Mutex<Option<SimulationEndReason>>,
}

impl OperatorState {
    /// Create a running (unpaused) operator state.
    pub fn new(tick_budget_ms: u64, max_ticks: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            wake: Notify::new(),
            stop_requested: AtomicBool::new(false),
            tick_budget_ms: AtomicU64::new(tick_budget_ms),
            tick_rate_bits: AtomicU64::new(0.0_f64.to_bits()),
            started_at: Utc::now(),
            max_ticks,
            end_reason: Mutex::new(None),
        }
    }

    /// Create operator state from configuration, paused if so configured.
    pub fn from_config(config: &SimulationConfig) -> Self {
        let state = Self::new(config.timing.tick_budget_ms, config.max_ticks);
        if config.start_paused {
            state.pause();
        }
        state
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether the run loop is held before its next cell update.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the simulation. The run loop blocks before its next cell.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the simulation and wake the run loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.wake.notify_one();
    }

    /// Wait until the simulation is no longer paused, or a stop was
    /// requested.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.wake.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean simulation stop. Also releases a paused run loop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Whether someone asked the run loop to stop.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Remember why the run ended.
    pub async fn set_end_reason(&self, reason: SimulationEndReason) {
        let mut guard = self.end_reason.lock().await;
        *guard = Some(reason);
    }

    /// Why the run ended, once it has.
    pub async fn end_reason(&self) -> Option<SimulationEndReason> {
        *self.end_reason.lock().await
    }

    // -----------------------------------------------------------------------
    // Tick budget and rate
    // -----------------------------------------------------------------------

    /// Get the current tick budget in milliseconds.
    pub fn tick_budget_ms(&self) -> u64 {
        self.tick_budget_ms.load(Ordering::Acquire)
    }

    /// Set the tick budget in milliseconds. Zero uncaps the tick rate.
    ///
    /// Returns the previous budget on success, or `None` if the value was
    /// rejected (above [`MAX_TICK_BUDGET_MS`]).
    pub fn set_tick_budget_ms(&self, ms: u64) -> Option<u64> {
        if ms > MAX_TICK_BUDGET_MS {
            return None;
        }
        Some(self.tick_budget_ms.swap(ms, Ordering::AcqRel))
    }

    /// Last measured ticks per second.
    pub fn tick_rate(&self) -> f64 {
        f64::from_bits(self.tick_rate_bits.load(Ordering::Acquire))
    }

    /// Store the latest measured tick rate.
    pub fn record_tick_rate(&self, rate: f64) {
        self.tick_rate_bits.store(rate.to_bits(), Ordering::Release);
    }

    // -----------------------------------------------------------------------
    // Boundaries
    // -----------------------------------------------------------------------

    /// Whether `completed_ticks` has used up the tick allowance.
    ///
    /// Returns `true` if `max_ticks > 0` and `completed_ticks >= max_ticks`.
    pub const fn tick_limit_reached(&self, completed_ticks: u64) -> bool {
        self.max_ticks > 0 && completed_ticks >= self.max_ticks
    }

    /// Tick allowance, 0 when unbounded.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// When this state was created.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since the operator state was created.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}
