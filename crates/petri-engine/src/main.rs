//! Headless engine binary for the Petri simulation.
//!
//! Wires configuration, the arena, the operator controls and a headless
//! snapshot consumer together, then runs the simulation loop until a
//! termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `petri-config.yaml` (or the first argument)
//! 3. Build and seed the arena
//! 4. Create operator state
//! 5. Start the headless consumer and the event logger
//! 6. Run the simulation loop
//! 7. Log the result

mod error;
mod headless;
mod reporting;

use std::path::PathBuf;
use std::sync::Arc;

use petri_core::arena::Arena;
use petri_core::channel::{EventFeed, snapshot_channel};
use petri_core::config::SimulationConfig;
use petri_core::operator::OperatorState;
use petri_core::runner;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::headless::run_headless;
use crate::reporting::{PopulationLogger, log_events};

/// Default configuration file, resolved against the working directory.
const CONFIG_PATH: &str = "petri-config.yaml";

/// Population is logged every this many ticks.
const REPORT_EVERY: u64 = 100;

/// Lifecycle events buffered for slow subscribers.
const EVENT_CAPACITY: usize = 256;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("petri-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        width = config.arena.width,
        height = config.arena.height,
        seed = ?config.seed,
        tick_budget_ms = config.timing.tick_budget_ms,
        feed_rate = config.feed_rate,
        species_overrides = config.species.len(),
        "Configuration loaded"
    );

    // 3. Build and seed the arena.
    let mut arena = Arena::from_config(&config).map_err(EngineError::from)?;

    // 4. Create operator state.
    let operator = Arc::new(OperatorState::from_config(&config));
    info!(
        max_ticks = operator.max_ticks(),
        tick_budget_ms = operator.tick_budget_ms(),
        paused = operator.is_paused(),
        "Operator state initialized"
    );

    // 5. Consumers: the headless renderer and the event log.
    let (mut publisher, consumer) = snapshot_channel(arena.snapshot());
    let renderer = tokio::spawn(run_headless(consumer));

    let feed = EventFeed::new(EVENT_CAPACITY);
    let event_log = tokio::spawn(log_events(feed.subscribe()));

    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, stopping");
                    operator.request_stop();
                }
                Err(e) => warn!(error = %e, "Could not listen for interrupt"),
            }
        });
    }

    // 6. Run the simulation loop.
    let mut logger = PopulationLogger::new(REPORT_EVERY, feed);
    let result = runner::run_simulation(&mut arena, &mut publisher, &operator, &mut logger)
        .await
        .map_err(EngineError::from)?;

    // 7. Log the result and wind the consumers down.
    runner::log_simulation_end(&result);

    drop(publisher);
    drop(logger);
    let stats = renderer.await.map_err(EngineError::from)?;
    event_log.await.map_err(EngineError::from)?;
    info!(
        frames = stats.frames,
        last_tick = ?stats.last_tick,
        "Headless consumer finished"
    );

    info!("petri-engine shutdown complete");
    Ok(())
}

/// Load configuration from the first argument, or `petri-config.yaml`.
///
/// A missing file yields defaults.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_PATH), PathBuf::from);
    info!(path = %path.display(), "Loading configuration");
    Ok(SimulationConfig::from_file(&path)?)
}
