//! Tick callback and event logger used by the binary.

use petri_core::arena::Arena;
use petri_core::channel::EventFeed;
use petri_core::runner::TickCallback;
use petri_core::tick::TickSummary;
use petri_types::{LifecycleEvent, Species};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

/// Forwards lifecycle events to the feed and logs the population every
/// `every` ticks.
#[derive(Debug)]
pub struct PopulationLogger {
    every: u64,
    events: EventFeed,
}

impl PopulationLogger {
    /// Log every `every` ticks (0 never logs).
    pub const fn new(every: u64, events: EventFeed) -> Self {
        Self { every, events }
    }

    const fn due(&self, tick: u64) -> bool {
        matches!(tick.checked_rem(self.every), Some(0))
    }
}

impl TickCallback for PopulationLogger {
    fn on_tick(&mut self, summary: &TickSummary, arena: &Arena) {
        self.events.send_all(&summary.events);
        if self.due(summary.tick) {
            info!(
                tick = summary.tick,
                grazers = summary.count(Species::Grazer),
                predators = summary.count(Species::Predator),
                plants = summary.count(Species::Plant),
                agar = summary.count(Species::Agar),
                cells = arena.len(),
                tick_rate = arena.snapshot().tick_rate,
                "Population"
            );
        }
    }
}

/// Log lifecycle events as they arrive, until the feed is dropped.
pub async fn log_events(mut events: broadcast::Receiver<LifecycleEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => info!(tick = event.tick, cell = %event.cell, "{event}"),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Event log fell behind, events dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use petri_core::arena::catalog;
    use petri_types::Vec2;

    use super::*;

    #[test]
    fn due_every_n_ticks() {
        let logger = PopulationLogger::new(100, EventFeed::new(4));
        assert!(logger.due(0));
        assert!(!logger.due(99));
        assert!(logger.due(200));
    }

    #[test]
    fn zero_interval_never_logs() {
        let logger = PopulationLogger::new(0, EventFeed::new(4));
        assert!(!logger.due(0));
        assert!(!logger.due(100));
    }

    #[tokio::test]
    async fn forwards_events_to_the_feed() {
        let feed = EventFeed::new(8);
        let mut rx = feed.subscribe();
        let mut logger = PopulationLogger::new(0, feed);

        let mut arena = Arena::new(200.0, 200.0, Some(1), catalog(&[]).unwrap(), 0);
        let parent = arena.spawn(Species::Grazer, Vec2::new(100.0, 100.0)).unwrap();
        if let Some(cell) = arena.cell_mut(parent) {
            cell.energy = 400.0;
            cell.mass = 145.0;
        }
        let summary = arena.run_tick().unwrap();
        logger.on_tick(&summary, &arena);

        let first = rx.recv().await.unwrap();
        assert_eq!(Some(&first), summary.events.first());
    }
}
