//! A renderer stand-in for running without a window.
//!
//! It consumes snapshots the way a renderer would, tallies what it would
//! have drawn, and acknowledges each one so the run loop's hand-off and lag
//! accounting behave as they would with a real display attached.

use std::collections::BTreeMap;

use petri_core::channel::SnapshotConsumer;
use petri_types::{Snapshot, Species};
use tokio::time::Instant;
use tracing::debug;

/// What one snapshot would have put on screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// Sprites per species.
    pub sprites: BTreeMap<Species, usize>,
    /// Total painted area: discs for circles, squares for square sprites.
    pub area: f64,
}

impl Frame {
    /// Tally a snapshot.
    pub fn of(snapshot: &Snapshot) -> Self {
        let mut frame = Self::default();
        for sprite in &snapshot.cells {
            let n = frame.sprites.entry(sprite.species).or_insert(0);
            *n = n.saturating_add(1);
            frame.area += sprite.side().map_or_else(
                || core::f64::consts::PI * sprite.radius * sprite.radius,
                |side| side * side,
            );
        }
        frame
    }
}

/// Totals over a headless session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    /// Snapshots consumed.
    pub frames: u64,
    /// Tick of the last snapshot consumed.
    pub last_tick: Option<u64>,
}

/// Consume and acknowledge snapshots until the publisher goes away.
pub async fn run_headless(mut consumer: SnapshotConsumer) -> HeadlessStats {
    let mut stats = HeadlessStats::default();
    while let Some(snapshot) = consumer.next().await {
        let started = Instant::now();
        let frame = Frame::of(&snapshot);
        debug!(
            tick = snapshot.tick,
            tick_rate = snapshot.tick_rate,
            sprites = ?frame.sprites,
            area = frame.area,
            "Frame drawn"
        );
        consumer.ack(snapshot.tick, started.elapsed());
        stats.frames = stats.frames.saturating_add(1);
        stats.last_tick = Some(snapshot.tick);
    }
    stats
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use petri_core::channel::{AckWait, snapshot_channel};
    use petri_types::{CellId, CellSprite, Rgb, ShapeKind};

    use super::*;

    fn sprite(species: Species, radius: f64, shape: ShapeKind) -> CellSprite {
        CellSprite {
            id: CellId(1),
            species,
            x: 0.0,
            y: 0.0,
            radius,
            color: Rgb::new(0, 0, 0),
            shape,
        }
    }

    #[test]
    fn frame_counts_and_paints() {
        let snapshot = Snapshot {
            tick: 3,
            tick_rate: 30.0,
            cells: vec![
                sprite(Species::Grazer, 1.0, ShapeKind::Circle),
                sprite(Species::Grazer, 2.0, ShapeKind::Circle),
                sprite(Species::Plant, 0.75, ShapeKind::Square),
            ],
        };
        let frame = Frame::of(&snapshot);
        assert_eq!(frame.sprites.get(&Species::Grazer), Some(&2));
        assert_eq!(frame.sprites.get(&Species::Plant), Some(&1));
        // Square of radius 0.75 has side sqrt(2), area 2.
        let expected = core::f64::consts::PI * 5.0 + 2.0;
        assert!((frame.area - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn acknowledges_what_it_consumes() {
        let (mut publisher, consumer) = snapshot_channel(Arc::new(Snapshot::default()));
        let task = tokio::spawn(run_headless(consumer));

        publisher.publish(Arc::new(Snapshot {
            tick: 7,
            ..Snapshot::default()
        }));
        let waited = publisher.wait_for_ack(7, Duration::from_secs(1)).await;
        assert!(matches!(waited, AckWait::Acknowledged(ack) if ack.tick == 7));

        drop(publisher);
        let stats = task.await.unwrap();
        assert_eq!(stats.last_tick, Some(7));
        assert!(stats.frames >= 1);
    }
}
