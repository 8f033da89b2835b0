//! Hand-off between the tick loop and whoever draws or narrates it.
//!
//! Snapshots travel over a [`tokio::sync::watch`] channel: the producer swaps
//! in a fresh [`Arc<Snapshot>`] every tick and never touches one it already
//! published, so a reader sees either the previous or the current complete
//! snapshot. The consumer answers on a second watch channel with an [`Ack`]
//! carrying the tick it finished and how long that took.
//!
//! Lifecycle events go out on a [`tokio::sync::broadcast`] channel; nobody
//! has to listen.

use std::sync::Arc;
use std::time::Duration;

use petri_types::{LifecycleEvent, Snapshot};
use tokio::sync::{broadcast, watch};

use crate::arena::Arena;
use crate::runner::TickCallback;
use crate::tick::TickSummary;

/// A consumer's report that it finished with a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Tick of the snapshot that was consumed.
    pub tick: u64,
    /// Time the consumer spent on it.
    pub render_time: Duration,
}

/// Outcome of waiting for an acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckWait {
    /// The consumer caught up.
    Acknowledged(Ack),
    /// The wait hit its bound first.
    TimedOut,
    /// No consumer is attached any more.
    Closed,
}

/// Create a connected publisher and consumer, starting from `initial`.
pub fn snapshot_channel(initial: Arc<Snapshot>) -> (SnapshotPublisher, SnapshotConsumer) {
    let (snapshot_tx, mut snapshot_rx) = watch::channel(initial);
    // The consumer acknowledges the initial snapshot like any other.
    snapshot_rx.mark_changed();
    let (ack_tx, ack_rx) = watch::channel(None);
    (
        SnapshotPublisher {
            snapshots: snapshot_tx,
            acks: ack_rx,
        },
        SnapshotConsumer {
            snapshots: snapshot_rx,
            acks: ack_tx,
        },
    )
}

/// Producer half, held by the run loop.
#[derive(Debug)]
pub struct SnapshotPublisher {
    snapshots: watch::Sender<Arc<Snapshot>>,
    acks: watch::Receiver<Option<Ack>>,
}

impl SnapshotPublisher {
    /// Swap in a new snapshot. Never fails, even with no reader attached.
    pub fn publish(&self, snapshot: Arc<Snapshot>) {
        self.snapshots.send_replace(snapshot);
    }

    /// A read-only watcher that does not acknowledge.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshots.subscribe()
    }

    /// Whether the acknowledging consumer is still attached.
    pub fn has_consumer(&self) -> bool {
        self.acks.has_changed().is_ok()
    }

    /// Wait, at most `timeout`, until the consumer has acknowledged `tick`
    /// or a later one.
    pub async fn wait_for_ack(&mut self, tick: u64, timeout: Duration) -> AckWait {
        let wait = self
            .acks
            .wait_for(|ack| matches!(ack, Some(a) if a.tick >= tick));
        match tokio::time::timeout(timeout, wait).await {
            Ok(Ok(ack)) => (*ack).map_or(AckWait::Closed, AckWait::Acknowledged),
            Ok(Err(_)) => AckWait::Closed,
            Err(_) => AckWait::TimedOut,
        }
    }
}

/// Consumer half, held by a renderer.
#[derive(Debug)]
pub struct SnapshotConsumer {
    snapshots: watch::Receiver<Arc<Snapshot>>,
    acks: watch::Sender<Option<Ack>>,
}

impl SnapshotConsumer {
    /// Wait for a snapshot newer than the last one seen; the first call
    /// returns the initial snapshot. `None` once the publisher is gone.
    pub async fn next(&mut self) -> Option<Arc<Snapshot>> {
        self.snapshots.changed().await.ok()?;
        Some(Arc::clone(&self.snapshots.borrow_and_update()))
    }

    /// The current snapshot, without waiting.
    pub fn latest(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Report that the snapshot for `tick` has been consumed.
    pub fn ack(&self, tick: u64, render_time: Duration) {
        self.acks.send_replace(Some(Ack { tick, render_time }));
    }
}

// ---------------------------------------------------------------------------
// Lifecycle events
// ---------------------------------------------------------------------------

/// Broadcasts lifecycle events to any number of listeners.
#[derive(Debug, Clone)]
pub struct EventFeed {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventFeed {
    /// A feed buffering up to `capacity` events per slow listener.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// A new listener, seeing events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    /// Send every event in order. Having no listener is not an error.
    pub fn send_all(&self, events: &[LifecycleEvent]) {
        for event in events {
            // Err only means nobody is listening.
            let _ = self.sender.send(*event);
        }
    }
}

impl TickCallback for EventFeed {
    fn on_tick(&mut self, summary: &TickSummary, _arena: &Arena) {
        self.send_all(&summary.events);
    }
}
