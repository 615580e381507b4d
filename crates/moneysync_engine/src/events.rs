//! Sync notifications for UI collaborators.

use chrono::{DateTime, Utc};
use moneysync_protocol::RecordId;
use tokio::sync::broadcast;

/// Something UI collaborators may want to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A run finished successfully.
    Completed {
        /// Recorded last-sync time.
        at: DateTime<Utc>,
    },
    /// An offline-created transaction now has a server id.
    TransactionConfirmed {
        /// The placeholder it was stored under.
        placeholder: RecordId,
        /// Its server identity.
        confirmed: RecordId,
    },
    /// A run ended without completing.
    Failed {
        /// True when the cause was connectivity.
        network: bool,
    },
}

/// The narrow publishing capability the engine is given.
pub trait SyncEventSink: Send + Sync {
    /// Publishes an event. Never blocks and never fails.
    fn publish(&self, event: SyncEvent);
}

/// Broadcast fan-out of sync events.
///
/// Slow subscribers lag and lose the oldest events rather than holding up
/// the engine.
#[derive(Debug, Clone)]
pub struct SyncEventBus {
    sender: broadcast::Sender<SyncEvent>,
}

impl SyncEventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SyncEventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl SyncEventSink for SyncEventBus {
    fn publish(&self, event: SyncEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }
}
