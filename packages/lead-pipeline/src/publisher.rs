//! Outbound event fan-out.
//!
//! # Guarantees
//!
//! - **At-most-once delivery**: slow receivers may miss events (`Lagged`)
//! - **No listener, no delivery**: events sent with zero subscribers are dropped
//! - Publishing never blocks and never fails the orchestrator

use tokio::sync::broadcast;

use crate::events::ScanEvent;
use crate::traits::ProgressPublisher;

/// Default channel capacity for UI events.
const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<ScanEvent>,
}

impl BroadcastPublisher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BroadcastPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastPublisher")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

impl ProgressPublisher for BroadcastPublisher {
    fn publish(&self, event: ScanEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("No UI listener, event dropped");
        }
    }
}
