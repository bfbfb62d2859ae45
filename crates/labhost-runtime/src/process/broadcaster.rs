//! Server event broadcasting.
//!
//! Fans lifecycle events out to any number of subscribers (UI bridge, log
//! task, tests) over a tokio broadcast channel.

use labhost_core::{ServerEvent, ServerEventEmitter};
use tokio::sync::broadcast;
use tracing::debug;

/// Broadcast channel capacity for server events
const CHANNEL_CAPACITY: usize = 64;

/// Broadcaster for server lifecycle events
pub struct ServerEventBroadcaster {
    sender: broadcast::Sender<ServerEvent>,
}

impl ServerEventBroadcaster {
    /// Create a new broadcaster
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Broadcast a server event to all subscribers
    pub fn broadcast(&self, event: ServerEvent) {
        // Only log if there are receivers
        if self.sender.receiver_count() > 0 {
            debug!(?event, "Broadcasting server event");
            let _ = self.sender.send(event);
        }
    }

    /// Subscribe to server events
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ServerEventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerEventEmitter for ServerEventBroadcaster {
    fn emit(&self, event: ServerEvent) {
        self.broadcast(event);
    }
}
