//! Event emitter trait for server lifecycle events.
//!
//! Implementations handle transport details (channels, UI events, logs).

use crate::events::ServerEvent;

/// Trait for emitting server lifecycle events.
///
/// Implementations must not block; they are called from the supervisor's
/// stream and exit-monitor tasks.
pub trait ServerEventEmitter: Send + Sync {
    fn emit(&self, event: ServerEvent);
}

/// A no-op event emitter for tests and contexts without listeners.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    pub const fn new() -> Self {
        Self
    }
}

impl ServerEventEmitter for NoopEmitter {
    fn emit(&self, _event: ServerEvent) {
        // Intentionally do nothing
    }
}
