//! Navigation sink and workspace session ports.

use crate::domain::{Endpoint, WindowHandle};

/// Receives the discovered endpoint so the host can load it.
pub trait NavigationSink: Send + Sync {
    /// Point `window` at `endpoint`. Called at most once per server process.
    fn load_url(&self, window: &WindowHandle, endpoint: &Endpoint);
}

/// The window/session that owns the supervised server.
pub trait WorkspaceSession: Send + Sync {
    /// Handle passed through to prompts and the navigation sink.
    fn window(&self) -> WindowHandle;

    /// Tear the whole session down. Invoked on the Close crash choice.
    fn close(&self);
}
