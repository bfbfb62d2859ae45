//! Port definitions (trait abstractions) for external collaborators.
//!
//! Ports define the interfaces that the core expects from the desktop shell:
//! preference storage, dialogs, navigation and the owning session. They
//! contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No process or filesystem implementation details
//! - Interactive prompts are async so they never block the event loop
//! - Everything is `Send + Sync` so it can be shared across tokio tasks

pub mod event_emitter;
pub mod navigation;
pub mod preference_store;
pub mod prompt;

use thiserror::Error;

pub use event_emitter::{NoopEmitter, ServerEventEmitter};
pub use navigation::{NavigationSink, WorkspaceSession};
pub use preference_store::{
    EXECUTABLE_PATH_KEY, InMemoryPreferenceStore, PreferenceError, PreferenceStore,
};
pub use prompt::{ChoicePrompt, FilePrompt, FilePromptOptions, FileSelection};

/// Errors returned from supervisor operations.
///
/// Launch failures are returned to the caller *and* routed to the crash
/// handler; the error value is informational, recovery is the handler's job.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The executable could not be spawned.
    #[error("Failed to launch '{executable}': {message}")]
    Launch { executable: String, message: String },

    /// Terminating the running process failed.
    #[error("Failed to stop server process: {0}")]
    Stop(String),

    /// The session was closed; no further starts are accepted.
    #[error("Session is closed")]
    Closed,
}

impl SupervisorError {
    /// Raw error text suitable for a crash dialog.
    pub fn description(&self) -> String {
        match self {
            Self::Launch { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
