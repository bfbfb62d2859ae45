//! Server lifecycle events.
//!
//! Emitted by the supervisor and crash handler so that a host UI (or a log
//! consumer) can follow what the notebook server is doing without polling.

use serde::{Deserialize, Serialize};

use crate::domain::FailureKind;

/// Server lifecycle event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    /// A launch is about to be attempted with the given executable.
    Starting { executable: String },

    /// The process spawned successfully.
    Running { pid: u32 },

    /// The connection URL was found in the diagnostic stream.
    #[serde(rename = "endpoint")]
    EndpointDiscovered { url: String },

    /// Launch failed or the running process died unexpectedly.
    Crashed { kind: FailureKind, message: String },

    /// The process is gone, either via `stop` or a clean exit.
    Stopped,

    /// The user chose to reload after a crash.
    Recovering,

    /// The user chose to close the session after a crash.
    #[serde(rename = "closed")]
    SessionClosed,
}

impl ServerEvent {
    /// Short lowercase name, matching the serialized `type` tag.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Starting { .. } => "starting",
            Self::Running { .. } => "running",
            Self::EndpointDiscovered { .. } => "endpoint",
            Self::Crashed { .. } => "crashed",
            Self::Stopped => "stopped",
            Self::Recovering => "recovering",
            Self::SessionClosed => "closed",
        }
    }
}
