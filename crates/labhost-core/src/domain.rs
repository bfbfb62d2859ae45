//! Domain types shared by the locator, supervisor and crash handler.
//!
//! These are plain values with no infrastructure dependencies. Anything that
//! touches the filesystem or spawns processes lives in `labhost-runtime`.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filesystem path believed to point at a runnable notebook server binary.
///
/// May be empty: a cancelled file prompt still produces a reference, and
/// downstream code must tolerate that. Validity is only confirmed by a
/// successful launch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutableRef(String);

impl ExecutableRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// An empty reference, as produced by a cancelled prompt.
    pub const fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl From<PathBuf> for ExecutableRef {
    fn from(path: PathBuf) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

impl From<&Path> for ExecutableRef {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

impl fmt::Display for ExecutableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connection URL scraped from the server's diagnostic output,
/// e.g. `http://localhost:8888/?token=abcd1234`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Port number embedded in the URL, if it parses.
    pub fn port(&self) -> Option<u16> {
        let rest = self.0.strip_prefix("http://localhost:")?;
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        digits.parse().ok()
    }

    /// Value of the `token` query parameter, if present.
    pub fn token(&self) -> Option<&str> {
        let (_, token) = self.0.split_once("token=")?;
        Some(token.split('&').next().unwrap_or(token))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle to the host window that owns the server session.
///
/// The core never inspects it; it is only passed through to prompts and the
/// navigation sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(String);

impl WindowHandle {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

/// Which of the two crash-recovery buttons the user picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrashChoice {
    Reload,
    Close,
}

impl CrashChoice {
    /// Button labels in prompt order. Index 0 is Reload, index 1 is Close.
    pub const BUTTONS: [&'static str; 2] = ["Reload", "Close"];

    /// Map a prompt's selected index to a choice.
    ///
    /// Anything other than 0 (including a dismissed dialog) closes the session.
    pub const fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Reload,
            _ => Self::Close,
        }
    }
}

/// How the supervised process failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The executable could not be spawned at all.
    Launch,
    /// The process was running and then exited or errored unexpectedly.
    Runtime,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Launch => write!(f, "launch failure"),
            Self::Runtime => write!(f, "runtime crash"),
        }
    }
}

/// A launch failure or runtime crash, as handed to the crash handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashReport {
    pub kind: FailureKind,
    /// Raw error description from the failed launch or exit.
    pub message: String,
    /// Diagnostic transcript captured up to the failure.
    pub transcript: String,
    /// Exit code, when the process exited normally with one.
    pub exit_code: Option<i32>,
    /// Supervisor generation the failure belongs to.
    pub generation: u64,
    pub occurred_at: DateTime<Utc>,
}

impl CrashReport {
    pub fn launch(message: impl Into<String>, generation: u64) -> Self {
        Self {
            kind: FailureKind::Launch,
            message: message.into(),
            transcript: String::new(),
            exit_code: None,
            generation,
            occurred_at: Utc::now(),
        }
    }

    pub fn runtime(
        message: impl Into<String>,
        transcript: String,
        exit_code: Option<i32>,
        generation: u64,
    ) -> Self {
        Self {
            kind: FailureKind::Runtime,
            message: message.into(),
            transcript,
            exit_code,
            generation,
            occurred_at: Utc::now(),
        }
    }
}
