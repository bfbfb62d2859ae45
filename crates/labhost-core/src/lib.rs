//! Core domain types and port definitions for labhost.
//!
//! labhost supervises a single local notebook server on behalf of a desktop
//! shell. This crate holds the pieces that carry no process or I/O behavior:
//! domain values, lifecycle events, configuration and the traits the shell
//! implements (preference store, prompts, navigation, session).
#![deny(unused_crate_dependencies)]

pub mod config;
pub mod domain;
pub mod events;
pub mod paths;
pub mod ports;

pub use config::{ConfigError, EnvProvider, LabhostConfig, MapEnv, SystemEnv};
pub use domain::{CrashChoice, CrashReport, Endpoint, ExecutableRef, FailureKind, WindowHandle};
pub use events::ServerEvent;
pub use paths::PathError;
pub use ports::{
    ChoicePrompt, EXECUTABLE_PATH_KEY, FilePrompt, FilePromptOptions, FileSelection,
    InMemoryPreferenceStore, NavigationSink, NoopEmitter, PreferenceError, PreferenceStore,
    ServerEventEmitter, SupervisorError, WorkspaceSession,
};

