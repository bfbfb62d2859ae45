//! Process supervision and OS-level concerns for labhost.
//!
//! This crate implements the pieces that touch the operating system: finding
//! the server executable, spawning and stopping it, reading its diagnostic
//! stream, persisting preferences and reacting to crashes. All host-specific
//! interaction (dialogs, navigation, session teardown) goes through the ports
//! defined in `labhost-core`.
#![deny(unsafe_code)]

pub mod crash;
pub mod locator;
pub mod process;
pub mod scanner;
pub mod store;

pub use crash::{CrashHandler, CrashState, RecoveryOutcome};
pub use locator::{ExecutableLocator, FsProvider, ResolveOutcome, ResolveSource, SystemFs};
pub use process::{CrashReceiver, ServerEventBroadcaster, ServerSupervisor, shutdown_child};
pub use scanner::{MAX_PATTERN_LEN, OutputScanner};
pub use store::JsonPreferenceStore;
