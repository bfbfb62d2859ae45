//! Notebook server process management.
//!
//! ## Architecture
//!
//! - `supervisor`: Single-process lifecycle (start, stop, exit monitoring)
//! - `stream`: Diagnostic stream reader feeding the endpoint scanner
//! - `shutdown`: Graceful child termination
//! - `broadcaster`: Fan-out of lifecycle events to subscribers

mod broadcaster;
mod shutdown;
mod stream;
mod supervisor;

pub use broadcaster::ServerEventBroadcaster;
pub use shutdown::shutdown_child;
pub use stream::spawn_stream_reader;
pub use supervisor::{CrashReceiver, ServerSupervisor};
