//! Graceful process shutdown for the notebook server.

mod child;

pub use child::shutdown_child;
