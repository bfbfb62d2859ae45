//! Notebook server executable discovery.
//!
//! ## Architecture
//!
//! - `fs`: Filesystem operations trait (injectable for testing)
//! - `registry`: Conda environment registry parsing and candidate filtering
//! - `resolve`: Tiered resolution (persisted → registry → prompt)

mod fs;
mod registry;
mod resolve;

pub use fs::{FsProvider, SystemFs};
pub use registry::{binary_in_env, candidate_environments, parse_registry};
pub use resolve::{ExecutableLocator, ResolveOutcome, ResolveSource};

#[cfg(test)]
pub use fs::MockFs;
