//! Filesystem provider trait for testable executable discovery.

use std::io;
use std::path::Path;

/// Trait for filesystem operations (injectable for testing).
pub trait FsProvider: Send + Sync {
    /// Whether `path` exists. Errors (including permission denied) count as absent.
    fn exists(&self, path: &Path) -> bool;

    /// Read a whole text file.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Production filesystem provider that uses real filesystem operations.
pub struct SystemFs;

impl FsProvider for SystemFs {
    fn exists(&self, path: &Path) -> bool {
        path.try_exists().unwrap_or(false)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

#[cfg(test)]
pub use mock::MockFs;
