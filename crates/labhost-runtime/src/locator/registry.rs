//! Conda environment registry scanning.
//!
//! `~/.conda/environments.txt` lists one environment root per line. An
//! environment is a candidate when `<root>/bin/<binary>` exists. The list is
//! recomputed on every call and never cached.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::fs::FsProvider;

/// Split registry contents into environment roots.
///
/// Accepts `\n`, `\r\n` and bare `\r` separators; blank lines are dropped.
pub fn parse_registry(contents: &str) -> Vec<PathBuf> {
    contents
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Path of the server binary inside an environment root.
pub fn binary_in_env(env_root: &Path, binary_name: &str) -> PathBuf {
    env_root.join("bin").join(binary_name)
}

/// Environment roots from `registry_file` that contain the server binary,
/// in file order.
///
/// A missing or unreadable registry yields an empty list.
pub fn candidate_environments(
    registry_file: &Path,
    binary_name: &str,
    fs: &dyn FsProvider,
) -> Vec<PathBuf> {
    if !fs.exists(registry_file) {
        debug!(registry = %registry_file.display(), "No environment registry");
        return Vec::new();
    }

    let contents = match fs.read_to_string(registry_file) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(registry = %registry_file.display(), error = %e, "Cannot read environment registry");
            return Vec::new();
        }
    };

    let candidates: Vec<PathBuf> = parse_registry(&contents)
        .into_iter()
        .filter(|root| fs.exists(&binary_in_env(root, binary_name)))
        .collect();

    debug!(
        registry = %registry_file.display(),
        count = candidates.len(),
        "Scanned environment registry"
    );
    candidates
}
