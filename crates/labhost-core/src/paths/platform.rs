//! Platform-specific locations.
//!
//! Nothing here is cached in process-wide state; callers resolve once and pass
//! the result into `LabhostConfig`, so tests can substitute fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::PathError;

/// The user's home directory. The server is always launched from here.
pub fn home_dir() -> Result<PathBuf, PathError> {
    dirs::home_dir().ok_or(PathError::NoHomeDir)
}

/// Root directory for labhost's own data (preferences, `.env`).
///
/// Resolves to e.g. `~/.local/share/labhost` and creates it if missing.
pub fn data_root() -> Result<PathBuf, PathError> {
    let root = dirs::data_local_dir()
        .ok_or(PathError::NoDataDir)?
        .join("labhost");

    if !root.exists() {
        fs::create_dir_all(&root).map_err(|e| PathError::CreateFailed {
            path: root.clone(),
            reason: e.to_string(),
        })?;
    }

    Ok(root)
}

/// Conda's list of environment roots, `~/.conda/environments.txt`.
pub fn default_registry_file(home: &Path) -> PathBuf {
    home.join(".conda").join("environments.txt")
}

/// Location of the `.env` file that stores user overrides.
pub fn env_file_path() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join(".env"))
}

/// Default location of the JSON preference file.
pub fn default_preferences_file() -> Result<PathBuf, PathError> {
    Ok(data_root()?.join("settings.json"))
}

/// Platform file name for a server binary (`.exe` suffix on Windows).
pub fn binary_file_name(base: &str) -> String {
    #[cfg(target_os = "windows")]
    {
        if base.to_ascii_lowercase().ends_with(".exe") {
            base.to_string()
        } else {
            format!("{base}.exe")
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        base.to_string()
    }
}

/// Expand a leading `~` against `home`. Relative paths are left relative.
pub fn expand_home(raw: &str, home: &Path) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    if trimmed == "~" {
        return Ok(home.to_path_buf());
    }

    Ok(trimmed
        .strip_prefix("~/")
        .map_or_else(|| PathBuf::from(trimmed), |rest| home.join(rest)))
}
