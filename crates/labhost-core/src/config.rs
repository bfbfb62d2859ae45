//! Runtime configuration.
//!
//! Every location the supervisor touches (home directory, registry file,
//! preference file) is carried here explicitly instead of living in global
//! state. Defaults come from the platform; `LABHOST_*` environment variables
//! override them. The CLI loads a `.env` file into the environment first.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::paths::{
    PathError, binary_file_name, default_preferences_file, default_registry_file, expand_home,
    home_dir,
};

/// Default server binary looked up under `<env>/bin/`.
pub const DEFAULT_BINARY_NAME: &str = "jupyter-lab";

/// Default arguments appended to the launch command.
pub const DEFAULT_LAUNCH_ARGS: [&str; 2] = ["--no-browser", "-y"];

/// Default grace period between SIGTERM and SIGKILL.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Name used in dialogs and log messages.
pub const DEFAULT_DISPLAY_NAME: &str = "Jupyter Lab";

pub const ENV_HOME: &str = "LABHOST_HOME";
pub const ENV_REGISTRY_FILE: &str = "LABHOST_REGISTRY_FILE";
pub const ENV_BINARY: &str = "LABHOST_BINARY";
pub const ENV_ARGS: &str = "LABHOST_ARGS";
pub const ENV_SHUTDOWN_GRACE_SECS: &str = "LABHOST_SHUTDOWN_GRACE_SECS";
pub const ENV_PREFERENCES: &str = "LABHOST_PREFERENCES";
pub const ENV_DISPLAY_NAME: &str = "LABHOST_DISPLAY_NAME";

/// Errors building a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Path(#[from] PathError),

    /// An override could not be parsed.
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Trait for accessing environment variables (injectable for testing).
pub trait EnvProvider {
    /// Get an environment variable.
    fn get(&self, key: &str) -> Option<OsString>;
}

/// Production environment provider that reads from the actual process environment.
pub struct SystemEnv;

impl EnvProvider for SystemEnv {
    fn get(&self, key: &str) -> Option<OsString> {
        std::env::var_os(key)
    }
}

/// Test/mock environment provider with predefined variables.
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: std::collections::HashMap<String, OsString>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl EnvProvider for MapEnv {
    fn get(&self, key: &str) -> Option<OsString> {
        self.vars.get(key).cloned()
    }
}

/// Everything the locator and supervisor need to know about the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabhostConfig {
    /// Working directory for the server and default prompt location.
    pub home_dir: PathBuf,
    /// Newline-delimited list of environment roots.
    pub registry_file: PathBuf,
    /// File name looked up as `<env>/bin/<binary_name>`.
    pub binary_name: String,
    /// Arguments passed after the executable.
    pub launch_args: Vec<String>,
    /// How long `stop` waits after SIGTERM before killing.
    pub shutdown_grace: Duration,
    /// JSON file backing the preference store.
    pub preferences_file: PathBuf,
    /// Human-readable server name for dialogs.
    pub display_name: String,
}

impl LabhostConfig {
    /// Defaults rooted at `home`, with no environment overrides.
    pub fn for_home(home: impl Into<PathBuf>) -> Self {
        let home_dir = home.into();
        Self {
            registry_file: default_registry_file(&home_dir),
            preferences_file: home_dir.join(".labhost").join("settings.json"),
            binary_name: binary_file_name(DEFAULT_BINARY_NAME),
            launch_args: DEFAULT_LAUNCH_ARGS.iter().map(ToString::to_string).collect(),
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            home_dir,
        }
    }

    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_provider(&SystemEnv)
    }

    /// Build from an injected environment.
    pub fn from_env_provider(env: &dyn EnvProvider) -> Result<Self, ConfigError> {
        let home_dir = match lookup(env, ENV_HOME) {
            Some(raw) => PathBuf::from(raw),
            None => home_dir()?,
        };

        let mut config = Self::for_home(home_dir);

        config.preferences_file = match lookup(env, ENV_PREFERENCES) {
            Some(raw) => expand_home(&raw, &config.home_dir)?,
            None => default_preferences_file()?,
        };

        if let Some(raw) = lookup(env, ENV_REGISTRY_FILE) {
            config.registry_file = expand_home(&raw, &config.home_dir)?;
            debug!(registry = %config.registry_file.display(), "Registry file overridden");
        }

        if let Some(raw) = lookup(env, ENV_BINARY) {
            config.binary_name = binary_file_name(&raw);
        }

        if let Some(raw) = lookup(env, ENV_ARGS) {
            config.launch_args = raw.split_whitespace().map(ToString::to_string).collect();
        }

        if let Some(raw) = lookup(env, ENV_SHUTDOWN_GRACE_SECS) {
            let secs = raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_SHUTDOWN_GRACE_SECS,
                    value: raw.clone(),
                })?;
            config.shutdown_grace = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(env, ENV_DISPLAY_NAME) {
            config.display_name = raw;
        }

        Ok(config)
    }

    /// Override the registry file.
    #[must_use]
    pub fn with_registry_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.registry_file = path.into();
        self
    }

    /// Override the server binary name.
    #[must_use]
    pub fn with_binary_name(mut self, name: &str) -> Self {
        self.binary_name = binary_file_name(name);
        self
    }

    /// Override the launch arguments.
    #[must_use]
    pub fn with_launch_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.launch_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Override the shutdown grace period.
    #[must_use]
    pub const fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Override the preference file.
    #[must_use]
    pub fn with_preferences_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.preferences_file = path.into();
        self
    }
}

/// Non-empty, trimmed environment value.
fn lookup(env: &dyn EnvProvider, key: &str) -> Option<String> {
    env.get(key)
        .map(|v| v.to_string_lossy().trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_for_home_defaults() {
        let config = LabhostConfig::for_home("/home/ada");
        assert_eq!(
            config.registry_file,
            PathBuf::from("/home/ada/.conda/environments.txt")
        );
        assert_eq!(config.launch_args, vec!["--no-browser", "-y"]);
        assert_eq!(config.shutdown_grace, Duration::from_secs(5));
        assert_eq!(config.display_name, "Jupyter Lab");
    }

    #[test]
    fn test_env_overrides() {
        let env = MapEnv::new()
            .with_var(ENV_HOME, "/home/grace")
            .with_var(ENV_PREFERENCES, "~/prefs.json")
            .with_var(ENV_REGISTRY_FILE, "~/envs.txt")
            .with_var(ENV_ARGS, "--no-browser  --port 9999")
            .with_var(ENV_SHUTDOWN_GRACE_SECS, "2");

        let config = LabhostConfig::from_env_provider(&env).unwrap();

        assert_eq!(config.home_dir, Path::new("/home/grace"));
        assert_eq!(config.preferences_file, Path::new("/home/grace/prefs.json"));
        assert_eq!(config.registry_file, Path::new("/home/grace/envs.txt"));
        assert_eq!(config.launch_args, vec!["--no-browser", "--port", "9999"]);
        assert_eq!(config.shutdown_grace, Duration::from_secs(2));
    }

    #[test]
    fn test_invalid_grace_is_rejected() {
        let env = MapEnv::new()
            .with_var(ENV_HOME, "/home/grace")
            .with_var(ENV_PREFERENCES, "/tmp/prefs.json")
            .with_var(ENV_SHUTDOWN_GRACE_SECS, "soon");

        let err = LabhostConfig::from_env_provider(&env).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: ENV_SHUTDOWN_GRACE_SECS,
                ..
            }
        ));
    }

    #[test]
    fn test_blank_override_is_ignored() {
        let env = MapEnv::new()
            .with_var(ENV_HOME, "/home/grace")
            .with_var(ENV_PREFERENCES, "/tmp/prefs.json")
            .with_var(ENV_BINARY, "   ");

        let config = LabhostConfig::from_env_provider(&env).unwrap();
        assert_eq!(config.binary_name, binary_file_name(DEFAULT_BINARY_NAME));
    }
}
