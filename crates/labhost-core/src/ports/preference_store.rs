//! Persisted preference store port.
//!
//! The core only needs a single string key (the executable path). Storage
//! mechanics belong to the implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Key under which the resolved executable path is stored.
pub const EXECUTABLE_PATH_KEY: &str = "executablePath";

/// Errors raised by a preference store backend.
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// The backing storage could not be read or written.
    #[error("Preference storage error: {0}")]
    Storage(String),

    /// Stored data could not be (de)serialized.
    #[error("Preference serialization error: {0}")]
    Serialization(String),
}

/// Durable key/value storage for user preferences.
///
/// Implementations must be cheap to call from async code; the core calls
/// them inline during executable resolution.
pub trait PreferenceStore: Send + Sync {
    /// Read a value. `Ok(None)` means the key has never been set.
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

/// Non-durable store for tests and headless runs.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a value.
    #[must_use]
    pub fn with_value(self, key: &str, value: &str) -> Self {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        self
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let values = self
            .values
            .lock()
            .map_err(|e| PreferenceError::Storage(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| PreferenceError::Storage(e.to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
