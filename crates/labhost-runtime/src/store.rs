//! JSON-file preference store.
//!
//! Keeps all preferences in a single JSON object on disk. The file is read on
//! every `get` and rewritten on every `set`; writes are rare (once per
//! resolution) and the file is tiny.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use labhost_core::{PreferenceError, PreferenceStore};
use serde_json::{Map, Value};
use tracing::debug;

/// Preference store backed by a JSON object file.
pub struct JsonPreferenceStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonPreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>, PreferenceError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(PreferenceError::Storage(e.to_string())),
        };

        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(PreferenceError::Serialization(format!(
                "expected a JSON object in {}, found {}",
                self.path.display(),
                type_name(&other)
            ))),
            Err(e) => Err(PreferenceError::Serialization(e.to_string())),
        }
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let map = self.load()?;
        Ok(match map.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| PreferenceError::Storage(e.to_string()))?;

        let mut map = self.load()?;
        map.insert(key.to_string(), Value::String(value.to_string()));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| PreferenceError::Storage(e.to_string()))?;
        }

        let serialized = serde_json::to_string_pretty(&Value::Object(map))
            .map_err(|e| PreferenceError::Serialization(e.to_string()))?;
        fs::write(&self.path, serialized).map_err(|e| PreferenceError::Storage(e.to_string()))?;

        debug!(key = %key, path = %self.path.display(), "Saved preference");
        Ok(())
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
