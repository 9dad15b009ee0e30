//! Settings for Flagpole.
//!
//! Settings are a tree of JSON values built from layered sources (files,
//! `.env`, environment variables, explicit overrides). Later layers win;
//! tables are merged key by key. Keys are addressed with dotted paths such
//! as `admin.base_path`.
//!
//! ```
//! use flagpole_config::{ConfigManager, FlagSettings};
//!
//! let manager = ConfigManager::new();
//! manager
//!     .set("flags", serde_json::json!({ "BETA": [["boolean", true]] }))
//!     .unwrap();
//!
//! let flags = FlagSettings::from_manager(&manager).unwrap();
//! assert_eq!(flags.conditions("BETA").unwrap()[0].value, "True");
//! ```

pub mod config_service;
pub mod env;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use config_service::{ConfigService, ConfigServiceBuilder};
pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use settings::{AdminSettings, ConditionEntry, FlagSettings};
pub use validation::{ConfigValidator, Validate};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

/// Layered settings store
#[derive(Clone, Default)]
pub struct ConfigManager {
    tree: Arc<RwLock<Map<String, Value>>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            tree: Arc::default(),
            env_prefix: Some(prefix.into()),
        }
    }

    /// Merge prefixed environment variables into the tree.
    pub fn load_env(&self) {
        let loader = EnvLoader::new(self.env_prefix.clone());
        self.merge_value(Value::Object(loader.load()));
    }

    /// Load a `.env` file into the process environment, then merge the
    /// environment. A missing default `.env` is not an error.
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        self.load_env();
        Ok(())
    }

    /// Merge a settings file into the tree.
    pub fn load_file(&self, path: impl AsRef<Path>, format: FileFormat) -> Result<()> {
        let data = ConfigLoader::new(format).load_file(path)?;
        if !data.is_object() {
            return Err(ConfigError::ParseError(
                "settings file must contain a table at the top level".to_string(),
            ));
        }
        self.merge_value(data);
        Ok(())
    }

    /// Set a value at a dotted path, replacing whatever was there.
    pub fn set<T: serde::Serialize>(&self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        let mut overlay = value;
        for segment in key.split('.').rev() {
            let mut map = Map::new();
            map.insert(segment.to_string(), overlay);
            overlay = Value::Object(map);
        }

        // Replace the leaf rather than merging into it.
        self.remove(key);
        self.merge_value(overlay);
        Ok(())
    }

    /// Raw value at a dotted path.
    pub fn value(&self, key: &str) -> Option<Value> {
        let tree = self.tree.read();
        let mut segments = key.split('.');
        let mut current = tree.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current.clone())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .value(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get(key)
    }

    /// Boolean value; accepts real booleans and the strings
    /// `true`/`false`/`1`/`0` that environment variables produce.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        match self.value(key) {
            Some(Value::String(s)) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("`{}` is not a boolean", s),
                }),
            },
            Some(_) => self.get(key),
            None => Err(ConfigError::KeyNotFound(key.to_string())),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Top-level keys
    pub fn keys(&self) -> Vec<String> {
        self.tree.read().keys().cloned().collect()
    }

    /// Merge another manager's tree over this one.
    pub fn merge(&self, other: &ConfigManager) {
        let snapshot = Value::Object(other.tree.read().clone());
        self.merge_value(snapshot);
    }

    /// Deserialize the whole tree and validate it.
    pub fn load_validated<T: DeserializeOwned + Validate>(&self) -> Result<T> {
        let snapshot = Value::Object(self.tree.read().clone());
        let validated: T = serde_json::from_value(snapshot)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        validated.validate()?;

        Ok(validated)
    }

    fn remove(&self, key: &str) {
        let mut tree = self.tree.write();
        let segments: Vec<&str> = key.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut node = &mut *tree;
        for segment in parents {
            match node.get_mut(*segment) {
                Some(Value::Object(next)) => node = next,
                _ => return,
            }
        }
        node.remove(*last);
    }

    fn merge_value(&self, overlay: Value) {
        if let Value::Object(overlay) = overlay {
            let mut tree = self.tree.write();
            merge_maps(&mut tree, overlay);
        }
    }
}

fn merge_maps(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_maps(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
