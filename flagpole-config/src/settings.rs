//! Typed views over the settings tree.

use crate::{ConfigError, ConfigManager, ConfigValidator, Result, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One statically configured condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionEntry {
    pub condition: String,
    pub value: String,
    pub required: bool,
}

impl ConditionEntry {
    pub fn new(condition: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            value: value.into(),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Scalar as written in a settings file.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawScalar {
    fn into_value(self) -> String {
        match self {
            // Stored conditions use the same spelling.
            RawScalar::Bool(true) => "True".to_string(),
            RawScalar::Bool(false) => "False".to_string(),
            RawScalar::Int(n) => n.to_string(),
            RawScalar::Float(n) => n.to_string(),
            RawScalar::Text(s) => s,
        }
    }
}

/// Accepted spellings of a condition entry:
/// `[kind, value]`, `[kind, value, required]` or a table.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Triple(String, RawScalar, bool),
    Pair(String, RawScalar),
    Table {
        condition: String,
        value: RawScalar,
        #[serde(default)]
        required: bool,
    },
}

impl From<RawEntry> for ConditionEntry {
    fn from(raw: RawEntry) -> Self {
        let (condition, value, required) = match raw {
            RawEntry::Triple(condition, value, required) => (condition, value, required),
            RawEntry::Pair(condition, value) => (condition, value, false),
            RawEntry::Table {
                condition,
                value,
                required,
            } => (condition, value, required),
        };

        ConditionEntry {
            condition,
            value: value.into_value(),
            required,
        }
    }
}

/// The static flag table under the `flags` key.
///
/// A flag declared with an empty list exists but has no conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSettings {
    flags: BTreeMap<String, Vec<ConditionEntry>>,
}

impl FlagSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `flags` from the manager; an absent key means no static flags.
    pub fn from_manager(manager: &ConfigManager) -> Result<Self> {
        match manager.value("flags") {
            Some(value) => Self::from_value(value),
            None => Ok(Self::default()),
        }
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let raw: BTreeMap<String, Vec<RawEntry>> =
            serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
                key: "flags".to_string(),
                message: e.to_string(),
            })?;

        let flags = raw
            .into_iter()
            .map(|(name, entries)| (name, entries.into_iter().map(Into::into).collect()))
            .collect();

        Ok(Self { flags })
    }

    /// Declare a flag, appending a condition.
    pub fn with_condition(mut self, name: impl Into<String>, entry: ConditionEntry) -> Self {
        self.flags.entry(name.into()).or_default().push(entry);
        self
    }

    /// Declare a flag with no conditions.
    pub fn with_flag(mut self, name: impl Into<String>) -> Self {
        self.flags.entry(name.into()).or_default();
        self
    }

    pub fn conditions(&self, name: &str) -> Option<&[ConditionEntry]> {
        self.flags.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    /// Declared flag names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.flags.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl Validate for FlagSettings {
    fn validate(&self) -> Result<()> {
        for (name, entries) in &self.flags {
            ConfigValidator::not_empty(name, "flag name")?;
            for entry in entries {
                ConfigValidator::not_empty(&entry.condition, &format!("condition of {}", name))?;
            }
        }
        Ok(())
    }
}

pub const DEFAULT_BASE_PATH: &str = "/admin/flags";

/// Name of the flag that switches the admin into big-list mode.
pub const DEFAULT_BIG_LIST_FLAG: &str = "FLAGPOLE_ADMIN_BIG_LIST";

/// Admin settings under the `admin` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    /// Mount point of the flag admin
    pub base_path: String,
    /// Flag that, when enabled, redirects mutations to index anchors
    pub big_list_flag: String,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            big_list_flag: DEFAULT_BIG_LIST_FLAG.to_string(),
        }
    }
}

impl AdminSettings {
    pub fn from_manager(manager: &ConfigManager) -> Result<Self> {
        if manager.has("admin") {
            manager.get("admin")
        } else {
            Ok(Self::default())
        }
    }

    /// Base path without a trailing slash.
    pub fn base_path(&self) -> &str {
        self.base_path.trim_end_matches('/')
    }
}

impl Validate for AdminSettings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::is_url_path(&self.base_path, "admin.base_path")?;
        ConfigValidator::not_empty(&self.big_list_flag, "admin.big_list_flag")
    }
}
