//! Conditions attached to flags.

use flagpole_config::ConditionEntry;
use serde::{Deserialize, Serialize};

pub const BOOLEAN: &str = "boolean";
pub const USER: &str = "user";
pub const ANONYMOUS: &str = "anonymous";
pub const PARAMETER: &str = "parameter";
pub const PATH_MATCHES: &str = "path matches";
pub const AFTER_DATE: &str = "after date";
pub const BEFORE_DATE: &str = "before date";

/// Spelling of a true boolean value.
pub const TRUE: &str = "True";
/// Spelling of a false boolean value.
pub const FALSE: &str = "False";

/// Where a condition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Origin {
    /// Declared in settings; read-only
    Static,
    /// A stored row, editable through the admin
    Stored { id: i64 },
}

/// One rule contributing to a flag's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Kind, e.g. `boolean` or `path matches`
    pub condition: String,
    /// Kind-specific value
    pub value: String,
    /// Required conditions gate the flag
    pub required: bool,
    pub origin: Origin,
}

impl Condition {
    pub fn new(condition: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            value: value.into(),
            required: false,
            origin: Origin::Static,
        }
    }

    /// Boolean condition with the stored spelling of `enabled`.
    pub fn boolean(enabled: bool) -> Self {
        Self::new(BOOLEAN, if enabled { TRUE } else { FALSE })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    pub fn is_boolean(&self) -> bool {
        self.condition == BOOLEAN
    }

    /// Id of the backing row, for stored conditions.
    pub fn stored_id(&self) -> Option<i64> {
        match self.origin {
            Origin::Stored { id } => Some(id),
            Origin::Static => None,
        }
    }
}

impl From<&ConditionEntry> for Condition {
    fn from(entry: &ConditionEntry) -> Self {
        Self {
            condition: entry.condition.clone(),
            value: entry.value.clone(),
            required: entry.required,
            origin: Origin::Static,
        }
    }
}
