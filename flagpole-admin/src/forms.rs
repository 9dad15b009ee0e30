//! Submitted forms and their validation

use flagpole_features::{ConditionRegistry, FlagError, NewFlagState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// Path segment of the create pages; a flag with this name could not be routed.
pub const CREATE_SEGMENT: &str = "create";

/// Field name -> messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_default().push(message.into());
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.fields.values().flatten().map(String::as_str)
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<validator::ValidationErrors> for FormErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut form = FormErrors::new();
        for (field, errors) in errors.field_errors() {
            for error in errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field));
                form.add(field.to_string(), message);
            }
        }
        form
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.messages().collect();
        f.write_str(&messages.join("; "))
    }
}

fn field<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn checkbox(pairs: &[(String, String)], name: &str) -> bool {
    matches!(
        field(pairs, name).map(str::to_lowercase).as_deref(),
        Some("on" | "true" | "1" | "yes")
    )
}

/// New flag form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewFlagForm {
    #[validate(length(min = 1, max = 64, message = "Enter a flag name of at most 64 characters"))]
    pub name: String,
}

impl NewFlagForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self::new(field(pairs, "name").unwrap_or_default().trim())
    }

    /// Field checks only; uniqueness needs the flag sources.
    pub fn check(&self) -> Result<(), FormErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => e.into(),
        };
        if self.name.contains('/') {
            errors.add("name", "Flag names cannot contain /");
        }
        if self.name == CREATE_SEGMENT {
            errors.add("name", format!("{} is reserved for the admin", CREATE_SEGMENT));
        }
        errors.into_result()
    }
}

/// Condition create/edit form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ConditionForm {
    #[validate(length(min = 1, max = 64, message = "Choose a condition"))]
    pub condition: String,
    #[validate(length(max = 127, message = "Enter a value of at most 127 characters"))]
    pub value: String,
    pub required: bool,
}

impl ConditionForm {
    pub fn new(condition: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            value: value.into(),
            required: false,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            condition: field(pairs, "condition").unwrap_or_default().trim().to_string(),
            value: field(pairs, "value").unwrap_or_default().trim().to_string(),
            required: checkbox(pairs, "required"),
        }
    }

    /// Field checks plus the condition kind's own validator.
    pub fn check(&self, registry: &ConditionRegistry) -> Result<(), FormErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::new(),
            Err(e) => e.into(),
        };

        if errors.field("condition").is_empty() {
            match registry.validate(&self.condition, &self.value) {
                Ok(()) => {}
                Err(FlagError::UnknownCondition(kind)) => {
                    errors.add("condition", format!("Unknown condition: {}", kind));
                }
                Err(FlagError::InvalidValue { message, .. }) => errors.add("value", message),
                Err(other) => errors.add("value", other.to_string()),
            }
        }

        errors.into_result()
    }

    pub fn into_row(self, name: &str) -> NewFlagState {
        NewFlagState::new(name, self.condition, self.value).required(self.required)
    }
}
