// Settings validation

use crate::{ConfigError, Result};

/// Trait for validating settings
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Reusable validation rules
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                field
            )));
        }
        Ok(())
    }

    /// A URL path: starts with `/` and contains no query or fragment.
    pub fn is_url_path(value: &str, field: &str) -> Result<()> {
        if !value.starts_with('/') || value.contains(['?', '#']) {
            return Err(ConfigError::ValidationError(format!(
                "{} must be an absolute URL path, got `{}`",
                field, value
            )));
        }
        Ok(())
    }
}
