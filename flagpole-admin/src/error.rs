//! Error types for the flag admin

use crate::forms::FormErrors;
use flagpole_features::FlagError;
use thiserror::Error;

/// Admin error types
#[derive(Error, Debug)]
pub enum AdminError {
    /// No source knows the flag
    #[error("Flag not found: {0}")]
    FlagNotFound(String),

    /// No stored condition with this id on this flag
    #[error("Condition not found: {flag}/{id}")]
    ConditionNotFound { flag: String, id: i64 },

    /// Submitted form did not validate
    #[error("Invalid form: {0}")]
    Form(FormErrors),

    /// Backing store failure
    #[error("Store error: {0}")]
    Store(#[from] FlagError),
}

impl AdminError {
    /// HTTP status the error maps to.
    pub fn status(&self) -> u16 {
        match self {
            Self::FlagNotFound(_) | Self::ConditionNotFound { .. } => 404,
            Self::Form(_) => 200,
            Self::Store(_) => 500,
        }
    }
}

/// Result type for admin operations
pub type AdminResult<T> = Result<T, AdminError>;
