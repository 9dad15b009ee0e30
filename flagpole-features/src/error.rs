//! Error types for flags and condition stores

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlagError {
    /// No stored condition with this id
    #[error("Flag condition not found: {0}")]
    NotFound(i64),

    /// Condition kind nobody registered
    #[error("Unknown condition: {0}")]
    UnknownCondition(String),

    /// Value rejected by a condition's validator
    #[error("Invalid value for {condition}: {message}")]
    InvalidValue { condition: String, message: String },

    /// Backing store failure
    #[error("Store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, FlagError>;
