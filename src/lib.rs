// Flagpole - feature flags with static and stored conditions
//
// This library ties together flag evaluation, settings loading, logging and
// the optional admin pages.

// Re-export the flag engine
pub use flagpole_features::*;

// Re-export member crates
pub use flagpole_config;
pub use flagpole_features;
pub use flagpole_log;

#[cfg(feature = "admin")]
pub use flagpole_admin;

pub use async_trait::async_trait;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        Condition,
        ConditionRegistry,
        EvaluationContext,
        Flag,
        FlagError,
        FlagEvaluator,
        FlagState,
        FlagStateStore,
        MemoryFlagStore,
        NewFlagState,
        async_trait,
        set_boolean,
    };

    pub use flagpole_config::{AdminSettings, ConditionEntry, ConfigService, FlagSettings};

    #[cfg(feature = "admin")]
    pub use flagpole_admin::{AdminConfig, AdminRequest, AdminResponse, FlagAdmin};

    pub use std::sync::Arc;
}
