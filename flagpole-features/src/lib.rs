//! Feature Flags for Flagpole
//!
//! Flags are named switches whose state is decided by conditions. Conditions
//! come from settings (static, read-only) and from stored rows (editable
//! through the admin); the evaluator merges both and applies the
//! required/optional policy.
//!
//! # Features
//!
//! - **Condition kinds** - boolean, user, anonymous, parameter, path matches,
//!   after date, before date, plus your own
//! - **Required conditions** - gates that must hold for a flag to be on
//! - **Pluggable sources** - settings and any [`FlagStateStore`]
//!
//! # Quick Start
//!
//! ```
//! use flagpole_config::{ConditionEntry, FlagSettings};
//! use flagpole_features::*;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let settings = FlagSettings::new()
//!     .with_condition("BETA", ConditionEntry::new("path matches", "^/beta"));
//! let store = Arc::new(MemoryFlagStore::new());
//! let flags = FlagEvaluator::new(settings, store.clone());
//!
//! let ctx = EvaluationContext::new().with_path("/beta/home");
//! assert!(flags.is_enabled("BETA", &ctx).await);
//!
//! // Operators switch flags on through a stored boolean row.
//! set_boolean(store.as_ref(), "NEW_UI", true).await.unwrap();
//! assert!(flags.is_enabled("NEW_UI", &EvaluationContext::new()).await);
//! # });
//! ```
//!
//! # Required Conditions
//!
//! ```
//! use flagpole_features::*;
//!
//! let flag = Flag::new("STAFF_BETA")
//!     .with_condition(Condition::boolean(true))
//!     .with_condition(Condition::new("user", "liberty").required());
//!
//! let registry = ConditionRegistry::new();
//! assert!(!flag.check_state(&registry, &EvaluationContext::new()));
//! assert!(flag.check_state(&registry, &EvaluationContext::new().with_user("liberty")));
//! ```

pub mod condition;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod flag;
pub mod provider;
pub mod registry;
pub mod store;

pub use condition::{Condition, Origin};
pub use context::EvaluationContext;
pub use error::{FlagError, Result};
pub use evaluator::{FlagEvaluator, FlagEvaluatorBuilder};
pub use flag::Flag;
pub use provider::{ConditionProvider, StaticConditions, StoredConditions};
pub use registry::{ConditionCheck, ConditionRegistry};
pub use store::{FlagState, FlagStateStore, MemoryFlagStore, NewFlagState, set_boolean};
