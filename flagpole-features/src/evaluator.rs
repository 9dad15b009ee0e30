//! The flag evaluator: merges providers and decides flag state.

use crate::condition::Condition;
use crate::context::EvaluationContext;
use crate::flag::Flag;
use crate::provider::{ConditionProvider, StaticConditions, StoredConditions};
use crate::registry::ConditionRegistry;
use crate::store::FlagStateStore;
use flagpole_config::FlagSettings;
use flagpole_log::{debug, warn};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Answers "is this flag on?".
///
/// Providers are consulted in registration order and their conditions
/// concatenated; [`FlagEvaluator::new`] registers settings before the store,
/// so static conditions always precede stored ones. A provider that fails
/// is logged and contributes nothing.
#[derive(Clone)]
pub struct FlagEvaluator {
    providers: Vec<Arc<dyn ConditionProvider>>,
    registry: Arc<ConditionRegistry>,
}

impl FlagEvaluator {
    /// Settings first, then the store, with the built-in condition kinds.
    pub fn new(settings: FlagSettings, store: Arc<dyn FlagStateStore>) -> Self {
        Self::builder()
            .provider(StaticConditions::new(settings))
            .provider(StoredConditions::new(store))
            .build()
    }

    pub fn builder() -> FlagEvaluatorBuilder {
        FlagEvaluatorBuilder::default()
    }

    pub fn registry(&self) -> &ConditionRegistry {
        &self.registry
    }

    /// Merged conditions for a flag.
    pub async fn conditions(&self, name: &str) -> Vec<Condition> {
        let mut merged = Vec::new();
        for provider in &self.providers {
            match provider.conditions(name).await {
                Ok(conditions) => merged.extend(conditions),
                Err(e) => {
                    warn!("condition provider failed"; source = provider.source(), flag = name, error = e);
                }
            }
        }
        merged
    }

    /// Whether any provider knows the flag.
    pub async fn exists(&self, name: &str) -> bool {
        for provider in &self.providers {
            match provider.contains(name).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => {
                    warn!("condition provider failed"; source = provider.source(), flag = name, error = e);
                }
            }
        }
        false
    }

    /// The flag with its merged conditions, or `None` if no provider knows it.
    pub async fn flag(&self, name: &str) -> Option<Flag> {
        if !self.exists(name).await {
            return None;
        }
        Some(Flag {
            name: name.to_string(),
            conditions: self.conditions(name).await,
        })
    }

    /// Every known flag, sorted by name.
    pub async fn flags(&self) -> Vec<Flag> {
        let mut names = BTreeSet::new();
        for provider in &self.providers {
            match provider.flag_names().await {
                Ok(found) => names.extend(found),
                Err(e) => {
                    warn!("condition provider failed"; source = provider.source(), error = e);
                }
            }
        }

        let mut flags = Vec::with_capacity(names.len());
        for name in names {
            let conditions = self.conditions(&name).await;
            flags.push(Flag { name, conditions });
        }
        flags
    }

    /// Whether the flag is on for this request. Unknown flags are off.
    pub async fn is_enabled(&self, name: &str, ctx: &EvaluationContext) -> bool {
        let flag = Flag {
            name: name.to_string(),
            conditions: self.conditions(name).await,
        };
        let enabled = flag.check_state(&self.registry, ctx);
        debug!("flag evaluated"; flag = name, conditions = flag.conditions.len(), enabled = enabled);
        enabled
    }

    pub async fn is_disabled(&self, name: &str, ctx: &EvaluationContext) -> bool {
        !self.is_enabled(name, ctx).await
    }

    /// `None` when the flag does not exist in any source.
    pub async fn flag_state(&self, name: &str, ctx: &EvaluationContext) -> Option<bool> {
        let flag = self.flag(name).await?;
        Some(flag.check_state(&self.registry, ctx))
    }
}

/// Builder for [`FlagEvaluator`]
#[derive(Default)]
pub struct FlagEvaluatorBuilder {
    providers: Vec<Arc<dyn ConditionProvider>>,
    registry: Option<ConditionRegistry>,
}

impl FlagEvaluatorBuilder {
    /// Append a provider; earlier providers' conditions come first.
    pub fn provider(mut self, provider: impl ConditionProvider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Replace the built-in condition kinds.
    pub fn registry(mut self, registry: ConditionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> FlagEvaluator {
        FlagEvaluator {
            providers: self.providers,
            registry: Arc::new(self.registry.unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{BOOLEAN, Origin, PATH_MATCHES};
    use crate::error::{FlagError, Result};
    use crate::store::{MemoryFlagStore, NewFlagState};
    use async_trait::async_trait;
    use flagpole_config::ConditionEntry;

    fn settings() -> FlagSettings {
        FlagSettings::new()
            .with_condition("FLAG_ENABLED", ConditionEntry::new(BOOLEAN, "True"))
            .with_condition("FLAG_DISABLED", ConditionEntry::new(PATH_MATCHES, "/disabled"))
    }

    fn evaluator(store: &Arc<MemoryFlagStore>) -> FlagEvaluator {
        FlagEvaluator::new(settings(), store.clone())
    }

    struct Broken;

    #[async_trait]
    impl ConditionProvider for Broken {
        fn source(&self) -> &'static str {
            "broken"
        }

        async fn conditions(&self, _name: &str) -> Result<Vec<Condition>> {
            Err(FlagError::Store("connection refused".to_string()))
        }

        async fn flag_names(&self) -> Result<Vec<String>> {
            Err(FlagError::Store("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_static_conditions_come_first() {
        let store = Arc::new(MemoryFlagStore::new());
        store
            .create(NewFlagState::new("FLAG_ENABLED", BOOLEAN, "False"))
            .await
            .unwrap();

        let conditions = evaluator(&store).conditions("FLAG_ENABLED").await;

        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].origin, Origin::Static);
        assert_eq!(conditions[0].value, "True");
        assert!(matches!(conditions[1].origin, Origin::Stored { .. }));
        assert_eq!(conditions[1].value, "False");
    }

    #[tokio::test]
    async fn test_unknown_flag_is_off() {
        let store = Arc::new(MemoryFlagStore::new());
        let evaluator = evaluator(&store);
        let ctx = EvaluationContext::new();

        assert!(!evaluator.is_enabled("NOPE", &ctx).await);
        assert!(evaluator.is_disabled("NOPE", &ctx).await);
        assert_eq!(evaluator.flag_state("NOPE", &ctx).await, None);
    }

    #[tokio::test]
    async fn test_sources_combine() {
        let store = Arc::new(MemoryFlagStore::new());
        let evaluator = evaluator(&store);

        let on_path = EvaluationContext::new().with_path("/disabled/page");
        let elsewhere = EvaluationContext::new().with_path("/home");

        assert!(evaluator.is_enabled("FLAG_ENABLED", &elsewhere).await);
        assert!(evaluator.is_enabled("FLAG_DISABLED", &on_path).await);
        assert!(!evaluator.is_enabled("FLAG_DISABLED", &elsewhere).await);

        store
            .create(NewFlagState::new("FLAG_DISABLED", BOOLEAN, "True"))
            .await
            .unwrap();
        assert!(evaluator.is_enabled("FLAG_DISABLED", &elsewhere).await);
    }

    #[tokio::test]
    async fn test_stored_required_gate_blocks_static_true() {
        let store = Arc::new(MemoryFlagStore::new());
        store
            .create(NewFlagState::new("FLAG_ENABLED", PATH_MATCHES, "^/beta").required(true))
            .await
            .unwrap();
        let evaluator = evaluator(&store);

        assert!(!evaluator.is_enabled("FLAG_ENABLED", &EvaluationContext::new().with_path("/home")).await);
        assert!(evaluator.is_enabled("FLAG_ENABLED", &EvaluationContext::new().with_path("/beta")).await);
    }

    #[tokio::test]
    async fn test_flags_lists_every_source() {
        let store = Arc::new(MemoryFlagStore::new());
        store.create(NewFlagState::initial("DBONLY_FLAG")).await.unwrap();

        let names: Vec<String> = evaluator(&store)
            .flags()
            .await
            .into_iter()
            .map(|f| f.name)
            .collect();

        assert_eq!(names, vec!["DBONLY_FLAG", "FLAG_DISABLED", "FLAG_ENABLED"]);
    }

    #[tokio::test]
    async fn test_failing_provider_is_skipped() {
        let evaluator = FlagEvaluator::builder()
            .provider(Broken)
            .provider(StaticConditions::new(settings()))
            .build();
        let ctx = EvaluationContext::new();

        assert!(evaluator.is_enabled("FLAG_ENABLED", &ctx).await);
        assert!(evaluator.exists("FLAG_ENABLED").await);
        assert_eq!(evaluator.flags().await.len(), 2);
    }

    #[tokio::test]
    async fn test_flag_declared_without_conditions_exists() {
        let evaluator = FlagEvaluator::builder()
            .provider(StaticConditions::new(FlagSettings::new().with_flag("EMPTY")))
            .build();

        let flag = evaluator.flag("EMPTY").await.unwrap();
        assert!(flag.conditions.is_empty());
        assert_eq!(
            evaluator.flag_state("EMPTY", &EvaluationContext::new()).await,
            Some(false)
        );
    }

    #[tokio::test]
    async fn test_custom_registry() {
        let evaluator = FlagEvaluator::builder()
            .provider(StaticConditions::new(settings()))
            .registry(ConditionRegistry::empty())
            .build();

        assert!(!evaluator.is_enabled("FLAG_ENABLED", &EvaluationContext::new()).await);
    }
}
