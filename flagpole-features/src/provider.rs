//! Sources of conditions.

use crate::condition::Condition;
use crate::error::Result;
use crate::store::FlagStateStore;
use async_trait::async_trait;
use flagpole_config::FlagSettings;
use std::sync::Arc;

/// Something that can list conditions for a flag name.
#[async_trait]
pub trait ConditionProvider: Send + Sync {
    /// Short label for logs.
    fn source(&self) -> &'static str;

    /// Conditions for `name`, in this source's order.
    async fn conditions(&self, name: &str) -> Result<Vec<Condition>>;

    /// Every flag this source knows about.
    async fn flag_names(&self) -> Result<Vec<String>>;

    /// Whether this source knows the flag, even with no conditions.
    async fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.flag_names().await?.iter().any(|n| n == name))
    }
}

/// Conditions declared in settings.
#[derive(Debug, Clone, Default)]
pub struct StaticConditions {
    settings: FlagSettings,
}

impl StaticConditions {
    pub fn new(settings: FlagSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ConditionProvider for StaticConditions {
    fn source(&self) -> &'static str {
        "settings"
    }

    async fn conditions(&self, name: &str) -> Result<Vec<Condition>> {
        Ok(self
            .settings
            .conditions(name)
            .map(|entries| entries.iter().map(Condition::from).collect())
            .unwrap_or_default())
    }

    async fn flag_names(&self) -> Result<Vec<String>> {
        Ok(self.settings.names().map(str::to_string).collect())
    }

    async fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.settings.contains(name))
    }
}

/// Conditions stored as rows.
#[derive(Clone)]
pub struct StoredConditions {
    store: Arc<dyn FlagStateStore>,
}

impl StoredConditions {
    pub fn new(store: Arc<dyn FlagStateStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ConditionProvider for StoredConditions {
    fn source(&self) -> &'static str {
        "store"
    }

    async fn conditions(&self, name: &str) -> Result<Vec<Condition>> {
        Ok(self
            .store
            .by_name(name)
            .await?
            .iter()
            .map(|row| row.to_condition())
            .collect())
    }

    async fn flag_names(&self) -> Result<Vec<String>> {
        self.store.names().await
    }

    async fn contains(&self, name: &str) -> Result<bool> {
        Ok(!self.store.by_name(name).await?.is_empty())
    }
}
