//! Persisted flag conditions.
//!
//! Each [`FlagState`] row is one condition of one flag; a flag owns every
//! row sharing its name. [`FlagStateStore`] is the seam a deployment fills
//! with its database; [`MemoryFlagStore`] keeps rows in process.

use crate::condition::{BOOLEAN, Condition, FALSE, Origin, TRUE};
use crate::error::{FlagError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicI64, Ordering};

/// A stored condition row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagState {
    pub id: i64,
    pub name: String,
    pub condition: String,
    pub value: String,
    pub required: bool,
}

impl FlagState {
    pub fn to_condition(&self) -> Condition {
        Condition {
            condition: self.condition.clone(),
            value: self.value.clone(),
            required: self.required,
            origin: Origin::Stored { id: self.id },
        }
    }
}

/// Column values for inserting or replacing a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFlagState {
    pub name: String,
    pub condition: String,
    pub value: String,
    #[serde(default)]
    pub required: bool,
}

impl NewFlagState {
    pub fn new(
        name: impl Into<String>,
        condition: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            condition: condition.into(),
            value: value.into(),
            required: false,
        }
    }

    /// The row a newly created flag starts with: boolean, off, optional.
    pub fn initial(name: impl Into<String>) -> Self {
        Self::new(name, BOOLEAN, FALSE)
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

/// Storage for flag condition rows.
///
/// Rows come back in ascending id order.
#[async_trait]
pub trait FlagStateStore: Send + Sync {
    async fn all(&self) -> Result<Vec<FlagState>>;

    /// Fails with [`FlagError::NotFound`] for unknown ids.
    async fn get(&self, id: i64) -> Result<FlagState>;

    async fn by_name(&self, name: &str) -> Result<Vec<FlagState>>;

    /// Distinct flag names, sorted.
    async fn names(&self) -> Result<Vec<String>>;

    async fn count(&self) -> Result<usize>;

    async fn create(&self, row: NewFlagState) -> Result<FlagState>;

    async fn update(&self, id: i64, row: NewFlagState) -> Result<FlagState>;

    /// Remove a row, returning it.
    async fn delete(&self, id: i64) -> Result<FlagState>;
}

/// Turn a flag on or off through its boolean row.
///
/// Updates the first boolean row of the flag, or creates one when the flag
/// has none. Other rows are left alone.
///
/// Disabling writes a required `False` row, so the flag stays off even when
/// another optional condition (such as a static `True`) holds. Enabling sets
/// the row to `True` and keeps its `required` flag.
pub async fn set_boolean(
    store: &dyn FlagStateStore,
    name: &str,
    enabled: bool,
) -> Result<FlagState> {
    let value = if enabled { TRUE } else { FALSE };

    let existing = store
        .by_name(name)
        .await?
        .into_iter()
        .find(|row| row.condition == BOOLEAN);

    match existing {
        Some(row) => {
            let required = row.required || !enabled;
            let update = NewFlagState::new(name, BOOLEAN, value).required(required);
            store.update(row.id, update).await
        }
        None => {
            let row = NewFlagState::new(name, BOOLEAN, value).required(!enabled);
            store.create(row).await
        }
    }
}

/// In-process store. Ids start at 1 and are never reused.
#[derive(Debug)]
pub struct MemoryFlagStore {
    rows: RwLock<BTreeMap<i64, FlagState>>,
    next_id: AtomicI64,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for MemoryFlagStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlagStateStore for MemoryFlagStore {
    async fn all(&self) -> Result<Vec<FlagState>> {
        Ok(self.rows.read().values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<FlagState> {
        self.rows
            .read()
            .get(&id)
            .cloned()
            .ok_or(FlagError::NotFound(id))
    }

    async fn by_name(&self, name: &str) -> Result<Vec<FlagState>> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|row| row.name == name)
            .cloned()
            .collect())
    }

    async fn names(&self) -> Result<Vec<String>> {
        let names: BTreeSet<String> = self
            .rows
            .read()
            .values()
            .map(|row| row.name.clone())
            .collect();
        Ok(names.into_iter().collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.rows.read().len())
    }

    async fn create(&self, row: NewFlagState) -> Result<FlagState> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let state = FlagState {
            id,
            name: row.name,
            condition: row.condition,
            value: row.value,
            required: row.required,
        };
        self.rows.write().insert(id, state.clone());
        Ok(state)
    }

    async fn update(&self, id: i64, row: NewFlagState) -> Result<FlagState> {
        let mut rows = self.rows.write();
        let state = rows.get_mut(&id).ok_or(FlagError::NotFound(id))?;
        state.name = row.name;
        state.condition = row.condition;
        state.value = row.value;
        state.required = row.required;
        Ok(state.clone())
    }

    async fn delete(&self, id: i64) -> Result<FlagState> {
        self.rows.write().remove(&id).ok_or(FlagError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::USER;

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let store = MemoryFlagStore::new();
        let a = store.create(NewFlagState::initial("A")).await.unwrap();
        let b = store.create(NewFlagState::initial("B")).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_initial_row_defaults() {
        let store = MemoryFlagStore::new();
        let row = store.create(NewFlagState::initial("NEW_FLAG")).await.unwrap();

        assert_eq!(row.condition, "boolean");
        assert_eq!(row.value, "False");
        assert!(!row.required);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let store = MemoryFlagStore::new();
        let a = store.create(NewFlagState::initial("A")).await.unwrap();
        store.delete(a.id).await.unwrap();
        let b = store.create(NewFlagState::initial("A")).await.unwrap();

        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let store = MemoryFlagStore::new();

        assert_eq!(store.get(9).await, Err(FlagError::NotFound(9)));
        assert_eq!(store.delete(9).await, Err(FlagError::NotFound(9)));
        assert_eq!(
            store.update(9, NewFlagState::initial("X")).await,
            Err(FlagError::NotFound(9))
        );
    }

    #[tokio::test]
    async fn test_names_distinct_and_sorted() {
        let store = MemoryFlagStore::new();
        store.create(NewFlagState::initial("B")).await.unwrap();
        store.create(NewFlagState::initial("A")).await.unwrap();
        store.create(NewFlagState::new("B", USER, "liberty")).await.unwrap();

        assert_eq!(store.names().await.unwrap(), vec!["A", "B"]);
        assert_eq!(store.by_name("B").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_set_boolean_creates_then_updates() {
        let store = MemoryFlagStore::new();

        let created = set_boolean(&store, "FLAG_DISABLED", true).await.unwrap();
        assert_eq!(created.value, "True");
        assert_eq!(store.count().await.unwrap(), 1);

        let updated = set_boolean(&store, "FLAG_DISABLED", false).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.value, "False");
        assert!(updated.required);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_disable_gates_optional_conditions() {
        let store = MemoryFlagStore::new();
        let initial = store.create(NewFlagState::initial("F")).await.unwrap();
        assert!(!initial.required);

        let disabled = set_boolean(&store, "F", false).await.unwrap();
        assert_eq!(disabled.id, initial.id);
        assert!(disabled.required);

        let enabled = set_boolean(&store, "F", true).await.unwrap();
        assert_eq!(enabled.value, "True");
        assert!(enabled.required);
    }

    #[tokio::test]
    async fn test_set_boolean_keeps_required_and_other_rows() {
        let store = MemoryFlagStore::new();
        store.create(NewFlagState::new("F", USER, "liberty")).await.unwrap();
        let gate = store
            .create(NewFlagState::new("F", BOOLEAN, TRUE).required(true))
            .await
            .unwrap();

        let updated = set_boolean(&store, "F", false).await.unwrap();

        assert_eq!(updated.id, gate.id);
        assert!(updated.required);
        assert_eq!(store.by_name("F").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_row_to_condition() {
        let store = MemoryFlagStore::new();
        let row = store.create(NewFlagState::new("F", USER, "liberty")).await.unwrap();
        let condition = row.to_condition();

        assert_eq!(condition.stored_id(), Some(row.id));
        assert_eq!(condition.value, "liberty");
    }
}
