// Copyright 2025 Cowboy AI, LLC.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::EntityRef;
use crate::errors::DomainResult;

/// The single state row of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    /// Record id
    pub id: Uuid,
    /// Owning entity
    pub owner: EntityRef,
    /// Current state as `Type@Case`
    pub current_state: Option<String>,
    /// Free-form data blob
    pub data: Map<String, Json>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last write time
    pub updated_at: DateTime<Utc>,
}

impl StateRecord {
    /// Empty record for `owner`
    pub fn new(owner: EntityRef) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner,
            current_state: None,
            data: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Persistent storage for state records, one per owner
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Record of `owner`, if any
    async fn load(&self, owner: &EntityRef) -> DomainResult<Option<StateRecord>>;

    /// Insert or replace the record of `record.owner`
    async fn save(&self, record: StateRecord) -> DomainResult<()>;

    /// Remove the record of `owner`; true when one existed
    async fn delete(&self, owner: &EntityRef) -> DomainResult<bool>;

    /// Open a unit of work
    async fn begin(&self) -> DomainResult<Box<dyn StateTransaction>>;
}

/// All-or-nothing group of writes
///
/// Reads see the transaction's own staged writes. Nothing is visible to the
/// store until `commit`.
#[async_trait]
pub trait StateTransaction: Send {
    /// Record of `owner` as seen inside the transaction
    async fn load(&mut self, owner: &EntityRef) -> DomainResult<Option<StateRecord>>;

    /// Stage a write
    async fn save(&mut self, record: StateRecord) -> DomainResult<()>;

    /// Apply staged writes
    async fn commit(self: Box<Self>) -> DomainResult<()>;

    /// Drop staged writes
    async fn rollback(self: Box<Self>) -> DomainResult<()>;
}

type Records = Arc<RwLock<HashMap<EntityRef, StateRecord>>>;

/// Process-local state store
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateStore {
    records: Records,
}

impl InMemoryStateStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no record is stored
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, owner: &EntityRef) -> DomainResult<Option<StateRecord>> {
        Ok(self.records.read().await.get(owner).cloned())
    }

    async fn save(&self, record: StateRecord) -> DomainResult<()> {
        self.records
            .write()
            .await
            .insert(record.owner.clone(), record);
        Ok(())
    }

    async fn delete(&self, owner: &EntityRef) -> DomainResult<bool> {
        Ok(self.records.write().await.remove(owner).is_some())
    }

    async fn begin(&self) -> DomainResult<Box<dyn StateTransaction>> {
        Ok(Box::new(InMemoryTransaction {
            records: self.records.clone(),
            staged: HashMap::new(),
        }))
    }
}

struct InMemoryTransaction {
    records: Records,
    staged: HashMap<EntityRef, StateRecord>,
}

#[async_trait]
impl StateTransaction for InMemoryTransaction {
    async fn load(&mut self, owner: &EntityRef) -> DomainResult<Option<StateRecord>> {
        if let Some(staged) = self.staged.get(owner) {
            return Ok(Some(staged.clone()));
        }
        Ok(self.records.read().await.get(owner).cloned())
    }

    async fn save(&mut self, record: StateRecord) -> DomainResult<()> {
        self.staged.insert(record.owner.clone(), record);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> DomainResult<()> {
        let InMemoryTransaction { records, staged } = *self;
        records.write().await.extend(staged);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DomainResult<()> {
        tracing::debug!(staged = self.staged.len(), "state transaction rolled back");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_staged_writes_apply_on_commit_only() {
        let store = InMemoryStateStore::new();
        let owner = EntityRef::new("Order", "1");
        let mut record = StateRecord::new(owner.clone());
        record.data.insert("total".into(), json!(10));

        let mut tx = store.begin().await.unwrap();
        tx.save(record.clone()).await.unwrap();
        assert_eq!(tx.load(&owner).await.unwrap(), Some(record.clone()));
        assert!(store.load(&owner).await.unwrap().is_none());
        tx.commit().await.unwrap();
        assert_eq!(store.load(&owner).await.unwrap(), Some(record));

        let mut tx = store.begin().await.unwrap();
        tx.save(StateRecord::new(EntityRef::new("Order", "2"))).await.unwrap();
        tx.rollback().await.unwrap();
        assert_eq!(store.len().await, 1);

        assert!(store.delete(&owner).await.unwrap());
        assert!(!store.delete(&owner).await.unwrap());
        assert!(store.is_empty().await);
    }
}
