// Copyright 2025 Cowboy AI, LLC.

//! Entity lookup by identifier, used by the `model` transformer

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as Json;
use tokio::sync::RwLock;

use crate::errors::DomainResult;
use crate::payload::Instance;

/// Finds persisted entities by primary key
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Entity with `id`; `None` when there is none
    async fn find(&self, id: &Json) -> DomainResult<Option<Instance>>;
}

/// Identifier key: strings as-is, everything else by its JSON text
fn key_of(id: &Json) -> String {
    match id {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// In-memory repository for testing
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityRepository {
    storage: Arc<RwLock<HashMap<String, Instance>>>,
}

impl InMemoryEntityRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `entity` under `id`
    pub async fn insert(&self, id: impl Into<Json>, entity: Instance) {
        self.storage.write().await.insert(key_of(&id.into()), entity);
    }

    /// Number of stored entities
    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    /// True when nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl EntityRepository for InMemoryEntityRepository {
    async fn find(&self, id: &Json) -> DomainResult<Option<Instance>> {
        Ok(self.storage.read().await.get(&key_of(id)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::instance;
    use serde_json::json;

    #[tokio::test]
    async fn test_numeric_and_string_ids_share_keys() {
        let repository = InMemoryEntityRepository::new();
        repository.insert(7, instance(json!({"name": "Ada"}))).await;
        repository.insert("abc", instance(json!({"name": "Grace"}))).await;

        assert!(repository.find(&json!(7)).await.unwrap().is_some());
        assert!(repository.find(&json!("abc")).await.unwrap().is_some());
        assert!(repository.find(&json!(8)).await.unwrap().is_none());
        assert_eq!(repository.len().await, 2);
    }
}
