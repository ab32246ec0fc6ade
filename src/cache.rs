// Copyright 2025 Cowboy AI, LLC.

//! Cache store contract, an in-memory store and cache-key building

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value as Json;
use tokio::sync::RwLock;

use crate::errors::DomainResult;

/// Default separator between cache-key parts
pub const DEFAULT_DELIMITER: &str = ":";

/// Key/value cache with optional expiry
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Cached value, if present and not expired
    async fn get(&self, key: &str) -> DomainResult<Option<Json>>;

    /// Store a value; `None` ttl keeps it until forgotten
    async fn put(&self, key: &str, value: Json, ttl: Option<Duration>) -> DomainResult<()>;

    /// Remove one key; true when something was removed
    async fn forget(&self, key: &str) -> DomainResult<bool>;

    /// Remove everything
    async fn flush(&self) -> DomainResult<()>;
}

impl dyn CacheStore {
    /// Cached value for `key`, or compute, store and return it
    pub async fn remember<F, Fut>(&self, key: &str, ttl: Option<Duration>, compute: F) -> DomainResult<Json>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = DomainResult<Json>> + Send,
    {
        if let Some(hit) = self.get(key).await? {
            tracing::debug!(key, "cache hit");
            return Ok(hit);
        }
        tracing::debug!(key, "cache miss");
        let value = compute().await?;
        self.put(key, value.clone(), ttl).await?;
        Ok(value)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Json,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map(|at| now < at).unwrap_or(true)
    }
}

/// Process-local cache store
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    /// True when no live entries remain
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> DomainResult<Option<Json>> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // expired: evict lazily
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn put(&self, key: &str, value: Json, ttl: Option<Duration>) -> DomainResult<()> {
        let entry = Entry {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn forget(&self, key: &str) -> DomainResult<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn flush(&self) -> DomainResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// Joins key parts with a delimiter, flattening nested arrays
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    delimiter: String,
}

impl Default for CacheKeyBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl CacheKeyBuilder {
    /// Builder using `delimiter`
    pub fn new(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
        }
    }

    /// Configured delimiter
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// `["user", [1, ["a"]], "x"]` → `user:1:a:x`
    pub fn build(&self, parts: &[Json]) -> String {
        let mut flat = Vec::new();
        for part in parts {
            flatten(part, &mut flat);
        }
        flat.join(&self.delimiter)
    }

    /// Shorthand for string parts
    pub fn join<S: AsRef<str>>(&self, parts: &[S]) -> String {
        parts
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(&self.delimiter)
    }
}

fn flatten(part: &Json, out: &mut Vec<String>) {
    match part {
        Json::Array(items) => items.iter().for_each(|item| flatten(item, out)),
        Json::Object(map) => map.values().for_each(|item| flatten(item, out)),
        Json::String(s) => out.push(s.clone()),
        Json::Null => out.push(String::new()),
        Json::Bool(true) => out.push("1".to_string()),
        Json::Bool(false) => out.push(String::new()),
        Json::Number(n) => out.push(n.to_string()),
    }
}
