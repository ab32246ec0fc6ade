// Copyright 2025 Cowboy AI, LLC.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as Json;

use super::Middleware;
use crate::cache::CacheStore;
use crate::cqrs::dispatch::Dispatch;
use crate::cqrs::operation::OperationKind;
use crate::cqrs::pipeline::Next;
use crate::errors::DomainResult;

/// Default lifetime of cached query results
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Remembers query results under the query's cache key
///
/// Commands, actions and queries without a cache key pass straight through.
#[derive(Clone)]
pub struct CachingMiddleware {
    store: Arc<dyn CacheStore>,
    default_ttl: Duration,
}

impl std::fmt::Debug for CachingMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingMiddleware")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

impl CachingMiddleware {
    /// Middleware over `store` with the default TTL
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Override the default TTL
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

#[async_trait]
impl Middleware for CachingMiddleware {
    async fn handle(&self, dispatch: &mut Dispatch, next: Next<'_>) -> DomainResult<Json> {
        if dispatch.kind() != OperationKind::Query {
            return next.run(dispatch).await;
        }
        let Some(key) = dispatch.operation().cache_key() else {
            return next.run(dispatch).await;
        };
        let ttl = dispatch.operation().cache_ttl().unwrap_or(self.default_ttl);

        self.store
            .remember(&key, Some(ttl), move || next.run(dispatch))
            .await
    }
}
