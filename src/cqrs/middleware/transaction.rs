// Copyright 2025 Cowboy AI, LLC.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as Json;

use super::Middleware;
use crate::cqrs::dispatch::Dispatch;
use crate::cqrs::pipeline::Next;
use crate::errors::DomainResult;

/// Transaction boundary driven by [`TransactionMiddleware`]
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Open the boundary
    async fn begin(&self) -> DomainResult<()>;

    /// Make the work durable
    async fn commit(&self) -> DomainResult<()>;

    /// Discard the work
    async fn rollback(&self) -> DomainResult<()>;
}

/// Begins before the rest of the pipeline, commits on success, rolls back on failure
#[derive(Clone)]
pub struct TransactionMiddleware {
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl std::fmt::Debug for TransactionMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionMiddleware").finish_non_exhaustive()
    }
}

impl TransactionMiddleware {
    /// Middleware over `unit_of_work`
    pub fn new(unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        Self { unit_of_work }
    }
}

#[async_trait]
impl Middleware for TransactionMiddleware {
    async fn handle(&self, dispatch: &mut Dispatch, next: Next<'_>) -> DomainResult<Json> {
        self.unit_of_work.begin().await?;
        match next.run(dispatch).await {
            Ok(value) => {
                self.unit_of_work.commit().await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback) = self.unit_of_work.rollback().await {
                    tracing::warn!(%rollback, "rollback failed");
                }
                Err(error)
            }
        }
    }
}
