// Copyright 2025 Cowboy AI, LLC.

use async_trait::async_trait;
use serde_json::Value as Json;

use super::Middleware;
use crate::cqrs::dispatch::Dispatch;
use crate::cqrs::pipeline::Next;
use crate::errors::DomainResult;

/// Runs the operation's `validate` hook; a failure short-circuits
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationMiddleware;

#[async_trait]
impl Middleware for ValidationMiddleware {
    async fn handle(&self, dispatch: &mut Dispatch, next: Next<'_>) -> DomainResult<Json> {
        dispatch.operation().validate()?;
        next.run(dispatch).await
    }
}
