// Copyright 2025 Cowboy AI, LLC.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value as Json;
use tracing::Instrument;

use super::Middleware;
use crate::cqrs::dispatch::Dispatch;
use crate::cqrs::pipeline::Next;
use crate::errors::DomainResult;

/// Wraps the rest of the pipeline in a span and logs the outcome
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn handle(&self, dispatch: &mut Dispatch, next: Next<'_>) -> DomainResult<Json> {
        let kind = dispatch.kind();
        let operation = dispatch.name();
        let span = tracing::info_span!("operation", %kind, operation);
        let started = Instant::now();

        async move {
            tracing::info!("operation started");
            let result = next.run(dispatch).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => tracing::info!(elapsed_ms, "operation completed"),
                Err(error) => tracing::warn!(elapsed_ms, %error, "operation failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}
