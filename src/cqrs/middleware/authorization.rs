// Copyright 2025 Cowboy AI, LLC.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as Json;

use super::Middleware;
use crate::cqrs::dispatch::Dispatch;
use crate::cqrs::pipeline::Next;
use crate::errors::{DomainError, DomainResult};
use crate::gate::{self, Gate};

/// Requires the operation's `authorize` hook, or its declared ability, to pass
///
/// Operations declaring neither are let through.
#[derive(Clone)]
pub struct AuthorizationMiddleware {
    gate: Arc<dyn Gate>,
}

impl std::fmt::Debug for AuthorizationMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationMiddleware").finish_non_exhaustive()
    }
}

impl AuthorizationMiddleware {
    /// Middleware checking against `gate`
    pub fn new(gate: Arc<dyn Gate>) -> Self {
        Self { gate }
    }
}

#[async_trait]
impl Middleware for AuthorizationMiddleware {
    async fn handle(&self, dispatch: &mut Dispatch, next: Next<'_>) -> DomainResult<Json> {
        let operation = dispatch.operation();
        let custom = operation.authorize(self.gate.as_ref(), next.container()).await;

        match custom {
            Some(allowed) => {
                if !allowed? {
                    tracing::warn!(operation = dispatch.name(), "authorization denied");
                    return Err(DomainError::unauthorized());
                }
            }
            None => {
                if let Some(ability) = operation.ability() {
                    gate::authorize(self.gate.as_ref(), &ability.name, &ability.gate_arguments()).await?;
                }
            }
        }

        next.run(dispatch).await
    }
}
