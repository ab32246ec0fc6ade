// Copyright 2025 Cowboy AI, LLC.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value as Json;

use super::Middleware;
use crate::cqrs::dispatch::Dispatch;
use crate::cqrs::events::{OperationEvent, OperationStage};
use crate::cqrs::pipeline::Next;
use crate::errors::DomainResult;
use crate::events::{EventPublisher, Notification};

/// Publishes executing / executed / failed notifications
///
/// Failures are re-raised unchanged after the failed notification.
#[derive(Clone)]
pub struct EventMiddleware {
    publisher: Arc<dyn EventPublisher>,
}

impl std::fmt::Debug for EventMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventMiddleware").finish_non_exhaustive()
    }
}

impl EventMiddleware {
    /// Middleware publishing to `publisher`
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    fn publish(&self, dispatch: &Dispatch, stage: OperationStage) {
        let event = OperationEvent::new(dispatch.kind(), dispatch.name(), stage);
        if let Err(error) = self.publisher.publish(Notification::Operation(event)) {
            tracing::warn!(%error, operation = dispatch.name(), "notification dropped");
        }
    }
}

#[async_trait]
impl Middleware for EventMiddleware {
    async fn handle(&self, dispatch: &mut Dispatch, next: Next<'_>) -> DomainResult<Json> {
        let started = Instant::now();
        self.publish(dispatch, OperationStage::Executing);

        let result = next.run(dispatch).await;
        let elapsed = started.elapsed();
        match &result {
            Ok(value) => self.publish(
                dispatch,
                OperationStage::Executed {
                    result: value.clone(),
                    elapsed,
                },
            ),
            Err(error) => self.publish(
                dispatch,
                OperationStage::Failed {
                    error: error.clone(),
                    elapsed,
                },
            ),
        }
        result
    }
}
