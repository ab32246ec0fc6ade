// Copyright 2025 Cowboy AI, LLC.

//! Fire-and-forget notification sink
//!
//! Operations and the state manager announce what happened; nothing they
//! do depends on what a publisher does with the notification.

use std::sync::{Arc, Mutex, PoisonError};

use crate::cqrs::events::OperationEvent;
use crate::errors::DomainResult;
use crate::state_machine::StateEvent;

/// Anything the crate announces
#[derive(Debug, Clone)]
pub enum Notification {
    /// Operation lifecycle (executing / executed / failed)
    Operation(OperationEvent),
    /// State manager outcome (changed / transition failed)
    State(StateEvent),
}

impl Notification {
    /// Stable event name, e.g. `QueryExecuted` or `StateChanged`
    pub fn event_name(&self) -> String {
        match self {
            Notification::Operation(event) => event.event_name(),
            Notification::State(event) => event.event_name().to_string(),
        }
    }
}

/// Event publisher trait
pub trait EventPublisher: Send + Sync {
    /// Publish a notification; the result is not consumed by callers
    fn publish(&self, notification: Notification) -> DomainResult<()>;
}

/// Publisher that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEventPublisher;

impl EventPublisher for NullEventPublisher {
    fn publish(&self, _notification: Notification) -> DomainResult<()> {
        Ok(())
    }
}

/// Publisher that forwards to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

impl EventPublisher for TracingEventPublisher {
    fn publish(&self, notification: Notification) -> DomainResult<()> {
        tracing::info!(event = %notification.event_name(), ?notification, "notification");
        Ok(())
    }
}

/// Publisher that records notifications in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventPublisher {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryEventPublisher {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far
    pub fn published(&self) -> Vec<Notification> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Event names in publish order
    pub fn names(&self) -> Vec<String> {
        self.published().iter().map(Notification::event_name).collect()
    }

    /// Operation notifications only
    pub fn operation_events(&self) -> Vec<OperationEvent> {
        self.published()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Operation(event) => Some(event),
                Notification::State(_) => None,
            })
            .collect()
    }

    /// State notifications only
    pub fn state_events(&self) -> Vec<StateEvent> {
        self.published()
            .into_iter()
            .filter_map(|n| match n {
                Notification::State(event) => Some(event),
                Notification::Operation(_) => None,
            })
            .collect()
    }

    /// Forget everything recorded
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventPublisher for InMemoryEventPublisher {
    fn publish(&self, notification: Notification) -> DomainResult<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cqrs::events::OperationStage;
    use crate::cqrs::OperationKind;
    use crate::state_machine::EntityRef;
    use serde_json::Map;

    #[test]
    fn test_in_memory_publisher_records_in_order() {
        let publisher = InMemoryEventPublisher::new();

        publisher
            .publish(Notification::Operation(OperationEvent::new(
                OperationKind::Command,
                "CreateUser",
                OperationStage::Executing,
            )))
            .unwrap();
        publisher
            .publish(Notification::State(StateEvent::StateChanged {
                owner: EntityRef::new("Order", "1"),
                from: None,
                to: "OrderState@Pending".to_string(),
                data: Map::new(),
            }))
            .unwrap();

        assert_eq!(publisher.names(), vec!["CommandExecuting", "StateChanged"]);
        assert_eq!(publisher.operation_events().len(), 1);
        assert_eq!(publisher.state_events().len(), 1);

        publisher.clear();
        assert!(publisher.published().is_empty());
    }

    #[test]
    fn test_null_and_tracing_publishers_accept_everything() {
        let event = Notification::Operation(OperationEvent::new(
            OperationKind::Query,
            "ListUsers",
            OperationStage::Executing,
        ));
        assert!(NullEventPublisher.publish(event.clone()).is_ok());
        assert!(TracingEventPublisher.publish(event).is_ok());
    }
}
