// Copyright 2025 Cowboy AI, LLC.

//! Operation lifecycle notifications

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value as Json;
use uuid::Uuid;

use super::operation::OperationKind;
use crate::errors::DomainError;

/// Where in its lifecycle an operation is
#[derive(Debug, Clone)]
pub enum OperationStage {
    /// About to run
    Executing,
    /// Finished
    Executed {
        /// Result as returned to the caller
        result: Json,
        /// Time spent inside the rest of the pipeline
        elapsed: Duration,
    },
    /// Failed; the error is re-raised unchanged
    Failed {
        /// The failure
        error: DomainError,
        /// Time spent before failing
        elapsed: Duration,
    },
}

impl OperationStage {
    fn label(&self) -> &'static str {
        match self {
            OperationStage::Executing => "Executing",
            OperationStage::Executed { .. } => "Executed",
            OperationStage::Failed { .. } => "Failed",
        }
    }
}

/// A lifecycle notification for one operation
#[derive(Debug, Clone)]
pub struct OperationEvent {
    /// Notification id
    pub id: Uuid,
    /// Operation kind
    pub kind: OperationKind,
    /// Operation name
    pub operation: String,
    /// Lifecycle stage
    pub stage: OperationStage,
    /// When the notification was created
    pub occurred_at: DateTime<Utc>,
}

impl OperationEvent {
    /// New notification stamped now
    pub fn new(kind: OperationKind, operation: impl Into<String>, stage: OperationStage) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            operation: operation.into(),
            stage,
            occurred_at: Utc::now(),
        }
    }

    /// `QueryExecuting`, `CommandExecuted`, `ActionFailed`, ...
    pub fn event_name(&self) -> String {
        let kind = match self.kind {
            OperationKind::Query => "Query",
            OperationKind::Command => "Command",
            OperationKind::Action => "Action",
        };
        format!("{kind}{}", self.stage.label())
    }

    /// Elapsed time for finished stages
    pub fn elapsed(&self) -> Option<Duration> {
        match &self.stage {
            OperationStage::Executing => None,
            OperationStage::Executed { elapsed, .. } | OperationStage::Failed { elapsed, .. } => {
                Some(*elapsed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_names_and_elapsed() {
        let executed = OperationEvent::new(
            OperationKind::Query,
            "ListUsers",
            OperationStage::Executed {
                result: json!([]),
                elapsed: Duration::from_millis(5),
            },
        );
        assert_eq!(executed.event_name(), "QueryExecuted");
        assert_eq!(executed.elapsed(), Some(Duration::from_millis(5)));

        let failed = OperationEvent::new(
            OperationKind::Action,
            "Import",
            OperationStage::Failed {
                error: DomainError::generic("boom"),
                elapsed: Duration::ZERO,
            },
        );
        assert_eq!(failed.event_name(), "ActionFailed");
    }
}
