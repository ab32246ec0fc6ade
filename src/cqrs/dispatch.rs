// Copyright 2025 Cowboy AI, LLC.

//! Type-erased operation handed through the pipeline

use async_trait::async_trait;
use serde_json::Value as Json;

use super::operation::{Action, Command, Operation, OperationKind, Query};
use crate::dependency_injection::DependencyContainer;
use crate::errors::DomainResult;

#[async_trait]
trait Runnable: Send + Sync {
    fn operation(&self) -> &dyn Operation;

    fn operation_mut(&mut self) -> &mut dyn Operation;

    async fn execute(&mut self, container: &DependencyContainer) -> DomainResult<Json>;
}

struct QueryRunner<Q>(Q);

#[async_trait]
impl<Q: Query + 'static> Runnable for QueryRunner<Q> {
    fn operation(&self) -> &dyn Operation {
        &self.0
    }

    fn operation_mut(&mut self) -> &mut dyn Operation {
        &mut self.0
    }

    async fn execute(&mut self, container: &DependencyContainer) -> DomainResult<Json> {
        let output = self.0.execute(container).await?;
        Ok(serde_json::to_value(output)?)
    }
}

struct CommandRunner<C>(C);

#[async_trait]
impl<C: Command + 'static> Runnable for CommandRunner<C> {
    fn operation(&self) -> &dyn Operation {
        &self.0
    }

    fn operation_mut(&mut self) -> &mut dyn Operation {
        &mut self.0
    }

    async fn execute(&mut self, container: &DependencyContainer) -> DomainResult<Json> {
        let output = self.0.execute(container).await?;
        Ok(serde_json::to_value(output)?)
    }
}

struct ActionRunner<A>(A);

#[async_trait]
impl<A: Action + 'static> Runnable for ActionRunner<A> {
    fn operation(&self) -> &dyn Operation {
        &self.0
    }

    fn operation_mut(&mut self) -> &mut dyn Operation {
        &mut self.0
    }

    async fn execute(&mut self, container: &DependencyContainer) -> DomainResult<Json> {
        let output = self.0.execute(container).await?;
        Ok(serde_json::to_value(output)?)
    }
}

/// An operation on its way through the pipeline
///
/// Results cross the pipeline as JSON so middleware can observe, cache and
/// replace them without knowing the concrete output type.
pub struct Dispatch {
    kind: OperationKind,
    runner: Box<dyn Runnable>,
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatch")
            .field("kind", &self.kind)
            .field("operation", &self.name())
            .field("booted", &self.operation().state().is_booted())
            .finish()
    }
}

impl Dispatch {
    /// Wrap a query
    pub fn query<Q: Query + 'static>(query: Q) -> Self {
        Self {
            kind: OperationKind::Query,
            runner: Box::new(QueryRunner(query)),
        }
    }

    /// Wrap a command
    pub fn command<C: Command + 'static>(command: C) -> Self {
        Self {
            kind: OperationKind::Command,
            runner: Box::new(CommandRunner(command)),
        }
    }

    /// Wrap an action
    pub fn action<A: Action + 'static>(action: A) -> Self {
        Self {
            kind: OperationKind::Action,
            runner: Box::new(ActionRunner(action)),
        }
    }

    /// Operation kind
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Operation name
    pub fn name(&self) -> &'static str {
        self.operation().name()
    }

    /// The wrapped operation
    pub fn operation(&self) -> &dyn Operation {
        self.runner.operation()
    }

    /// The wrapped operation, mutably
    pub fn operation_mut(&mut self) -> &mut dyn Operation {
        self.runner.operation_mut()
    }

    /// Boot once, then execute
    pub async fn boot_then_execute(&mut self, container: &DependencyContainer) -> DomainResult<Json> {
        if !self.operation().state().is_booted() {
            tracing::debug!(operation = self.name(), "booting");
            self.operation_mut().boot(container).await?;
            self.operation_mut().state_mut().mark_booted();
        }
        self.runner.execute(container).await
    }
}
