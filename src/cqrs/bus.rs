// Copyright 2025 Cowboy AI, LLC.

//! Dispatcher and buses
//!
//! Middleware is collected global → class → runtime, filtered against the
//! union of class and runtime exclusions by exact type, resolved through the
//! container and composed as an onion around boot-then-execute.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as Json;

use super::dispatch::Dispatch;
use super::middleware::{Middleware, MiddlewareId, MiddlewareRef, MiddlewareRegistry};
use super::operation::{Action, Command, OperationKind, Query};
use super::pipeline::Next;
use crate::config::CqrsConfig;
use crate::dependency_injection::DependencyContainer;
use crate::errors::DomainResult;

/// Middleware applied to every operation of a kind
#[derive(Debug, Clone, Default)]
pub struct GlobalMiddleware {
    query: Vec<MiddlewareRef>,
    command: Vec<MiddlewareRef>,
    action: Vec<MiddlewareRef>,
}

impl GlobalMiddleware {
    /// No global middleware
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the configured names per kind
    pub fn from_config(config: &CqrsConfig, registry: &MiddlewareRegistry) -> DomainResult<Self> {
        Ok(Self {
            query: registry.resolve_names(&config.query_middleware)?,
            command: registry.resolve_names(&config.command_middleware)?,
            action: registry.resolve_names(&config.action_middleware)?,
        })
    }

    /// Append middleware for `kind`
    pub fn push(&mut self, kind: OperationKind, middleware: MiddlewareRef) -> &mut Self {
        match kind {
            OperationKind::Query => self.query.push(middleware),
            OperationKind::Command => self.command.push(middleware),
            OperationKind::Action => self.action.push(middleware),
        }
        self
    }

    /// Builder form of [`GlobalMiddleware::push`]
    pub fn with(mut self, kind: OperationKind, middleware: MiddlewareRef) -> Self {
        self.push(kind, middleware);
        self
    }

    /// Middleware for `kind`
    pub fn for_kind(&self, kind: OperationKind) -> &[MiddlewareRef] {
        match kind {
            OperationKind::Query => &self.query,
            OperationKind::Command => &self.command,
            OperationKind::Action => &self.action,
        }
    }
}

/// Runs dispatches through their pipelines
#[derive(Debug, Clone)]
pub struct Dispatcher {
    container: Arc<DependencyContainer>,
    global: GlobalMiddleware,
}

impl Dispatcher {
    /// Dispatcher resolving through `container`
    pub fn new(container: Arc<DependencyContainer>, global: GlobalMiddleware) -> Self {
        Self { container, global }
    }

    /// Container used for middleware resolution and injection
    pub fn container(&self) -> &Arc<DependencyContainer> {
        &self.container
    }

    /// Global middleware
    pub fn global(&self) -> &GlobalMiddleware {
        &self.global
    }

    /// Merged and filtered middleware for `dispatch`, in pipeline order
    pub fn collect(&self, dispatch: &Dispatch) -> Vec<MiddlewareRef> {
        let operation = dispatch.operation();
        let mut excluded: Vec<MiddlewareId> = operation.exclude_middleware();
        excluded.extend(operation.state().excluded().iter().copied());

        self.global
            .for_kind(dispatch.kind())
            .iter()
            .cloned()
            .chain(operation.middleware())
            .chain(operation.state().middleware().iter().cloned())
            .filter(|middleware| !excluded.contains(&middleware.id()))
            .collect()
    }

    /// Run `dispatch` and return its result as JSON
    pub async fn dispatch(&self, dispatch: &mut Dispatch) -> DomainResult<Json> {
        let collected = self.collect(dispatch);
        if collected.is_empty() {
            return dispatch.boot_then_execute(&self.container).await;
        }

        let mut pipeline: Vec<Arc<dyn Middleware>> = Vec::with_capacity(collected.len());
        for middleware in &collected {
            pipeline.push(middleware.resolve(&self.container).await?);
        }
        tracing::debug!(
            kind = %dispatch.kind(),
            operation = dispatch.name(),
            middleware = ?collected.iter().map(|m| m.id()).collect::<Vec<_>>(),
            "pipeline built"
        );

        Next::new(&pipeline, &self.container).run(dispatch).await
    }

    /// Run a query and decode its output
    pub async fn query<Q: Query + 'static>(&self, query: Q) -> DomainResult<Q::Output> {
        let json = self.dispatch(&mut Dispatch::query(query)).await?;
        Ok(serde_json::from_value(json)?)
    }

    /// Run a command and decode its output
    pub async fn command<C: Command + 'static>(&self, command: C) -> DomainResult<C::Output> {
        let json = self.dispatch(&mut Dispatch::command(command)).await?;
        Ok(serde_json::from_value(json)?)
    }

    /// Run an action and decode its output
    pub async fn action<A: Action + 'static>(&self, action: A) -> DomainResult<A::Output> {
        let json = self.dispatch(&mut Dispatch::action(action)).await?;
        Ok(serde_json::from_value(json)?)
    }
}

/// Executes queries
#[derive(Debug, Clone)]
pub struct QueryBus {
    dispatcher: Arc<Dispatcher>,
}

impl QueryBus {
    /// Bus over `dispatcher`
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Execute `query` through its pipeline
    pub async fn execute<Q: Query + 'static>(&self, query: Q) -> DomainResult<Q::Output> {
        self.dispatcher.query(query).await
    }
}

/// Executes commands
#[derive(Debug, Clone)]
pub struct CommandBus {
    dispatcher: Arc<Dispatcher>,
}

impl CommandBus {
    /// Bus over `dispatcher`
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Execute `command` through its pipeline
    pub async fn execute<C: Command + 'static>(&self, command: C) -> DomainResult<C::Output> {
        self.dispatcher.command(command).await
    }
}

/// Direct entry point for actions
#[async_trait]
pub trait ActionExt: Action + Sized + 'static {
    /// Run through the action pipeline
    async fn run(self, dispatcher: &Dispatcher) -> DomainResult<Self::Output> {
        dispatcher.action(self).await
    }
}

impl<A: Action + 'static> ActionExt for A {}
