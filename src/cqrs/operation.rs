// Copyright 2025 Cowboy AI, LLC.

//! Query, Command and Action operations

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::middleware::{Middleware, MiddlewareId, MiddlewareRef};
use crate::dependency_injection::DependencyContainer;
use crate::errors::DomainResult;
use crate::gate::Gate;

/// Which bus an operation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Read
    Query,
    /// Write
    Command,
    /// Self-running unit of work
    Action,
}

impl OperationKind {
    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Command => "command",
            OperationKind::Action => "action",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-instance dispatch state
///
/// `booted` only ever goes from false to true. The middleware lists grow
/// through [`OperationExt`] in call order.
#[derive(Debug, Clone, Default)]
pub struct OperationState {
    booted: bool,
    middleware: Vec<MiddlewareRef>,
    excluded: Vec<MiddlewareId>,
}

impl OperationState {
    /// Fresh, unbooted state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `boot` already ran
    pub fn is_booted(&self) -> bool {
        self.booted
    }

    /// Record that `boot` ran
    pub fn mark_booted(&mut self) {
        self.booted = true;
    }

    /// Runtime middleware in the order added
    pub fn middleware(&self) -> &[MiddlewareRef] {
        &self.middleware
    }

    /// Runtime exclusions in the order added
    pub fn excluded(&self) -> &[MiddlewareId] {
        &self.excluded
    }

    /// Append runtime middleware
    pub fn push_middleware(&mut self, middleware: MiddlewareRef) {
        self.middleware.push(middleware);
    }

    /// Append a runtime exclusion
    pub fn exclude(&mut self, id: MiddlewareId) {
        if !self.excluded.contains(&id) {
            self.excluded.push(id);
        }
    }
}

/// Policy-style ability check declared by an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    /// Ability name checked at the gate
    pub name: String,
    /// Subject the ability applies to
    pub model: Option<Json>,
    /// Extra arguments after the model
    pub arguments: Vec<Json>,
}

impl Ability {
    /// Ability without model or arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: None,
            arguments: Vec::new(),
        }
    }

    /// Set the subject
    pub fn on(mut self, model: Json) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the extra arguments
    pub fn with_arguments(mut self, arguments: Vec<Json>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Arguments handed to the gate: the model first, when there is one
    pub fn gate_arguments(&self) -> Vec<Json> {
        self.model
            .iter()
            .cloned()
            .chain(self.arguments.iter().cloned())
            .collect()
    }
}

/// Last path segment of a type name, generics kept
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let path = full.split('<').next().unwrap_or(full);
    match path.rfind("::") {
        Some(at) => &full[at + 2..],
        None => full,
    }
}

/// Hooks shared by every operation kind
///
/// Only `state`/`state_mut` are required; everything else defaults to
/// "not declared".
#[async_trait]
pub trait Operation: Send + Sync {
    /// Dispatch state
    fn state(&self) -> &OperationState;

    /// Mutable dispatch state
    fn state_mut(&mut self) -> &mut OperationState;

    /// Name used in logs and notifications
    fn name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Middleware declared for every instance of the type
    fn middleware(&self) -> Vec<MiddlewareRef> {
        Vec::new()
    }

    /// Middleware excluded for every instance of the type
    fn exclude_middleware(&self) -> Vec<MiddlewareId> {
        Vec::new()
    }

    /// One-time setup before the first `execute`
    async fn boot(&mut self, _container: &DependencyContainer) -> DomainResult<()> {
        Ok(())
    }

    /// Checked by the validation middleware
    fn validate(&self) -> DomainResult<()> {
        Ok(())
    }

    /// Cache key for the caching middleware; `None` bypasses the cache
    fn cache_key(&self) -> Option<String> {
        None
    }

    /// Cache lifetime; `None` uses the configured default
    fn cache_ttl(&self) -> Option<Duration> {
        None
    }

    /// Custom authorization; `None` when the operation declares none
    async fn authorize(
        &self,
        _gate: &dyn Gate,
        _container: &DependencyContainer,
    ) -> Option<DomainResult<bool>> {
        None
    }

    /// Ability checked at the gate when `authorize` is not declared
    fn ability(&self) -> Option<Ability> {
        None
    }
}

/// A read operation
#[async_trait]
pub trait Query: Operation {
    /// Result type
    type Output: Serialize + DeserializeOwned + Send + 'static;

    /// Run the query
    async fn execute(&mut self, container: &DependencyContainer) -> DomainResult<Self::Output>;
}

/// A write operation
#[async_trait]
pub trait Command: Operation {
    /// Result type
    type Output: Serialize + DeserializeOwned + Send + 'static;

    /// Run the command
    async fn execute(&mut self, container: &DependencyContainer) -> DomainResult<Self::Output>;
}

/// An operation run directly rather than through a bus
#[async_trait]
pub trait Action: Operation {
    /// Result type
    type Output: Serialize + DeserializeOwned + Send + 'static;

    /// Run the action
    async fn execute(&mut self, container: &DependencyContainer) -> DomainResult<Self::Output>;
}

/// Chainable middleware configuration
///
/// Each call moves the same operation through and hands it back; nothing is
/// copied.
pub trait OperationExt: Operation + Sized {
    /// Add runtime middleware after any added before
    fn with_middleware(mut self, middleware: MiddlewareRef) -> Self {
        self.state_mut().push_middleware(middleware);
        self
    }

    /// Exclude middleware of type `M` from every source
    fn without_middleware<M: Middleware>(self) -> Self {
        self.without(MiddlewareId::of::<M>())
    }

    /// Exclude middleware by id
    fn without(mut self, id: MiddlewareId) -> Self {
        self.state_mut().exclude(id);
        self
    }
}

impl<T: Operation + Sized> OperationExt for T {}
