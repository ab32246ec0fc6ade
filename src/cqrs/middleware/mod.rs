// Copyright 2025 Cowboy AI, LLC.

//! Middleware wrapping boot-then-execute
//!
//! A middleware receives the dispatch and the rest of the chain. It may call
//! [`Next::run`] and post-process the result, return without calling it to
//! short-circuit, or fail.

mod authorization;
mod caching;
mod event;
mod logging;
mod transaction;
mod validation;

pub use authorization::AuthorizationMiddleware;
pub use caching::CachingMiddleware;
pub use event::EventMiddleware;
pub use logging::LoggingMiddleware;
pub use transaction::{TransactionMiddleware, UnitOfWork};
pub use validation::ValidationMiddleware;

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value as Json;

use super::dispatch::Dispatch;
use super::operation::short_type_name;
use super::pipeline::Next;
use crate::dependency_injection::DependencyContainer;
use crate::errors::{DomainError, DomainResult};

/// A link in the dispatch pipeline
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// Identity used for exclusion
    fn id(&self) -> MiddlewareId {
        MiddlewareId::of::<Self>()
    }

    /// Handle the dispatch, usually by awaiting `next.run(dispatch)`
    async fn handle(&self, dispatch: &mut Dispatch, next: Next<'_>) -> DomainResult<Json>;
}

/// Exact type identity of a middleware
#[derive(Clone, Copy)]
pub struct MiddlewareId {
    type_id: TypeId,
    name: &'static str,
}

impl MiddlewareId {
    /// Identity of `M`
    pub fn of<M: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            name: short_type_name(std::any::type_name::<M>()),
        }
    }

    /// Short type name
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for MiddlewareId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for MiddlewareId {}

impl Hash for MiddlewareId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for MiddlewareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MiddlewareId").field(&self.name).finish()
    }
}

type Resolve = for<'a> fn(&'a DependencyContainer) -> BoxFuture<'a, DomainResult<Arc<dyn Middleware>>>;

/// A middleware by type, resolved when the pipeline is built, or a ready instance
#[derive(Clone)]
pub enum MiddlewareRef {
    /// Resolved through the container at pipeline-build time
    Type {
        /// Type identity
        id: MiddlewareId,
        /// Resolution strategy
        resolve: Resolve,
    },
    /// Already built
    Instance(Arc<dyn Middleware>),
}

impl fmt::Debug for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiddlewareRef::Type { id, .. } => f.debug_tuple("Type").field(id).finish(),
            MiddlewareRef::Instance(m) => f.debug_tuple("Instance").field(&m.id()).finish(),
        }
    }
}

fn autowire<'a, M>(container: &'a DependencyContainer) -> BoxFuture<'a, DomainResult<Arc<dyn Middleware>>>
where
    M: Middleware + Default,
{
    Box::pin(async move {
        if container.has::<M>().await {
            let resolved: Arc<dyn Middleware> = container.resolve::<M>().await?;
            return Ok(resolved);
        }
        let built: Arc<dyn Middleware> = Arc::new(M::default());
        Ok(built)
    })
}

fn from_container<'a, M: Middleware>(
    container: &'a DependencyContainer,
) -> BoxFuture<'a, DomainResult<Arc<dyn Middleware>>> {
    Box::pin(async move {
        let resolved: Arc<dyn Middleware> = container.resolve::<M>().await.map_err(|_| {
            DomainError::configuration(format!(
                "Middleware {} is not registered in the container.",
                short_type_name(std::any::type_name::<M>())
            ))
        })?;
        Ok(resolved)
    })
}

impl MiddlewareRef {
    /// `M` from the container when registered, otherwise `M::default()`
    pub fn of<M: Middleware + Default>() -> Self {
        MiddlewareRef::Type {
            id: MiddlewareId::of::<M>(),
            resolve: autowire::<M>,
        }
    }

    /// `M` from the container; unregistered is a configuration error
    pub fn from_container<M: Middleware>() -> Self {
        MiddlewareRef::Type {
            id: MiddlewareId::of::<M>(),
            resolve: from_container::<M>,
        }
    }

    /// A ready instance
    pub fn instance<M: Middleware>(middleware: M) -> Self {
        MiddlewareRef::Instance(Arc::new(middleware))
    }

    /// Identity compared against exclusions
    pub fn id(&self) -> MiddlewareId {
        match self {
            MiddlewareRef::Type { id, .. } => *id,
            MiddlewareRef::Instance(middleware) => middleware.id(),
        }
    }

    /// Built middleware
    pub async fn resolve(&self, container: &DependencyContainer) -> DomainResult<Arc<dyn Middleware>> {
        match self {
            MiddlewareRef::Type { resolve, .. } => resolve(container).await,
            MiddlewareRef::Instance(middleware) => Ok(middleware.clone()),
        }
    }
}

impl From<Arc<dyn Middleware>> for MiddlewareRef {
    fn from(middleware: Arc<dyn Middleware>) -> Self {
        MiddlewareRef::Instance(middleware)
    }
}

/// Names usable in configuration for global middleware
#[derive(Debug, Clone, Default)]
pub struct MiddlewareRegistry {
    entries: HashMap<String, MiddlewareRef>,
}

impl MiddlewareRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in middleware
    ///
    /// `logging` and `validation` autowire; `events`, `cache`,
    /// `authorization` and `transaction` need their collaborators registered
    /// in the container.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("logging", MiddlewareRef::of::<LoggingMiddleware>());
        registry.register("validation", MiddlewareRef::of::<ValidationMiddleware>());
        registry.register("events", MiddlewareRef::from_container::<EventMiddleware>());
        registry.register("cache", MiddlewareRef::from_container::<CachingMiddleware>());
        registry.register(
            "authorization",
            MiddlewareRef::from_container::<AuthorizationMiddleware>(),
        );
        registry.register(
            "transaction",
            MiddlewareRef::from_container::<TransactionMiddleware>(),
        );
        registry
    }

    /// Add or replace an entry
    pub fn register(&mut self, name: impl Into<String>, middleware: MiddlewareRef) {
        self.entries.insert(name.into(), middleware);
    }

    /// Entry for `name`; unknown is a configuration error
    pub fn get(&self, name: &str) -> DomainResult<MiddlewareRef> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| DomainError::configuration(format!("Unknown middleware `{name}`.")))
    }

    /// Resolve a list of names in order
    pub fn resolve_names<S: AsRef<str>>(&self, names: &[S]) -> DomainResult<Vec<MiddlewareRef>> {
        names.iter().map(|name| self.get(name.as_ref())).collect()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_compare_by_exact_type() {
        assert_eq!(MiddlewareId::of::<LoggingMiddleware>(), MiddlewareId::of::<LoggingMiddleware>());
        assert_ne!(MiddlewareId::of::<LoggingMiddleware>(), MiddlewareId::of::<ValidationMiddleware>());
        assert_eq!(MiddlewareId::of::<LoggingMiddleware>().name(), "LoggingMiddleware");

        let instance = MiddlewareRef::instance(LoggingMiddleware);
        assert_eq!(instance.id(), MiddlewareRef::of::<LoggingMiddleware>().id());
    }

    #[tokio::test]
    async fn test_autowired_and_container_refs() {
        let container = DependencyContainer::new();
        assert!(MiddlewareRef::of::<ValidationMiddleware>()
            .resolve(&container)
            .await
            .is_ok());

        let err = MiddlewareRef::from_container::<CachingMiddleware>()
            .resolve(&container)
            .await
            .err();
        assert!(err.is_some_and(|e| e.is_configuration_error()));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = MiddlewareRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            vec!["authorization", "cache", "events", "logging", "transaction", "validation"]
        );
        assert!(registry.resolve_names(&["logging", "validation"]).is_ok());
        assert!(registry.get("nope").unwrap_err().is_configuration_error());
    }
}
