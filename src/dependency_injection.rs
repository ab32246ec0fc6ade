// Copyright 2025 Cowboy AI, LLC.

//! Dependency injection for operations, middleware and mapping transforms
//!
//! Services are resolved by type for `boot`/`execute` and for middleware
//! references; named makers build instances from a parameter map for the
//! `container` value transformer.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value as Json};
use tokio::sync::{OnceCell, RwLock};

use crate::errors::{DomainError, DomainResult};
use crate::payload::Instance;

/// Anything the container can hand out
pub trait Injectable: Any + Send + Sync {}

impl<T: Any + Send + Sync> Injectable for T {}

type Service = Arc<dyn Any + Send + Sync>;

type Build = Arc<dyn Fn(&DependencyContainer) -> DomainResult<Service> + Send + Sync>;

/// Named maker: builds an instance from make-parameters
pub type Maker = Arc<dyn Fn(&Map<String, Json>, &DependencyContainer) -> DomainResult<Instance> + Send + Sync>;

#[derive(Clone)]
enum Binding {
    Shared(Service),
    Factory(Build),
    Singleton { build: Build, cell: Arc<OnceCell<Service>> },
}

impl Binding {
    async fn produce(&self, container: &DependencyContainer) -> DomainResult<Service> {
        match self {
            Binding::Shared(service) => Ok(service.clone()),
            Binding::Factory(build) => build(container),
            Binding::Singleton { build, cell } => cell
                .get_or_try_init(|| async { build(container) })
                .await
                .cloned(),
        }
    }
}

fn erase<T, F>(factory: F) -> Build
where
    T: Injectable,
    F: Fn(&DependencyContainer) -> DomainResult<Arc<T>> + Send + Sync + 'static,
{
    Arc::new(move |container| {
        let service: Service = factory(container)?;
        Ok(service)
    })
}

type Table<V> = Arc<RwLock<HashMap<TypeId, V>>>;

/// Type-keyed service container with named makers
///
/// Instances belong to one container; factories, singletons and makers are
/// shared with every scope created from it.
#[derive(Default)]
pub struct DependencyContainer {
    instances: Table<Binding>,
    providers: Table<Binding>,
    makers: Arc<RwLock<HashMap<String, Maker>>>,
}

impl std::fmt::Debug for DependencyContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyContainer").finish_non_exhaustive()
    }
}

impl DependencyContainer {
    /// Empty container
    pub fn new() -> Self {
        Self::default()
    }

    async fn bind<T: Injectable>(&self, table: &Table<Binding>, binding: Binding) -> DomainResult<()> {
        let type_id = TypeId::of::<T>();
        if self.has::<T>().await {
            return Err(DomainError::AlreadyExists(format!(
                "{} is already bound",
                std::any::type_name::<T>()
            )));
        }
        table.write().await.insert(type_id, binding);
        Ok(())
    }

    /// Bind an instance, shared by every resolution
    pub async fn register_instance<T: Injectable>(&self, service: T) -> DomainResult<()> {
        self.register_shared(Arc::new(service)).await
    }

    /// Bind an already shared instance
    pub async fn register_shared<T: Injectable>(&self, service: Arc<T>) -> DomainResult<()> {
        self.bind::<T>(&self.instances, Binding::Shared(service)).await
    }

    /// Bind a factory called on every resolution
    pub async fn register_factory<T, F>(&self, factory: F) -> DomainResult<()>
    where
        T: Injectable,
        F: Fn(&DependencyContainer) -> DomainResult<Arc<T>> + Send + Sync + 'static,
    {
        self.bind::<T>(&self.providers, Binding::Factory(erase(factory)))
            .await
    }

    /// Bind a factory called once, on first resolution
    pub async fn register_singleton<T, F>(&self, factory: F) -> DomainResult<()>
    where
        T: Injectable,
        F: Fn(&DependencyContainer) -> DomainResult<Arc<T>> + Send + Sync + 'static,
    {
        let binding = Binding::Singleton {
            build: erase(factory),
            cell: Arc::new(OnceCell::new()),
        };
        self.bind::<T>(&self.providers, binding).await
    }

    /// Register a named maker used by [`DependencyContainer::make`]
    pub async fn register_maker<F>(&self, name: impl Into<String>, maker: F)
    where
        F: Fn(&Map<String, Json>, &DependencyContainer) -> DomainResult<Instance> + Send + Sync + 'static,
    {
        self.makers.write().await.insert(name.into(), Arc::new(maker));
    }

    /// Whether a maker is registered under `name`
    pub async fn has_maker(&self, name: &str) -> bool {
        self.makers.read().await.contains_key(name)
    }

    /// Build the named type from `params`
    pub async fn make(&self, name: &str, params: &Map<String, Json>) -> DomainResult<Instance> {
        let maker = self.makers.read().await.get(name).cloned();
        let maker = maker.ok_or_else(|| DomainError::NotFound(format!("No maker registered for {name}")))?;
        maker(params, self)
    }

    /// Whether `T` can be resolved
    pub async fn has<T: Injectable>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.instances.read().await.contains_key(&type_id)
            || self.providers.read().await.contains_key(&type_id)
    }

    /// Resolve `T`; unbound is `NotFound`
    pub async fn resolve<T: Injectable>(&self) -> DomainResult<Arc<T>> {
        let type_id = TypeId::of::<T>();
        let binding = match self.instances.read().await.get(&type_id).cloned() {
            Some(binding) => Some(binding),
            None => self.providers.read().await.get(&type_id).cloned(),
        };
        let binding = binding.ok_or_else(|| {
            DomainError::NotFound(format!("{} is not bound", std::any::type_name::<T>()))
        })?;

        binding.produce(self).await?.downcast::<T>().map_err(|_| {
            DomainError::InternalError(format!(
                "binding for {} produced another type",
                std::any::type_name::<T>()
            ))
        })
    }

    /// Child container with its own instances
    pub fn create_scope(&self) -> DependencyContainer {
        DependencyContainer {
            instances: Table::<Binding>::default(),
            providers: self.providers.clone(),
            makers: self.makers.clone(),
        }
    }
}

/// Fluent setup of a [`DependencyContainer`]
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    container: DependencyContainer,
}

impl ContainerBuilder {
    /// Start from an empty container
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an instance
    pub async fn instance<T: Injectable>(self, service: T) -> DomainResult<Self> {
        self.container.register_instance(service).await?;
        Ok(self)
    }

    /// Bind a singleton factory
    pub async fn singleton<T, F>(self, factory: F) -> DomainResult<Self>
    where
        T: Injectable,
        F: Fn(&DependencyContainer) -> DomainResult<Arc<T>> + Send + Sync + 'static,
    {
        self.container.register_singleton(factory).await?;
        Ok(self)
    }

    /// Add a named maker
    pub async fn maker<F>(self, name: impl Into<String>, maker: F) -> Self
    where
        F: Fn(&Map<String, Json>, &DependencyContainer) -> DomainResult<Instance> + Send + Sync + 'static,
    {
        self.container.register_maker(name, maker).await;
        self
    }

    /// The configured container
    pub fn build(self) -> DependencyContainer {
        self.container
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::instance;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct Clock {
        zone: String,
    }

    #[derive(Debug, serde::Serialize)]
    struct Mailer {
        host: String,
        port: u16,
    }

    fn clock(zone: &str) -> Clock {
        Clock { zone: zone.into() }
    }

    #[tokio::test]
    async fn test_instances_resolve_to_the_same_arc() {
        let container = DependencyContainer::new();
        container.register_instance(clock("UTC")).await.unwrap();

        let a = container.resolve::<Clock>().await.unwrap();
        let b = container.resolve::<Clock>().await.unwrap();
        assert_eq!(a.zone, "UTC");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_one_binding_per_type() {
        let container = DependencyContainer::new();
        container.register_instance(1u32).await.unwrap();
        let err = container
            .register_factory(|_| Ok(Arc::new(2u32)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_factory_builds_fresh_and_singleton_builds_once() {
        let container = DependencyContainer::new();
        container
            .register_factory(|_| Ok(Arc::new(clock("factory"))))
            .await
            .unwrap();
        let first = container.resolve::<Clock>().await.unwrap();
        let second = container.resolve::<Clock>().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        let calls = Arc::new(AtomicU32::new(0));
        let counted = calls.clone();
        container
            .register_singleton(move |_| {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(String::from("shared")))
            })
            .await
            .unwrap();

        let a = container.resolve::<String>().await.unwrap();
        let b = container.resolve::<String>().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unbound_is_not_found() {
        let container = DependencyContainer::new();
        assert!(!container.has::<Clock>().await);
        assert!(container.resolve::<Clock>().await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_named_maker_receives_params() {
        let container = DependencyContainer::new();
        container
            .register_maker("Mailer", |params, _| {
                Ok(instance(Mailer {
                    host: params
                        .get("host")
                        .and_then(Json::as_str)
                        .unwrap_or("localhost")
                        .to_string(),
                    port: params.get("port").and_then(Json::as_u64).unwrap_or(25) as u16,
                }))
            })
            .await;

        let mut params = Map::new();
        params.insert("host".to_string(), json!("smtp.example.com"));
        let made = container.make("Mailer", &params).await.unwrap();
        let mailer = made.as_any().downcast_ref::<Mailer>().unwrap();
        assert_eq!(mailer.host, "smtp.example.com");
        assert_eq!(mailer.port, 25);

        assert!(container.has_maker("Mailer").await);
        assert!(container.make("Missing", &params).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_scopes_share_providers_but_not_instances() {
        let root = DependencyContainer::new();
        root.register_singleton(|_| Ok(Arc::new(clock("root"))))
            .await
            .unwrap();
        root.register_instance(7u8).await.unwrap();

        let scoped = root.create_scope();
        assert_eq!(scoped.resolve::<Clock>().await.unwrap().zone, "root");
        assert!(!scoped.has::<u8>().await);
        scoped.register_instance(9u8).await.unwrap();
        assert_eq!(*root.resolve::<u8>().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_builder() {
        let container = ContainerBuilder::new()
            .instance(clock("builder"))
            .await
            .unwrap()
            .maker("Mailer", |_, _| Ok(instance(Mailer { host: "h".into(), port: 1 })))
            .await
            .build();

        assert_eq!(container.resolve::<Clock>().await.unwrap().zone, "builder");
        assert!(container.has_maker("Mailer").await);
    }
}
