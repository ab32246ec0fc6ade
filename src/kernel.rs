// Copyright 2025 Cowboy AI, LLC.

//! Composition root
//!
//! [`Kernel`] wires the registries, factory, dispatcher and collaborators from
//! a [`PragmaticConfig`]. Collaborator middleware (events, cache,
//! authorization and, when a unit of work is supplied, transactions) is
//! registered in the container so configured names resolve at dispatch time.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use crate::alerts::{AlertManager, InMemorySession, SessionStore};
use crate::cache::{CacheKeyBuilder, CacheStore, InMemoryCache};
use crate::config::PragmaticConfig;
use crate::cqrs::{
    AuthorizationMiddleware, CachingMiddleware, CommandBus, Dispatcher, EventMiddleware,
    GlobalMiddleware, MiddlewareRegistry, QueryBus, TransactionMiddleware, UnitOfWork,
};
use crate::data::{DataFactory, DataSerializer};
use crate::data::mapping::ResolverRegistry;
use crate::debug::DebugManager;
use crate::dependency_injection::DependencyContainer;
use crate::errors::{DomainError, DomainResult};
use crate::events::{EventPublisher, TracingEventPublisher};
use crate::gate::{AbilityGate, Gate};
use crate::hashing::FastHasher;
use crate::json::JsonManager;
use crate::reflection::{ReflectionReader, TypeRegistry};
use crate::state_machine::{InMemoryStateStore, StateServices, StateStore};

/// Builder for [`Kernel`]; unset collaborators get in-memory defaults
#[derive(Default)]
pub struct KernelBuilder {
    config: PragmaticConfig,
    container: Option<Arc<DependencyContainer>>,
    middleware: Option<MiddlewareRegistry>,
    cache: Option<Arc<dyn CacheStore>>,
    publisher: Option<Arc<dyn EventPublisher>>,
    gate: Option<Arc<dyn Gate>>,
    session: Option<Arc<dyn SessionStore>>,
    state_store: Option<Arc<dyn StateStore>>,
    unit_of_work: Option<Arc<dyn UnitOfWork>>,
}

impl std::fmt::Debug for KernelBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl KernelBuilder {
    /// Use `config`
    pub fn config(mut self, config: PragmaticConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an existing container
    pub fn container(mut self, container: Arc<DependencyContainer>) -> Self {
        self.container = Some(container);
        self
    }

    /// Use a middleware registry instead of the built-ins
    pub fn middleware(mut self, registry: MiddlewareRegistry) -> Self {
        self.middleware = Some(registry);
        self
    }

    /// Cache store for query results
    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Notification sink
    pub fn publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Authorization gate
    pub fn gate(mut self, gate: Arc<dyn Gate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Session backing alerts
    pub fn session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    /// Store for state records
    pub fn state_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.state_store = Some(store);
        self
    }

    /// Unit of work enabling the `transaction` middleware
    pub fn unit_of_work(mut self, unit_of_work: Arc<dyn UnitOfWork>) -> Self {
        self.unit_of_work = Some(unit_of_work);
        self
    }

    /// Wire everything; an unknown middleware name or invalid setting fails here
    pub async fn build(self) -> DomainResult<Kernel> {
        let config = self.config;
        let hasher = FastHasher::new(config.hash_algo()?);
        let keys = CacheKeyBuilder::new(config.cache.delimiter.clone());
        let capacity = NonZeroUsize::new(config.reflection.cache_capacity).ok_or_else(|| {
            DomainError::configuration("reflection.cache_capacity must be greater than zero")
        })?;

        let container = self.container.unwrap_or_default();
        let types = Arc::new(TypeRegistry::new());
        let reader = Arc::new(ReflectionReader::with_capacity(types.clone(), capacity));
        let resolvers = Arc::new(ResolverRegistry::with_builtins(keys.clone(), hasher));
        let factory = DataFactory::new(reader.clone(), resolvers.clone(), container.clone());
        let serializer = DataSerializer::new(reader.clone());

        let cache = self.cache.unwrap_or_else(|| Arc::new(InMemoryCache::new()));
        let publisher = self
            .publisher
            .unwrap_or_else(|| Arc::new(TracingEventPublisher));
        let gate = self.gate.unwrap_or_else(|| Arc::new(AbilityGate::new()));
        let session = self
            .session
            .unwrap_or_else(|| Arc::new(InMemorySession::new()));
        let state_store = self
            .state_store
            .unwrap_or_else(|| Arc::new(InMemoryStateStore::new()));
        let states = StateServices::new(state_store, publisher.clone());

        container
            .register_instance(EventMiddleware::new(publisher.clone()))
            .await?;
        container
            .register_instance(
                CachingMiddleware::new(cache.clone())
                    .with_default_ttl(Duration::from_secs(config.cache.default_ttl_secs)),
            )
            .await?;
        container
            .register_instance(AuthorizationMiddleware::new(gate.clone()))
            .await?;
        if let Some(unit_of_work) = self.unit_of_work {
            container
                .register_instance(TransactionMiddleware::new(unit_of_work))
                .await?;
        }
        container.register_instance(factory.clone()).await?;
        container.register_instance(states.clone()).await?;

        let middleware = self.middleware.unwrap_or_else(MiddlewareRegistry::with_builtins);
        let global = GlobalMiddleware::from_config(&config.cqrs, &middleware)?;
        let dispatcher = Arc::new(Dispatcher::new(container.clone(), global));

        let debug = DebugManager::new(
            config.debug.mode,
            config.debug.enabled,
            config.debug.default_driver.clone(),
        );
        debug.driver(None)?;
        let json = JsonManager::new(config.json.default_driver.clone(), hasher);
        json.driver(None)?;

        tracing::debug!(
            query = ?config.cqrs.query_middleware,
            command = ?config.cqrs.command_middleware,
            action = ?config.cqrs.action_middleware,
            "kernel built"
        );

        Ok(Kernel {
            query_bus: QueryBus::new(dispatcher.clone()),
            command_bus: CommandBus::new(dispatcher.clone()),
            alerts: AlertManager::new(session),
            debug: Arc::new(debug),
            config,
            container,
            types,
            reader,
            resolvers,
            factory,
            serializer,
            middleware,
            dispatcher,
            json,
            hasher,
            cache,
            publisher,
            gate,
            states,
        })
    }
}

/// Everything wired together
#[derive(Clone)]
pub struct Kernel {
    config: PragmaticConfig,
    container: Arc<DependencyContainer>,
    types: Arc<TypeRegistry>,
    reader: Arc<ReflectionReader>,
    resolvers: Arc<ResolverRegistry>,
    factory: DataFactory,
    serializer: DataSerializer,
    middleware: MiddlewareRegistry,
    dispatcher: Arc<Dispatcher>,
    query_bus: QueryBus,
    command_bus: CommandBus,
    json: JsonManager,
    hasher: FastHasher,
    debug: Arc<DebugManager>,
    alerts: AlertManager,
    cache: Arc<dyn CacheStore>,
    publisher: Arc<dyn EventPublisher>,
    gate: Arc<dyn Gate>,
    states: StateServices,
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("config", &self.config)
            .field("middleware", &self.middleware.names())
            .finish_non_exhaustive()
    }
}

impl Kernel {
    /// Start building
    pub fn builder() -> KernelBuilder {
        KernelBuilder::default()
    }

    /// Kernel from `config` with in-memory collaborators
    pub async fn new(config: PragmaticConfig) -> DomainResult<Self> {
        Self::builder().config(config).build().await
    }

    /// Active configuration
    pub fn config(&self) -> &PragmaticConfig {
        &self.config
    }

    /// Service container
    pub fn container(&self) -> &Arc<DependencyContainer> {
        &self.container
    }

    /// Registered type definitions
    pub fn types(&self) -> &Arc<TypeRegistry> {
        &self.types
    }

    /// Reflection reader
    pub fn reader(&self) -> &Arc<ReflectionReader> {
        &self.reader
    }

    /// Mapper and transformer registry
    pub fn resolvers(&self) -> &Arc<ResolverRegistry> {
        &self.resolvers
    }

    /// DTO factory
    pub fn factory(&self) -> &DataFactory {
        &self.factory
    }

    /// DTO serializer
    pub fn serializer(&self) -> &DataSerializer {
        &self.serializer
    }

    /// Middleware names
    pub fn middleware(&self) -> &MiddlewareRegistry {
        &self.middleware
    }

    /// Pipeline dispatcher
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Query bus
    pub fn query_bus(&self) -> &QueryBus {
        &self.query_bus
    }

    /// Command bus
    pub fn command_bus(&self) -> &CommandBus {
        &self.command_bus
    }

    /// JSON drivers
    pub fn json(&self) -> &JsonManager {
        &self.json
    }

    /// Fast hasher
    pub fn hasher(&self) -> FastHasher {
        self.hasher
    }

    /// Debug dumps
    pub fn debug(&self) -> &Arc<DebugManager> {
        &self.debug
    }

    /// Alerts
    pub fn alerts(&self) -> &AlertManager {
        &self.alerts
    }

    /// Cache store
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Notification sink
    pub fn publisher(&self) -> &Arc<dyn EventPublisher> {
        &self.publisher
    }

    /// Authorization gate
    pub fn gate(&self) -> &Arc<dyn Gate> {
        &self.gate
    }

    /// State store and publisher
    pub fn states(&self) -> &StateServices {
        &self.states
    }
}
