// Copyright 2025 Cowboy AI, LLC.

//! # CIM Pragmatic
//!
//! Application building blocks for the Composable Information Machine:
//!
//! - **Value**: an explicit present/absent wrapper distinct from `null`
//! - **Reflection**: declared type definitions and cached parameter descriptors
//! - **Data**: DTO construction through field mappers and value transformers
//! - **CQRS**: queries, commands and actions dispatched through a middleware
//!   pipeline assembled from global, class and runtime levels
//! - **State Machine**: per-entity data blobs with enum-guarded transitions
//! - **Support**: alerts, debug dumps, JSON drivers, fast hashing, caching
//!
//! ## Design Principles
//!
//! 1. **Absence is not null**: mapping distinguishes "no value" from `null`
//! 2. **Declared, not discovered**: types publish their parameters once
//! 3. **Exact middleware identity**: exclusion compares concrete types
//! 4. **Explicit collaborators**: stores, gates and publishers are traits
//!    with in-memory implementations

#![warn(missing_docs)]

pub mod alerts;
pub mod cache;
pub mod config;
pub mod cqrs;
pub mod data;
pub mod debug;
pub mod dependency_injection;
pub mod errors;
pub mod events;
pub mod gate;
pub mod hashing;
pub mod json;
pub mod kernel;
pub mod payload;
pub mod reflection;
pub mod state_machine;
pub mod support;
pub mod value;

pub use alerts::{AlertData, AlertManager, AlertType, InMemorySession, SessionStore};
pub use cache::{CacheKeyBuilder, CacheStore, InMemoryCache};
pub use config::PragmaticConfig;
pub use cqrs::{
    Ability, Action, ActionExt, Command, CommandBus, Dispatch, Dispatcher, Middleware,
    MiddlewareId, MiddlewareRef, MiddlewareRegistry, Next, Operation, OperationExt,
    OperationKind, OperationState, Query, QueryBus,
};
pub use data::{Data, DataFactory, DataSerializer, FieldMapper, ResolverRegistry, ValueTransformer};
pub use debug::{DebugManager, DebugMode};
pub use dependency_injection::{ContainerBuilder, DependencyContainer};
pub use errors::{DomainError, DomainResult};
pub use events::{EventPublisher, InMemoryEventPublisher, Notification};
pub use gate::{AbilityGate, Gate};
pub use hashing::{FastHasher, HashAlgo};
pub use json::{JsonDriver, JsonManager};
pub use kernel::{Kernel, KernelBuilder};
pub use payload::{Instance, Object, Payload};
pub use reflection::{
    DeclaredAnnotation, DeclaredParameter, ParameterDescriptor, ReflectionReader, TypeDefinition,
    TypeRegistry,
};
pub use state_machine::{EntityRef, StateEnum, StateManager, StateServices, Stateful};
pub use support::{Enumeration, Source};
pub use value::Value;
