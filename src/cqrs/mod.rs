// Copyright 2025 Cowboy AI, LLC.

//! # Operations and the middleware pipeline
//!
//! Queries read, commands write and actions do anything else. Each kind is
//! dispatched through an ordered list of middleware collected from three
//! levels:
//!
//! 1. global middleware configured per kind on the [`Dispatcher`]
//! 2. class-level middleware declared by the operation type
//! 3. runtime middleware attached to one instance via [`OperationExt`]
//!
//! Exclusions declared by the type or attached to the instance remove
//! middleware by exact type before anything is resolved. With nothing left
//! the operation boots and executes directly.

pub mod bus;
pub mod dispatch;
pub mod events;
pub mod middleware;
pub mod operation;
pub mod pipeline;

pub use bus::{ActionExt, CommandBus, Dispatcher, GlobalMiddleware, QueryBus};
pub use dispatch::Dispatch;
pub use events::{OperationEvent, OperationStage};
pub use middleware::{
    AuthorizationMiddleware, CachingMiddleware, EventMiddleware, LoggingMiddleware, Middleware,
    MiddlewareId, MiddlewareRef, MiddlewareRegistry, TransactionMiddleware, UnitOfWork,
    ValidationMiddleware,
};
pub use operation::{
    Ability, Action, Command, Operation, OperationExt, OperationKind, OperationState, Query,
};
pub use pipeline::Next;
