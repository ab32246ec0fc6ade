// Copyright 2025 Cowboy AI, LLC.

//! DTO construction from loosely shaped input and the structural inverse
//!
//! A [`Data`] type declares its constructor parameters once. The
//! [`DataFactory`] resolves each parameter against a [`Source`] by direct
//! key lookup, then declared field mappers, then runs the declared value
//! transformers, and deserializes the collected arguments. Arguments that
//! stay absent are omitted so serde defaults apply.
//!
//! [`Source`]: crate::support::Source

pub mod entity;
pub mod factory;
pub mod mapping;
pub mod serializer;

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::reflection::{DeclaredParameter, TypeDefinition};

pub use entity::{EntityRepository, InMemoryEntityRepository};
pub use factory::DataFactory;
pub use mapping::{FieldMapper, ResolverRegistry, ValueTransformer};
pub use serializer::DataSerializer;

/// A serde-backed DTO with declared constructor parameters
pub trait Data: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Registered type name
    const NAME: &'static str;

    /// Constructor parameters in declaration order
    fn parameters() -> Vec<DeclaredParameter>;

    /// Definition published into the type registry
    fn definition() -> TypeDefinition {
        TypeDefinition::for_data::<Self>()
    }
}
