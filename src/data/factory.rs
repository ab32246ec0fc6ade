// Copyright 2025 Cowboy AI, LLC.

//! Builds registered types from data sources

use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;

use super::mapping::ResolverRegistry;
use super::Data;
use crate::dependency_injection::DependencyContainer;
use crate::errors::{DomainError, DomainResult};
use crate::payload::{Instance, Payload};
use crate::reflection::{ParameterDescriptor, ReflectionReader, TypeRegistry};
use crate::support::{DataAccessor, Source};
use crate::value::Value;

/// Resolves constructor arguments and instantiates registered types
#[derive(Debug, Clone)]
pub struct DataFactory {
    reader: Arc<ReflectionReader>,
    resolvers: Arc<ResolverRegistry>,
    container: Arc<DependencyContainer>,
    accessor: DataAccessor,
}

impl DataFactory {
    /// Factory over the given reader, resolvers and container
    pub fn new(
        reader: Arc<ReflectionReader>,
        resolvers: Arc<ResolverRegistry>,
        container: Arc<DependencyContainer>,
    ) -> Self {
        Self {
            reader,
            resolvers,
            container,
            accessor: DataAccessor,
        }
    }

    /// Type registry behind the reader
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        self.reader.registry()
    }

    /// Reflection reader
    pub fn reader(&self) -> &ReflectionReader {
        &self.reader
    }

    /// Resolver registry
    pub fn resolvers(&self) -> &ResolverRegistry {
        &self.resolvers
    }

    /// Container used by the `container` transformer
    pub fn container(&self) -> &DependencyContainer {
        &self.container
    }

    /// Source accessor
    pub fn accessor(&self) -> &DataAccessor {
        &self.accessor
    }

    /// Build `T` from `source`, registering `T` on first use
    pub async fn make<T: Data>(&self, source: &Source<'_>) -> DomainResult<T> {
        self.registry().ensure_data::<T>();
        let built = self.make_dynamic(T::NAME, source).await?;
        built.as_any().downcast_ref::<T>().cloned().ok_or_else(|| {
            DomainError::configuration(format!(
                "Constructor of `{}` did not produce a `{}`.",
                T::NAME,
                std::any::type_name::<T>()
            ))
        })
    }

    /// Build the registered type `type_name` from `source`
    pub fn make_dynamic<'a>(
        &'a self,
        type_name: &'a str,
        source: &'a Source<'a>,
    ) -> BoxFuture<'a, DomainResult<Instance>> {
        Box::pin(async move {
            let definition = self.reader.definition(type_name)?;
            let constructor = definition.constructor().cloned().ok_or_else(|| {
                DomainError::configuration(format!("`{type_name}` cannot be constructed."))
            })?;
            let args = self.resolve_arguments(type_name, source).await?;
            constructor(args)
        })
    }

    /// Present constructor arguments of `type_name`, in declaration order
    pub async fn resolve_arguments(
        &self,
        type_name: &str,
        source: &Source<'_>,
    ) -> DomainResult<IndexMap<String, Payload>> {
        let params = self.reader.constructor_params(type_name, true)?;
        let mut args = IndexMap::with_capacity(params.len());
        for parameter in params.iter() {
            if let Value::Present(value) = self.resolve_parameter(parameter, source).await? {
                args.insert(parameter.name.clone(), value);
            }
        }
        Ok(args)
    }

    /// Direct lookup, then field mappers, then the transformer chain
    pub async fn resolve_parameter(
        &self,
        parameter: &ParameterDescriptor,
        source: &Source<'_>,
    ) -> DomainResult<Value<Payload>> {
        let mut value = self.accessor.get(source, &parameter.name)?;
        if value.is_absent() {
            for annotation in parameter.field_mappers() {
                let mapper = self.resolvers.field_mapper(annotation)?;
                let mapped = mapper.resolve(self, parameter, source).await?;
                if mapped.exists() {
                    value = mapped;
                    break;
                }
            }
        }
        self.transform_value(parameter, value).await
    }

    /// Run the parameter's value transformers in order
    pub async fn transform_value(
        &self,
        parameter: &ParameterDescriptor,
        mut value: Value<Payload>,
    ) -> DomainResult<Value<Payload>> {
        for annotation in parameter.transformers() {
            let transformer = self.resolvers.transformer(annotation)?;
            value = transformer.transform(self, parameter, value).await?;
        }
        Ok(value)
    }
}
