// Copyright 2025 Cowboy AI, LLC.

//! Field mappers and value transformers
//!
//! Resolvers are registered by name. An annotation names its resolver and
//! carries its params; the built resolver is cached under
//! `kind:name:hash(params)` so equal annotations share one instance.

pub mod field;
pub mod transform;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::{Map, Value as Json};

use super::factory::DataFactory;
use crate::cache::CacheKeyBuilder;
use crate::errors::{DomainError, DomainResult};
use crate::hashing::FastHasher;
use crate::payload::Payload;
use crate::reflection::{AnnotationDescriptor, AnnotationKind, ParameterDescriptor};
use crate::support::Source;
use crate::value::Value;

/// Locates a value for a parameter when direct lookup finds nothing
#[async_trait]
pub trait FieldMapper: Send + Sync {
    /// Present value, or absent to let the next mapper try
    async fn resolve(
        &self,
        factory: &DataFactory,
        parameter: &ParameterDescriptor,
        source: &Source<'_>,
    ) -> DomainResult<Value<Payload>>;
}

/// Converts the current value of a parameter; chained in declaration order
#[async_trait]
pub trait ValueTransformer: Send + Sync {
    /// New value handed to the next transformer
    async fn transform(
        &self,
        factory: &DataFactory,
        parameter: &ParameterDescriptor,
        value: Value<Payload>,
    ) -> DomainResult<Value<Payload>>;
}

/// Builds a field mapper from annotation params
pub type MapperFactory =
    Arc<dyn Fn(&Map<String, Json>) -> DomainResult<Arc<dyn FieldMapper>> + Send + Sync>;

/// Builds a value transformer from annotation params
pub type TransformerFactory =
    Arc<dyn Fn(&Map<String, Json>) -> DomainResult<Arc<dyn ValueTransformer>> + Send + Sync>;

#[derive(Clone)]
enum Built {
    Mapper(Arc<dyn FieldMapper>),
    Transformer(Arc<dyn ValueTransformer>),
}

/// Named resolver factories plus the instance cache
pub struct ResolverRegistry {
    mappers: RwLock<HashMap<String, MapperFactory>>,
    transformers: RwLock<HashMap<String, TransformerFactory>>,
    instances: RwLock<HashMap<String, Built>>,
    keys: CacheKeyBuilder,
    hasher: FastHasher,
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut mappers: Vec<_> = self
            .mappers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        mappers.sort();
        let mut transformers: Vec<_> = self
            .transformers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        transformers.sort();
        f.debug_struct("ResolverRegistry")
            .field("mappers", &mappers)
            .field("transformers", &transformers)
            .finish()
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::with_builtins(CacheKeyBuilder::default(), FastHasher::default())
    }
}

impl ResolverRegistry {
    /// Registry without any resolvers
    pub fn empty(keys: CacheKeyBuilder, hasher: FastHasher) -> Self {
        Self {
            mappers: RwLock::new(HashMap::new()),
            transformers: RwLock::new(HashMap::new()),
            instances: RwLock::new(HashMap::new()),
            keys,
            hasher,
        }
    }

    /// Registry with the built-in mappers and transformers
    pub fn with_builtins(keys: CacheKeyBuilder, hasher: FastHasher) -> Self {
        let registry = Self::empty(keys, hasher);
        field::register_builtins(&registry);
        transform::register_builtins(&registry);
        registry
    }

    /// Register a field mapper under `name`
    pub fn register_mapper<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Map<String, Json>) -> DomainResult<Arc<dyn FieldMapper>> + Send + Sync + 'static,
    {
        self.mappers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), Arc::new(factory));
        self.clear_instances();
    }

    /// Register a value transformer under `name`
    pub fn register_transformer<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Map<String, Json>) -> DomainResult<Arc<dyn ValueTransformer>>
            + Send
            + Sync
            + 'static,
    {
        self.transformers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), Arc::new(factory));
        self.clear_instances();
    }

    /// Whether a field mapper is registered under `name`
    pub fn has_mapper(&self, name: &str) -> bool {
        self.mappers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Whether a value transformer is registered under `name`
    pub fn has_transformer(&self, name: &str) -> bool {
        self.transformers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Mapper for a field-mapper annotation
    pub fn field_mapper(&self, annotation: &AnnotationDescriptor) -> DomainResult<Arc<dyn FieldMapper>> {
        if annotation.kind != AnnotationKind::FieldMapper {
            return Err(DomainError::configuration(format!(
                "`{}` is not declared as a field mapper.",
                annotation.resolver_type
            )));
        }
        let key = self.instance_key(annotation)?;
        if let Some(Built::Mapper(mapper)) = self.cached(&key) {
            return Ok(mapper);
        }

        let factory = self
            .mappers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&annotation.resolver_type)
            .cloned()
            .ok_or_else(|| {
                DomainError::configuration(format!(
                    "Field mapper `{}` does not exist.",
                    annotation.resolver_type
                ))
            })?;
        let mapper = factory(&annotation.resolver_params)?;
        tracing::debug!(resolver = %annotation.resolver_type, key = %key, "field mapper built");
        self.store(key, Built::Mapper(mapper.clone()));
        Ok(mapper)
    }

    /// Transformer for a value-transformer annotation
    pub fn transformer(&self, annotation: &AnnotationDescriptor) -> DomainResult<Arc<dyn ValueTransformer>> {
        if annotation.kind != AnnotationKind::ValueTransformer {
            return Err(DomainError::configuration(format!(
                "`{}` is not declared as a value transformer.",
                annotation.resolver_type
            )));
        }
        let key = self.instance_key(annotation)?;
        if let Some(Built::Transformer(transformer)) = self.cached(&key) {
            return Ok(transformer);
        }

        let factory = self
            .transformers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&annotation.resolver_type)
            .cloned()
            .ok_or_else(|| {
                DomainError::configuration(format!(
                    "Value transformer `{}` does not exist.",
                    annotation.resolver_type
                ))
            })?;
        let transformer = factory(&annotation.resolver_params)?;
        tracing::debug!(resolver = %annotation.resolver_type, key = %key, "value transformer built");
        self.store(key, Built::Transformer(transformer.clone()));
        Ok(transformer)
    }

    /// Number of cached resolver instances
    pub fn cached_len(&self) -> usize {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop cached resolver instances
    pub fn clear_instances(&self) {
        self.instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn instance_key(&self, annotation: &AnnotationDescriptor) -> DomainResult<String> {
        let params = serde_json::to_string(&annotation.resolver_params)?;
        Ok(self.keys.build(&[
            Json::from(annotation.kind.label()),
            Json::from(annotation.resolver_type.as_str()),
            Json::from(self.hasher.make(params)),
        ]))
    }

    fn cached(&self, key: &str) -> Option<Built> {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn store(&self, key: String, built: Built) {
        self.instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, built);
    }
}

/// Optional string param; other JSON types are a configuration error
pub(crate) fn string_param(params: &Map<String, Json>, name: &str) -> DomainResult<Option<String>> {
    match params.get(name) {
        None | Some(Json::Null) => Ok(None),
        Some(Json::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(DomainError::configuration(format!(
            "Resolver param `{name}` must be a string, got {other}"
        ))),
    }
}

/// Optional map param; other JSON types are a configuration error
pub(crate) fn map_param(params: &Map<String, Json>, name: &str) -> DomainResult<Map<String, Json>> {
    match params.get(name) {
        None | Some(Json::Null) => Ok(Map::new()),
        Some(Json::Object(map)) => Ok(map.clone()),
        Some(other) => Err(DomainError::configuration(format!(
            "Resolver param `{name}` must be a map, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn annotation(kind: AnnotationKind, name: &str, params: Json) -> AnnotationDescriptor {
        AnnotationDescriptor {
            kind,
            resolver_type: name.to_string(),
            resolver_params: match params {
                Json::Object(map) => map,
                _ => Map::new(),
            },
        }
    }

    #[test]
    fn test_equal_annotations_share_an_instance() {
        let registry = ResolverRegistry::default();
        let first = registry
            .field_mapper(&annotation(AnnotationKind::FieldMapper, "alias", json!({"keys": ["a"]})))
            .unwrap();
        let second = registry
            .field_mapper(&annotation(AnnotationKind::FieldMapper, "alias", json!({"keys": ["a"]})))
            .unwrap();
        let other = registry
            .field_mapper(&annotation(AnnotationKind::FieldMapper, "alias", json!({"keys": ["b"]})))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(registry.cached_len(), 2);
    }

    #[test]
    fn test_unknown_or_misdeclared_resolvers_fail() {
        let registry = ResolverRegistry::default();

        let unknown = registry.transformer(&annotation(AnnotationKind::ValueTransformer, "nope", json!({})));
        assert!(unknown.err().is_some_and(|e| e.is_configuration_error()));

        let wrong_kind = registry.field_mapper(&annotation(AnnotationKind::ValueTransformer, "alias", json!({})));
        assert!(wrong_kind.err().is_some_and(|e| e.is_configuration_error()));

        let missing_args = registry.field_mapper(&annotation(AnnotationKind::FieldMapper, "alias", json!({})));
        assert!(missing_args.err().is_some_and(|e| e.is_configuration_error()));
    }

    #[test]
    fn test_builtins_are_registered() {
        let registry = ResolverRegistry::default();
        assert!(registry.has_mapper("snake_to_camel"));
        assert!(registry.has_mapper("alias"));
        for name in ["enum", "create_object", "data", "container", "model", "collection", "static_call"] {
            assert!(registry.has_transformer(name), "missing {name}");
        }
    }
}
