// Copyright 2025 Cowboy AI, LLC.

//! Reflection metadata
//!
//! Types publish a [`TypeDefinition`] into the [`TypeRegistry`]; the
//! [`ReflectionReader`] derives ordered [`ParameterDescriptor`] lists from
//! it and keeps them in a bounded LRU cache keyed by
//! `(type, method, with_annotations)`. Cached lists carry the revisions of
//! the type and of every type their parameters name, and are re-derived
//! once one of those is registered again or removed.

pub mod declared;
pub mod descriptors;
pub mod registry;
pub mod type_expr;

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;

pub use declared::{AnnotationArgument, DeclaredAnnotation, DeclaredParameter};
pub use descriptors::{AnnotationDescriptor, AnnotationKind, ParameterDescriptor, TypeDescriptor};
pub use registry::{
    normalize_name, Constructor, EnumDefinition, StaticMethod, TypeDefinition, TypeKind,
    TypeRegistry, CONSTRUCTOR, FROM,
};

use crate::errors::{DomainError, DomainResult};

/// Default number of derived descriptor lists kept in memory
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    type_name: String,
    method: String,
    with_annotations: bool,
}

#[derive(Debug, Clone)]
struct CachedParams {
    stamps: Vec<(String, u64)>,
    params: Arc<Vec<ParameterDescriptor>>,
}

impl CachedParams {
    fn is_current(&self, registry: &TypeRegistry) -> bool {
        self.stamps
            .iter()
            .all(|(name, revision)| registry.revision_of(name) == *revision)
    }
}

/// Derives and caches parameter descriptors
pub struct ReflectionReader {
    registry: Arc<TypeRegistry>,
    cache: Mutex<LruCache<CacheKey, CachedParams>>,
}

impl std::fmt::Debug for ReflectionReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReflectionReader")
            .field("registry", &self.registry)
            .field("cached", &self.cached_len())
            .finish()
    }
}

impl ReflectionReader {
    /// Reader over `registry` with the default cache capacity
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        let capacity = NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN);
        Self::with_capacity(registry, capacity)
    }

    /// Reader keeping at most `capacity` descriptor lists
    pub fn with_capacity(registry: Arc<TypeRegistry>, capacity: NonZeroUsize) -> Self {
        Self {
            registry,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Registry the reader derives from
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Definition of `type_name`; `ConfigurationError` when unknown
    pub fn definition(&self, type_name: &str) -> DomainResult<Arc<TypeDefinition>> {
        self.registry.get(type_name).ok_or_else(|| {
            DomainError::configuration(format!("Type `{type_name}` is not registered."))
        })
    }

    /// Constructor parameters of `type_name`
    pub fn constructor_params(
        &self,
        type_name: &str,
        with_annotations: bool,
    ) -> DomainResult<Arc<Vec<ParameterDescriptor>>> {
        self.method_params(type_name, CONSTRUCTOR, with_annotations)
    }

    /// Parameters of `method` on `type_name`
    pub fn method_params(
        &self,
        type_name: &str,
        method: &str,
        with_annotations: bool,
    ) -> DomainResult<Arc<Vec<ParameterDescriptor>>> {
        let key = CacheKey {
            type_name: normalize_name(type_name),
            method: method.to_string(),
            with_annotations,
        };
        {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = cache.get(&key) {
                if cached.is_current(&self.registry) {
                    return Ok(cached.params.clone());
                }
            }
        }

        tracing::debug!(
            type_name = %key.type_name,
            method = %key.method,
            with_annotations,
            "deriving parameter descriptors"
        );

        let mut stamps = vec![(key.type_name.clone(), self.registry.revision_of(&key.type_name))];
        let definition = self.definition(&key.type_name)?;
        let declared = definition.method(method).ok_or_else(|| {
            DomainError::configuration(format!(
                "Method `{method}` does not exist on `{}`.",
                definition.name()
            ))
        })?;

        let mut params = Vec::with_capacity(declared.len());
        for parameter in declared {
            if params
                .iter()
                .any(|p: &ParameterDescriptor| p.name == parameter.name)
            {
                return Err(DomainError::configuration(format!(
                    "Duplicate parameter `{}` on `{}::{method}`.",
                    parameter.name,
                    definition.name()
                )));
            }
            params.push(self.describe_parameter(parameter, with_annotations, &mut stamps)?);
        }

        let params = Arc::new(params);
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(
                key,
                CachedParams {
                    stamps,
                    params: params.clone(),
                },
            );
        Ok(params)
    }

    fn describe_parameter(
        &self,
        parameter: &DeclaredParameter,
        with_annotations: bool,
        stamps: &mut Vec<(String, u64)>,
    ) -> DomainResult<ParameterDescriptor> {
        let annotations = if with_annotations {
            parameter
                .annotations
                .iter()
                .map(DeclaredAnnotation::normalize)
                .collect::<DomainResult<Vec<_>>>()?
        } else {
            Vec::new()
        };

        Ok(ParameterDescriptor {
            name: parameter.name.clone(),
            ty: self.classify(parameter.type_expr.as_deref(), stamps)?,
            has_default: parameter.default.is_some(),
            default_value: parameter.default.clone(),
            annotations,
        })
    }

    /// Parse and classify a type expression against the registry
    pub fn describe_type(&self, expr: Option<&str>) -> DomainResult<TypeDescriptor> {
        self.classify(expr, &mut Vec::new())
    }

    fn classify(
        &self,
        expr: Option<&str>,
        stamps: &mut Vec<(String, u64)>,
    ) -> DomainResult<TypeDescriptor> {
        let parsed = type_expr::parse(expr)?;

        let mut is_class = Vec::with_capacity(parsed.names.len());
        let mut is_primitive = Vec::with_capacity(parsed.names.len());
        let mut is_enum = Vec::with_capacity(parsed.names.len());
        for name in &parsed.names {
            let primitive = type_expr::is_primitive(name);
            if !primitive {
                let name = normalize_name(name);
                if !stamps.iter().any(|(seen, _)| *seen == name) {
                    let revision = self.registry.revision_of(&name);
                    stamps.push((name, revision));
                }
            }
            let kind = self.registry.get(name).map(|d| d.kind());
            is_primitive.push(primitive);
            is_class.push(!primitive);
            is_enum.push(kind == Some(TypeKind::Enum));
        }

        Ok(TypeDescriptor {
            names: parsed.names,
            nullable: parsed.nullable,
            is_union: parsed.is_union,
            is_intersection: parsed.is_intersection,
            is_class: agree(&is_class),
            is_primitive: agree(&is_primitive),
            is_enum: agree(&is_enum),
        })
    }

    /// Drop every cached list derived for `type_name`
    pub fn invalidate(&self, type_name: &str) {
        let type_name = normalize_name(type_name);
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let stale: Vec<CacheKey> = cache
            .iter()
            .filter(|(key, _)| key.type_name == type_name)
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            cache.pop(&key);
        }
    }

    /// Drop every cached list
    pub fn flush(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached lists
    pub fn cached_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

fn agree(flags: &[bool]) -> Option<bool> {
    let first = *flags.first()?;
    flags.iter().all(|&flag| flag == first).then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn reader() -> ReflectionReader {
        let registry = Arc::new(TypeRegistry::new());
        registry.register(TypeDefinition::new("Status", TypeKind::Enum));
        registry.register(TypeDefinition::new("Address", TypeKind::Data));
        registry.register(
            TypeDefinition::new("Order", TypeKind::Data).with_constructor_params(vec![
                DeclaredParameter::new("id").typed("int"),
                DeclaredParameter::new("status")
                    .typed("?Status")
                    .map_transform("enum", json!({})),
                DeclaredParameter::new("note").default_value(json!(null)),
                DeclaredParameter::new("shipping").typed("Address|int"),
            ]),
        );
        ReflectionReader::new(registry)
    }

    #[test]
    fn test_constructor_params_are_ordered_and_classified() {
        let reader = reader();
        let params = reader.constructor_params("Order", true).unwrap();
        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "status", "note", "shipping"]);

        let status = &params[1];
        assert_eq!(status.ty.is_enum, Some(true));
        assert_eq!(status.ty.is_class, Some(true));
        assert!(status.ty.nullable);
        assert_eq!(status.annotations.len(), 1);

        let note = &params[2];
        assert_eq!(note.ty, TypeDescriptor::mixed());
        assert!(note.has_default);
        assert_eq!(note.default_value, Some(json!(null)));

        let shipping = &params[3];
        assert!(shipping.ty.is_union);
        assert_eq!(shipping.ty.is_class, None);
        assert_eq!(shipping.ty.is_primitive, None);
        assert_eq!(shipping.ty.is_enum, Some(false));
    }

    #[test]
    fn test_without_annotations_skips_normalization() {
        let reader = reader();
        let params = reader.constructor_params("Order", false).unwrap();
        assert!(params.iter().all(|p| p.annotations.is_empty()));
    }

    #[test]
    fn test_repeated_calls_hit_the_cache() {
        let reader = reader();
        let first = reader.constructor_params("Order", true).unwrap();
        let second = reader.constructor_params("::Order", true).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(reader.cached_len(), 1);

        reader.invalidate("Order");
        assert_eq!(reader.cached_len(), 0);
        let third = reader.constructor_params("Order", true).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(first, third);
    }

    #[test]
    fn test_redefinition_invalidates_cached_params() {
        let reader = reader();
        let before = reader.constructor_params("Address", false).unwrap_err();
        assert!(before.is_configuration_error());

        reader.registry().register(
            TypeDefinition::new("Address", TypeKind::Data)
                .with_constructor_params(vec![DeclaredParameter::new("city").typed("string")]),
        );
        let after = reader.constructor_params("Address", false).unwrap();
        assert_eq!(after.len(), 1);

        reader.registry().register(
            TypeDefinition::new("Address", TypeKind::Data).with_constructor_params(vec![
                DeclaredParameter::new("city").typed("string"),
                DeclaredParameter::new("zip").typed("string"),
            ]),
        );
        assert_eq!(reader.constructor_params("Address", false).unwrap().len(), 2);
    }

    #[test]
    fn test_unrelated_registrations_keep_the_cache_warm() {
        let reader = reader();
        let first = reader.constructor_params("Order", true).unwrap();

        reader.registry().register(TypeDefinition::new("Invoice", TypeKind::Data));
        let second = reader.constructor_params("Order", true).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        reader.registry().register(TypeDefinition::new("Status", TypeKind::Class));
        let third = reader.constructor_params("Order", true).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(third[1].ty.is_enum, Some(false));
    }

    #[test]
    fn test_unknown_type_or_method_is_configuration_error() {
        let reader = reader();
        assert!(reader
            .constructor_params("Missing", true)
            .unwrap_err()
            .is_configuration_error());
        assert!(reader
            .method_params("Order", "cancel", true)
            .unwrap_err()
            .is_configuration_error());
    }

    #[test]
    fn test_malformed_annotation_fails_at_read_time() {
        let reader = reader();
        reader.registry().register(
            TypeDefinition::new("Broken", TypeKind::Data).with_constructor_params(vec![
                DeclaredParameter::new("x").annotate(DeclaredAnnotation::new(AnnotationKind::FieldMapper)),
            ]),
        );
        assert!(reader.constructor_params("Broken", false).is_ok());
        let err = reader.constructor_params("Broken", true).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: Mapper class is required.");
    }
}
