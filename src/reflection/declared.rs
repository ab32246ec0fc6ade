// Copyright 2025 Cowboy AI, LLC.

//! Raw parameter declarations as a type publishes them
//!
//! A declaration is what an author writes once per type; the
//! [`ReflectionReader`](super::ReflectionReader) turns it into
//! [`ParameterDescriptor`](super::ParameterDescriptor)s.

use serde_json::{Map, Value as Json};

use super::descriptors::{AnnotationDescriptor, AnnotationKind};
use crate::errors::{DomainError, DomainResult};

/// One annotation argument, positional or named
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationArgument {
    /// `mapperClass` first, then `params`
    Positional(Json),
    /// `mapperClass: ...` or `params: ...`
    Named(String, Json),
}

/// An annotation as written, before normalization
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredAnnotation {
    /// Chain the annotation belongs to
    pub kind: AnnotationKind,
    /// Arguments in written order
    pub arguments: Vec<AnnotationArgument>,
}

impl DeclaredAnnotation {
    /// Empty annotation of `kind`
    pub fn new(kind: AnnotationKind) -> Self {
        Self {
            kind,
            arguments: Vec::new(),
        }
    }

    /// Field mapper with positional `(resolver, params)`
    pub fn map_field(resolver: &str, params: Json) -> Self {
        Self::new(AnnotationKind::FieldMapper)
            .arg(Json::from(resolver))
            .arg(params)
    }

    /// Value transformer with positional `(resolver, params)`
    pub fn map_transform(resolver: &str, params: Json) -> Self {
        Self::new(AnnotationKind::ValueTransformer)
            .arg(Json::from(resolver))
            .arg(params)
    }

    /// Append a positional argument
    pub fn arg(mut self, value: Json) -> Self {
        self.arguments.push(AnnotationArgument::Positional(value));
        self
    }

    /// Append a named argument
    pub fn named(mut self, name: impl Into<String>, value: Json) -> Self {
        self.arguments.push(AnnotationArgument::Named(name.into(), value));
        self
    }

    /// Resolve arguments into `{mapperClass, params}`
    pub fn normalize(&self) -> DomainResult<AnnotationDescriptor> {
        let mut mapper: Option<Json> = None;
        let mut params: Option<Json> = None;
        let mut seen_named = false;
        let mut position = 0usize;

        for argument in &self.arguments {
            match argument {
                AnnotationArgument::Positional(value) => {
                    if seen_named {
                        return Err(DomainError::configuration(
                            "Positional annotation argument cannot follow a named argument.",
                        ));
                    }
                    let slot = match position {
                        0 => &mut mapper,
                        1 => &mut params,
                        _ => {
                            return Err(DomainError::configuration(
                                "Too many annotation arguments.",
                            ))
                        }
                    };
                    *slot = Some(value.clone());
                    position += 1;
                }
                AnnotationArgument::Named(name, value) => {
                    seen_named = true;
                    let slot = match name.as_str() {
                        "mapperClass" | "mapper_class" => &mut mapper,
                        "params" => &mut params,
                        other => {
                            return Err(DomainError::configuration(format!(
                                "Unknown annotation argument: {other}"
                            )))
                        }
                    };
                    if slot.is_some() {
                        return Err(DomainError::configuration(format!(
                            "Duplicate annotation argument: {name}"
                        )));
                    }
                    *slot = Some(value.clone());
                }
            }
        }

        let resolver_type = match mapper {
            Some(Json::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
            Some(Json::String(_)) | Some(Json::Null) | None => {
                return Err(DomainError::configuration("Mapper class is required."))
            }
            Some(other) => {
                return Err(DomainError::configuration(format!(
                    "Mapper class must be a string, got {other}"
                )))
            }
        };

        let resolver_params = match params {
            None | Some(Json::Null) => Map::new(),
            Some(Json::Object(map)) => map,
            Some(other) => {
                return Err(DomainError::configuration(format!(
                    "Mapper params must be a map, got {other}"
                )))
            }
        };

        Ok(AnnotationDescriptor {
            kind: self.kind,
            resolver_type,
            resolver_params,
        })
    }
}

/// A parameter as written
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredParameter {
    /// Parameter name
    pub name: String,
    /// Type expression; `None` means untyped
    pub type_expr: Option<String>,
    /// Default value
    pub default: Option<Json>,
    /// Annotations in written order
    pub annotations: Vec<DeclaredAnnotation>,
}

impl DeclaredParameter {
    /// Untyped parameter without default
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_expr: None,
            default: None,
            annotations: Vec::new(),
        }
    }

    /// Set the type expression, e.g. `?Status` or `int|string`
    pub fn typed(mut self, expr: impl Into<String>) -> Self {
        self.type_expr = Some(expr.into());
        self
    }

    /// Declare a default value
    pub fn default_value(mut self, value: Json) -> Self {
        self.default = Some(value);
        self
    }

    /// Attach a field mapper
    pub fn map_field(self, resolver: &str, params: Json) -> Self {
        self.annotate(DeclaredAnnotation::map_field(resolver, params))
    }

    /// Attach a value transformer
    pub fn map_transform(self, resolver: &str, params: Json) -> Self {
        self.annotate(DeclaredAnnotation::map_transform(resolver, params))
    }

    /// Attach an arbitrary annotation
    pub fn annotate(mut self, annotation: DeclaredAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_positional_arguments_normalize() {
        let descriptor = DeclaredAnnotation::map_field("alias", json!({"keys": ["mail"]}))
            .normalize()
            .unwrap();

        assert_eq!(descriptor.kind, AnnotationKind::FieldMapper);
        assert_eq!(descriptor.resolver_type, "alias");
        assert_eq!(descriptor.resolver_params.get("keys"), Some(&json!(["mail"])));
    }

    #[test]
    fn test_named_and_mixed_arguments() {
        let named = DeclaredAnnotation::new(AnnotationKind::ValueTransformer)
            .named("params", json!({"enum": "Status"}))
            .named("mapperClass", json!("enum"))
            .normalize()
            .unwrap();
        assert_eq!(named.resolver_type, "enum");

        let mixed = DeclaredAnnotation::new(AnnotationKind::ValueTransformer)
            .arg(json!("enum"))
            .named("params", json!({}))
            .normalize()
            .unwrap();
        assert!(mixed.resolver_params.is_empty());
    }

    #[test]
    fn test_malformed_argument_lists() {
        let positional_after_named = DeclaredAnnotation::new(AnnotationKind::FieldMapper)
            .named("mapperClass", json!("alias"))
            .arg(json!({}))
            .normalize();
        assert!(positional_after_named.unwrap_err().is_configuration_error());

        let duplicate = DeclaredAnnotation::new(AnnotationKind::FieldMapper)
            .arg(json!("alias"))
            .named("mapperClass", json!("alias"))
            .normalize();
        assert!(duplicate.unwrap_err().is_configuration_error());

        let unknown = DeclaredAnnotation::new(AnnotationKind::FieldMapper)
            .named("resolver", json!("alias"))
            .normalize();
        assert!(unknown.unwrap_err().is_configuration_error());

        let bad_params = DeclaredAnnotation::map_field("alias", json!([1])).normalize();
        assert!(bad_params.unwrap_err().is_configuration_error());
    }

    #[test]
    fn test_missing_mapper_is_required() {
        let err = DeclaredAnnotation::new(AnnotationKind::FieldMapper)
            .normalize()
            .unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: Mapper class is required.");
    }
}
