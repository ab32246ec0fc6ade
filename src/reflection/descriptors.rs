// Copyright 2025 Cowboy AI, LLC.

//! Derived parameter metadata handed to the mapping chain

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// Declared type of a parameter
///
/// The `is_*` flags are `None` when union or intersection members disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Member type names, `null` excluded
    pub names: Vec<String>,
    /// Whether null is accepted
    pub nullable: bool,
    /// `A|B`
    pub is_union: bool,
    /// `A&B`
    pub is_intersection: bool,
    /// Every member is a registered class-like type
    pub is_class: Option<bool>,
    /// Every member is a primitive
    pub is_primitive: Option<bool>,
    /// Every member is a registered enum
    pub is_enum: Option<bool>,
}

impl TypeDescriptor {
    /// Untyped parameter
    pub fn mixed() -> Self {
        Self {
            names: vec!["mixed".to_string()],
            nullable: true,
            is_union: false,
            is_intersection: false,
            is_class: Some(false),
            is_primitive: Some(true),
            is_enum: Some(false),
        }
    }

    /// Descriptor with unknown classification, used for synthesized parameters
    pub fn unclassified(name: impl Into<String>) -> Self {
        Self {
            names: vec![name.into()],
            nullable: true,
            is_union: false,
            is_intersection: false,
            is_class: None,
            is_primitive: None,
            is_enum: None,
        }
    }

    /// The single member name, `None` for unions and intersections
    pub fn single(&self) -> Option<&str> {
        match self.names.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    /// Display form: `?T`, `A|B|null`, `A&B`
    pub fn display_name(&self) -> String {
        let joined = if self.is_intersection {
            self.names.join("&")
        } else {
            self.names.join("|")
        };
        match (self.nullable, self.names.len()) {
            (true, 1) if self.names[0] != "mixed" && self.names[0] != "null" => format!("?{joined}"),
            (true, n) if n > 1 => format!("{joined}|null"),
            _ => joined,
        }
    }

    /// Whether `Some(true)` was recorded for the enum flag
    pub fn is_enum_type(&self) -> bool {
        self.is_enum == Some(true)
    }
}

/// Which chain an annotation belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationKind {
    /// Locates a value when direct lookup fails
    FieldMapper,
    /// Converts a located value
    ValueTransformer,
}

impl AnnotationKind {
    /// Short label used in cache keys and logs
    pub fn label(&self) -> &'static str {
        match self {
            AnnotationKind::FieldMapper => "mapper",
            AnnotationKind::ValueTransformer => "transformer",
        }
    }
}

/// Normalized mapping annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationDescriptor {
    /// Field mapper or value transformer
    pub kind: AnnotationKind,
    /// Registered resolver name
    pub resolver_type: String,
    /// Resolver configuration
    pub resolver_params: Map<String, Json>,
}

/// One parameter of a declared method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Parameter name, unique within its method
    pub name: String,
    /// Declared type
    pub ty: TypeDescriptor,
    /// Whether the parameter has a default
    pub has_default: bool,
    /// The default, when present
    pub default_value: Option<Json>,
    /// Annotations in declaration order
    pub annotations: Vec<AnnotationDescriptor>,
}

impl ParameterDescriptor {
    /// Field-mapper annotations in order
    pub fn field_mappers(&self) -> impl Iterator<Item = &AnnotationDescriptor> {
        self.annotations
            .iter()
            .filter(|a| a.kind == AnnotationKind::FieldMapper)
    }

    /// Value-transformer annotations in order
    pub fn transformers(&self) -> impl Iterator<Item = &AnnotationDescriptor> {
        self.annotations
            .iter()
            .filter(|a| a.kind == AnnotationKind::ValueTransformer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let mut ty = TypeDescriptor::unclassified("Status");
        assert_eq!(ty.display_name(), "?Status");

        ty.nullable = false;
        ty.names.push("int".to_string());
        ty.is_union = true;
        assert_eq!(ty.display_name(), "Status|int");
        assert_eq!(ty.single(), None);

        assert_eq!(TypeDescriptor::mixed().display_name(), "mixed");
    }
}
