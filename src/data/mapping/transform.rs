// Copyright 2025 Cowboy AI, LLC.

//! Built-in value transformers
//!
//! Each transformer targets a registered type: the `class` (or `enum`)
//! param when given, otherwise the parameter's own single declared type.
//! A target that cannot be found is a configuration error; an absent value
//! stays absent.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

use super::{map_param, string_param, ResolverRegistry, ValueTransformer};
use crate::data::factory::DataFactory;
use crate::errors::{DomainError, DomainResult};
use crate::payload::Payload;
use crate::reflection::type_expr::is_primitive;
use crate::reflection::{
    AnnotationDescriptor, AnnotationKind, ParameterDescriptor, TypeDefinition, TypeDescriptor,
    TypeKind, FROM,
};
use crate::support::Source;
use crate::value::Value;

fn target_name(explicit: Option<&str>, parameter: &ParameterDescriptor) -> DomainResult<String> {
    explicit
        .or_else(|| parameter.ty.single())
        .filter(|name| !is_primitive(name))
        .map(str::to_string)
        .ok_or_else(|| {
            DomainError::configuration(format!(
                "Provided class does not exist for parameter `{}`.",
                parameter.name
            ))
        })
}

fn target(factory: &DataFactory, name: &str) -> DomainResult<Arc<TypeDefinition>> {
    factory
        .registry()
        .get(name)
        .ok_or_else(|| DomainError::configuration(format!("Provided class `{name}` does not exist.")))
}

fn is_instance_of(definition: &TypeDefinition, payload: &Payload) -> bool {
    matches!(payload, Payload::Object(object) if definition.owns(object))
}

async fn call_static(
    factory: &DataFactory,
    definition: &TypeDefinition,
    method: &str,
    raw: Payload,
    extra_args: &[Json],
) -> DomainResult<Value<Payload>> {
    let call = definition.static_method(method).cloned().ok_or_else(|| {
        DomainError::configuration(format!(
            "Static method {}::{method} is not callable.",
            definition.name()
        ))
    })?;
    let mut args = Vec::with_capacity(extra_args.len() + 1);
    args.push(raw);
    args.extend(extra_args.iter().cloned().map(Payload::Json));
    call(factory, args).await
}

/// Coerces a raw backing value into an enum case
#[derive(Debug, Clone, Default)]
pub struct EnumTransform {
    enumeration: Option<String>,
}

impl EnumTransform {
    /// Transformer for `{"enum": name?}`
    pub fn from_params(params: &Map<String, Json>) -> DomainResult<Self> {
        Ok(Self {
            enumeration: string_param(params, "enum")?,
        })
    }
}

#[async_trait]
impl ValueTransformer for EnumTransform {
    async fn transform(
        &self,
        factory: &DataFactory,
        parameter: &ParameterDescriptor,
        value: Value<Payload>,
    ) -> DomainResult<Value<Payload>> {
        if self.enumeration.is_none() && !parameter.ty.is_enum_type() {
            return Err(DomainError::configuration("Parameter type must be an enum."));
        }
        let name = target_name(self.enumeration.as_deref(), parameter)?;
        let definition = target(factory, &name)?;
        let cases = definition
            .enumeration()
            .ok_or_else(|| DomainError::configuration(format!("`{name}` is not an enum.")))?;

        let raw = match value {
            Value::Present(raw) if !raw.is_null() => raw,
            _ => return Ok(Value::none()),
        };
        if is_instance_of(&definition, &raw) {
            return Ok(Value::some(raw));
        }

        let json = raw.to_json()?;
        match cases.lookup(&json) {
            Some(case) => Ok(Value::some(Payload::Object(case))),
            None => Err(DomainError::validation(format!(
                "Invalid value {json} for enum `{name}` on parameter `{}`.",
                parameter.name
            ))),
        }
    }
}

/// Builds the target from a mapping, or from a scalar as its first argument
#[derive(Debug, Clone, Default)]
pub struct CreateObjectTransform {
    class: Option<String>,
}

impl CreateObjectTransform {
    /// Transformer for `{"class": name?}`
    pub fn from_params(params: &Map<String, Json>) -> DomainResult<Self> {
        Ok(Self {
            class: string_param(params, "class")?,
        })
    }
}

#[async_trait]
impl ValueTransformer for CreateObjectTransform {
    async fn transform(
        &self,
        factory: &DataFactory,
        parameter: &ParameterDescriptor,
        value: Value<Payload>,
    ) -> DomainResult<Value<Payload>> {
        let name = target_name(self.class.as_deref(), parameter)?;
        let definition = target(factory, &name)?;

        let raw = match value {
            Value::Present(raw) => raw,
            Value::Absent => return Ok(Value::none()),
        };
        if is_instance_of(&definition, &raw) {
            return Ok(Value::some(raw));
        }

        let built = match raw {
            Payload::Json(Json::Object(map)) => factory.make_dynamic(&name, &Source::Map(&map)).await?,
            Payload::Map(entries) => factory.make_dynamic(&name, &Source::Collection(&entries)).await?,
            scalar => {
                let constructor = definition.constructor().ok_or_else(|| {
                    DomainError::configuration(format!("`{name}` cannot be constructed."))
                })?;
                let params = factory.reader().constructor_params(&name, false)?;
                let first = params.first().ok_or_else(|| {
                    DomainError::configuration(format!("`{name}` takes no constructor arguments."))
                })?;
                let mut args = IndexMap::new();
                args.insert(first.name.clone(), scalar);
                constructor(args)?
            }
        };
        Ok(Value::some(Payload::Object(built)))
    }
}

/// Builds a data type through its `from` factory
#[derive(Debug, Clone, Default)]
pub struct DataTransform {
    class: Option<String>,
}

impl DataTransform {
    /// Transformer for `{"class": name?}`
    pub fn from_params(params: &Map<String, Json>) -> DomainResult<Self> {
        Ok(Self {
            class: string_param(params, "class")?,
        })
    }
}

#[async_trait]
impl ValueTransformer for DataTransform {
    async fn transform(
        &self,
        factory: &DataFactory,
        parameter: &ParameterDescriptor,
        value: Value<Payload>,
    ) -> DomainResult<Value<Payload>> {
        let name = target_name(self.class.as_deref(), parameter)?;
        let definition = target(factory, &name)?;
        if definition.kind() != TypeKind::Data {
            return Err(DomainError::configuration(format!(
                "Provided class `{name}` must be a data type."
            )));
        }

        let raw = match value {
            Value::Present(raw) => raw,
            Value::Absent => return Ok(Value::none()),
        };
        if is_instance_of(&definition, &raw) {
            return Ok(Value::some(raw));
        }
        call_static(factory, &definition, FROM, raw, &[]).await
    }
}

/// Resolves the target through a named container maker
#[derive(Debug, Clone, Default)]
pub struct ContainerTransform {
    class: Option<String>,
    params: Map<String, Json>,
}

impl ContainerTransform {
    /// Transformer for `{"class": name?, "params": {..}}`
    pub fn from_params(params: &Map<String, Json>) -> DomainResult<Self> {
        Ok(Self {
            class: string_param(params, "class")?,
            params: map_param(params, "params")?,
        })
    }
}

#[async_trait]
impl ValueTransformer for ContainerTransform {
    async fn transform(
        &self,
        factory: &DataFactory,
        parameter: &ParameterDescriptor,
        value: Value<Payload>,
    ) -> DomainResult<Value<Payload>> {
        let name = target_name(self.class.as_deref(), parameter)?;
        if !factory.container().has_maker(&name).await {
            return Err(DomainError::configuration(format!(
                "Provided class/interface `{name}` does not exist."
            )));
        }

        let raw = match value {
            Value::Present(raw) => raw,
            Value::Absent => return Ok(Value::none()),
        };

        let params = if raw.is_mapping() {
            let mut merged = self.params.clone();
            if let Json::Object(given) = raw.to_json()? {
                merged.extend(given);
            }
            merged
        } else {
            self.params.clone()
        };
        let built = factory.container().make(&name, &params).await?;
        Ok(Value::some(Payload::Object(built)))
    }
}

/// Looks an entity up by the value as its identifier; misses are absent
#[derive(Debug, Clone, Default)]
pub struct ModelTransform {
    class: Option<String>,
}

impl ModelTransform {
    /// Transformer for `{"class": name?}`
    pub fn from_params(params: &Map<String, Json>) -> DomainResult<Self> {
        Ok(Self {
            class: string_param(params, "class")?,
        })
    }
}

#[async_trait]
impl ValueTransformer for ModelTransform {
    async fn transform(
        &self,
        factory: &DataFactory,
        parameter: &ParameterDescriptor,
        value: Value<Payload>,
    ) -> DomainResult<Value<Payload>> {
        let name = target_name(self.class.as_deref(), parameter)?;
        let definition = target(factory, &name)?;
        let repository = definition.repository().cloned().ok_or_else(|| {
            DomainError::configuration(format!("Provided class `{name}` is not an entity."))
        })?;

        let raw = match value {
            Value::Present(raw) => raw,
            Value::Absent => return Ok(Value::none()),
        };
        if is_instance_of(&definition, &raw) {
            return Ok(Value::some(raw));
        }

        let id = raw.to_json()?;
        if id.is_null() {
            return Ok(Value::none());
        }
        let found = repository.find(&id).await?;
        Ok(Value::from(found.map(Payload::Object)))
    }
}

/// Applies an item transformer to every element of a collection
#[derive(Debug, Clone, Default)]
pub struct CollectionTransform {
    item: Option<String>,
    item_params: Map<String, Json>,
    item_type: Option<String>,
}

impl CollectionTransform {
    /// Transformer for `{"item": name?, "item_params": {..}, "item_type": expr?}`
    pub fn from_params(params: &Map<String, Json>) -> DomainResult<Self> {
        Ok(Self {
            item: string_param(params, "item")?,
            item_params: map_param(params, "item_params")?,
            item_type: string_param(params, "item_type")?,
        })
    }

    fn item_parameter(&self, factory: &DataFactory, item: &str) -> DomainResult<ParameterDescriptor> {
        let ty = match &self.item_type {
            Some(expr) => factory.reader().describe_type(Some(expr))?,
            None => TypeDescriptor::unclassified("item"),
        };
        Ok(ParameterDescriptor {
            name: "item".to_string(),
            ty,
            has_default: false,
            default_value: None,
            annotations: vec![AnnotationDescriptor {
                kind: AnnotationKind::ValueTransformer,
                resolver_type: item.to_string(),
                resolver_params: self.item_params.clone(),
            }],
        })
    }
}

enum Items {
    List(Vec<Payload>),
    Keyed(IndexMap<String, Payload>),
}

impl Items {
    fn from_payload(raw: Payload) -> Self {
        match raw {
            Payload::List(items) => Items::List(items),
            Payload::Json(Json::Array(items)) => Items::List(items.into_iter().map(Payload::Json).collect()),
            Payload::Map(entries) => Items::Keyed(entries),
            Payload::Json(Json::Object(map)) => {
                Items::Keyed(map.into_iter().map(|(k, v)| (k, Payload::Json(v))).collect())
            }
            Payload::Json(Json::Null) => Items::List(Vec::new()),
            other => Items::List(vec![other]),
        }
    }
}

#[async_trait]
impl ValueTransformer for CollectionTransform {
    async fn transform(
        &self,
        factory: &DataFactory,
        _parameter: &ParameterDescriptor,
        value: Value<Payload>,
    ) -> DomainResult<Value<Payload>> {
        let raw = match value {
            Value::Present(raw) => raw,
            Value::Absent => return Ok(Value::none()),
        };
        let items = Items::from_payload(raw);

        let Some(item) = self.item.as_deref() else {
            return Ok(Value::some(match items {
                Items::List(items) => Payload::List(items),
                Items::Keyed(entries) => Payload::Map(entries),
            }));
        };

        let item_parameter = self.item_parameter(factory, item)?;
        let transformed = match items {
            Items::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(transform_item(factory, &item_parameter, item).await?);
                }
                Payload::List(out)
            }
            Items::Keyed(entries) => {
                let mut out = IndexMap::with_capacity(entries.len());
                for (key, item) in entries {
                    out.insert(key, transform_item(factory, &item_parameter, item).await?);
                }
                Payload::Map(out)
            }
        };
        Ok(Value::some(transformed))
    }
}

async fn transform_item(
    factory: &DataFactory,
    parameter: &ParameterDescriptor,
    item: Payload,
) -> DomainResult<Payload> {
    let value = factory.transform_value(parameter, Value::some(item)).await?;
    Ok(value.into_option().unwrap_or_else(Payload::null))
}

/// Calls a static factory on the target with the value and extra arguments
#[derive(Debug, Clone)]
pub struct StaticCallTransform {
    class: Option<String>,
    method: String,
    extra_args: Vec<Json>,
}

impl Default for StaticCallTransform {
    fn default() -> Self {
        Self {
            class: None,
            method: FROM.to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl StaticCallTransform {
    /// Transformer for `{"class": name?, "method": "from", "extra_args": [..]}`
    pub fn from_params(params: &Map<String, Json>) -> DomainResult<Self> {
        let extra_args = match params.get("extra_args") {
            None | Some(Json::Null) => Vec::new(),
            Some(Json::Array(items)) => items.clone(),
            Some(other) => {
                return Err(DomainError::configuration(format!(
                    "Resolver param `extra_args` must be a list, got {other}"
                )))
            }
        };
        Ok(Self {
            class: string_param(params, "class")?,
            method: string_param(params, "method")?.unwrap_or_else(|| FROM.to_string()),
            extra_args,
        })
    }
}

#[async_trait]
impl ValueTransformer for StaticCallTransform {
    async fn transform(
        &self,
        factory: &DataFactory,
        parameter: &ParameterDescriptor,
        value: Value<Payload>,
    ) -> DomainResult<Value<Payload>> {
        let name = target_name(self.class.as_deref(), parameter)?;
        let definition = target(factory, &name)?;

        let raw = match value {
            Value::Present(raw) => raw,
            Value::Absent => return Ok(Value::none()),
        };
        if is_instance_of(&definition, &raw) {
            return Ok(Value::some(raw));
        }
        call_static(factory, &definition, &self.method, raw, &self.extra_args).await
    }
}

pub(super) fn register_builtins(registry: &ResolverRegistry) {
    registry.register_transformer("enum", |params| {
        Ok(Arc::new(EnumTransform::from_params(params)?) as Arc<dyn ValueTransformer>)
    });
    registry.register_transformer("create_object", |params| {
        Ok(Arc::new(CreateObjectTransform::from_params(params)?) as Arc<dyn ValueTransformer>)
    });
    registry.register_transformer("data", |params| {
        Ok(Arc::new(DataTransform::from_params(params)?) as Arc<dyn ValueTransformer>)
    });
    registry.register_transformer("container", |params| {
        Ok(Arc::new(ContainerTransform::from_params(params)?) as Arc<dyn ValueTransformer>)
    });
    registry.register_transformer("model", |params| {
        Ok(Arc::new(ModelTransform::from_params(params)?) as Arc<dyn ValueTransformer>)
    });
    registry.register_transformer("collection", |params| {
        Ok(Arc::new(CollectionTransform::from_params(params)?) as Arc<dyn ValueTransformer>)
    });
    registry.register_transformer("static_call", |params| {
        Ok(Arc::new(StaticCallTransform::from_params(params)?) as Arc<dyn ValueTransformer>)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_static_call_params() {
        let defaults = StaticCallTransform::from_params(&Map::new()).unwrap();
        assert_eq!(defaults.method, "from");
        assert!(defaults.extra_args.is_empty());

        let configured = StaticCallTransform::from_params(
            json!({"class": "Money", "method": "parse", "extra_args": ["EUR"]})
                .as_object()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(configured.class.as_deref(), Some("Money"));
        assert_eq!(configured.extra_args, vec![json!("EUR")]);

        let bad = StaticCallTransform::from_params(json!({"extra_args": "EUR"}).as_object().unwrap());
        assert!(bad.unwrap_err().is_configuration_error());
    }

    #[test]
    fn test_items_shape() {
        assert!(matches!(Items::from_payload(Payload::Json(json!([1, 2]))), Items::List(items) if items.len() == 2));
        assert!(matches!(Items::from_payload(Payload::Json(json!({"a": 1}))), Items::Keyed(entries) if entries.len() == 1));
        assert!(matches!(Items::from_payload(Payload::null()), Items::List(items) if items.is_empty()));
        assert!(matches!(Items::from_payload(Payload::Json(json!(5))), Items::List(items) if items.len() == 1));
    }

    #[test]
    fn test_container_params_must_be_a_map() {
        let err = ContainerTransform::from_params(json!({"params": [1]}).as_object().unwrap()).unwrap_err();
        assert!(err.is_configuration_error());
    }
}
