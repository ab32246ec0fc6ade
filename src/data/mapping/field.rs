// Copyright 2025 Cowboy AI, LLC.

//! Built-in field mappers

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value as Json};

use super::{FieldMapper, ResolverRegistry};
use crate::data::factory::DataFactory;
use crate::errors::{DomainError, DomainResult};
use crate::payload::Payload;
use crate::reflection::ParameterDescriptor;
use crate::support::strings::snake_case;
use crate::support::Source;
use crate::value::Value;

/// Reads a camelCase parameter from its snake_case source key
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeToCamel;

#[async_trait]
impl FieldMapper for SnakeToCamel {
    async fn resolve(
        &self,
        factory: &DataFactory,
        parameter: &ParameterDescriptor,
        source: &Source<'_>,
    ) -> DomainResult<Value<Payload>> {
        let snake = snake_case(&parameter.name);
        if snake == parameter.name {
            return Ok(Value::none());
        }
        factory.accessor().get(source, &snake)
    }
}

/// Tries alternative source keys in order; the first present one wins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    keys: Vec<String>,
}

impl Alias {
    /// Mapper over `keys`
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from `{"keys": [..]}` or `{"keys": "single"}`
    pub fn from_params(params: &Map<String, Json>) -> DomainResult<Self> {
        let keys = match params.get("keys") {
            Some(Json::String(key)) => vec![key.clone()],
            Some(Json::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        DomainError::configuration(format!("Alias key must be a string, got {item}"))
                    })
                })
                .collect::<DomainResult<Vec<_>>>()?,
            _ => Vec::new(),
        };
        if keys.is_empty() {
            return Err(DomainError::configuration("Alias mapper requires `keys`."));
        }
        Ok(Self { keys })
    }
}

#[async_trait]
impl FieldMapper for Alias {
    async fn resolve(
        &self,
        factory: &DataFactory,
        _parameter: &ParameterDescriptor,
        source: &Source<'_>,
    ) -> DomainResult<Value<Payload>> {
        for key in &self.keys {
            let value = factory.accessor().get(source, key)?;
            if value.exists() {
                return Ok(value);
            }
        }
        Ok(Value::none())
    }
}

pub(super) fn register_builtins(registry: &ResolverRegistry) {
    registry.register_mapper("snake_to_camel", |_| Ok(Arc::new(SnakeToCamel) as Arc<dyn FieldMapper>));
    registry.register_mapper("alias", |params| {
        Ok(Arc::new(Alias::from_params(params)?) as Arc<dyn FieldMapper>)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alias_params() {
        let single = Alias::from_params(json!({"keys": "mail"}).as_object().unwrap()).unwrap();
        assert_eq!(single, Alias::new(["mail"]));

        let many = Alias::from_params(json!({"keys": ["mail", "email"]}).as_object().unwrap()).unwrap();
        assert_eq!(many, Alias::new(["mail", "email"]));

        assert!(Alias::from_params(json!({"keys": [1]}).as_object().unwrap()).is_err());
        assert!(Alias::from_params(&Map::new()).is_err());
    }
}
