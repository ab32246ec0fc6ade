// Copyright 2025 Cowboy AI, LLC.

//! Structural inverse of the factory: built values back to plain JSON

use std::sync::Arc;

use serde_json::{Map, Value as Json};

use super::Data;
use crate::errors::DomainResult;
use crate::payload::{Instance, Payload};
use crate::reflection::{ReflectionReader, TypeDefinition, CONSTRUCTOR};

/// Reads declared constructor parameters back off built values
#[derive(Debug, Clone)]
pub struct DataSerializer {
    reader: Arc<ReflectionReader>,
}

impl DataSerializer {
    /// Serializer over `reader`
    pub fn new(reader: Arc<ReflectionReader>) -> Self {
        Self { reader }
    }

    /// Declared parameters of `T` read off `value`
    pub fn to_array<T: Data>(&self, value: &T) -> DomainResult<Map<String, Json>> {
        self.reader.registry().ensure_data::<T>();
        let json = serde_json::to_value(value)?;
        self.select(T::NAME, json)
    }

    /// Declared parameters of a built instance, or its whole serialized form
    /// when its type is not registered
    pub fn to_array_instance(&self, object: &Instance) -> DomainResult<Map<String, Json>> {
        let json = object.to_json()?;
        match self.constructible(object) {
            Some(definition) => self.select(definition.name(), json),
            None => Ok(match json {
                Json::Object(map) => map,
                _ => Map::new(),
            }),
        }
    }

    /// Plain JSON form of any payload, recursing through lists and maps
    pub fn normalize(&self, payload: &Payload) -> DomainResult<Json> {
        match payload {
            Payload::Json(json) => Ok(json.clone()),
            Payload::Object(object) if self.constructible(object).is_some() => {
                Ok(Json::Object(self.to_array_instance(object)?))
            }
            Payload::Object(object) => object.to_json(),
            Payload::List(items) => Ok(Json::Array(
                items
                    .iter()
                    .map(|item| self.normalize(item))
                    .collect::<DomainResult<Vec<_>>>()?,
            )),
            Payload::Map(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, item) in entries {
                    map.insert(key.clone(), self.normalize(item)?);
                }
                Ok(Json::Object(map))
            }
        }
    }

    fn constructible(&self, object: &Instance) -> Option<Arc<TypeDefinition>> {
        self.reader
            .registry()
            .by_type_id(object.as_any().type_id())
            .filter(|definition| definition.method(CONSTRUCTOR).is_some())
    }

    fn select(&self, type_name: &str, json: Json) -> DomainResult<Map<String, Json>> {
        let params = self.reader.constructor_params(type_name, false)?;
        let mut fields = match json {
            Json::Object(map) => map,
            _ => Map::new(),
        };
        let mut out = Map::with_capacity(params.len());
        for parameter in params.iter() {
            if let Some(value) = fields.remove(&parameter.name) {
                out.insert(parameter.name.clone(), value);
            }
        }
        Ok(out)
    }
}
