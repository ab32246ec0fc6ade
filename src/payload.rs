// Copyright 2025 Cowboy AI, LLC.

//! Dynamic values flowing through the mapping chain and the pipeline

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as Json;

use crate::errors::DomainResult;
use crate::value::Truthy;

/// A built, type-erased instance (DTO, enum case, entity, container service)
pub trait Object: Any + Debug + Send + Sync {
    /// Access for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Rust type name of the instance
    fn type_name(&self) -> &'static str;

    /// Serialized form of the instance
    fn to_json(&self) -> DomainResult<Json>;
}

impl<T> Object for T
where
    T: Serialize + Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn to_json(&self) -> DomainResult<Json> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Shared handle to a built instance
pub type Instance = Arc<dyn Object>;

/// Wrap any serializable value as an [`Instance`]
pub fn instance<T>(value: T) -> Instance
where
    T: Serialize + Debug + Send + Sync + 'static,
{
    Arc::new(value)
}

/// A raw JSON value or something already built from one
#[derive(Debug, Clone)]
pub enum Payload {
    /// Raw data
    Json(Json),
    /// A built instance
    Object(Instance),
    /// An ordered list of payloads
    List(Vec<Payload>),
    /// A keyed collection of payloads
    Map(IndexMap<String, Payload>),
}

impl Payload {
    /// The JSON null payload
    pub fn null() -> Self {
        Payload::Json(Json::Null)
    }

    /// True for a JSON null
    pub fn is_null(&self) -> bool {
        matches!(self, Payload::Json(Json::Null))
    }

    /// Borrow raw JSON, if that is what this payload holds
    pub fn as_json(&self) -> Option<&Json> {
        match self {
            Payload::Json(json) => Some(json),
            _ => None,
        }
    }

    /// True if this payload holds a JSON object or a keyed collection
    pub fn is_mapping(&self) -> bool {
        matches!(self, Payload::Json(Json::Object(_)) | Payload::Map(_))
    }

    /// True if this payload holds an instance of `T`
    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Borrow the held instance as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Payload::Object(object) => object.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Recursively serialize into plain JSON
    pub fn to_json(&self) -> DomainResult<Json> {
        match self {
            Payload::Json(json) => Ok(json.clone()),
            Payload::Object(object) => object.to_json(),
            Payload::List(items) => Ok(Json::Array(
                items
                    .iter()
                    .map(Payload::to_json)
                    .collect::<DomainResult<Vec<_>>>()?,
            )),
            Payload::Map(entries) => {
                let mut map = serde_json::Map::with_capacity(entries.len());
                for (key, value) in entries {
                    map.insert(key.clone(), value.to_json()?);
                }
                Ok(Json::Object(map))
            }
        }
    }

    /// Split a JSON array or list payload into items; `None` for non-collections
    pub fn into_items(self) -> Option<Vec<Payload>> {
        match self {
            Payload::Json(Json::Array(items)) => Some(items.into_iter().map(Payload::Json).collect()),
            Payload::List(items) => Some(items),
            Payload::Map(entries) => Some(entries.into_values().collect()),
            Payload::Json(Json::Object(map)) => {
                Some(map.into_iter().map(|(_, v)| Payload::Json(v)).collect())
            }
            _ => None,
        }
    }
}

impl From<Json> for Payload {
    fn from(json: Json) -> Self {
        Payload::Json(json)
    }
}

impl From<Instance> for Payload {
    fn from(object: Instance) -> Self {
        Payload::Object(object)
    }
}

impl Truthy for Payload {
    fn is_truthy(&self) -> bool {
        match self {
            Payload::Json(json) => json.is_truthy(),
            Payload::Object(_) => true,
            Payload::List(items) => !items.is_empty(),
            Payload::Map(entries) => !entries.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_object_payload_downcasts() {
        let payload = Payload::Object(instance(Point { x: 1, y: 2 }));

        assert!(payload.is::<Point>());
        assert!(!payload.is::<String>());
        assert_eq!(payload.downcast_ref::<Point>(), Some(&Point { x: 1, y: 2 }));
    }

    #[test]
    fn test_nested_payload_serializes() {
        let mut entries = IndexMap::new();
        entries.insert("origin".to_string(), Payload::Object(instance(Point { x: 0, y: 0 })));
        entries.insert(
            "tags".to_string(),
            Payload::List(vec![Payload::Json(json!("a")), Payload::Json(json!("b"))]),
        );

        let json = Payload::Map(entries).to_json().unwrap();
        assert_eq!(json, json!({"origin": {"x": 0, "y": 0}, "tags": ["a", "b"]}));
    }

    #[test]
    fn test_into_items() {
        let items = Payload::Json(json!([1, 2])).into_items().unwrap();
        assert_eq!(items.len(), 2);
        assert!(Payload::Json(json!(5)).into_items().is_none());
    }
}
