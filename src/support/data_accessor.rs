// Copyright 2025 Cowboy AI, LLC.

//! Uniform key lookup over the data sources a DTO can be built from
//!
//! Every source kind answers "is this key present" with its own rule, so
//! that a present null is never confused with a missing key.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::errors::{DomainError, DomainResult};
use crate::payload::{Instance, Payload};
use crate::support::dot;
use crate::value::Value;

/// An entity-like record with attributes, computed accessors and relations
pub trait Record: Send + Sync {
    /// Stored attribute, if set (a stored null is `Some(Json::Null)`)
    fn attribute(&self, key: &str) -> Option<Json>;

    /// Whether a computed accessor exists for `key`
    fn has_accessor(&self, _key: &str) -> bool {
        false
    }

    /// Value of the computed accessor for `key`
    fn accessor(&self, _key: &str) -> Option<Payload> {
        None
    }

    /// Whether `key` names a relation
    fn is_relation(&self, _key: &str) -> bool {
        false
    }

    /// Loaded relation value for `key`
    fn relation(&self, _key: &str) -> Option<Payload> {
        None
    }

    /// All stored attributes
    fn attributes(&self) -> Map<String, Json>;
}

/// Request-like input split into query string and body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestInput {
    /// Query string parameters
    pub query: Map<String, Json>,
    /// Parsed body
    pub body: Map<String, Json>,
}

impl RequestInput {
    /// Build from a body only
    pub fn from_body(body: Map<String, Json>) -> Self {
        Self {
            query: Map::new(),
            body,
        }
    }

    /// Add query parameters
    pub fn with_query(mut self, query: Map<String, Json>) -> Self {
        self.query = query;
        self
    }

    /// Body first, then query
    pub fn input(&self, key: &str) -> Option<&Json> {
        dot::get_in(&self.body, key).or_else(|| dot::get_in(&self.query, key))
    }

    /// Whether `key` is present in body or query
    pub fn has(&self, key: &str) -> bool {
        self.input(key).is_some()
    }

    /// Merged view, body overriding query
    pub fn all(&self) -> Map<String, Json> {
        let mut merged = self.query.clone();
        for (key, value) in &self.body {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

/// A borrowed data source
#[derive(Clone, Copy)]
pub enum Source<'a> {
    /// Associative mapping
    Map(&'a Map<String, Json>),
    /// Any JSON value; only objects and arrays answer lookups
    Json(&'a Json),
    /// Record with attribute-style access
    Record(&'a dyn Record),
    /// Request-like input
    Request(&'a RequestInput),
    /// Ordered keyed collection
    Collection(&'a IndexMap<String, Payload>),
    /// Plain built object, read through its serialized properties
    Object(&'a Instance),
}

impl<'a> From<&'a Map<String, Json>> for Source<'a> {
    fn from(map: &'a Map<String, Json>) -> Self {
        Source::Map(map)
    }
}

impl<'a> From<&'a Json> for Source<'a> {
    fn from(json: &'a Json) -> Self {
        Source::Json(json)
    }
}

impl<'a> From<&'a RequestInput> for Source<'a> {
    fn from(request: &'a RequestInput) -> Self {
        Source::Request(request)
    }
}

impl<'a> From<&'a IndexMap<String, Payload>> for Source<'a> {
    fn from(collection: &'a IndexMap<String, Payload>) -> Self {
        Source::Collection(collection)
    }
}

impl std::fmt::Debug for Source<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Source::Map(_) => "Map",
            Source::Json(_) => "Json",
            Source::Record(_) => "Record",
            Source::Request(_) => "Request",
            Source::Collection(_) => "Collection",
            Source::Object(_) => "Object",
        };
        f.debug_tuple("Source").field(&kind).finish()
    }
}

/// Reads and writes keys on supported sources
#[derive(Debug, Clone, Copy, Default)]
pub struct DataAccessor;

impl DataAccessor {
    /// Look up `key`; absent when the source does not contain it
    pub fn get(&self, source: &Source<'_>, key: &str) -> DomainResult<Value<Payload>> {
        let found = match source {
            Source::Map(map) => dot::get_in(map, key).cloned().map(Payload::Json),
            Source::Json(json) => dot::get(json, key).cloned().map(Payload::Json),
            Source::Request(request) => request.input(key).cloned().map(Payload::Json),
            Source::Collection(collection) => collection.get(key).cloned(),
            Source::Record(record) => Self::from_record(*record, key),
            Source::Object(object) => {
                let json = object.to_json()?;
                match json {
                    Json::Object(map) => map.get(key).cloned().map(Payload::Json),
                    _ => None,
                }
            }
        };
        Ok(Value::from(found))
    }

    fn from_record(record: &dyn Record, key: &str) -> Option<Payload> {
        if let Some(value) = record.attribute(key) {
            return Some(Payload::Json(value));
        }
        if record.has_accessor(key) {
            return Some(record.accessor(key).unwrap_or_else(Payload::null));
        }
        if record.is_relation(key) {
            return Some(record.relation(key).unwrap_or_else(Payload::null));
        }
        None
    }

    /// Whether `key` is present
    pub fn has(&self, source: &Source<'_>, key: &str) -> DomainResult<bool> {
        Ok(self.get(source, key)?.exists())
    }

    /// Plain JSON view of the whole source
    pub fn all(&self, source: &Source<'_>) -> DomainResult<Map<String, Json>> {
        let json = match source {
            Source::Map(map) => return Ok((*map).clone()),
            Source::Json(json) => (*json).clone(),
            Source::Request(request) => return Ok(request.all()),
            Source::Record(record) => return Ok(record.attributes()),
            Source::Collection(collection) => Payload::Map((*collection).clone()).to_json()?,
            Source::Object(object) => object.to_json()?,
        };
        match json {
            Json::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    /// Write `value` at `key` on an owned JSON target
    pub fn set(&self, target: &mut Json, key: &str, value: Json) -> DomainResult<()> {
        if target.is_object() || target.is_null() {
            dot::set(target, key, value);
            return Ok(());
        }
        match target {
            Json::Array(items) => {
                let index = key.parse::<usize>().map_err(|_| {
                    DomainError::InvalidOperation {
                        reason: format!("Unsupported key for list target: {key}"),
                    }
                })?;
                let len = items.len();
                match items.get_mut(index) {
                    Some(slot) => *slot = value,
                    None if index == len => items.push(value),
                    None => {
                        return Err(DomainError::InvalidOperation {
                            reason: format!("Index {index} is out of bounds"),
                        })
                    }
                }
                Ok(())
            }
            other => Err(DomainError::InvalidOperation {
                reason: format!("Unsupported data type for setting value: {}", kind_of(other)),
            }),
        }
    }
}

fn kind_of(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
