// Copyright 2025 Cowboy AI, LLC.

//! JSON encoding behind swappable drivers
//!
//! The manager holds named drivers and a default; every call goes through
//! the [`JsonDriver`] contract, never through reflective forwarding.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as Json;

use crate::errors::{DomainError, DomainResult};
use crate::hashing::FastHasher;

/// Name of the compact driver
pub const DEFAULT_DRIVER: &str = "default";
/// Name of the pretty-printing driver
pub const PRETTY_DRIVER: &str = "pretty";

/// Encoding contract every driver implements
pub trait JsonDriver: Send + Sync {
    /// Encode, failing on error
    fn encode(&self, value: &Json) -> DomainResult<String>;

    /// Decode, failing on error
    fn decode(&self, input: &str) -> DomainResult<Json>;

    /// Encode, `None` on error
    fn try_encode(&self, value: &Json) -> Option<String> {
        self.encode(value).ok()
    }

    /// Decode, `default` on error
    fn try_decode(&self, input: &str, default: Json) -> Json {
        self.decode(input).unwrap_or(default)
    }

    /// Whether `input` is well-formed JSON
    fn validate(&self, input: &str) -> bool {
        self.decode(input).is_ok()
    }
}

/// Compact output, unicode and slashes unescaped
#[derive(Debug, Clone, Copy, Default)]
pub struct CompactJsonDriver;

impl JsonDriver for CompactJsonDriver {
    fn encode(&self, value: &Json) -> DomainResult<String> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode(&self, input: &str) -> DomainResult<Json> {
        Ok(serde_json::from_str(input)?)
    }
}

/// Indented output
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyJsonDriver;

impl JsonDriver for PrettyJsonDriver {
    fn encode(&self, value: &Json) -> DomainResult<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }

    fn decode(&self, input: &str) -> DomainResult<Json> {
        Ok(serde_json::from_str(input)?)
    }
}

/// Registry of named drivers with a default
#[derive(Clone)]
pub struct JsonManager {
    drivers: HashMap<String, Arc<dyn JsonDriver>>,
    default: String,
    hasher: FastHasher,
}

impl std::fmt::Debug for JsonManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.drivers.keys().collect();
        names.sort();
        f.debug_struct("JsonManager")
            .field("drivers", &names)
            .field("default", &self.default)
            .finish()
    }
}

impl JsonManager {
    /// Manager with the built-in drivers and `default` selected
    pub fn new(default: impl Into<String>, hasher: FastHasher) -> Self {
        let mut drivers: HashMap<String, Arc<dyn JsonDriver>> = HashMap::new();
        drivers.insert(DEFAULT_DRIVER.to_string(), Arc::new(CompactJsonDriver));
        drivers.insert(PRETTY_DRIVER.to_string(), Arc::new(PrettyJsonDriver));
        Self {
            drivers,
            default: default.into(),
            hasher,
        }
    }

    /// Register or replace a named driver
    pub fn extend(&mut self, name: impl Into<String>, driver: Arc<dyn JsonDriver>) {
        self.drivers.insert(name.into(), driver);
    }

    /// Driver by name, or the default
    pub fn driver(&self, name: Option<&str>) -> DomainResult<Arc<dyn JsonDriver>> {
        let name = name.unwrap_or(self.default.as_str());
        self.drivers.get(name).cloned().ok_or_else(|| {
            DomainError::configuration(format!("JSON driver [{name}] is not configured."))
        })
    }

    /// Encode with the default driver
    pub fn encode(&self, value: &Json) -> DomainResult<String> {
        self.driver(None)?.encode(value)
    }

    /// Serialize then encode with the default driver
    pub fn encode_value<T: Serialize>(&self, value: &T) -> DomainResult<String> {
        self.encode(&serde_json::to_value(value)?)
    }

    /// Decode with the default driver
    pub fn decode(&self, input: &str) -> DomainResult<Json> {
        self.driver(None)?.decode(input)
    }

    /// Encode, `None` on error
    pub fn try_encode(&self, value: &Json) -> Option<String> {
        self.driver(None).ok()?.try_encode(value)
    }

    /// Decode, `default` on error
    pub fn try_decode(&self, input: &str, default: Json) -> Json {
        match self.driver(None) {
            Ok(driver) => driver.try_decode(input, default),
            Err(_) => default,
        }
    }

    /// Whether `input` is well-formed JSON
    pub fn validate(&self, input: &str) -> bool {
        self.driver(None)
            .map(|driver| driver.validate(input))
            .unwrap_or(false)
    }

    /// Fast hash of the encoded value
    pub fn hash(&self, value: &Json) -> DomainResult<String> {
        Ok(self.hasher.make(self.encode(value)?))
    }
}

impl Default for JsonManager {
    fn default() -> Self {
        Self::new(DEFAULT_DRIVER, FastHasher::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_driver_is_compact() {
        let manager = JsonManager::default();
        assert_eq!(manager.encode(&json!({"a": [1, 2]})).unwrap(), r#"{"a":[1,2]}"#);
        assert_eq!(manager.decode("[true]").unwrap(), json!([true]));
    }

    #[test]
    fn test_named_driver_and_unknown_driver() {
        let manager = JsonManager::new(PRETTY_DRIVER, FastHasher::default());
        assert!(manager.encode(&json!({"a": 1})).unwrap().contains('\n'));
        assert!(manager
            .driver(Some("yaml"))
            .err()
            .unwrap()
            .is_configuration_error());
    }

    #[test]
    fn test_try_variants_and_validate() {
        let manager = JsonManager::default();
        assert_eq!(manager.try_decode("{oops", json!("fallback")), json!("fallback"));
        assert!(manager.validate(r#"{"ok":true}"#));
        assert!(!manager.validate("{oops"));
        assert!(manager.try_encode(&json!(1)).is_some());
    }

    #[test]
    fn test_hash_is_stable_for_equal_values() {
        let manager = JsonManager::default();
        let a = manager.hash(&json!({"keys": ["a", "b"]})).unwrap();
        let b = manager.hash(&json!({"keys": ["a", "b"]})).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, manager.hash(&json!({"keys": ["b"]})).unwrap());
    }
}
