// Copyright 2025 Cowboy AI, LLC.

//! Crate configuration
//!
//! Every section has defaults, so an empty JSON object is a valid file.
//! Environment overrides are applied on request and win over file values.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::cache::DEFAULT_DELIMITER;
use crate::debug::{DebugMode, TRACING_DRIVER};
use crate::errors::{DomainError, DomainResult};
use crate::hashing::HashAlgo;
use crate::json::DEFAULT_DRIVER;
use crate::reflection::DEFAULT_CACHE_CAPACITY;

/// Global middleware per operation kind, by registered name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CqrsConfig {
    /// Applied to every query, outermost first
    pub query_middleware: Vec<String>,
    /// Applied to every command, outermost first
    pub command_middleware: Vec<String>,
    /// Applied to every action, outermost first
    pub action_middleware: Vec<String>,
}

/// Cache defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for cached query results without their own
    pub default_ttl_secs: u64,
    /// Separator between cache-key parts
    pub delimiter: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 3600,
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }
}

/// Reflection cache sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ReflectionConfig {
    /// Derived descriptor lists kept in the LRU cache
    pub cache_capacity: usize,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// JSON encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct JsonConfig {
    /// Driver used when none is named
    pub default_driver: String,
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self {
            default_driver: DEFAULT_DRIVER.to_string(),
        }
    }
}

/// Fast hashing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HashConfig {
    /// `xxh3` or `xxh3_128`
    pub algo: String,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            algo: HashAlgo::Xxh3.as_str().to_string(),
        }
    }
}

/// Debug dumps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DebugConfig {
    /// Flag consulted in `auto` mode
    pub enabled: bool,
    /// Gating mode
    pub mode: DebugMode,
    /// Driver used when none is named
    pub default_driver: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: DebugMode::Auto,
            default_driver: TRACING_DRIVER.to_string(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PragmaticConfig {
    /// Global middleware
    pub cqrs: CqrsConfig,
    /// Cache defaults
    pub cache: CacheConfig,
    /// Reflection cache
    pub reflection: ReflectionConfig,
    /// JSON encoding
    pub json: JsonConfig,
    /// Fast hashing
    pub hash: HashConfig,
    /// Debug dumps
    pub debug: DebugConfig,
}

impl PragmaticConfig {
    /// Parse a JSON document
    pub fn from_json_str(input: &str) -> DomainResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| DomainError::configuration(format!("Invalid configuration: {e}")))
    }

    /// Read and parse a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> DomainResult<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|e| {
            DomainError::configuration(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&input)
    }

    /// Apply `JSON_DRIVER`, `HASH_FAST_ALGO`, `CACHE_KEY_DELIMITER`,
    /// `DEBUG_ENABLED` and `DEBUG_DRIVER` from the process environment
    pub fn with_env_overrides(self) -> DomainResult<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name
    pub fn with_overrides<F>(mut self, lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(driver) = lookup("JSON_DRIVER") {
            self.json.default_driver = driver;
        }
        if let Some(algo) = lookup("HASH_FAST_ALGO") {
            self.hash.algo = HashAlgo::parse(&algo)?.as_str().to_string();
        }
        if let Some(delimiter) = lookup("CACHE_KEY_DELIMITER") {
            self.cache.delimiter = delimiter;
        }
        if let Some(enabled) = lookup("DEBUG_ENABLED") {
            self.debug.enabled = parse_flag(&enabled)?;
        }
        if let Some(driver) = lookup("DEBUG_DRIVER") {
            self.debug.default_driver = driver;
        }
        Ok(self)
    }

    /// Configured hash algorithm
    pub fn hash_algo(&self) -> DomainResult<HashAlgo> {
        HashAlgo::parse(&self.hash.algo)
    }

    /// JSON Schema of the configuration document
    pub fn json_schema() -> DomainResult<Json> {
        Ok(serde_json::to_value(schemars::schema_for!(PragmaticConfig))?)
    }
}

fn parse_flag(value: &str) -> DomainResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(DomainError::configuration(format!(
            "Invalid boolean flag: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = PragmaticConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PragmaticConfig::default());
        assert_eq!(config.cache.default_ttl_secs, 3600);
        assert_eq!(config.cache.delimiter, ":");
        assert_eq!(config.reflection.cache_capacity, 512);
        assert_eq!(config.debug.mode, DebugMode::Auto);
    }

    #[test]
    fn test_partial_document() {
        let config = PragmaticConfig::from_json_str(
            r#"{"cqrs": {"query_middleware": ["logging", "cache"]}, "debug": {"mode": "enabled"}}"#,
        )
        .unwrap();
        assert_eq!(config.cqrs.query_middleware, vec!["logging", "cache"]);
        assert!(config.cqrs.command_middleware.is_empty());
        assert_eq!(config.debug.mode, DebugMode::Enabled);
    }

    #[test]
    fn test_invalid_document_is_configuration_error() {
        let err = PragmaticConfig::from_json_str(r#"{"cache": {"default_ttl_secs": "soon"}}"#).unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("JSON_DRIVER", "pretty"),
            ("HASH_FAST_ALGO", "XXH3_128"),
            ("CACHE_KEY_DELIMITER", "|"),
            ("DEBUG_ENABLED", "true"),
        ]);
        let config = PragmaticConfig::default()
            .with_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.json.default_driver, "pretty");
        assert_eq!(config.hash_algo().unwrap(), HashAlgo::Xxh3_128);
        assert_eq!(config.cache.delimiter, "|");
        assert!(config.debug.enabled);
        assert_eq!(config.debug.default_driver, "tracing");

        let err = PragmaticConfig::default()
            .with_overrides(|name| (name == "HASH_FAST_ALGO").then(|| "md5".to_string()))
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_schema_lists_sections() {
        let schema = PragmaticConfig::json_schema().unwrap();
        let properties = &schema["properties"];
        for section in ["cqrs", "cache", "reflection", "json", "hash", "debug"] {
            assert!(properties.get(section).is_some(), "missing {section}");
        }
    }
}
