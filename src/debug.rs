// Copyright 2025 Cowboy AI, LLC.

//! Switchable debug dumps
//!
//! The mode and the enablement flag live on the [`DebugManager`] instance.
//! `Auto` defers to the flag; `Enabled` and `Disabled` override it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::errors::{DomainError, DomainResult};

/// Name of the driver writing through `tracing`
pub const TRACING_DRIVER: &str = "tracing";
/// Name of the driver that discards output
pub const SILENT_DRIVER: &str = "silent";
/// Name of the driver that records dumps in memory
pub const MEMORY_DRIVER: &str = "memory";

/// How dumps are gated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DebugMode {
    /// Always dump
    Enabled,
    /// Never dump
    Disabled,
    /// Dump when the enablement flag is set
    #[default]
    Auto,
}

/// Output sink for dumps
pub trait DebugDriver: Send + Sync {
    /// Emit `values`; returns what was dumped, a single value unwrapped
    fn dump(&self, values: &[Json]) -> Json;
}

fn dumped(values: &[Json]) -> Json {
    match values {
        [single] => single.clone(),
        many => Json::Array(many.to_vec()),
    }
}

/// Writes dumps as `tracing` debug events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDebugDriver;

impl DebugDriver for TracingDebugDriver {
    fn dump(&self, values: &[Json]) -> Json {
        for value in values {
            tracing::debug!(target: "cim_pragmatic::debug", %value, "dump");
        }
        dumped(values)
    }
}

/// Accepts dumps without output
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentDebugDriver;

impl DebugDriver for SilentDebugDriver {
    fn dump(&self, values: &[Json]) -> Json {
        dumped(values)
    }
}

/// Records every dumped value
#[derive(Debug, Clone, Default)]
pub struct MemoryDebugDriver {
    dumps: Arc<Mutex<Vec<Json>>>,
}

impl MemoryDebugDriver {
    /// Empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Values recorded so far
    pub fn dumps(&self) -> Vec<Json> {
        self.dumps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DebugDriver for MemoryDebugDriver {
    fn dump(&self, values: &[Json]) -> Json {
        self.dumps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(values.iter().cloned());
        dumped(values)
    }
}

/// Mode, flag and named drivers
pub struct DebugManager {
    initial_mode: DebugMode,
    mode: RwLock<DebugMode>,
    enabled: bool,
    default_driver: String,
    drivers: HashMap<String, Arc<dyn DebugDriver>>,
}

impl std::fmt::Debug for DebugManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut drivers: Vec<_> = self.drivers.keys().collect();
        drivers.sort();
        f.debug_struct("DebugManager")
            .field("mode", &self.mode())
            .field("enabled", &self.enabled)
            .field("default_driver", &self.default_driver)
            .field("drivers", &drivers)
            .finish()
    }
}

impl Default for DebugManager {
    fn default() -> Self {
        Self::new(DebugMode::Auto, false, TRACING_DRIVER)
    }
}

impl DebugManager {
    /// Manager with the built-in drivers
    pub fn new(mode: DebugMode, enabled: bool, default_driver: impl Into<String>) -> Self {
        let mut drivers: HashMap<String, Arc<dyn DebugDriver>> = HashMap::new();
        drivers.insert(TRACING_DRIVER.to_string(), Arc::new(TracingDebugDriver));
        drivers.insert(SILENT_DRIVER.to_string(), Arc::new(SilentDebugDriver));
        drivers.insert(MEMORY_DRIVER.to_string(), Arc::new(MemoryDebugDriver::new()));
        Self {
            initial_mode: mode,
            mode: RwLock::new(mode),
            enabled,
            default_driver: default_driver.into(),
            drivers,
        }
    }

    /// Add or replace a driver
    pub fn extend(&mut self, name: impl Into<String>, driver: Arc<dyn DebugDriver>) {
        self.drivers.insert(name.into(), driver);
    }

    /// Current mode
    pub fn mode(&self) -> DebugMode {
        *self.mode.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_mode(&self, mode: DebugMode) {
        *self.mode.write().unwrap_or_else(PoisonError::into_inner) = mode;
    }

    /// Force dumps on
    pub fn enable(&self) -> &Self {
        self.set_mode(DebugMode::Enabled);
        self
    }

    /// Force dumps off
    pub fn disable(&self) -> &Self {
        self.set_mode(DebugMode::Disabled);
        self
    }

    /// Back to the configured mode
    pub fn reset(&self) -> &Self {
        self.set_mode(self.initial_mode);
        self
    }

    /// Whether dumps are emitted in the current mode
    pub fn is_enabled(&self) -> bool {
        match self.mode() {
            DebugMode::Enabled => true,
            DebugMode::Disabled => false,
            DebugMode::Auto => self.enabled,
        }
    }

    /// Driver by name, or the default driver
    pub fn driver(&self, name: Option<&str>) -> DomainResult<Arc<dyn DebugDriver>> {
        let name = name.unwrap_or(&self.default_driver);
        self.drivers.get(name).cloned().ok_or_else(|| {
            DomainError::configuration(format!("Debug driver [{name}] is not configured."))
        })
    }

    /// Dump through the default driver; `None` while disabled
    pub fn dump(&self, values: &[Json]) -> DomainResult<Option<Json>> {
        if !self.is_enabled() {
            return Ok(None);
        }
        Ok(Some(self.driver(None)?.dump(values)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auto_mode_follows_flag() {
        assert!(!DebugManager::new(DebugMode::Auto, false, SILENT_DRIVER).is_enabled());
        assert!(DebugManager::new(DebugMode::Auto, true, SILENT_DRIVER).is_enabled());
    }

    #[test]
    fn test_enable_disable_reset() {
        let debug = DebugManager::new(DebugMode::Auto, false, SILENT_DRIVER);
        assert_eq!(debug.dump(&[json!(1)]).unwrap(), None);

        debug.enable();
        assert_eq!(debug.dump(&[json!(1)]).unwrap(), Some(json!(1)));
        assert_eq!(debug.dump(&[json!(1), json!("a")]).unwrap(), Some(json!([1, "a"])));

        debug.disable();
        assert!(!debug.is_enabled());
        debug.reset();
        assert_eq!(debug.mode(), DebugMode::Auto);
    }

    #[test]
    fn test_custom_and_unknown_drivers() {
        let recorder = MemoryDebugDriver::new();
        let mut debug = DebugManager::new(DebugMode::Enabled, false, "recorder");
        debug.extend("recorder", Arc::new(recorder.clone()));

        debug.dump(&[json!({"id": 7})]).unwrap();
        assert_eq!(recorder.dumps(), vec![json!({"id": 7})]);

        let err = debug.driver(Some("laradumps")).err().unwrap();
        assert!(err.is_configuration_error());
    }
}
