// Copyright 2025 Cowboy AI, LLC.

//! Flash-style alerts kept in a session store, grouped by type

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};

/// Session key prefix for alert lists
pub const SESSION_PREFIX: &str = "__alerts__.";
/// Alerts kept per type; the oldest is dropped beyond this
pub const MAX_ALERTS_PER_TYPE: usize = 50;
/// Prefix of generated alert ids
pub const ID_PREFIX: &str = "alert_";

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    /// Something failed
    Error,
    /// Something needs attention
    Warning,
    /// Something succeeded
    Success,
    /// For information
    Info,
}

impl AlertType {
    /// Every type, in reading order
    pub const ALL: [AlertType; 4] = [
        AlertType::Error,
        AlertType::Warning,
        AlertType::Success,
        AlertType::Info,
    ];

    /// Lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Error => "error",
            AlertType::Warning => "warning",
            AlertType::Success => "success",
            AlertType::Info => "info",
        }
    }
}

/// One alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AlertData {
    /// Unique id
    pub id: String,
    /// Severity
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    /// Text shown to the user
    pub message: String,
    /// When the alert was raised
    pub created_at: DateTime<Utc>,
}

impl AlertData {
    /// New alert; an empty message is rejected
    pub fn make(alert_type: AlertType, message: impl Into<String>, id: Option<String>) -> DomainResult<Self> {
        let message = message.into();
        if message.is_empty() {
            return Err(DomainError::validation("Message cannot be empty."));
        }
        Ok(Self {
            id: id.unwrap_or_else(|| format!("{ID_PREFIX}{}", Uuid::new_v4().simple())),
            alert_type,
            message,
            created_at: Utc::now(),
        })
    }
}

impl fmt::Display for AlertData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Per-user key/value session
pub trait SessionStore: Send + Sync {
    /// Value at `key`
    fn get(&self, key: &str) -> Option<Json>;

    /// Store `value` at `key`
    fn put(&self, key: &str, value: Json);

    /// Remove `key`
    fn forget(&self, key: &str);
}

/// Process-local session
#[derive(Debug, Clone, Default)]
pub struct InMemorySession {
    values: Arc<Mutex<HashMap<String, Json>>>,
}

impl InMemorySession {
    /// Empty session
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySession {
    fn get(&self, key: &str) -> Option<Json> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: Json) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn forget(&self, key: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Alerts stored in a [`SessionStore`]
///
/// Within a type, a message is stored once. `get` and `all` consume what
/// they return; the `peek` variants do not.
#[derive(Clone)]
pub struct AlertManager {
    session: Arc<dyn SessionStore>,
}

impl fmt::Debug for AlertManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertManager").finish_non_exhaustive()
    }
}

impl AlertManager {
    /// Manager over `session`
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        Self { session }
    }

    fn key(alert_type: AlertType) -> String {
        format!("{SESSION_PREFIX}{}", alert_type.as_str())
    }

    fn read(&self, alert_type: AlertType) -> DomainResult<Vec<AlertData>> {
        match self.session.get(&Self::key(alert_type)) {
            Some(stored) => Ok(serde_json::from_value(stored)?),
            None => Ok(Vec::new()),
        }
    }

    /// Store `alert` unless its message is already present for its type
    pub fn add(&self, alert: AlertData) -> DomainResult<()> {
        let mut alerts = self.read(alert.alert_type)?;
        if alerts.iter().any(|existing| existing.message == alert.message) {
            return Ok(());
        }
        if alerts.len() >= MAX_ALERTS_PER_TYPE {
            alerts.remove(0);
        }
        let key = Self::key(alert.alert_type);
        alerts.push(alert);
        self.session.put(&key, serde_json::to_value(alerts)?);
        Ok(())
    }

    /// Add a new alert of `alert_type`
    pub fn push(&self, alert_type: AlertType, message: impl Into<String>) -> DomainResult<()> {
        self.add(AlertData::make(alert_type, message, None)?)
    }

    /// Add a success alert
    pub fn success(&self, message: impl Into<String>) -> DomainResult<()> {
        self.push(AlertType::Success, message)
    }

    /// Add an error alert
    pub fn error(&self, message: impl Into<String>) -> DomainResult<()> {
        self.push(AlertType::Error, message)
    }

    /// Add an info alert
    pub fn info(&self, message: impl Into<String>) -> DomainResult<()> {
        self.push(AlertType::Info, message)
    }

    /// Add a warning alert
    pub fn warning(&self, message: impl Into<String>) -> DomainResult<()> {
        self.push(AlertType::Warning, message)
    }

    /// Take the alerts of `alert_type`
    pub fn get(&self, alert_type: AlertType) -> DomainResult<Vec<AlertData>> {
        let alerts = self.read(alert_type)?;
        self.forget(alert_type);
        Ok(alerts)
    }

    /// Alerts of `alert_type`, left in place
    pub fn peek(&self, alert_type: AlertType) -> DomainResult<Vec<AlertData>> {
        self.read(alert_type)
    }

    /// Every alert, left in place
    pub fn peek_all(&self) -> DomainResult<Vec<AlertData>> {
        let mut alerts = Vec::new();
        for alert_type in AlertType::ALL {
            alerts.extend(self.peek(alert_type)?);
        }
        Ok(alerts)
    }

    /// Take every alert
    pub fn all(&self) -> DomainResult<Vec<AlertData>> {
        let mut alerts = Vec::new();
        for alert_type in AlertType::ALL {
            alerts.extend(self.get(alert_type)?);
        }
        Ok(alerts)
    }

    /// Drop the alerts of `alert_type`
    pub fn forget(&self, alert_type: AlertType) {
        self.session.forget(&Self::key(alert_type));
    }

    /// Drop every alert
    pub fn clear(&self) {
        for alert_type in AlertType::ALL {
            self.forget(alert_type);
        }
    }

    /// Whether any alert of `alert_type` is stored
    pub fn has(&self, alert_type: AlertType) -> DomainResult<bool> {
        Ok(self.count(alert_type)? > 0)
    }

    /// Whether any alert is stored
    pub fn has_any(&self) -> DomainResult<bool> {
        for alert_type in AlertType::ALL {
            if self.has(alert_type)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Number of alerts of `alert_type`
    pub fn count(&self, alert_type: AlertType) -> DomainResult<usize> {
        Ok(self.read(alert_type)?.len())
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(Arc::new(InMemorySession::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn messages(alerts: &[AlertData]) -> Vec<&str> {
        alerts.iter().map(|a| a.message.as_str()).collect()
    }

    #[test]
    fn test_duplicates_within_a_type_are_ignored() {
        let alerts = AlertManager::default();
        alerts.success("Saved").unwrap();
        alerts.success("Saved").unwrap();
        alerts.error("Saved").unwrap();

        assert_eq!(alerts.count(AlertType::Success).unwrap(), 1);
        assert_eq!(alerts.count(AlertType::Error).unwrap(), 1);
    }

    #[test]
    fn test_oldest_dropped_beyond_limit() {
        let alerts = AlertManager::default();
        for n in 0..=MAX_ALERTS_PER_TYPE {
            alerts.info(format!("note {n}")).unwrap();
        }
        let stored = alerts.peek(AlertType::Info).unwrap();
        assert_eq!(stored.len(), MAX_ALERTS_PER_TYPE);
        assert_eq!(stored[0].message, "note 1");
    }

    #[test]
    fn test_get_and_all_consume() {
        let alerts = AlertManager::default();
        alerts.warning("Low disk").unwrap();
        alerts.error("Failed").unwrap();

        assert_eq!(messages(&alerts.peek_all().unwrap()), vec!["Failed", "Low disk"]);
        assert!(alerts.has_any().unwrap());

        assert_eq!(messages(&alerts.get(AlertType::Error).unwrap()), vec!["Failed"]);
        assert!(!alerts.has(AlertType::Error).unwrap());

        assert_eq!(messages(&alerts.all().unwrap()), vec!["Low disk"]);
        assert!(!alerts.has_any().unwrap());
    }

    #[test]
    fn test_empty_message_rejected() {
        let err = AlertManager::default().success("").unwrap_err();
        assert!(err.is_validation_error());
    }
}
