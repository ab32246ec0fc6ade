// Copyright 2025 Cowboy AI, LLC.

//! Ability checks consulted by the authorization middleware

use std::collections::HashMap;
use std::sync::{Arc, RwLock, PoisonError};

use async_trait::async_trait;
use serde_json::Value as Json;

use crate::errors::{DomainError, DomainResult};

/// Authorization gate
#[async_trait]
pub trait Gate: Send + Sync {
    /// Whether `ability` is allowed for the subject and arguments
    async fn check(&self, ability: &str, arguments: &[Json]) -> DomainResult<bool>;
}

/// Fail with the standard authorization error unless `ability` is allowed
pub async fn authorize(gate: &dyn Gate, ability: &str, arguments: &[Json]) -> DomainResult<()> {
    if gate.check(ability, arguments).await? {
        Ok(())
    } else {
        Err(DomainError::unauthorized())
    }
}

type AbilityCheck = Arc<dyn Fn(&[Json]) -> bool + Send + Sync>;

/// Gate backed by per-ability closures; undefined abilities are denied
#[derive(Clone, Default)]
pub struct AbilityGate {
    abilities: Arc<RwLock<HashMap<String, AbilityCheck>>>,
}

impl std::fmt::Debug for AbilityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let abilities = self.abilities.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = abilities.keys().cloned().collect();
        names.sort();
        f.debug_struct("AbilityGate").field("abilities", &names).finish()
    }
}

impl AbilityGate {
    /// Gate with no abilities
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or replace an ability
    pub fn define<F>(self, ability: impl Into<String>, check: F) -> Self
    where
        F: Fn(&[Json]) -> bool + Send + Sync + 'static,
    {
        self.abilities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ability.into(), Arc::new(check));
        self
    }

    /// Whether `ability` is defined
    pub fn has(&self, ability: &str) -> bool {
        self.abilities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(ability)
    }
}

#[async_trait]
impl Gate for AbilityGate {
    async fn check(&self, ability: &str, arguments: &[Json]) -> DomainResult<bool> {
        let check = self
            .abilities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(ability)
            .cloned();
        Ok(check.map(|check| check(arguments)).unwrap_or(false))
    }
}
