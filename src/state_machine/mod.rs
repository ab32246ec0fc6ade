// Copyright 2025 Cowboy AI, LLC.

//! Per-entity state storage with enum-driven transitions
//!
//! Each owning entity has at most one [`StateRecord`]: a free-form data blob
//! addressed with dot paths plus an optional current state. The current state
//! is stored as `"Type@Case"` so a record written by one enum is never
//! mistaken for another.
//!
//! Transitions are guarded by [`StateEnum::can_transition_to`]. States that
//! do not override it allow any target.

mod manager;
mod store;

pub use manager::{FlowHandler, StateManager, StateServices, Stateful};
pub use store::{InMemoryStateStore, StateRecord, StateStore, StateTransaction};

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::errors::DomainError;
use crate::support::enumeration::Enumeration;

/// Separator between the enum type and the case in a stored state
pub const STATE_SEPARATOR: char = '@';

/// An enumeration usable as an entity state
pub trait StateEnum: Enumeration {
    /// Whether moving from `self` to `target` is allowed
    fn can_transition_to(&self, _target: &Self) -> bool {
        true
    }

    /// Stored form, `Type@Case`
    fn encode(&self) -> String {
        format!("{}{STATE_SEPARATOR}{}", Self::NAME, self.name())
    }

    /// Decode a stored state; `None` for another type or an unknown case
    fn decode(stored: &str) -> Option<Self> {
        let (type_name, case) = stored.split_once(STATE_SEPARATOR)?;
        if type_name != Self::NAME {
            return None;
        }
        Self::from_name(case)
    }
}

/// The entity a state record belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct EntityRef {
    /// Entity type name
    pub entity_type: String,
    /// Entity identifier
    pub id: String,
}

impl EntityRef {
    /// Reference to `entity_type` with `id`
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.entity_type, self.id)
    }
}

/// Outcome of a transition attempt
#[derive(Debug, Clone)]
pub enum StateEvent {
    /// The transition committed
    StateChanged {
        /// Owning entity
        owner: EntityRef,
        /// Previous state, encoded
        from: Option<String>,
        /// New state, encoded
        to: String,
        /// Extra data passed to the transition
        data: Map<String, Json>,
    },
    /// The transition was rejected or its unit of work failed
    TransitionFailed {
        /// Owning entity
        owner: EntityRef,
        /// State at the time of the attempt, encoded
        from: Option<String>,
        /// Attempted state, encoded
        to: String,
        /// The failure
        error: DomainError,
    },
}

impl StateEvent {
    /// `StateChanged` or `TransitionFailed`
    pub fn event_name(&self) -> &'static str {
        match self {
            StateEvent::StateChanged { .. } => "StateChanged",
            StateEvent::TransitionFailed { .. } => "TransitionFailed",
        }
    }

    /// Owning entity
    pub fn owner(&self) -> &EntityRef {
        match self {
            StateEvent::StateChanged { owner, .. } | StateEvent::TransitionFailed { owner, .. } => {
                owner
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Light {
        Red,
        Green,
    }

    impl Enumeration for Light {
        const NAME: &'static str = "Light";

        fn cases() -> Vec<Self> {
            vec![Light::Red, Light::Green]
        }

        fn name(&self) -> &'static str {
            match self {
                Light::Red => "Red",
                Light::Green => "Green",
            }
        }
    }

    impl StateEnum for Light {}

    #[test]
    fn test_encode_decode() {
        assert_eq!(Light::Green.encode(), "Light@Green");
        assert_eq!(Light::decode("Light@Red"), Some(Light::Red));
        assert_eq!(Light::decode("Door@Red"), None);
        assert_eq!(Light::decode("Light@Blue"), None);
        assert_eq!(Light::decode("garbage"), None);
        assert!(Light::Red.can_transition_to(&Light::Green));
    }

    #[test]
    fn test_entity_ref_display() {
        assert_eq!(EntityRef::new("Order", "42").to_string(), "Order#42");
    }
}
