// Copyright 2025 Cowboy AI, LLC.

//! Closed sets of named cases with optional backing values
//!
//! Enums used by the mapping chain (`enum` transform) and by the state
//! manager implement [`Enumeration`]. A case may carry a backing value, the
//! raw form it is looked up by.

use std::fmt::Debug;

use serde_json::Value as Json;

/// A Rust enum exposed by name and backing value
///
/// # Examples
///
/// ```rust
/// use cim_pragmatic::support::enumeration::Enumeration;
/// use serde_json::json;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Priority {
///     Low,
///     High,
/// }
///
/// impl Enumeration for Priority {
///     const NAME: &'static str = "Priority";
///
///     fn cases() -> Vec<Self> {
///         vec![Priority::Low, Priority::High]
///     }
///
///     fn name(&self) -> &'static str {
///         match self {
///             Priority::Low => "Low",
///             Priority::High => "High",
///         }
///     }
///
///     fn backing_value(&self) -> Option<serde_json::Value> {
///         Some(json!(self.name().to_lowercase()))
///     }
/// }
///
/// assert_eq!(Priority::try_from_backing(&json!("high")), Some(Priority::High));
/// assert_eq!(Priority::from_name("Low"), Some(Priority::Low));
/// ```
pub trait Enumeration: Debug + Clone + PartialEq + Send + Sync + 'static {
    /// Registered type name
    const NAME: &'static str;

    /// All cases in declaration order
    fn cases() -> Vec<Self>;

    /// Case name
    fn name(&self) -> &'static str;

    /// Raw backing value; `None` for unit cases
    fn backing_value(&self) -> Option<Json> {
        None
    }

    /// Find a case by name
    fn from_name(name: &str) -> Option<Self> {
        Self::cases().into_iter().find(|case| case.name() == name)
    }

    /// Find a case by backing value
    fn try_from_backing(value: &Json) -> Option<Self> {
        Self::cases()
            .into_iter()
            .find(|case| case.backing_value().as_ref() == Some(value))
    }

    /// True when any case carries a backing value
    fn is_backed() -> bool {
        Self::cases().iter().any(|case| case.backing_value().is_some())
    }
}

/// Inspection helpers over any [`Enumeration`]
pub struct EnumHelper;

impl EnumHelper {
    /// Whether `value` names a case (unit enums) or matches a backing value
    pub fn exists<E: Enumeration>(value: &Json) -> bool {
        if E::is_backed() {
            return E::try_from_backing(value).is_some();
        }
        value
            .as_str()
            .map(|name| E::from_name(name).is_some())
            .unwrap_or(false)
    }

    /// Backing values, or names for unit enums
    pub fn values<E: Enumeration>() -> Vec<Json> {
        if E::is_backed() {
            return E::cases()
                .iter()
                .filter_map(|case| case.backing_value())
                .collect();
        }
        Self::names::<E>().into_iter().map(Json::from).collect()
    }

    /// Case names in declaration order
    pub fn names<E: Enumeration>() -> Vec<&'static str> {
        E::cases().iter().map(|case| case.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    enum Suit {
        Hearts,
        Spades,
    }

    impl Enumeration for Suit {
        const NAME: &'static str = "Suit";

        fn cases() -> Vec<Self> {
            vec![Suit::Hearts, Suit::Spades]
        }

        fn name(&self) -> &'static str {
            match self {
                Suit::Hearts => "Hearts",
                Suit::Spades => "Spades",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Level {
        One,
        Two,
    }

    impl Enumeration for Level {
        const NAME: &'static str = "Level";

        fn cases() -> Vec<Self> {
            vec![Level::One, Level::Two]
        }

        fn name(&self) -> &'static str {
            match self {
                Level::One => "One",
                Level::Two => "Two",
            }
        }

        fn backing_value(&self) -> Option<Json> {
            Some(match self {
                Level::One => json!(1),
                Level::Two => json!(2),
            })
        }
    }

    #[test]
    fn test_unit_enum_helpers() {
        assert!(!Suit::is_backed());
        assert!(EnumHelper::exists::<Suit>(&json!("Spades")));
        assert!(!EnumHelper::exists::<Suit>(&json!("Clubs")));
        assert_eq!(EnumHelper::values::<Suit>(), vec![json!("Hearts"), json!("Spades")]);
    }

    #[test]
    fn test_backed_enum_helpers() {
        assert!(Level::is_backed());
        assert_eq!(Level::try_from_backing(&json!(2)), Some(Level::Two));
        assert!(EnumHelper::exists::<Level>(&json!(1)));
        assert!(!EnumHelper::exists::<Level>(&json!("One")));
        assert_eq!(EnumHelper::values::<Level>(), vec![json!(1), json!(2)]);
        assert_eq!(EnumHelper::names::<Level>(), vec!["One", "Two"]);
    }
}
