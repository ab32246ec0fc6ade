// Copyright 2025 Cowboy AI, LLC.

//! Present/absent wrapper used by the mapping chain
//!
//! `Value<T>` separates "key missing" from "key present with null": a
//! `Present(Json::Null)` is a value the caller explicitly supplied, while
//! `Absent` means nothing was found and the constructor default applies.

use serde_json::Value as Json;

/// Explicit option type with loose-truthiness producers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value<T> {
    /// A value was supplied, possibly null
    Present(T),
    /// Nothing was supplied
    Absent,
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::Absent
    }
}

impl<T> From<Option<T>> for Value<T> {
    fn from(option: Option<T>) -> Self {
        match option {
            Some(value) => Value::Present(value),
            None => Value::Absent,
        }
    }
}

impl<T> Value<T> {
    /// Wrap a present value
    pub fn some(value: T) -> Self {
        Value::Present(value)
    }

    /// The absent value
    pub fn none() -> Self {
        Value::Absent
    }

    /// Present `value` when `condition` holds
    pub fn maybe(condition: bool, value: T) -> Self {
        if condition {
            Value::Present(value)
        } else {
            Value::Absent
        }
    }

    /// Present the computed value when `condition` holds; `value` only runs if needed
    pub fn maybe_with(condition: bool, value: impl FnOnce() -> T) -> Self {
        if condition {
            Value::Present(value())
        } else {
            Value::Absent
        }
    }

    /// Both the condition and the value are deferred
    pub fn maybe_lazy(condition: impl FnOnce() -> bool, value: impl FnOnce() -> T) -> Self {
        Self::maybe_with(condition(), value)
    }

    /// Like [`Value::maybe_with`] but the producer already returns a `Value`
    pub fn maybe_value(condition: bool, value: impl FnOnce() -> Value<T>) -> Self {
        if condition {
            value()
        } else {
            Value::Absent
        }
    }

    /// True when a value is present, even a null one
    pub fn exists(&self) -> bool {
        matches!(self, Value::Present(_))
    }

    /// True when absent
    pub fn is_absent(&self) -> bool {
        !self.exists()
    }

    /// Unwrap the payload.
    ///
    /// # Panics
    ///
    /// Panics when the value is absent. Callers check [`Value::exists`] first.
    pub fn get(self) -> T {
        match self {
            Value::Present(value) => value,
            Value::Absent => panic!("called `Value::get()` on an absent value"),
        }
    }

    /// Borrow the payload
    pub fn as_ref(&self) -> Value<&T> {
        match self {
            Value::Present(value) => Value::Present(value),
            Value::Absent => Value::Absent,
        }
    }

    /// Convert into an `Option`
    pub fn into_option(self) -> Option<T> {
        match self {
            Value::Present(value) => Some(value),
            Value::Absent => None,
        }
    }

    /// Self if present, else the fallback
    pub fn or(self, fallback: T) -> Self {
        match self {
            Value::Present(_) => self,
            Value::Absent => Value::Present(fallback),
        }
    }

    /// Self if present, else the computed fallback
    pub fn or_else(self, fallback: impl FnOnce() -> T) -> Self {
        match self {
            Value::Present(_) => self,
            Value::Absent => Value::Present(fallback()),
        }
    }

    /// Self if present, else another `Value` (not re-wrapped)
    pub fn or_value(self, fallback: impl FnOnce() -> Value<T>) -> Self {
        match self {
            Value::Present(_) => self,
            Value::Absent => fallback(),
        }
    }

    /// Apply `f` to a present payload
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Value<U> {
        match self {
            Value::Present(value) => Value::Present(f(value)),
            Value::Absent => Value::Absent,
        }
    }

    /// Hand the whole value to `f`, which must produce a `Value`
    pub fn then<U>(self, f: impl FnOnce(Value<T>) -> Value<U>) -> Value<U> {
        f(self)
    }

    /// Side effect on a present payload
    pub fn tap(self, f: impl FnOnce(&T)) -> Self {
        if let Value::Present(value) = &self {
            f(value);
        }
        self
    }
}

impl<T: Truthy> Value<T> {
    /// Present only when `value` is truthy
    pub fn truthy(value: T) -> Self {
        let keep = value.is_truthy();
        Self::maybe(keep, value)
    }
}

/// Loose truthiness used by [`Value::truthy`]
pub trait Truthy {
    /// Whether the value counts as "set"
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for Json {
    fn is_truthy(&self) -> bool {
        match self {
            Json::Null => false,
            Json::Bool(b) => *b,
            Json::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
            Json::String(s) => !(s.is_empty() || s == "0"),
            Json::Array(items) => !items.is_empty(),
            Json::Object(map) => !map.is_empty(),
        }
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !(self.is_empty() || self == "0")
    }
}

impl Truthy for &str {
    fn is_truthy(&self) -> bool {
        !(self.is_empty() || *self == "0")
    }
}

impl Truthy for i64 {
    fn is_truthy(&self) -> bool {
        *self != 0
    }
}

impl<T> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }
}

impl<T> Truthy for Vec<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}
