// Copyright 2025 Cowboy AI, LLC.

//! Error types for dispatch, mapping and state operations

use thiserror::Error;

/// Message carried by authorization failures raised from the pipeline
pub const UNAUTHORIZED_MESSAGE: &str = "This action is unauthorized.";

/// Errors raised by the container, the mapping chain, the pipeline and state managers
///
/// `Clone` so a failure can travel inside a notification while the original
/// is returned to the caller.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Misconfigured resolver, type definition, middleware or driver
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Input rejected by an operation or a mapping transform
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Denied at the gate
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    /// A guarded state refused the target
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Case being left
        from: String,
        /// Case that was refused
        to: String,
    },

    /// The call does not apply to its receiver
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// What was wrong
        reason: String,
    },

    /// JSON encoding or DTO construction failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Missing binding, maker or record
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate binding
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Broken store or collaborator
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Failure raised by application code
    #[error("Domain error: {0}")]
    Generic(String),
}

/// Result alias used throughout the crate
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl DomainError {
    /// Failure raised by application code
    pub fn generic(msg: impl Into<String>) -> Self {
        DomainError::Generic(msg.into())
    }

    /// Misconfiguration
    pub fn configuration(msg: impl Into<String>) -> Self {
        DomainError::ConfigurationError(msg.into())
    }

    /// Rejected input
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::ValidationError(msg.into())
    }

    /// Authorization failure with the standard denial message
    pub fn unauthorized() -> Self {
        DomainError::AuthorizationError(UNAUTHORIZED_MESSAGE.to_string())
    }

    /// `ConfigurationError`
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, DomainError::ConfigurationError(_))
    }

    /// `ValidationError`
    pub fn is_validation_error(&self) -> bool {
        matches!(self, DomainError::ValidationError(_))
    }

    /// `AuthorizationError`
    pub fn is_authorization_error(&self) -> bool {
        matches!(self, DomainError::AuthorizationError(_))
    }

    /// `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(DomainError::configuration("Mapper class is required."), "Configuration error: Mapper class is required." ; "configuration")]
    #[test_case(DomainError::unauthorized(), "Authorization error: This action is unauthorized." ; "unauthorized")]
    #[test_case(
        DomainError::InvalidStateTransition { from: "Draft".into(), to: "Archived".into() },
        "Invalid state transition from Draft to Archived" ;
        "transition"
    )]
    #[test_case(
        DomainError::InvalidOperation { reason: "cannot set a key on a string".into() },
        "Invalid operation: cannot set a key on a string" ;
        "invalid operation"
    )]
    #[test_case(DomainError::NotFound("No maker registered for Clock".into()), "Not found: No maker registered for Clock" ; "not found")]
    fn test_display(err: DomainError, expected: &str) {
        assert_eq!(err.to_string(), expected);
    }

    #[test]
    fn test_classifiers_are_exclusive() {
        let errors = [
            DomainError::configuration("x"),
            DomainError::validation("x"),
            DomainError::unauthorized(),
            DomainError::NotFound("x".into()),
            DomainError::generic("x"),
        ];
        let flags: Vec<[bool; 4]> = errors
            .iter()
            .map(|e| {
                [
                    e.is_configuration_error(),
                    e.is_validation_error(),
                    e.is_authorization_error(),
                    e.is_not_found(),
                ]
            })
            .collect();

        assert_eq!(
            flags,
            vec![
                [true, false, false, false],
                [false, true, false, false],
                [false, false, true, false],
                [false, false, false, true],
                [false, false, false, false],
            ]
        );
    }

    #[test]
    fn test_question_mark_converts_decode_failures() {
        fn decode_output(raw: serde_json::Value) -> DomainResult<u64> {
            Ok(serde_json::from_value(raw)?)
        }

        assert_eq!(decode_output(json!(3)).unwrap(), 3);
        assert!(matches!(
            decode_output(json!("three")),
            Err(DomainError::SerializationError(_))
        ));
    }
}
