//! Error types for the OpenCare platform core

use thiserror::Error;

/// Platform core error taxonomy
///
/// Every operation in the core surfaces one of these. The HTTP mapping lives
/// in the gateway: Validation -> 400, Authentication -> 401, Authorization ->
/// 403, NotFound -> 404, Conflict/InvalidTransition -> 409, the rest -> 500.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Malformed input; the one kind that carries field-level detail to callers
    #[error("validation failed on {field}: {message}")]
    Validation {
        /// Offending field
        field: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// Entity absent, or present in another tenant; the two are never distinguished
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Credential could not be verified
    #[error("invalid or expired credential")]
    Authentication,

    /// Authenticated but not allowed: role or tenant mismatch
    #[error("{0}")]
    Authorization(&'static str),

    /// Uniqueness or concurrency violation
    #[error("{0}")]
    Conflict(String),

    /// State machine rejected the requested edge
    #[error("invalid transition from {from} to {requested}")]
    InvalidTransition {
        /// Current state
        from: String,
        /// State the caller asked for
        requested: String,
    },

    /// Startup or configuration failure
    #[error("config error: {0}")]
    Config(String),

    /// Unanticipated failure; callers see a generic message only
    #[error("internal error")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a validation failure
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Shorthand for a rejected state transition
    pub fn invalid_transition(from: impl Into<String>, requested: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            requested: requested.into(),
        }
    }
}

/// Result type for the OpenCare core
pub type CoreResult<T> = Result<T, CoreError>;
