//! Error types for the Denis inference control plane.
//!
//! Adapters and the router never throw across their boundary (spec.md §7) —
//! failures are folded into [`ProviderCallResult`](crate::result::ProviderCallResult)
//! or the [`RouteEnvelope`](crate::envelope::RouteEnvelope). `DenisError` exists
//! for the one exception the spec carves out: misuse of the library surface
//! itself, raised synchronously from `route()` before any adapter call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised synchronously by the control-plane library surface.
#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum DenisError {
    /// The caller-supplied request shape is invalid (spec.md §7: the only
    /// exception propagated to the caller from `route()`).
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Human-readable description.
        message: String,
        /// Field that failed validation, if applicable.
        field: Option<String>,
    },

    /// An engine was declared with an unknown provider family, and
    /// `DENIS_STRICT_ENGINE_REGISTRY=1` was set (spec.md §4.1, §7).
    #[error("misconfigured registry: {message}")]
    RegistryMisconfiguration {
        /// Description of the misconfiguration.
        message: String,
    },

    /// Two engines share both endpoint and model (spec.md §3.1 invariant).
    #[error("duplicate engine in registry: {engine_id}")]
    DuplicateEngine {
        /// The offending engine id.
        engine_id: String,
    },
}

impl DenisError {
    /// Build an [`DenisError::InvalidRequest`].
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            field: None,
        }
    }

    /// Build an [`DenisError::InvalidRequest`] naming the offending field.
    #[must_use]
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Stable machine-readable error code, for logs and API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "INVALID_REQUEST",
            Self::RegistryMisconfiguration { .. } => "REGISTRY_MISCONFIGURATION",
            Self::DuplicateEngine { .. } => "DUPLICATE_ENGINE",
        }
    }

    /// None of these are ever retryable — they indicate misuse, not a
    /// transient backend condition.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Result alias for fallible control-plane library operations.
pub type DenisResult<T> = Result<T, DenisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            DenisError::invalid_request("bad shape").error_code(),
            "INVALID_REQUEST"
        );
        assert_eq!(
            DenisError::DuplicateEngine {
                engine_id: "x".into()
            }
            .error_code(),
            "DUPLICATE_ENGINE"
        );
    }

    #[test]
    fn nothing_is_retryable() {
        assert!(!DenisError::invalid_request("x").is_retryable());
    }
}
