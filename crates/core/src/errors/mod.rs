//! Error types for the ReelSearch core
//!
//! Provides the failure taxonomy shared by every module:
//! - Distinct error types for different failure modes
//! - Error codes for machine-readable handling
//! - No automatic retries: every error surfaces to the caller unmodified

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using SearchError
pub type Result<T> = std::result::Result<T, SearchError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    InvalidArgument,
    UnknownFilterKey,

    // External service errors (8xxx)
    EmbeddingUnavailable,
    SearchBackendUnavailable,
    Timeout,

    // Internal errors (9xxx)
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::InvalidArgument => 1001,
            ErrorCode::UnknownFilterKey => 1002,

            // External (8xxx)
            ErrorCode::EmbeddingUnavailable => 8001,
            ErrorCode::SearchBackendUnavailable => 8002,
            ErrorCode::Timeout => 8003,

            // Internal (9xxx)
            ErrorCode::ConfigurationError => 9001,
            ErrorCode::SerializationError => 9002,
        }
    }
}

/// Core error types
#[derive(Error, Debug)]
pub enum SearchError {
    // Validation errors
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        message: String,
        field: Option<String>,
    },

    #[error("Unknown filter key: {key}")]
    UnknownFilterKey { key: String },

    // External service errors
    #[error("Embedding service unavailable: {message}")]
    EmbeddingUnavailable { message: String },

    #[error("Search backend unavailable: {message}")]
    SearchBackendUnavailable { message: String },

    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    // Internal errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SearchError {
    /// Shorthand for an invalid-argument error without a field
    pub fn invalid(message: impl Into<String>) -> Self {
        SearchError::InvalidArgument {
            message: message.into(),
            field: None,
        }
    }

    /// Shorthand for an invalid-argument error on a specific field
    pub fn invalid_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        SearchError::InvalidArgument {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            SearchError::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            SearchError::UnknownFilterKey { .. } => ErrorCode::UnknownFilterKey,
            SearchError::EmbeddingUnavailable { .. } => ErrorCode::EmbeddingUnavailable,
            SearchError::SearchBackendUnavailable { .. } => ErrorCode::SearchBackendUnavailable,
            SearchError::Timeout { .. } => ErrorCode::Timeout,
            SearchError::Configuration { .. } => ErrorCode::ConfigurationError,
            SearchError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    /// Check if this error came from an external collaborator
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            SearchError::EmbeddingUnavailable { .. }
                | SearchError::SearchBackendUnavailable { .. }
                | SearchError::Timeout { .. }
        )
    }

    /// Check if this error is a client error (bad request, not a failure of ours)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SearchError::InvalidArgument { .. } | SearchError::UnknownFilterKey { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = SearchError::invalid_field("limit exceeds pool", "limit");
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert_eq!(err.code().as_code(), 1001);
        assert!(err.is_client_error());
        assert!(!err.is_upstream_error());
    }

    #[test]
    fn test_timeout_distinct_from_unavailable() {
        let timeout = SearchError::Timeout {
            operation: "embed".into(),
            timeout_ms: 5000,
        };
        let unavailable = SearchError::EmbeddingUnavailable {
            message: "connection refused".into(),
        };
        assert_ne!(timeout.code(), unavailable.code());
        assert!(timeout.is_upstream_error());
        assert!(unavailable.is_upstream_error());
    }

    #[test]
    fn test_unknown_filter_key() {
        let err = SearchError::UnknownFilterKey { key: "director".into() };
        assert_eq!(err.code(), ErrorCode::UnknownFilterKey);
        assert_eq!(err.to_string(), "Unknown filter key: director");
    }
}
