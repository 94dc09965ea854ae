//! Error types for citesurf
//!
//! Provides:
//! - Distinct error types for different failure modes
//! - Error codes for machine-readable reporting
//! - Recoverable/fatal classification used by the walk engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidFormat,

    // Resource errors (4xxx)
    NodeNotFound,
    NoSeeds,

    // Conflict errors (5xxx)
    DuplicateNode,

    // Upstream lookup errors (8xxx)
    LookupFailed,
    LookupNotFound,
    RateLimited,
    UpstreamError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
    IoError,
    InvariantViolation,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidFormat => 1003,

            // Resources (4xxx)
            ErrorCode::NodeNotFound => 4001,
            ErrorCode::NoSeeds => 4002,

            // Conflicts (5xxx)
            ErrorCode::DuplicateNode => 5001,

            // Upstream (8xxx)
            ErrorCode::LookupFailed => 8001,
            ErrorCode::LookupNotFound => 8002,
            ErrorCode::RateLimited => 8003,
            ErrorCode::UpstreamError => 8004,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
            ErrorCode::IoError => 9004,
            ErrorCode::InvariantViolation => 9999,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    // Graph store errors
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    #[error("Duplicate node: {id}")]
    DuplicateNode { id: String },

    #[error("No seed document could be imported")]
    NoSeeds,

    // Lookup errors
    #[error("Lookup failed for {identifier}: {message}")]
    LookupFailed { identifier: String, message: String },

    #[error("Identifier not found by lookup provider: {identifier}")]
    LookupNotFound { identifier: String },

    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Walk invariant violated: {message}")]
    InvariantViolation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::NodeNotFound { .. } => ErrorCode::NodeNotFound,
            AppError::DuplicateNode { .. } => ErrorCode::DuplicateNode,
            AppError::NoSeeds => ErrorCode::NoSeeds,
            AppError::LookupFailed { .. } => ErrorCode::LookupFailed,
            AppError::LookupNotFound { .. } => ErrorCode::LookupNotFound,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::InvariantViolation { .. } => ErrorCode::InvariantViolation,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Io(_) => ErrorCode::IoError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Whether a walk step may skip past this error and keep going.
    ///
    /// Only failures to resolve a single reference qualify; everything else
    /// aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::LookupFailed { .. }
                | AppError::LookupNotFound { .. }
                | AppError::RateLimited { .. }
                | AppError::HttpClient(_)
                | AppError::Serialization(_)
        )
    }

    /// Shorthand for a lookup failure
    pub fn lookup(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::LookupFailed {
            identifier: identifier.into(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::NodeNotFound { id: "10.1/x".into() };
        assert_eq!(err.code(), ErrorCode::NodeNotFound);
        assert_eq!(err.code().as_code(), 4001);
    }

    #[test]
    fn test_lookup_errors_are_recoverable() {
        let err = AppError::lookup("10.1/x", "timeout");
        assert!(err.is_recoverable());
        assert_eq!(err.to_string(), "Lookup failed for 10.1/x: timeout");
    }

    #[test]
    fn test_invariant_violation_is_fatal() {
        let err = AppError::InvariantViolation {
            message: "seed depth 2".into(),
        };
        assert!(!err.is_recoverable());
        assert_eq!(err.code().as_code(), 9999);
    }

    #[test]
    fn test_rate_limit_is_recoverable() {
        let err = AppError::RateLimited { limit: 5 };
        assert!(err.is_recoverable());
        assert_eq!(err.code(), ErrorCode::RateLimited);
        assert_eq!(err.to_string(), "Rate limit exceeded: 5 requests per second");
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::DuplicateNode).unwrap();
        assert_eq!(json, "\"DUPLICATE_NODE\"");
    }
}
