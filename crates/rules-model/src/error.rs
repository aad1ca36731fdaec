//! Unified error types for operation evaluation.
//!
//! Every failure surfaced by the engine falls into one of a small number of
//! kinds so the calling pipeline can decide between reporting, treating the
//! result as empty, or retrying.

use std::fmt;

use thiserror::Error;

/// Coarse classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown operation or missing/invalid parameter. Never retried.
    Usage,
    /// Requested metadata does not exist.
    NotFound,
    /// Cache or remote transport failure.
    BackendUnavailable,
    /// An operation produced a result that does not line up with its input rows.
    Alignment,
    /// Frame engine, serialization or I/O failure.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Usage => "usage",
            ErrorKind::NotFound => "not_found",
            ErrorKind::BackendUnavailable => "backend_unavailable",
            ErrorKind::Alignment => "alignment",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for all engine operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EngineError {
    // =========================================================================
    // USAGE ERRORS
    // =========================================================================
    /// No operation is registered under this name.
    #[error("Unknown operation '{name}'")]
    UnknownOperation {
        /// The requested operation name.
        name: String,
    },

    /// A parameter the operation needs was not supplied.
    #[error("Operation '{operation}' requires parameter '{parameter}'")]
    MissingParameter {
        /// Operation name.
        operation: String,
        /// Missing parameter name.
        parameter: &'static str,
    },

    /// A parameter was supplied but cannot be used.
    #[error("Operation '{operation}' got an invalid '{parameter}': {message}")]
    InvalidParameter {
        /// Operation name.
        operation: String,
        /// Offending parameter name.
        parameter: &'static str,
        /// What is wrong with it.
        message: String,
    },

    // =========================================================================
    // LOOKUP ERRORS
    // =========================================================================
    /// Metadata or a dataset could not be found.
    #[error("{what} not found: {key}")]
    NotFound {
        /// What was looked up (e.g. "Model metadata").
        what: &'static str,
        /// The key that missed.
        key: String,
    },

    // =========================================================================
    // TRANSPORT ERRORS
    // =========================================================================
    /// The cache or remote source could not be reached.
    #[error("{backend} unavailable: {message}")]
    BackendUnavailable {
        /// Backend name (e.g. "redis").
        backend: &'static str,
        /// Transport error description.
        message: String,
    },

    // =========================================================================
    // IMPLEMENTATION ERRORS
    // =========================================================================
    /// An operation result does not have one value per input row.
    #[error("Operation '{operation}' produced {actual} values for {expected} rows")]
    Alignment {
        /// Operation name.
        operation: String,
        /// Row count of the evaluation frame.
        expected: usize,
        /// Length of the produced result.
        actual: usize,
    },

    // =========================================================================
    // WRAPPED ERRORS
    // =========================================================================
    /// Polars DataFrame operation error.
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] rules_common::ConfigError),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// Create a missing-parameter error.
    pub fn missing(operation: impl Into<String>, parameter: &'static str) -> Self {
        Self::MissingParameter {
            operation: operation.into(),
            parameter,
        }
    }

    /// Create an invalid-parameter error.
    pub fn invalid(
        operation: impl Into<String>,
        parameter: &'static str,
        message: impl fmt::Display,
    ) -> Self {
        Self::InvalidParameter {
            operation: operation.into(),
            parameter,
            message: message.to_string(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            key: key.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownOperation { .. }
            | Self::MissingParameter { .. }
            | Self::InvalidParameter { .. } => ErrorKind::Usage,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            Self::Alignment { .. } => ErrorKind::Alignment,
            Self::Polars(_) | Self::Json(_) | Self::Io(_) | Self::Config(_) => ErrorKind::Internal,
        }
    }

    /// Whether a caller may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::BackendUnavailable
    }
}
