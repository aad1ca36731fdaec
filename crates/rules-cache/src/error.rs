//! Cache error types.

use rules_model::EngineError;
use thiserror::Error;

/// Errors raised by cache backends.
///
/// A cache miss is not an error; lookups return `Ok(None)` for absent keys.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CacheError {
    /// The backend could not be reached or rejected the command.
    #[error("{backend} cache unavailable: {message}")]
    Unavailable {
        backend: &'static str,
        message: String,
    },

    /// A stored value could not be encoded or decoded.
    #[error("Cache value for '{key}' is not valid JSON: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

impl CacheError {
    pub fn unavailable(backend: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            backend,
            message: message.to_string(),
        }
    }

    pub fn serialization(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            key: key.into(),
            source,
        }
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::unavailable("redis", err)
    }
}

impl From<CacheError> for EngineError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Unavailable { backend, message } => {
                EngineError::BackendUnavailable { backend, message }
            }
            CacheError::Serialization { source, .. } => EngineError::Json(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules_model::ErrorKind;

    #[test]
    fn unavailable_maps_to_backend_kind() {
        let err: EngineError = CacheError::unavailable("redis", "connection refused").into();
        assert_eq!(err.kind(), ErrorKind::BackendUnavailable);
        assert!(err.is_retryable());
        insta::assert_snapshot!(err, @"redis unavailable: connection refused");
    }

    #[test]
    fn serialization_maps_to_internal() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: EngineError = CacheError::serialization("model_details:sdtm1-5", source).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
