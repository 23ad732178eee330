//! Error types for the embedding backfill CLI.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding API: {0}")]
    ConnectionError(String),

    #[error("embedding API error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding API returned {received} vectors for {expected} texts")]
    CountMismatch { expected: usize, received: usize },

    #[error("embedding timeout")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            // Connection and timeout errors are retryable
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            // Server errors might be transient (e.g., 503 Service Unavailable)
            EmbeddingError::ServerError(msg) => {
                msg.contains("503")
                    || msg.contains("502")
                    || msg.contains("504")
                    || msg.contains("429")
                    || msg.to_lowercase().contains("unavailable")
                    || msg.to_lowercase().contains("too many requests")
            }
            // Request errors depend on the underlying cause
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            // Malformed or misaligned responses are not retryable
            EmbeddingError::InvalidResponse(_) | EmbeddingError::CountMismatch { .. } => false,
        }
    }
}

/// Errors related to document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to document store: {0}")]
    ConnectionError(String),

    #[error("pgvector extension error: {0}")]
    ExtensionError(String),

    #[error("query error: {0}")]
    QueryError(String),

    #[error("update error: {0}")]
    UpdateError(String),
}

impl Retryable for StoreError {
    fn is_retryable(&self) -> bool {
        match self {
            // Connection errors are always retryable
            StoreError::ConnectionError(_) => true,
            // Extension absence never resolves on its own
            StoreError::ExtensionError(_) => false,
            // Other errors might be transient
            StoreError::QueryError(msg) | StoreError::UpdateError(msg) => {
                let msg_lower = msg.to_lowercase();
                msg_lower.contains("timeout")
                    || msg_lower.contains("connection")
                    || msg_lower.contains("unavailable")
                    || msg_lower.contains("too many")
            }
        }
    }
}

/// Errors from a backfill run.
#[derive(Debug, Error)]
pub enum BackfillError {
    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("provider returned {received} vectors for a batch of {expected} documents")]
    VectorCountMismatch { expected: usize, received: usize },
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_count_mismatch_not_retryable() {
        let err = EmbeddingError::CountMismatch {
            expected: 96,
            received: 95,
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_embedding_throttling_retryable() {
        let err = EmbeddingError::ServerError("status 429: too many requests".to_string());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_store_connection_retryable() {
        let err = StoreError::ConnectionError("connection refused".to_string());
        assert!(err.is_retryable());
        let err = StoreError::ExtensionError("vector extension missing".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_backfill_error_wraps_leaf_errors() {
        let err: BackfillError = EmbeddingError::Timeout.into();
        assert!(matches!(err, BackfillError::EmbeddingError(_)));
        let err: BackfillError = StoreError::QueryError("boom".to_string()).into();
        assert!(matches!(err, BackfillError::StoreError(_)));
    }
}
