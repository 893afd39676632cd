//! Error types for the GIS library.

use thiserror::Error;

/// Errors raised by a [`FeatureStore`](crate::store::FeatureStore) implementation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The store could not be reached (pool exhausted, network, IO).
    #[error("feature store unavailable: {message}")]
    Connection { message: String },

    /// A uniqueness or other integrity constraint rejected the write.
    #[error("constraint violation: {message}")]
    Constraint { message: String },

    /// The statement failed for any other reason.
    #[error("query failed: {message}")]
    Query { message: String },
}

/// The projection library could not convert a position.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("projection failed: {message}")]
pub struct ProjectionError {
    pub message: String,
}

impl ProjectionError {
    pub(crate) fn from_display(err: impl std::fmt::Display) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Errors that abort a whole request.
///
/// Per-item ingestion failures are not errors; they are reported as
/// [`RejectReason`](crate::ingest::RejectReason) values inside a
/// [`BatchResult`](crate::ingest::BatchResult).
#[derive(Error, Debug)]
pub enum GisError {
    /// The path is unusable before any computation starts.
    #[error("malformed path input: {reason}")]
    MalformedPathInput { reason: String },

    /// The store failed to measure one segment of a path.
    #[error("distance query failed for segment {index}: {source}")]
    DistanceQueryFailure {
        index: usize,
        #[source]
        source: StoreError,
    },

    /// A pass-through store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Required configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias using [`GisError`].
pub type Result<T> = std::result::Result<T, GisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GisError::MalformedPathInput {
            reason: "point 3 has latitude 91".to_string(),
        };
        assert!(err.to_string().contains("point 3"));

        let err = GisError::DistanceQueryFailure {
            index: 2,
            source: StoreError::Connection {
                message: "pool timed out".to_string(),
            },
        };
        assert!(err.to_string().contains("segment 2"));
        assert!(err.to_string().contains("pool timed out"));

        let err = GisError::from(StoreError::Constraint {
            message: "duplicate key".to_string(),
        });
        assert_eq!(err.to_string(), "constraint violation: duplicate key");
    }
}
