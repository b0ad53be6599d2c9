//! # Store Errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the document store
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Collection was never registered with the database
    #[error("Collection '{0}' is not registered")]
    CollectionNotFound(String),

    /// A write would violate a unique key
    #[error("Duplicate value for unique key [{key}] in '{collection}'")]
    DuplicateKey { collection: String, key: String },

    /// Lookup by id found nothing
    #[error("Document '{id}' not found in '{collection}'")]
    DocumentNotFound { collection: String, id: String },

    /// Poisoned lock or other unrecoverable internal state
    #[error("Store internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn duplicate_key(collection: &str, fields: &[String]) -> Self {
        StoreError::DuplicateKey {
            collection: collection.to_string(),
            key: fields.join(", "),
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::DuplicateKey { .. } => 400,
            StoreError::DocumentNotFound { .. } => 404,
            StoreError::CollectionNotFound(_) => 500,
            StoreError::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let dup = StoreError::duplicate_key("reviews", &["tour".into(), "user".into()]);
        assert_eq!(dup.status_code(), 400);
        assert!(dup.to_string().contains("tour, user"));

        let missing = StoreError::DocumentNotFound {
            collection: "tours".to_string(),
            id: "x".to_string(),
        };
        assert_eq!(missing.status_code(), 404);
        assert_eq!(StoreError::Internal("lock poisoned".into()).status_code(), 500);
    }
}
