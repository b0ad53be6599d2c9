//! # Resource Errors
//!
//! The service-level error surface. Component errors convert into this
//! enum so every operation exposes one `status_code()` for the HTTP
//! adapter, and one wire shape for error envelopes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ValidationError;
use crate::query::QueryError;
use crate::store::StoreError;

/// Result type for resource operations
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Errors surfaced by the CRUD and domain services
#[derive(Debug, Clone, Error)]
pub enum ResourceError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Single-entity operation found nothing
    #[error("No document found with that ID")]
    NotFound,

    /// Malformed list-query input
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Model field rules rejected the document
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // ==================
    // Store Failures
    // ==================
    /// Unique-key conflicts (400) and internal store faults (500)
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResourceError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ResourceError::NotFound => 404,
            ResourceError::Query(e) => e.status_code(),
            ResourceError::Validation(e) => e.status_code(),
            ResourceError::Store(e) => e.status_code(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

/// Wire shape of a failed operation: `fail` for client errors, `error`
/// for server faults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn from_error(error: &ResourceError) -> Self {
        let status = if error.is_client_error() {
            "fail"
        } else {
            "error"
        };
        Self {
            status: status.to_string(),
            message: error.to_string(),
        }
    }
}
