//! # Service Errors
//!
//! Domain operations can fail in more ways than plain CRUD: wrong
//! credentials, undeliverable email, lookups by something other than an
//! id. This enum folds those on top of the resource errors so every
//! service call still exposes one `status_code()`.

use thiserror::Error;

use crate::auth::AuthError;
use crate::mailer::MailError;
use crate::models::ValidationError;
use crate::query::QueryError;
use crate::resource::{ErrorResponse, ResourceError};
use crate::store::StoreError;

/// Result type for domain service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced by the domain services
#[derive(Debug, Error)]
pub enum ServiceError {
    // ==================
    // CRUD
    // ==================
    #[error(transparent)]
    Resource(#[from] ResourceError),

    // ==================
    // Accounts
    // ==================
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Email lookup found no account
    #[error("There is no user with that email address")]
    UnknownEmail,

    /// Profile update tried to smuggle in a password change
    #[error("This route is not for password updates")]
    PasswordUpdateNotAllowed,

    // ==================
    // Email
    // ==================
    #[error(transparent)]
    Mail(#[from] MailError),
}

impl ServiceError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Resource(e) => e.status_code(),
            ServiceError::Auth(e) => e.status_code(),
            ServiceError::UnknownEmail => 404,
            ServiceError::PasswordUpdateNotAllowed => 400,
            ServiceError::Mail(e) => e.status_code(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Wire shape of this error
    pub fn to_response(&self) -> ErrorResponse {
        let status = if self.is_client_error() {
            "fail"
        } else {
            "error"
        };
        ErrorResponse {
            status: status.to_string(),
            message: self.to_string(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        ServiceError::Resource(error.into())
    }
}

impl From<QueryError> for ServiceError {
    fn from(error: QueryError) -> Self {
        ServiceError::Resource(error.into())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(error: ValidationError) -> Self {
        ServiceError::Resource(error.into())
    }
}
