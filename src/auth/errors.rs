//! # Credential Errors

use thiserror::Error;

/// Result type for credential operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors from password and reset-token handling
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// Wrong current password. The message never says which part was
    /// wrong, so nothing leaks about stored credentials.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password failed the policy
    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    /// Password and its confirmation differ
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Reset token unknown, already used, or past its expiry; the
    /// message never distinguishes which
    #[error("Token is invalid or has expired")]
    InvalidToken,

    /// Password hashing failed
    #[error("Internal error: password hashing failed")]
    HashingFailed,
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials => 401,
            AuthError::WeakPassword(_) => 400,
            AuthError::PasswordMismatch => 400,
            AuthError::InvalidToken => 400,
            AuthError::HashingFailed => 500,
        }
    }
}
