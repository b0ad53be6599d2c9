//! # Mailer Errors

use thiserror::Error;

/// Result type for mail operations
pub type MailResult<T> = Result<T, MailError>;

/// Errors raised while composing or delivering email
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build email: {0}")]
    BuildFailed(String),

    #[error("There was an error sending the email: {0}")]
    TransportFailed(String),
}

impl MailError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mail_errors_are_server_side() {
        assert_eq!(MailError::InvalidAddress("x".into()).status_code(), 500);
        assert_eq!(MailError::TransportFailed("x".into()).status_code(), 500);
    }
}
