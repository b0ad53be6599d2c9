//! # Validation Errors

use thiserror::Error;

/// Failed field validations for one document, all collected before
/// reporting so a client sees every problem at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid input data. {}", issues.join(". "))]
pub struct ValidationError {
    pub issues: Vec<String>,
}

impl ValidationError {
    pub fn single(field: &str, message: &str) -> Self {
        Self {
            issues: vec![format!("{}: {}", field, message)],
        }
    }

    pub fn status_code(&self) -> u16 {
        400
    }
}

/// Collects per-field issues during validation.
#[derive(Debug, Default)]
pub struct Validator {
    issues: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, field: &str, message: &str) {
        self.issues.push(format!("{}: {}", field, message));
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                issues: self.issues,
            })
        }
    }
}
