//! # Credential Handling
//!
//! Password hashing, password policy and reset-token primitives used by
//! the user service.

pub mod crypto;
pub mod errors;

pub use crypto::{
    generate_reset_token, hash_password, hash_token, reset_token_expiry, token_matches,
    verify_password, PasswordPolicy, RESET_TOKEN_TTL_MINUTES,
};
pub use errors::{AuthError, AuthResult};
