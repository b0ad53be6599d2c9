//! # User Model
//!
//! Accounts. Credential fields (`password_hash` and the reset-token
//! pair) never leave the server; deactivated accounts stay stored but
//! are invisible to ordinary reads.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::checks;
use crate::models::errors::{ValidationError, Validator};
use crate::models::Model;
use crate::query::Predicate;
use crate::store::UniqueKey;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("email pattern compiles")
});

pub const EMAIL_FIELD: &str = "email";
pub const ACTIVE_FIELD: &str = "active";
pub const PASSWORD_HASH_FIELD: &str = "password_hash";
pub const PASSWORD_CHANGED_AT_FIELD: &str = "password_changed_at";
pub const RESET_TOKEN_FIELD: &str = "password_reset_token";
pub const RESET_EXPIRES_FIELD: &str = "password_reset_expires";

/// Account roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    User,
    Guide,
    LeadGuide,
    Admin,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Role> {
        match raw {
            "user" => Some(Role::User),
            "guide" => Some(Role::Guide),
            "lead-guide" => Some(Role::LeadGuide),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Guide => "guide",
            Role::LeadGuide => "lead-guide",
            Role::Admin => "admin",
        }
    }
}

/// Marker for the users collection
pub struct User;

impl User {
    pub fn email_is_valid(email: &str) -> bool {
        EMAIL_RE.is_match(email)
    }
}

impl Model for User {
    const COLLECTION: &'static str = "users";

    fn unique_keys() -> Vec<UniqueKey> {
        vec![UniqueKey::on(&["email"])]
    }

    fn read_scope() -> Vec<Predicate> {
        vec![Predicate::ne(ACTIVE_FIELD, Value::Bool(false))]
    }

    fn protected_fields() -> &'static [&'static str] {
        &[
            PASSWORD_HASH_FIELD,
            RESET_TOKEN_FIELD,
            RESET_EXPIRES_FIELD,
            ACTIVE_FIELD,
        ]
    }

    fn apply_defaults(doc: &mut Map<String, Value>) {
        doc.entry("photo".to_string())
            .or_insert_with(|| Value::String("default.jpg".to_string()));
        doc.entry("role".to_string())
            .or_insert_with(|| Value::String(Role::User.as_str().to_string()));
        doc.entry(ACTIVE_FIELD.to_string()).or_insert(Value::Bool(true));
        if let Some(Value::String(email)) = doc.get_mut(EMAIL_FIELD) {
            *email = email.trim().to_lowercase();
        }
    }

    fn validate(doc: &Map<String, Value>) -> Result<(), ValidationError> {
        let mut v = Validator::new();

        checks::required_string(&mut v, doc, "name");

        match doc.get("email").and_then(Value::as_str) {
            Some(email) if User::email_is_valid(email) => {}
            Some(_) => v.issue("email", "must be a valid email address"),
            None => v.issue("email", "is required"),
        }

        if let Some(role) = doc.get("role") {
            match role.as_str().and_then(Role::parse) {
                Some(_) => {}
                None => v.issue("role", "must be user, guide, lead-guide or admin"),
            }
        }

        checks::optional_bool(&mut v, doc, "active");

        v.finish()
    }
}
