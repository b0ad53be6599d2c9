//! # Models
//!
//! Field rules, defaults and read scopes for the platform's entities.
//! A model describes documents of one collection: which fields must be
//! present and well formed, which unique keys the collection enforces,
//! which predicate hides documents from ordinary reads, and which fields
//! never leave the server. The generic CRUD layer is parameterized over
//! this trait.

pub mod booking;
pub mod errors;
pub mod review;
pub mod tour;
pub mod user;

pub use booking::Booking;
pub use errors::{ValidationError, Validator};
pub use review::Review;
pub use tour::{Difficulty, Tour};
pub use user::{Role, User};

use serde_json::{Map, Value};

use crate::query::Predicate;
use crate::store::UniqueKey;

/// Document rules for one collection
pub trait Model: Send + Sync + 'static {
    /// Collection the model's documents live in
    const COLLECTION: &'static str;

    /// Unique keys enforced by the collection
    fn unique_keys() -> Vec<UniqueKey> {
        Vec::new()
    }

    /// Predicates silently added to every ordinary read; hides soft
    /// deleted or non-public documents.
    fn read_scope() -> Vec<Predicate> {
        Vec::new()
    }

    /// Fields stripped from every document before it leaves the server
    fn protected_fields() -> &'static [&'static str] {
        &[]
    }

    /// Fills model defaults into a new document body
    fn apply_defaults(_doc: &mut Map<String, Value>) {}

    /// Validates a complete document body. Called with the full body on
    /// create and with the merged result on update, so update patches
    /// are held to the same rules.
    fn validate(doc: &Map<String, Value>) -> Result<(), ValidationError>;
}

/// Shared field checks used by the model validators.
pub(crate) mod checks {
    use super::{Map, Validator, Value};

    pub fn required_string(v: &mut Validator, doc: &Map<String, Value>, field: &str) {
        match doc.get(field).and_then(Value::as_str) {
            Some(s) if !s.trim().is_empty() => {}
            Some(_) => v.issue(field, "must not be empty"),
            None => v.issue(field, "is required"),
        }
    }

    pub fn required_positive_number(v: &mut Validator, doc: &Map<String, Value>, field: &str) {
        match doc.get(field).and_then(Value::as_f64) {
            Some(n) if n > 0.0 => {}
            Some(_) => v.issue(field, "must be greater than 0"),
            None => v.issue(field, "is required and must be a number"),
        }
    }

    pub fn optional_number_in_range(
        v: &mut Validator,
        doc: &Map<String, Value>,
        field: &str,
        min: f64,
        max: f64,
    ) {
        if let Some(value) = doc.get(field) {
            match value.as_f64() {
                Some(n) if (min..=max).contains(&n) => {}
                _ => v.issue(field, &format!("must be between {} and {}", min, max)),
            }
        }
    }

    pub fn optional_bool(v: &mut Validator, doc: &Map<String, Value>, field: &str) {
        if let Some(value) = doc.get(field) {
            if !value.is_boolean() {
                v.issue(field, "must be a boolean");
            }
        }
    }
}
