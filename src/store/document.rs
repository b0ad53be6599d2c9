//! # Document Metadata
//!
//! Store-managed fields stamped onto every document: a UUID identity, a
//! creation timestamp (the default sort key), and an internal version
//! counter excluded from reads by the default projection.

use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Document identity field
pub const ID_FIELD: &str = "_id";
/// Creation timestamp field, RFC 3339
pub const CREATED_AT_FIELD: &str = "created_at";
/// Internal version counter, incremented on every update
pub const VERSION_FIELD: &str = "_version";

/// Fields owned by the store; patches may not touch them
pub const META_FIELDS: [&str; 3] = [ID_FIELD, CREATED_AT_FIELD, VERSION_FIELD];

/// Stamps metadata onto a new document body. A caller-provided `_id`
/// (fixture data) is kept; otherwise a fresh UUID is assigned. An
/// explicit `created_at` is also kept, matching a model wanting to
/// backdate seeded documents.
pub fn stamp_new(mut body: Map<String, Value>) -> Map<String, Value> {
    let has_id = matches!(body.get(ID_FIELD), Some(Value::String(s)) if !s.is_empty());
    if !has_id {
        body.insert(
            ID_FIELD.to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );
    }
    body.entry(CREATED_AT_FIELD.to_string())
        .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
    body.insert(VERSION_FIELD.to_string(), Value::from(0));
    body
}

/// Shallow-merges a patch into a document, skipping store-managed
/// fields, and bumps the version counter.
pub fn apply_patch(doc: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        if META_FIELDS.contains(&key.as_str()) {
            continue;
        }
        doc.insert(key.clone(), value.clone());
    }
    let version = doc
        .get(VERSION_FIELD)
        .and_then(Value::as_i64)
        .unwrap_or(0);
    doc.insert(VERSION_FIELD.to_string(), Value::from(version + 1));
}

/// Extracts the identity of a stored document.
pub fn document_id(doc: &Value) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}
