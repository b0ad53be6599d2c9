//! # Field Projection
//!
//! Field selection for list and single-document reads. An explicit
//! inclusion list always retains the document identity; the default
//! projection only strips the store's internal version field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::query::errors::{QueryError, QueryResult};
use crate::store::document::{ID_FIELD, VERSION_FIELD};

/// Which fields of a document survive a read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    /// Keep only the listed fields (plus `_id`)
    Include(Vec<String>),
    /// Keep everything except the listed fields
    Exclude(Vec<String>),
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Exclude(vec![VERSION_FIELD.to_string()])
    }
}

impl Projection {
    /// Parses a comma-separated `fields` value. A `-` prefix marks an
    /// exclusion; one list must not mix both kinds.
    pub fn parse(raw: &str) -> QueryResult<Projection> {
        let mut include = Vec::new();
        let mut exclude = Vec::new();

        for token in raw.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match token.strip_prefix('-') {
                Some(field) if !field.is_empty() => exclude.push(field.to_string()),
                Some(_) => {}
                None => include.push(token.to_string()),
            }
        }

        match (include.is_empty(), exclude.is_empty()) {
            (true, true) => Ok(Projection::default()),
            (false, true) => Ok(Projection::Include(include)),
            (true, false) => Ok(Projection::Exclude(exclude)),
            (false, false) => Err(QueryError::MixedProjection),
        }
    }

    /// Applies the projection to one document, returning the narrowed
    /// copy. Non-object values pass through untouched.
    pub fn apply(&self, doc: &Value) -> Value {
        let fields = match doc.as_object() {
            Some(fields) => fields,
            None => return doc.clone(),
        };

        match self {
            Projection::Include(keep) => {
                let mut out = serde_json::Map::new();
                if let Some(id) = fields.get(ID_FIELD) {
                    out.insert(ID_FIELD.to_string(), id.clone());
                }
                for field in keep {
                    if field == ID_FIELD {
                        continue;
                    }
                    if let Some(value) = fields.get(field) {
                        out.insert(field.clone(), value.clone());
                    }
                }
                Value::Object(out)
            }
            Projection::Exclude(drop) => {
                let mut out = fields.clone();
                for field in drop {
                    out.remove(field);
                }
                Value::Object(out)
            }
        }
    }
}
