//! # Sort Keys
//!
//! Ordered multi-key sorting for list queries. A `-` prefix on a field
//! name means descending; later keys break ties left by earlier ones.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::query::filter::compare_values;
use crate::store::document::CREATED_AT_FIELD;

/// Sort direction for a single key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One (field, direction) pair of a sort order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parses one token of a `sort` parameter. Empty tokens (stray
    /// commas) yield `None`.
    pub fn parse(token: &str) -> Option<SortKey> {
        let token = token.trim();
        if let Some(field) = token.strip_prefix('-') {
            if field.is_empty() {
                return None;
            }
            return Some(SortKey::desc(field));
        }
        if token.is_empty() {
            return None;
        }
        Some(SortKey::asc(token))
    }
}

/// Splits a comma-separated `sort` value into ordered sort keys.
pub fn parse_sort(raw: &str) -> Vec<SortKey> {
    raw.split(',').filter_map(SortKey::parse).collect()
}

/// The sort applied when a request carries no `sort` parameter:
/// newest documents first.
pub fn default_sort() -> Vec<SortKey> {
    vec![SortKey::desc(CREATED_AT_FIELD)]
}

/// Compares two documents under an ordered key list. The first key that
/// distinguishes the documents decides; equal documents stay in their
/// original order under a stable sort.
pub fn compare_documents(a: &Value, b: &Value, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ordering = compare_field(a.get(&key.field), b.get(&key.field));
        let ordering = match key.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Field comparison for sorting. Values of different types order by a
/// fixed type rank so mixed collections still sort deterministically;
/// a missing field sorts like null (lowest).
fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);

    let rank_a = type_rank(a);
    let rank_b = type_rank(b);
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    compare_values(a, b).unwrap_or(Ordering::Equal)
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
