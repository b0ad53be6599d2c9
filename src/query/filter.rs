//! # Filter Predicates
//!
//! Typed comparison predicates for list queries. The operator set accepted
//! from request parameters is closed (`gt`, `gte`, `lt`, `lte`, plus the
//! implicit equality of a scalar value); `ne` and `in` exist only for
//! internally constructed queries such as read scopes and id-set lookups.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator applied to a single document field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl FilterOp {
    /// Maps an operator name from a request parameter onto the closed
    /// request-facing set. Equality is implicit (a scalar value), so `eq`
    /// is not accepted here, and neither are the internal-only operators.
    pub fn from_request_name(name: &str) -> Option<FilterOp> {
        match name {
            "gt" => Some(FilterOp::Gt),
            "gte" => Some(FilterOp::Gte),
            "lt" => Some(FilterOp::Lt),
            "lte" => Some(FilterOp::Lte),
            _ => None,
        }
    }

    /// Operator name as it appears in requests and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Ne => "ne",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::In => "in",
        }
    }
}

/// One field comparison within a filter; all predicates of a query must
/// hold for a document to match (AND semantics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Ne, value)
    }

    pub fn gte(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Gte, value)
    }

    pub fn lte(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOp::Lte, value)
    }

    /// Membership predicate over a set of candidate values
    pub fn within(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, FilterOp::In, Value::Array(values))
    }

    /// Evaluates this predicate against a document.
    ///
    /// A document missing the field does not match, with one exception:
    /// `ne` treats an absent field as "not equal", so read scopes like
    /// `secret_tour ne true` also cover documents written before the
    /// field existed.
    pub fn matches(&self, doc: &Value) -> bool {
        let actual = match doc.get(&self.field) {
            Some(v) => v,
            None => return self.op == FilterOp::Ne,
        };

        match self.op {
            FilterOp::Eq => values_equal(actual, &self.value),
            FilterOp::Ne => !values_equal(actual, &self.value),
            FilterOp::In => match &self.value {
                Value::Array(candidates) => {
                    candidates.iter().any(|c| values_equal(actual, c))
                }
                other => values_equal(actual, other),
            },
            FilterOp::Gt => matches_ordering(actual, &self.value, &[Ordering::Greater]),
            FilterOp::Gte => {
                matches_ordering(actual, &self.value, &[Ordering::Greater, Ordering::Equal])
            }
            FilterOp::Lt => matches_ordering(actual, &self.value, &[Ordering::Less]),
            FilterOp::Lte => {
                matches_ordering(actual, &self.value, &[Ordering::Less, Ordering::Equal])
            }
        }
    }
}

fn matches_ordering(actual: &Value, expected: &Value, accepted: &[Ordering]) -> bool {
    match compare_values(actual, expected) {
        Some(ordering) => accepted.contains(&ordering),
        None => false,
    }
}

/// Equality with numeric coercion: `5` and `5.0` are the same value.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Ordering between two values of comparable types. Numbers compare
/// across integer/float representations; strings and booleans compare
/// within their own type. Nulls, arrays and objects are not ordered, so
/// range operators never match them.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => {
            let x = a.as_f64()?;
            let y = b.as_f64()?;
            x.partial_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
