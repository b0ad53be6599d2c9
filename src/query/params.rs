//! # Request Parameter Parsing
//!
//! Turns the flat parameter mapping of a list request into filter
//! predicates. Reserved keys (`page`, `sort`, `limit`, `fields`) drive
//! the other query facets and never become predicates. The caller's
//! mapping is read, never mutated.

use serde_json::Value;

use crate::query::errors::{QueryError, QueryResult};
use crate::query::filter::{FilterOp, Predicate};

/// The flat key-value mapping an HTTP query-string decoder produces:
/// string scalars, or one level of operator nesting
/// (`duration[gte]=5` arrives as `{"duration": {"gte": "5"}}`).
pub type RequestParams = serde_json::Map<String, Value>;

/// Parameter keys that configure the query rather than filter it
pub const RESERVED_KEYS: [&str; 4] = ["page", "sort", "limit", "fields"];

/// Extracts filter predicates from a parameter mapping.
///
/// Scalar values become equality predicates. Nested objects must contain
/// only operator names from the closed request set; anything else is a
/// parse error rather than a silently dropped key.
pub fn parse_filters(params: &RequestParams) -> QueryResult<Vec<Predicate>> {
    let mut predicates = Vec::new();

    for (key, value) in params {
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        match value {
            Value::Object(operators) => {
                for (name, operand) in operators {
                    let op = FilterOp::from_request_name(name).ok_or_else(|| {
                        QueryError::UnknownOperator {
                            field: key.clone(),
                            operator: name.clone(),
                        }
                    })?;
                    if operand.is_object() || operand.is_array() {
                        return Err(QueryError::NonScalarOperand {
                            field: key.clone(),
                            operator: name.clone(),
                        });
                    }
                    predicates.push(Predicate::new(key.clone(), op, coerce_operand(operand)));
                }
            }
            Value::Array(_) => {
                return Err(QueryError::NonScalarOperand {
                    field: key.clone(),
                    operator: FilterOp::Eq.as_str().to_string(),
                });
            }
            scalar => predicates.push(Predicate::eq(key.clone(), coerce_operand(scalar))),
        }
    }

    Ok(predicates)
}

/// Query-string values arrive as strings; infer the intended type so
/// `duration[gte]=5` compares numerically. Values a decoder already
/// typed pass through unchanged.
fn coerce_operand(operand: &Value) -> Value {
    match operand {
        Value::String(raw) => infer_scalar(raw),
        other => other.clone(),
    }
}

/// Type inference for a raw string value: null, boolean, integer, float,
/// else the string itself.
pub fn infer_scalar(raw: &str) -> Value {
    let trimmed = raw.trim();
    match trimmed {
        "null" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        if float.is_finite() {
            return Value::from(float);
        }
    }
    Value::String(raw.to_string())
}
