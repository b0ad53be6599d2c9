//! # Grouped Aggregation
//!
//! Group-by-key reduction over a set of documents: count, sum, average,
//! min, max and push reducers. This backs both the rating recomputation
//! and the catalog statistics. Numeric reducers skip documents whose
//! field is missing or non-numeric, mirroring how a document database's
//! aggregation treats absent values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::query::filter::compare_values;
use crate::query::sort::{compare_documents, SortKey};

/// Reduction applied to each group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Accumulator {
    /// Number of documents in the group
    Count,
    /// Sum of a numeric field
    Sum(String),
    /// Arithmetic mean of a numeric field
    Avg(String),
    /// Smallest numeric value of a field
    Min(String),
    /// Largest numeric value of a field
    Max(String),
    /// All values of a field, in scan order
    Push(String),
}

/// Named output of one accumulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reducer {
    pub output: String,
    pub accumulator: Accumulator,
}

impl Reducer {
    pub fn count(output: &str) -> Self {
        Self {
            output: output.to_string(),
            accumulator: Accumulator::Count,
        }
    }

    pub fn sum(output: &str, field: &str) -> Self {
        Self {
            output: output.to_string(),
            accumulator: Accumulator::Sum(field.to_string()),
        }
    }

    pub fn avg(output: &str, field: &str) -> Self {
        Self {
            output: output.to_string(),
            accumulator: Accumulator::Avg(field.to_string()),
        }
    }

    pub fn min(output: &str, field: &str) -> Self {
        Self {
            output: output.to_string(),
            accumulator: Accumulator::Min(field.to_string()),
        }
    }

    pub fn max(output: &str, field: &str) -> Self {
        Self {
            output: output.to_string(),
            accumulator: Accumulator::Max(field.to_string()),
        }
    }

    pub fn push(output: &str, field: &str) -> Self {
        Self {
            output: output.to_string(),
            accumulator: Accumulator::Push(field.to_string()),
        }
    }
}

/// Groups documents by the value of `key_field` and applies every
/// reducer per group. Documents missing the key group under null. Rows
/// come back sorted ascending by group key so results are
/// deterministic; callers wanting another order re-sort.
pub fn group(docs: &[Value], key_field: &str, reducers: &[Reducer]) -> Vec<Value> {
    let mut groups: Vec<(Value, Vec<&Value>)> = Vec::new();

    for doc in docs {
        let key = doc.get(key_field).cloned().unwrap_or(Value::Null);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(doc),
            None => groups.push((key, vec![doc])),
        }
    }

    let mut rows: Vec<Value> = groups
        .into_iter()
        .map(|(key, members)| {
            let mut row = Map::new();
            row.insert(key_field.to_string(), key);
            for reducer in reducers {
                row.insert(reducer.output.clone(), reduce(&members, &reducer.accumulator));
            }
            Value::Object(row)
        })
        .collect();

    rows.sort_by(|a, b| compare_documents(a, b, &[SortKey::asc(key_field)]));
    rows
}

fn reduce(members: &[&Value], accumulator: &Accumulator) -> Value {
    match accumulator {
        Accumulator::Count => Value::from(members.len()),
        Accumulator::Sum(field) => {
            let sum: f64 = numeric_values(members, field).sum();
            whole_or_float(sum)
        }
        Accumulator::Avg(field) => {
            let values: Vec<f64> = numeric_values(members, field).collect();
            if values.is_empty() {
                Value::Null
            } else {
                Value::from(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
        Accumulator::Min(field) => extreme(members, field, std::cmp::Ordering::Less),
        Accumulator::Max(field) => extreme(members, field, std::cmp::Ordering::Greater),
        Accumulator::Push(field) => Value::Array(
            members
                .iter()
                .filter_map(|doc| doc.get(field).cloned())
                .collect(),
        ),
    }
}

fn numeric_values<'a>(
    members: &'a [&Value],
    field: &'a str,
) -> impl Iterator<Item = f64> + 'a {
    members
        .iter()
        .filter_map(move |doc| doc.get(field).and_then(Value::as_f64))
}

/// Keeps the winning field value in its original representation, so a
/// min over integer prices stays an integer.
fn extreme(members: &[&Value], field: &str, wanted: std::cmp::Ordering) -> Value {
    let mut best: Option<&Value> = None;
    for doc in members {
        let candidate = match doc.get(field) {
            Some(v) if v.is_number() => v,
            _ => continue,
        };
        best = match best {
            None => Some(candidate),
            Some(current) => {
                if compare_values(candidate, current) == Some(wanted) {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.cloned().unwrap_or(Value::Null)
}

fn whole_or_float(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}
