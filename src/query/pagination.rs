//! # Pagination Window
//!
//! Page/limit windowing with silent fallback: a missing, non-numeric or
//! non-positive `page` or `limit` uses the default instead of failing
//! the request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 100;

/// Window of a list result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    pub fn new(page: usize, limit: usize) -> Self {
        Self { page, limit }
    }

    /// Number of documents skipped before the window starts
    pub fn skip(&self) -> usize {
        (self.page - 1) * self.limit
    }

    /// Reads `page` and `limit` out of a parameter mapping.
    pub fn from_params(params: &serde_json::Map<String, Value>) -> Self {
        Self {
            page: parse_component(params.get("page"), DEFAULT_PAGE),
            limit: parse_component(params.get("limit"), DEFAULT_LIMIT),
        }
    }
}

/// Positive-integer parse with fallback. Accepts both string values (the
/// query-string case) and numbers (a decoder that already coerced).
fn parse_component(raw: Option<&Value>, default: usize) -> usize {
    let parsed = match raw {
        Some(Value::String(s)) => s.trim().parse::<usize>().ok(),
        Some(Value::Number(n)) => n.as_u64().map(|n| n as usize),
        _ => None,
    };
    match parsed {
        Some(n) if n >= 1 => n,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(page: Value, limit: Value) -> serde_json::Map<String, Value> {
        let mut map = serde_json::Map::new();
        map.insert("page".to_string(), page);
        map.insert("limit".to_string(), limit);
        map
    }

    #[test]
    fn test_defaults_when_absent() {
        let pagination = Pagination::from_params(&serde_json::Map::new());
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 100);
        assert_eq!(pagination.skip(), 0);
    }

    #[test]
    fn test_skip_formula() {
        let pagination = Pagination::from_params(&params(json!("2"), json!("10")));
        assert_eq!(pagination.page, 2);
        assert_eq!(pagination.limit, 10);
        assert_eq!(pagination.skip(), 10);
    }

    #[test]
    fn test_non_numeric_values_fall_back() {
        let pagination = Pagination::from_params(&params(json!("abc"), json!("ten")));
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 100);
    }

    #[test]
    fn test_zero_and_negative_values_fall_back() {
        let pagination = Pagination::from_params(&params(json!("0"), json!("-5")));
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 100);
    }

    #[test]
    fn test_numeric_json_values_accepted() {
        let pagination = Pagination::from_params(&params(json!(3), json!(25)));
        assert_eq!(pagination.page, 3);
        assert_eq!(pagination.skip(), 50);
    }
}
