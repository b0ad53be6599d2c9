//! # Tour Model
//!
//! The catalog entity. Tours carry the denormalized rating statistics
//! the aggregator maintains (`ratings_quantity`, `ratings_average`) and
//! a `secret_tour` flag that hides a tour from ordinary catalog reads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::checks;
use crate::models::errors::{ValidationError, Validator};
use crate::models::Model;
use crate::query::Predicate;
use crate::store::UniqueKey;

/// New tours start at the product-default rating before any review
pub const DEFAULT_RATING: f64 = 4.5;

/// Denormalized review count maintained by the rating aggregator
pub const RATINGS_QUANTITY_FIELD: &str = "ratings_quantity";

/// Denormalized review mean maintained by the rating aggregator
pub const RATINGS_AVERAGE_FIELD: &str = "ratings_average";

/// Tour difficulty grades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Difficult,
}

impl Difficulty {
    pub fn parse(raw: &str) -> Option<Difficulty> {
        match raw {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "difficult" => Some(Difficulty::Difficult),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Difficult => "difficult",
        }
    }
}

/// Marker for the tours collection
pub struct Tour;

impl Tour {
    /// URL-safe slug derived from the tour name: lowercased, with runs
    /// of non-alphanumeric characters collapsed to single hyphens.
    pub fn slugify(name: &str) -> String {
        let mut slug = String::with_capacity(name.len());
        let mut pending_hyphen = false;
        for c in name.chars() {
            if c.is_alphanumeric() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                for lower in c.to_lowercase() {
                    slug.push(lower);
                }
            } else {
                pending_hyphen = true;
            }
        }
        slug
    }
}

impl Model for Tour {
    const COLLECTION: &'static str = "tours";

    fn unique_keys() -> Vec<UniqueKey> {
        vec![UniqueKey::on(&["name"])]
    }

    fn read_scope() -> Vec<Predicate> {
        vec![Predicate::ne("secret_tour", Value::Bool(true))]
    }

    fn apply_defaults(doc: &mut Map<String, Value>) {
        doc.entry(RATINGS_AVERAGE_FIELD.to_string())
            .or_insert_with(|| Value::from(DEFAULT_RATING));
        doc.entry(RATINGS_QUANTITY_FIELD.to_string())
            .or_insert_with(|| Value::from(0));
        doc.entry("secret_tour".to_string())
            .or_insert(Value::Bool(false));
        doc.entry("images".to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Some(name) = doc.get("name").and_then(Value::as_str) {
            let slug = Tour::slugify(name);
            doc.entry("slug".to_string())
                .or_insert_with(|| Value::String(slug));
        }
    }

    fn validate(doc: &Map<String, Value>) -> Result<(), ValidationError> {
        let mut v = Validator::new();

        match doc.get("name").and_then(Value::as_str) {
            Some(name) => {
                let len = name.trim().chars().count();
                if !(10..=40).contains(&len) {
                    v.issue("name", "must be between 10 and 40 characters");
                }
            }
            None => v.issue("name", "is required"),
        }

        checks::required_positive_number(&mut v, doc, "duration");
        checks::required_positive_number(&mut v, doc, "max_group_size");
        checks::required_positive_number(&mut v, doc, "price");
        checks::required_string(&mut v, doc, "summary");

        match doc.get("difficulty").and_then(Value::as_str) {
            Some(raw) if Difficulty::parse(raw).is_some() => {}
            Some(_) => v.issue("difficulty", "must be easy, medium or difficult"),
            None => v.issue("difficulty", "is required"),
        }

        if let Some(discount) = doc.get("price_discount") {
            let discount = discount.as_f64();
            let price = doc.get("price").and_then(Value::as_f64);
            match (discount, price) {
                (Some(d), Some(p)) if d < p => {}
                (Some(_), Some(_)) => {
                    v.issue("price_discount", "must be below the regular price")
                }
                _ => v.issue("price_discount", "must be a number"),
            }
        }

        checks::optional_number_in_range(&mut v, doc, "ratings_average", 1.0, 5.0);
        checks::optional_bool(&mut v, doc, "secret_tour");

        if let Some(dates) = doc.get("start_dates") {
            match dates.as_array() {
                Some(entries) => {
                    let all_parse = entries.iter().all(|d| {
                        d.as_str()
                            .map(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok())
                            .unwrap_or(false)
                    });
                    if !all_parse {
                        v.issue("start_dates", "must be RFC 3339 timestamps");
                    }
                }
                None => v.issue("start_dates", "must be a list of timestamps"),
            }
        }

        v.finish()
    }
}
