//! # Review Model
//!
//! The child entity of the rating aggregation: each review references
//! exactly one tour and contributes its `rating` to that tour's
//! statistics. One review per (tour, user) pair.

use serde_json::{Map, Value};

use crate::models::checks;
use crate::models::errors::{ValidationError, Validator};
use crate::models::Model;
use crate::store::UniqueKey;

/// Field holding the parent tour reference
pub const TOUR_FIELD: &str = "tour";
/// Field holding the authoring user reference
pub const USER_FIELD: &str = "user";
/// Field aggregated into the tour statistics
pub const RATING_FIELD: &str = "rating";

/// Marker for the reviews collection
pub struct Review;

impl Model for Review {
    const COLLECTION: &'static str = "reviews";

    fn unique_keys() -> Vec<UniqueKey> {
        vec![UniqueKey::on(&[TOUR_FIELD, USER_FIELD])]
    }

    fn validate(doc: &Map<String, Value>) -> Result<(), ValidationError> {
        let mut v = Validator::new();

        checks::required_string(&mut v, doc, "review");
        checks::required_string(&mut v, doc, TOUR_FIELD);
        checks::required_string(&mut v, doc, USER_FIELD);

        match doc.get(RATING_FIELD).and_then(Value::as_f64) {
            Some(rating) if (1.0..=5.0).contains(&rating) => {}
            Some(_) => v.issue(RATING_FIELD, "must be between 1 and 5"),
            None => v.issue(RATING_FIELD, "is required and must be a number"),
        }

        v.finish()
    }
}
