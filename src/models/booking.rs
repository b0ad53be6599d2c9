//! # Booking Model
//!
//! A paid (or pending) reservation of one tour by one user, recorded
//! when a checkout completes.

use serde_json::{Map, Value};

use crate::models::checks;
use crate::models::errors::{ValidationError, Validator};
use crate::models::Model;

/// Marker for the bookings collection
pub struct Booking;

impl Model for Booking {
    const COLLECTION: &'static str = "bookings";

    fn apply_defaults(doc: &mut Map<String, Value>) {
        doc.entry("paid".to_string()).or_insert(Value::Bool(true));
    }

    fn validate(doc: &Map<String, Value>) -> Result<(), ValidationError> {
        let mut v = Validator::new();
        checks::required_string(&mut v, doc, "tour");
        checks::required_string(&mut v, doc, "user");
        checks::required_positive_number(&mut v, doc, "price");
        checks::optional_bool(&mut v, doc, "paid");
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_booking_defaults_to_paid() {
        let mut body = json!({ "tour": "t1", "user": "u1", "price": 497 })
            .as_object()
            .cloned()
            .unwrap();
        Booking::apply_defaults(&mut body);
        assert_eq!(body.get("paid"), Some(&json!(true)));
        assert!(Booking::validate(&body).is_ok());
    }

    #[test]
    fn test_price_must_be_positive() {
        let body = json!({ "tour": "t1", "user": "u1", "price": 0 })
            .as_object()
            .cloned()
            .unwrap();
        assert!(Booking::validate(&body).is_err());
    }
}
