//! CRUD Envelope Tests
//!
//! The wire contract of the generic CRUD layer, exercised through the
//! assembled platform:
//! - List and single-entity envelopes serialize to the documented shapes
//! - Create answers 201, delete answers 204 with null data
//! - Unknown ids fail with 404 and a `fail` error envelope
//! - Validation and unique-key conflicts are 400-class
//! - Scoped-out documents (secret tours, deactivated users) 404 like
//!   missing ones and never appear in lists
//! - Internal and credential fields never leave the server

use serde_json::{json, Value};
use tourbase::query::RequestParams;
use tourbase::services::ServiceError;
use tourbase::{Platform, PlatformConfig};

// =============================================================================
// Helper Functions
// =============================================================================

fn platform() -> Platform {
    Platform::new(&PlatformConfig::default()).unwrap()
}

fn tour_body(name: &str, price: f64) -> Value {
    json!({
        "name": name,
        "duration": 5,
        "max_group_size": 25,
        "difficulty": "easy",
        "price": price,
        "summary": "Envelope test tour",
    })
}

fn id_of(doc: &Value) -> String {
    doc.get("_id").and_then(Value::as_str).unwrap().to_string()
}

// =============================================================================
// Envelope Shapes
// =============================================================================

/// A list read serializes to `{status, results, data: {data: [...]}}`.
#[tokio::test]
async fn test_list_envelope_wire_shape() {
    let platform = platform();
    platform.tours().create(tour_body("The Forest Hiker", 397.0)).unwrap();
    platform.tours().create(tour_body("The Sea Explorer", 497.0)).unwrap();

    let envelope = platform.tours().list(&RequestParams::new()).unwrap();
    let wire = serde_json::to_value(&envelope).unwrap();

    assert_eq!(wire.get("status"), Some(&json!("success")));
    assert_eq!(wire.get("results"), Some(&json!(2)));
    let docs = wire
        .pointer("/data/data")
        .and_then(Value::as_array)
        .unwrap();
    assert_eq!(docs.len(), 2);
    assert!(docs.iter().all(|d| d.get("name").is_some()));
}

/// A single-entity read serializes to `{status, data: {data: {...}}}`
/// with no `results` count.
#[tokio::test]
async fn test_doc_envelope_wire_shape() {
    let platform = platform();
    let created = platform
        .tours()
        .create(tour_body("The Forest Hiker", 397.0))
        .unwrap();
    assert_eq!(created.status_code(), 201);

    let envelope = platform.tours().get(&id_of(created.document())).unwrap();
    assert_eq!(envelope.status_code(), 200);

    let wire = serde_json::to_value(&envelope).unwrap();
    assert_eq!(wire.get("status"), Some(&json!("success")));
    assert!(wire.get("results").is_none());
    assert_eq!(
        wire.pointer("/data/data/name"),
        Some(&json!("The Forest Hiker"))
    );
}

/// Deletion answers 204 and serializes `data` as JSON null.
#[tokio::test]
async fn test_delete_envelope_is_204_with_null_data() {
    let platform = platform();
    let created = platform
        .tours()
        .create(tour_body("The Forest Hiker", 397.0))
        .unwrap();
    let id = id_of(created.document());

    let envelope = platform.tours().remove(&id).unwrap();
    assert_eq!(envelope.status_code(), 204);
    let wire = serde_json::to_value(&envelope).unwrap();
    assert_eq!(wire, json!({ "status": "success", "data": null }));

    let err = platform.tours().get(&id).unwrap_err();
    assert_eq!(err.status_code(), 404);
}

// =============================================================================
// Error Classes
// =============================================================================

/// Unknown ids 404 on every single-entity operation with the same
/// message, and the error envelope labels them `fail`.
#[tokio::test]
async fn test_unknown_id_is_404_fail() {
    let platform = platform();

    let get = platform.tours().get("missing").unwrap_err();
    let update = platform
        .tours()
        .update("missing", json!({ "price": 1.0 }))
        .unwrap_err();
    let remove = platform.tours().remove("missing").unwrap_err();

    for err in [get, update, remove] {
        assert_eq!(err.status_code(), 404);
        let response = err.to_response();
        assert_eq!(response.status, "fail");
        assert_eq!(response.message, "No document found with that ID");
    }
}

/// Field-rule violations are 400 and name every offending field.
#[tokio::test]
async fn test_validation_errors_are_400_with_fields() {
    let platform = platform();
    let err = platform
        .tours()
        .create(json!({ "name": "Too short", "difficulty": "extreme" }))
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let message = err.to_string();
    assert!(message.starts_with("Invalid input data."));
    assert!(message.contains("name"));
    assert!(message.contains("difficulty"));
    assert!(message.contains("price"));
}

/// Duplicate unique keys are 400-class conflicts.
#[tokio::test]
async fn test_duplicate_keys_are_400() {
    let platform = platform();
    platform.tours().create(tour_body("The Forest Hiker", 397.0)).unwrap();
    let err = platform
        .tours()
        .create(tour_body("The Forest Hiker", 997.0))
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(err.to_string().contains("name"));

    platform
        .users()
        .signup(json!({
            "name": "First Person",
            "email": "jo@example.com",
            "password": "pass1234",
            "password_confirm": "pass1234",
        }))
        .await
        .unwrap();
    let err = platform
        .users()
        .signup(json!({
            "name": "Second Person",
            "email": "jo@example.com",
            "password": "pass1234",
            "password_confirm": "pass1234",
        }))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

/// A patch is validated against the merged document, so an update
/// cannot break rules the create path enforced.
#[tokio::test]
async fn test_update_cannot_break_field_rules() {
    let platform = platform();
    let created = platform
        .tours()
        .create(tour_body("The Forest Hiker", 397.0))
        .unwrap();
    let id = id_of(created.document());

    let err = platform
        .tours()
        .update(&id, json!({ "price": -5 }))
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    // The stored document is untouched by the failed patch.
    let kept = platform.tours().get(&id).unwrap();
    assert_eq!(kept.document().get("price"), Some(&json!(397.0)));
}

// =============================================================================
// Read Scopes
// =============================================================================

/// Secret tours are invisible: absent from lists, 404 on direct reads.
#[tokio::test]
async fn test_secret_tours_are_invisible() {
    let platform = platform();
    let mut secret = tour_body("Members Only Tour", 900.0);
    secret
        .as_object_mut()
        .unwrap()
        .insert("secret_tour".to_string(), json!(true));
    let created = platform.tours().create(secret).unwrap();
    let secret_id = id_of(created.document());
    platform.tours().create(tour_body("The Forest Hiker", 397.0)).unwrap();

    let listed = platform.tours().list(&RequestParams::new()).unwrap();
    assert_eq!(listed.results, 1);

    let err = platform.tours().get(&secret_id).unwrap_err();
    assert_eq!(err.status_code(), 404);
}

/// A deactivated account drops out of list and single reads but stays
/// stored.
#[tokio::test]
async fn test_deactivated_users_are_invisible() {
    let platform = platform();
    let envelope = platform
        .users()
        .signup(json!({
            "name": "Leaving Person",
            "email": "bye@example.com",
            "password": "pass1234",
            "password_confirm": "pass1234",
        }))
        .await
        .unwrap();
    let id = id_of(envelope.document());

    platform.users().deactivate_me(&id).unwrap();

    assert_eq!(platform.users().list(&RequestParams::new()).unwrap().results, 0);
    let err = platform.users().get(&id).unwrap_err();
    assert!(matches!(err, ServiceError::Resource(_)));
    assert_eq!(err.status_code(), 404);

    // Still stored, only scoped out.
    let raw = platform
        .db()
        .collection("users")
        .unwrap()
        .find_by_id(&id)
        .unwrap();
    assert!(raw.is_some());
}

// =============================================================================
// Field Hygiene
// =============================================================================

/// `_version` is store bookkeeping and never serialized, on any path.
#[tokio::test]
async fn test_version_field_never_leaves() {
    let platform = platform();
    let created = platform
        .tours()
        .create(tour_body("The Forest Hiker", 397.0))
        .unwrap();
    let id = id_of(created.document());
    platform.tours().update(&id, json!({ "price": 497.0 })).unwrap();

    assert!(created.document().get("_version").is_none());
    let fetched = platform.tours().get(&id).unwrap();
    assert!(fetched.document().get("_version").is_none());
    let listed = platform.tours().list(&RequestParams::new()).unwrap();
    assert!(listed.data.data[0].get("_version").is_none());
}

/// Credential fields are stripped from every served user document.
#[tokio::test]
async fn test_credential_fields_never_leave() {
    let platform = platform();
    let envelope = platform
        .users()
        .signup(json!({
            "name": "Careful Person",
            "email": "safe@example.com",
            "password": "pass1234",
            "password_confirm": "pass1234",
        }))
        .await
        .unwrap();
    let id = id_of(envelope.document());

    for doc in [
        envelope.document().clone(),
        platform.users().get(&id).unwrap().document().clone(),
        platform.users().list(&RequestParams::new()).unwrap().data.data[0].clone(),
    ] {
        assert!(doc.get("password_hash").is_none());
        assert!(doc.get("password_reset_token").is_none());
        assert!(doc.get("password_reset_expires").is_none());
        assert!(doc.get("active").is_none());
        assert!(doc.get("password").is_none());
    }
}
