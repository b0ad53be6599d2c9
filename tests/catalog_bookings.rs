//! Catalog and Booking Tests
//!
//! Cross-service behavior through the assembled platform:
//! - The analytics reads (top five, stats rollup) see the rating
//!   statistics the aggregator recomputed from reviews
//! - Checkout recording resolves the paying user and feeds the
//!   "my tours" read
//! - Review reads serve the author's display card, stored data keeps
//!   the raw id

use serde_json::{json, Value};
use tourbase::query::RequestParams;
use tourbase::{Platform, PlatformConfig};

// =============================================================================
// Helper Functions
// =============================================================================

fn platform() -> Platform {
    Platform::new(&PlatformConfig::default()).unwrap()
}

fn tour_body(name: &str, price: f64, difficulty: &str) -> Value {
    json!({
        "name": name,
        "duration": 5,
        "max_group_size": 25,
        "difficulty": difficulty,
        "price": price,
        "summary": "Cross-service test tour",
    })
}

fn create_tour(platform: &Platform, name: &str, price: f64, difficulty: &str) -> String {
    let envelope = platform
        .tours()
        .create(tour_body(name, price, difficulty))
        .unwrap();
    id_of(envelope.document())
}

async fn sign_up(platform: &Platform, name: &str, email: &str) -> String {
    let envelope = platform
        .users()
        .signup(json!({
            "name": name,
            "email": email,
            "password": "pass1234",
            "password_confirm": "pass1234",
        }))
        .await
        .unwrap();
    id_of(envelope.document())
}

fn review(platform: &Platform, tour: &str, user: &str, rating: f64) -> String {
    let envelope = platform
        .reviews()
        .create(
            json!({ "review": "Posted by the test", "rating": rating }),
            Some(tour),
            Some(user),
        )
        .unwrap();
    id_of(envelope.document())
}

fn id_of(doc: &Value) -> String {
    doc.get("_id").and_then(Value::as_str).unwrap().to_string()
}

// =============================================================================
// Analytics After Recompute
// =============================================================================

/// The top-five read orders by the recomputed means, not the defaults
/// the tours were created with.
#[tokio::test]
async fn test_top_tours_reflect_settled_ratings() {
    let platform = platform();
    let acclaimed = create_tour(&platform, "The Acclaimed Tour", 300.0, "easy");
    let panned = create_tour(&platform, "The Panned Tour", 100.0, "easy");
    create_tour(&platform, "The Unreviewed Tour", 200.0, "easy");

    review(&platform, &acclaimed, "u1", 5.0);
    review(&platform, &acclaimed, "u2", 5.0);
    review(&platform, &panned, "u1", 3.0);
    platform.settle_ratings().await.unwrap();

    let envelope = platform.tours().top_tours().unwrap();
    assert_eq!(envelope.results, 3);
    let means: Vec<f64> = envelope
        .data
        .data
        .iter()
        .map(|doc| doc.get("ratings_average").and_then(Value::as_f64).unwrap())
        .collect();
    // Reviewed 5.0 first, the untouched default 4.5 next, then 3.0.
    assert_eq!(means, vec![5.0, 4.5, 3.0]);
}

/// The stats rollup works off the live statistics: a tour reviewed
/// below the cut drops out, review counts feed `num_ratings`.
#[tokio::test]
async fn test_tour_stats_follow_review_recompute() {
    let platform = platform();
    let steady = create_tour(&platform, "The Steady Tour", 100.0, "easy");
    let sliding = create_tour(&platform, "The Sliding Tour", 100.0, "medium");
    create_tour(&platform, "The Untouched Tour", 300.0, "easy");

    review(&platform, &steady, "u1", 5.0);
    review(&platform, &steady, "u2", 4.0);
    review(&platform, &sliding, "u1", 3.0);
    platform.settle_ratings().await.unwrap();

    let envelope = platform.tours().tour_stats().unwrap();
    // The sliding tour's 3.0 mean is under the 4.5 cut; only the easy
    // row is left.
    assert_eq!(envelope.results, 1);
    let easy = &envelope.data.data[0];
    assert_eq!(easy.get("difficulty"), Some(&json!("EASY")));
    assert_eq!(easy.get("num_tours"), Some(&json!(2)));
    assert_eq!(easy.get("num_ratings").and_then(Value::as_f64), Some(2.0));
    assert_eq!(easy.get("avg_price").and_then(Value::as_f64), Some(200.0));
}

/// Removing the only review through the service puts the tour back on
/// the product defaults.
#[tokio::test]
async fn test_removing_last_review_restores_defaults() {
    let platform = platform();
    let tour = create_tour(&platform, "The Reviewed Tour", 100.0, "easy");

    let review_id = review(&platform, &tour, "u1", 2.0);
    platform.settle_ratings().await.unwrap();
    let rated = platform.tours().get(&tour).unwrap();
    assert_eq!(rated.document().get("ratings_average"), Some(&json!(2.0)));
    assert_eq!(rated.document().get("ratings_quantity"), Some(&json!(1)));

    platform.reviews().remove(&review_id).unwrap();
    platform.settle_ratings().await.unwrap();
    let reset = platform.tours().get(&tour).unwrap();
    assert_eq!(reset.document().get("ratings_average"), Some(&json!(4.5)));
    assert_eq!(reset.document().get("ratings_quantity"), Some(&json!(0)));
}

// =============================================================================
// Checkout and My Tours
// =============================================================================

/// A recorded checkout resolves the payer by email, converts the
/// charged minor units and shows up in the user's booked tours.
#[tokio::test]
async fn test_checkout_feeds_my_tours() {
    let platform = platform();
    let user = sign_up(&platform, "Laura Wilson", "laura@example.com").await;
    let hiking = create_tour(&platform, "The Forest Hiker", 397.0, "easy");
    let rafting = create_tour(&platform, "The River Rafter", 497.0, "medium");
    create_tour(&platform, "The Skipped Tour", 197.0, "easy");

    let booked = platform
        .bookings()
        .record_checkout(&hiking, "Laura@Example.com", 39_700)
        .unwrap();
    assert_eq!(booked.status_code(), 201);
    assert_eq!(booked.document().get("user"), Some(&json!(user)));
    assert_eq!(
        booked.document().get("price").and_then(Value::as_f64),
        Some(397.0)
    );
    platform
        .bookings()
        .record_checkout(&rafting, "laura@example.com", 49_700)
        .unwrap();

    let mine = platform.bookings().tours_booked_by(&user).unwrap();
    assert_eq!(mine.results, 2);
    let names: Vec<&str> = mine
        .data
        .data
        .iter()
        .map(|doc| doc.get("name").and_then(Value::as_str).unwrap())
        .collect();
    assert!(names.contains(&"The Forest Hiker"));
    assert!(names.contains(&"The River Rafter"));
}

// =============================================================================
// Author Cards
// =============================================================================

/// Review reads replace the raw author id with the display card; the
/// stored document keeps the plain id.
#[tokio::test]
async fn test_review_reads_serve_author_cards() {
    let platform = platform();
    let laura = sign_up(&platform, "Laura Wilson", "laura@example.com").await;
    let ben = sign_up(&platform, "Ben Hadley", "ben@example.com").await;
    let tour = create_tour(&platform, "The Forest Hiker", 397.0, "easy");

    let review_id = review(&platform, &tour, &laura, 5.0);
    review(&platform, &tour, &ben, 4.0);

    let single = platform.reviews().get(&review_id).unwrap();
    assert_eq!(
        single.document().get("user"),
        Some(&json!({
            "_id": laura,
            "name": "Laura Wilson",
            "photo": "default.jpg",
        }))
    );

    let listed = platform
        .reviews()
        .list_for_tour(&tour, &RequestParams::new())
        .unwrap();
    assert_eq!(listed.results, 2);
    assert!(listed
        .data
        .data
        .iter()
        .all(|doc| doc.get("user").map(Value::is_object).unwrap_or(false)));

    // Stored form is untouched by the read-side join.
    let raw = platform
        .db()
        .collection("reviews")
        .unwrap()
        .find_by_id(&review_id)
        .unwrap()
        .unwrap();
    assert_eq!(raw.get("user"), Some(&json!(laura)));
}
