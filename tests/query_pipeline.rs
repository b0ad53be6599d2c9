//! Query Pipeline Tests
//!
//! End-to-end list reads through a live collection:
//! - Reserved keys never become filter predicates
//! - Comparison operators coerce numeric strings
//! - Sort honors `-` prefixes and treats missing fields as null
//! - Field selection keeps `_id`, default projection drops `_version`
//! - Pagination windows after sorting, with silent fallback

use std::sync::Arc;

use serde_json::{json, Value};
use tourbase::query::{ListQuery, Pagination, Predicate, RequestParams};
use tourbase::store::{Collection, Database};

// =============================================================================
// Helper Functions
// =============================================================================

fn params(pairs: &[(&str, Value)]) -> RequestParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A tours collection with a fixed spread of prices and difficulties.
fn seeded_tours() -> Arc<Collection> {
    let db = Database::new();
    let tours = db.create_collection("tours", Vec::new()).unwrap();
    let rows = [
        ("The Forest Hiker", "easy", 397.0, Some(4.7)),
        ("The Sea Explorer", "medium", 497.0, Some(4.8)),
        ("The Snow Adventurer", "difficult", 997.0, Some(4.5)),
        ("The City Wanderer", "easy", 1197.0, None),
        ("The Park Camper", "medium", 1497.0, Some(4.9)),
    ];
    for (name, difficulty, price, rating) in rows {
        let mut body = serde_json::Map::new();
        body.insert("name".to_string(), json!(name));
        body.insert("difficulty".to_string(), json!(difficulty));
        body.insert("price".to_string(), json!(price));
        if let Some(r) = rating {
            body.insert("ratings_average".to_string(), json!(r));
        }
        db.insert("tours", body).unwrap();
    }
    tours
}

fn names(docs: &[Value]) -> Vec<&str> {
    docs.iter()
        .map(|d| d.get("name").and_then(Value::as_str).unwrap())
        .collect()
}

// =============================================================================
// Filtering
// =============================================================================

/// Plain parameters become equality predicates; reserved keys do not.
#[test]
fn test_reserved_keys_never_filter() {
    let tours = seeded_tours();
    let query = ListQuery::from_params(&params(&[
        ("difficulty", json!("easy")),
        ("sort", json!("price")),
        ("limit", json!("10")),
        ("page", json!("1")),
        ("fields", json!("name,difficulty")),
    ]))
    .unwrap();
    assert_eq!(query.filter, vec![Predicate::eq("difficulty", json!("easy"))]);

    let docs = tours.find(&query).unwrap();
    assert_eq!(names(&docs), vec!["The Forest Hiker", "The City Wanderer"]);
}

/// Operator objects coerce their numeric strings before comparing.
#[test]
fn test_range_operators_coerce_numeric_strings() {
    let tours = seeded_tours();
    let query = ListQuery::from_params(&params(&[
        ("price", json!({ "gte": "497", "lt": "1497" })),
        ("sort", json!("price")),
    ]))
    .unwrap();
    let docs = tours.find(&query).unwrap();
    assert_eq!(
        names(&docs),
        vec![
            "The Sea Explorer",
            "The Snow Adventurer",
            "The City Wanderer",
        ]
    );
}

/// A filter on a field some documents lack matches none of those.
#[test]
fn test_missing_field_never_matches_comparison() {
    let tours = seeded_tours();
    let query = ListQuery::from_params(&params(&[(
        "ratings_average",
        json!({ "gte": "4.5" }),
    )]))
    .unwrap();
    let docs = tours.find(&query).unwrap();
    assert_eq!(docs.len(), 4);
    assert!(names(&docs).iter().all(|n| *n != "The City Wanderer"));
}

// =============================================================================
// Sorting
// =============================================================================

/// `-field` sorts descending; ties break on later keys.
#[test]
fn test_descending_sort_with_tiebreak() {
    let tours = seeded_tours();
    let query =
        ListQuery::from_params(&params(&[("sort", json!("difficulty,-price"))])).unwrap();
    let docs = tours.find(&query).unwrap();
    assert_eq!(
        names(&docs),
        vec![
            "The Snow Adventurer",
            "The City Wanderer",
            "The Forest Hiker",
            "The Park Camper",
            "The Sea Explorer",
        ]
    );
}

/// Documents missing the sort field sort like null, the lowest value:
/// first ascending, last descending.
#[test]
fn test_missing_sort_field_sorts_like_null() {
    let tours = seeded_tours();

    let asc = tours
        .find(&ListQuery::from_params(&params(&[("sort", json!("ratings_average"))])).unwrap())
        .unwrap();
    assert_eq!(names(&asc).first(), Some(&"The City Wanderer"));
    assert_eq!(names(&asc).last(), Some(&"The Park Camper"));

    let desc = tours
        .find(&ListQuery::from_params(&params(&[("sort", json!("-ratings_average"))])).unwrap())
        .unwrap();
    assert_eq!(names(&desc).first(), Some(&"The Park Camper"));
    assert_eq!(names(&desc).last(), Some(&"The City Wanderer"));
}

/// Without a sort parameter the newest documents come first.
#[test]
fn test_default_sort_is_newest_first() {
    let tours = seeded_tours();
    let docs = tours.find(&ListQuery::new()).unwrap();
    let created: Vec<&str> = docs
        .iter()
        .map(|d| d.get("created_at").and_then(Value::as_str).unwrap())
        .collect();
    let mut expected = created.clone();
    expected.sort_by(|a, b| b.cmp(a));
    assert_eq!(created, expected);
}

// =============================================================================
// Projection
// =============================================================================

/// Selected fields plus `_id` survive; everything else is dropped.
#[test]
fn test_field_selection_keeps_id() {
    let tours = seeded_tours();
    let query = ListQuery::from_params(&params(&[("fields", json!("name,price"))])).unwrap();
    let docs = tours.find(&query).unwrap();
    for doc in &docs {
        let fields = doc.as_object().unwrap();
        let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["_id", "name", "price"]);
    }
}

/// The default projection hides the version counter but nothing else.
#[test]
fn test_default_projection_drops_version() {
    let tours = seeded_tours();
    let docs = tours.find(&ListQuery::new()).unwrap();
    for doc in &docs {
        assert!(doc.get("_version").is_none());
        assert!(doc.get("_id").is_some());
        assert!(doc.get("created_at").is_some());
        assert!(doc.get("price").is_some());
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Windows slice the sorted result: page 2 of size 2 is rows 3 and 4.
#[test]
fn test_pagination_windows_after_sort() {
    let tours = seeded_tours();
    let query = ListQuery::from_params(&params(&[
        ("sort", json!("price")),
        ("page", json!("2")),
        ("limit", json!("2")),
    ]))
    .unwrap();
    let docs = tours.find(&query).unwrap();
    assert_eq!(names(&docs), vec!["The Snow Adventurer", "The City Wanderer"]);
}

/// A page past the data yields an empty result, not an error.
#[test]
fn test_page_past_end_is_empty() {
    let tours = seeded_tours();
    let query = ListQuery::from_params(&params(&[("page", json!("9")), ("limit", json!("3"))]))
        .unwrap();
    assert!(tours.find(&query).unwrap().is_empty());
}

/// Malformed and non-positive paging values fall back silently.
#[test]
fn test_pagination_fallback_is_silent() {
    for (page, limit) in [
        (json!("0"), json!("-3")),
        (json!("abc"), json!("abc")),
        (json!(""), json!("")),
    ] {
        let query =
            ListQuery::from_params(&params(&[("page", page), ("limit", limit)])).unwrap();
        assert_eq!(query.pagination, Pagination::default());
        assert_eq!(query.pagination.skip(), 0);
    }
    let docs = seeded_tours()
        .find(&ListQuery::from_params(&params(&[("page", json!("zero"))])).unwrap())
        .unwrap();
    assert_eq!(docs.len(), 5);
}
