//! # Tour Service
//!
//! Catalog CRUD plus the analytics reads: the five-best preset, the
//! per-difficulty stats rollup and the monthly start-date plan.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Datelike};
use serde_json::{json, Value};

use crate::models::tour::{RATINGS_AVERAGE_FIELD, RATINGS_QUANTITY_FIELD};
use crate::models::{Model, Tour};
use crate::query::{Predicate, RequestParams};
use crate::resource::{CrudService, DeleteEnvelope, DocEnvelope, ListEnvelope};
use crate::services::errors::ServiceResult;
use crate::store::{aggregate, Database, Reducer};

/// Catalog operations over the tours collection
pub struct TourService {
    crud: CrudService<Tour>,
    db: Arc<Database>,
}

impl TourService {
    pub fn new(db: Arc<Database>) -> ServiceResult<Self> {
        Ok(Self {
            crud: CrudService::new(Arc::clone(&db))?,
            db,
        })
    }

    pub fn list(&self, params: &RequestParams) -> ServiceResult<ListEnvelope> {
        Ok(self.crud.list(params)?)
    }

    pub fn get(&self, id: &str) -> ServiceResult<DocEnvelope> {
        Ok(self.crud.get(id)?)
    }

    pub fn create(&self, body: Value) -> ServiceResult<DocEnvelope> {
        Ok(self.crud.create(body)?)
    }

    pub fn update(&self, id: &str, patch: Value) -> ServiceResult<DocEnvelope> {
        Ok(self.crud.update(id, patch)?)
    }

    pub fn remove(&self, id: &str) -> ServiceResult<DeleteEnvelope> {
        Ok(self.crud.remove(id)?)
    }

    /// The "top five" preset: best rated first, cheapest as tiebreak,
    /// trimmed to the card fields. Implemented as a canned parameter
    /// set, so it goes through the same query pipeline as any list read.
    pub fn top_tours(&self) -> ServiceResult<ListEnvelope> {
        let mut params = RequestParams::new();
        params.insert("limit".to_string(), json!("5"));
        params.insert("sort".to_string(), json!("-ratings_average,price"));
        params.insert(
            "fields".to_string(),
            json!("name,price,ratings_average,summary,difficulty"),
        );
        self.list(&params)
    }

    /// Per-difficulty rollup over well rated tours (mean of 4.5 and up),
    /// cheapest difficulty first. Difficulty labels come back uppercased.
    pub fn tour_stats(&self) -> ServiceResult<ListEnvelope> {
        let tours = self.db.collection(Tour::COLLECTION)?;
        let mut predicates = Tour::read_scope();
        predicates.push(Predicate::gte(RATINGS_AVERAGE_FIELD, json!(4.5)));

        let mut rows = tours.aggregate(
            &predicates,
            "difficulty",
            &[
                Reducer::count("num_tours"),
                Reducer::sum("num_ratings", RATINGS_QUANTITY_FIELD),
                Reducer::avg("avg_rating", RATINGS_AVERAGE_FIELD),
                Reducer::avg("avg_price", "price"),
                Reducer::min("min_price", "price"),
                Reducer::max("max_price", "price"),
            ],
        )?;

        for row in &mut rows {
            if let Some(Value::String(difficulty)) = row.get_mut("difficulty") {
                *difficulty = difficulty.to_uppercase();
            }
        }
        rows.sort_by(|a, b| compare_by_f64(a, b, "avg_price"));
        Ok(ListEnvelope::new(rows))
    }

    /// How many tours start in each month of the given year, busiest
    /// month first, with the tour names listed per month.
    pub fn monthly_plan(&self, year: i32) -> ServiceResult<ListEnvelope> {
        let tours = self.db.collection(Tour::COLLECTION)?;
        let docs = tours.scan(&Tour::read_scope())?;

        // Unwind each tour into one record per start date in the year.
        let mut starts: Vec<Value> = Vec::new();
        for doc in &docs {
            let name = doc.get("name").cloned().unwrap_or(Value::Null);
            let dates = doc.get("start_dates").and_then(Value::as_array);
            for date in dates.into_iter().flatten() {
                let parsed = date
                    .as_str()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok());
                if let Some(when) = parsed {
                    if when.year() == year {
                        starts.push(json!({ "month": when.month(), "name": name.clone() }));
                    }
                }
            }
        }

        let mut rows = aggregate::group(
            &starts,
            "month",
            &[
                Reducer::count("num_tour_starts"),
                Reducer::push("tours", "name"),
            ],
        );
        rows.sort_by(|a, b| compare_by_f64(b, a, "num_tour_starts"));
        rows.truncate(12);
        Ok(ListEnvelope::new(rows))
    }
}

fn compare_by_f64(a: &Value, b: &Value, field: &str) -> Ordering {
    let left = a.get(field).and_then(Value::as_f64);
    let right = b.get(field).and_then(Value::as_f64);
    left.partial_cmp(&right).unwrap_or(Ordering::Equal)
}
