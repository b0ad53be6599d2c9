//! # Booking Service
//!
//! Booking CRUD, checkout recording and the "my tours" read joining a
//! user's bookings back to full tour documents.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::models::user::EMAIL_FIELD;
use crate::models::{Booking, Model, Tour, User};
use crate::query::{ListQuery, Predicate, RequestParams};
use crate::resource::{CrudService, DeleteEnvelope, DocEnvelope, ListEnvelope};
use crate::services::errors::{ServiceError, ServiceResult};
use crate::store::{Database, ID_FIELD};

/// Booking operations over the bookings collection
pub struct BookingService {
    crud: CrudService<Booking>,
    db: Arc<Database>,
}

impl BookingService {
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

    /// Records a completed checkout: resolves the paying user by email
    /// and stores the booking with the charged amount converted from
    /// minor units.
    pub fn record_checkout(
        &self,
        tour_id: &str,
        customer_email: &str,
        amount_cents: u64,
    ) -> ServiceResult<DocEnvelope> {
        let users = self.db.collection(User::COLLECTION)?;
        let normalized = customer_email.trim().to_lowercase();
        let account = users
            .scan(&[Predicate::eq(EMAIL_FIELD, Value::String(normalized))])?
            .into_iter()
            .next()
            .ok_or(ServiceError::UnknownEmail)?;
        let user_id = account
            .get(ID_FIELD)
            .and_then(Value::as_str)
            .ok_or(ServiceError::UnknownEmail)?;

        let price = amount_cents as f64 / 100.0;
        self.create(json!({
            "tour": tour_id,
            "user": user_id,
            "price": price,
        }))
    }

    /// Tours the given user has booked, deduplicated, as full tour
    /// documents under the usual catalog read scope.
    pub fn tours_booked_by(&self, user_id: &str) -> ServiceResult<ListEnvelope> {
        let bookings = self.db.collection(Booking::COLLECTION)?;
        let owned = bookings.scan(&[Predicate::eq("user", Value::String(user_id.to_string()))])?;

        let mut tour_ids: Vec<Value> = Vec::new();
        for booking in &owned {
            if let Some(tour) = booking.get("tour") {
                if !tour_ids.contains(tour) {
                    tour_ids.push(tour.clone());
                }
            }
        }

        let mut query = ListQuery::new().with_predicate(Predicate::within(ID_FIELD, tour_ids));
        for predicate in Tour::read_scope() {
            query = query.with_predicate(predicate);
        }
        let tours = self.db.collection(Tour::COLLECTION)?.find(&query)?;
        Ok(ListEnvelope::new(tours))
    }
}
