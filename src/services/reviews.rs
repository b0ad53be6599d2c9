//! # Review Service
//!
//! Review CRUD wired for the nested tour route: list narrows to one
//! tour's reviews, and create fills the parent tour and authoring user
//! from the call context the way the HTTP layer passes route and
//! session ids down. Served reviews carry the author's display fields
//! (name, photo) joined in place of the raw user id. Stats maintenance
//! is not done here; the rating aggregator reacts to the change feed
//! these writes produce.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::models::review::{TOUR_FIELD, USER_FIELD};
use crate::models::{Model, Review, User};
use crate::query::{Predicate, RequestParams};
use crate::resource::{CrudService, DeleteEnvelope, DocEnvelope, ListEnvelope};
use crate::services::errors::ServiceResult;
use crate::store::{Database, ID_FIELD};

/// Author fields served with a review
const AUTHOR_FIELDS: [&str; 2] = ["name", "photo"];

/// Review operations over the reviews collection
pub struct ReviewService {
    crud: CrudService<Review>,
    db: Arc<Database>,
}

impl ReviewService {
    pub fn new(db: Arc<Database>) -> ServiceResult<Self> {
        // The author join reads the users collection; registering it
        // here keeps the service usable before any user service exists.
        db.create_collection(User::COLLECTION, User::unique_keys())?;
        Ok(Self {
            crud: CrudService::new(Arc::clone(&db))?,
            db,
        })
    }

    pub fn list(&self, params: &RequestParams) -> ServiceResult<ListEnvelope> {
        let mut envelope = self.crud.list(params)?;
        self.join_authors(&mut envelope.data.data)?;
        Ok(envelope)
    }

    /// Reviews of one tour, the nested-route read.
    pub fn list_for_tour(
        &self,
        tour_id: &str,
        params: &RequestParams,
    ) -> ServiceResult<ListEnvelope> {
        let scope = vec![Predicate::eq(TOUR_FIELD, Value::String(tour_id.to_string()))];
        let mut envelope = self.crud.list_scoped(params, scope)?;
        self.join_authors(&mut envelope.data.data)?;
        Ok(envelope)
    }

    pub fn get(&self, id: &str) -> ServiceResult<DocEnvelope> {
        let mut envelope = self.crud.get(id)?;
        self.join_author(&mut envelope.data.data)?;
        Ok(envelope)
    }

    /// Creates a review. Absent `tour` and `user` fields are filled from
    /// the context ids, so a body posted under a tour route does not
    /// repeat the parent id. Explicit body fields win. The creation
    /// response serves the raw author id; the join applies to reads.
    pub fn create(
        &self,
        mut body: Value,
        tour_id: Option<&str>,
        user_id: Option<&str>,
    ) -> ServiceResult<DocEnvelope> {
        if let Some(fields) = body.as_object_mut() {
            if let Some(tour) = tour_id {
                fields
                    .entry(TOUR_FIELD.to_string())
                    .or_insert_with(|| Value::String(tour.to_string()));
            }
            if let Some(user) = user_id {
                fields
                    .entry(USER_FIELD.to_string())
                    .or_insert_with(|| Value::String(user.to_string()));
            }
        }
        Ok(self.crud.create(body)?)
    }

    pub fn update(&self, id: &str, patch: Value) -> ServiceResult<DocEnvelope> {
        let mut envelope = self.crud.update(id, patch)?;
        self.join_author(&mut envelope.data.data)?;
        Ok(envelope)
    }

    pub fn remove(&self, id: &str) -> ServiceResult<DeleteEnvelope> {
        Ok(self.crud.remove(id)?)
    }

    fn join_authors(&self, docs: &mut [Value]) -> ServiceResult<()> {
        for doc in docs {
            self.join_author(doc)?;
        }
        Ok(())
    }

    /// Replaces the review's raw `user` id with the author's display
    /// card. An author that cannot be served (deleted account, or
    /// outside the user read scope) leaves the raw id in place, so the
    /// review stays attributable.
    fn join_author(&self, doc: &mut Value) -> ServiceResult<()> {
        let author_id = match doc.get(USER_FIELD).and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => return Ok(()),
        };
        let author = self
            .db
            .collection(User::COLLECTION)?
            .find_by_id(&author_id)?
            .filter(|a| User::read_scope().iter().all(|p| p.matches(a)));

        if let Some(author) = author {
            let mut card = Map::new();
            card.insert(ID_FIELD.to_string(), Value::String(author_id));
            for field in AUTHOR_FIELDS {
                if let Some(value) = author.get(field) {
                    card.insert(field.to_string(), value.clone());
                }
            }
            if let Some(fields) = doc.as_object_mut() {
                fields.insert(USER_FIELD.to_string(), Value::Object(card));
            }
        }
        Ok(())
    }
}
