//! # Generic CRUD Services
//!
//! One service implementation shared by every resource, parameterized
//! over its model: list reads driven by the query layer, single reads
//! with 404 semantics, creation with defaults and validation, merge
//! updates re-validated against the merged document, and deletions
//! answering 204 with null data. Read scopes and protected fields come
//! from the model, so a hidden document 404s identically to a missing
//! one.

pub mod errors;
pub mod response;

pub use errors::{ErrorResponse, ResourceError, ResourceResult};
pub use response::{DeleteEnvelope, DocEnvelope, ListEnvelope};

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{Model, ValidationError};
use crate::query::{ListQuery, Predicate, Projection, RequestParams};
use crate::store::collection::Collection;
use crate::store::{document, Database, StoreResult};

/// CRUD over one model's collection
pub struct CrudService<M: Model> {
    db: Arc<Database>,
    collection: Arc<Collection>,
    _model: PhantomData<M>,
}

impl<M: Model> CrudService<M> {
    /// Builds the service, registering the model's collection and
    /// unique keys with the database. Registration is idempotent, so
    /// several services over one collection share state.
    pub fn new(db: Arc<Database>) -> StoreResult<Self> {
        let collection = db.create_collection(M::COLLECTION, M::unique_keys())?;
        Ok(Self {
            db,
            collection,
            _model: PhantomData,
        })
    }

    /// List read driven by request parameters.
    pub fn list(&self, params: &RequestParams) -> ResourceResult<ListEnvelope> {
        self.list_scoped(params, Vec::new())
    }

    /// List read with extra context predicates (a nested route's parent
    /// filter, an id-set lookup) on top of the request parameters and
    /// the model's read scope.
    pub fn list_scoped(
        &self,
        params: &RequestParams,
        extra: Vec<Predicate>,
    ) -> ResourceResult<ListEnvelope> {
        let mut query = ListQuery::from_params(params)?;
        for predicate in M::read_scope().into_iter().chain(extra) {
            query = query.with_predicate(predicate);
        }

        let docs = self.execute(query)?;
        Ok(ListEnvelope::new(docs))
    }

    /// Executes an already-built query under the model's read scope.
    pub fn execute(&self, query: ListQuery) -> ResourceResult<Vec<Value>> {
        let mut docs = self.collection.find(&query)?;
        for doc in &mut docs {
            strip_protected::<M>(doc);
        }
        debug!(collection = M::COLLECTION, results = docs.len(), "list read");
        Ok(docs)
    }

    /// Single read by id; 404 when the id is unknown or the document is
    /// outside the model's read scope.
    pub fn get(&self, id: &str) -> ResourceResult<DocEnvelope> {
        let doc = self.scoped_lookup(id)?;
        Ok(DocEnvelope::ok(self.present(&doc)))
    }

    /// Creates a document from a JSON body: defaults, validation, then
    /// the insert. Answers 201.
    pub fn create(&self, body: Value) -> ResourceResult<DocEnvelope> {
        let mut body = into_object(body)?;
        M::apply_defaults(&mut body);
        M::validate(&body)?;

        let doc = self.db.insert(M::COLLECTION, body)?;
        Ok(DocEnvelope::created(self.present(&doc)))
    }

    /// Merges a patch into the identified document. The merged result
    /// is validated before anything is written, so a patch cannot break
    /// field rules the create path enforces. Returns the updated
    /// document; 404 when the id is unknown.
    pub fn update(&self, id: &str, patch: Value) -> ResourceResult<DocEnvelope> {
        let patch = into_object(patch)?;
        let current = self.scoped_lookup(id)?;

        let mut merged = match current.as_object() {
            Some(fields) => fields.clone(),
            None => return Err(ResourceError::NotFound),
        };
        document::apply_patch(&mut merged, &patch);
        M::validate(&merged)?;

        let updated = self
            .db
            .update(M::COLLECTION, id, &patch)?
            .ok_or(ResourceError::NotFound)?;
        Ok(DocEnvelope::ok(self.present(&updated)))
    }

    /// Deletes the identified document; 404 when unknown, 204 with null
    /// data on success.
    pub fn remove(&self, id: &str) -> ResourceResult<DeleteEnvelope> {
        self.scoped_lookup(id)?;
        self.db
            .delete(M::COLLECTION, id)?
            .ok_or(ResourceError::NotFound)?;
        Ok(DeleteEnvelope::new())
    }

    /// Raw document by id, enforcing the read scope.
    fn scoped_lookup(&self, id: &str) -> ResourceResult<Value> {
        let doc = self
            .collection
            .find_by_id(id)?
            .ok_or(ResourceError::NotFound)?;
        if !M::read_scope().iter().all(|p| p.matches(&doc)) {
            return Err(ResourceError::NotFound);
        }
        Ok(doc)
    }

    /// Outgoing shape of a raw document: default projection (internal
    /// version field dropped) plus the model's protected fields.
    fn present(&self, doc: &Value) -> Value {
        let mut presented = Projection::default().apply(doc);
        strip_protected::<M>(&mut presented);
        presented
    }
}

fn strip_protected<M: Model>(doc: &mut Value) {
    if let Some(fields) = doc.as_object_mut() {
        for field in M::protected_fields() {
            fields.remove(*field);
        }
    }
}

fn into_object(body: Value) -> Result<Map<String, Value>, ValidationError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ValidationError::single("body", "must be a JSON object")),
    }
}
