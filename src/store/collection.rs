//! # Collections
//!
//! A collection is an in-memory set of JSON documents guarded by a
//! read-write lock. Critical sections are short and never held across an
//! await point. Mutating operations are crate-private: all writes go
//! through the database so every mutation emits a change event.

use std::sync::RwLock;

use serde_json::{Map, Value};

use crate::query::filter::values_equal;
use crate::query::sort::compare_documents;
use crate::query::{ListQuery, Predicate};
use crate::store::aggregate::{self, Reducer};
use crate::store::document::{self, ID_FIELD};
use crate::store::errors::{StoreError, StoreResult};

/// A set of fields whose combined value must be unique per collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub fields: Vec<String>,
}

impl UniqueKey {
    pub fn on(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Named document collection
pub struct Collection {
    name: String,
    unique_keys: Vec<UniqueKey>,
    documents: RwLock<Vec<Value>>,
}

impl Collection {
    pub(crate) fn new(name: &str, unique_keys: Vec<UniqueKey>) -> Self {
        Self {
            name: name.to_string(),
            unique_keys,
            documents: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Executes a list query: filter, multi-key sort, pagination window,
    /// then projection, all honored together.
    pub fn find(&self, query: &ListQuery) -> StoreResult<Vec<Value>> {
        let docs = self.read()?;

        let mut matches: Vec<&Value> = docs
            .iter()
            .filter(|doc| query.filter.iter().all(|p| p.matches(doc)))
            .collect();

        matches.sort_by(|a, b| compare_documents(a, b, &query.sort));

        Ok(matches
            .into_iter()
            .skip(query.pagination.skip())
            .take(query.pagination.limit)
            .map(|doc| query.projection.apply(doc))
            .collect())
    }

    /// Raw lookup by identity; no projection applied.
    pub fn find_by_id(&self, id: &str) -> StoreResult<Option<Value>> {
        let docs = self.read()?;
        Ok(docs.iter().find(|doc| has_id(doc, id)).cloned())
    }

    /// All documents matching the predicates, unsorted and unprojected.
    pub fn scan(&self, predicates: &[Predicate]) -> StoreResult<Vec<Value>> {
        let docs = self.read()?;
        Ok(docs
            .iter()
            .filter(|doc| predicates.iter().all(|p| p.matches(doc)))
            .cloned()
            .collect())
    }

    pub fn count(&self, predicates: &[Predicate]) -> StoreResult<usize> {
        let docs = self.read()?;
        Ok(docs
            .iter()
            .filter(|doc| predicates.iter().all(|p| p.matches(doc)))
            .count())
    }

    /// Filters, then groups by `key_field` applying every reducer.
    pub fn aggregate(
        &self,
        predicates: &[Predicate],
        key_field: &str,
        reducers: &[Reducer],
    ) -> StoreResult<Vec<Value>> {
        let docs = self.scan(predicates)?;
        Ok(aggregate::group(&docs, key_field, reducers))
    }

    pub(crate) fn insert(&self, body: Map<String, Value>) -> StoreResult<Value> {
        let stamped = document::stamp_new(body);
        let mut docs = self.write()?;

        if let Some(id) = stamped.get(ID_FIELD).and_then(Value::as_str) {
            if docs.iter().any(|doc| has_id(doc, id)) {
                return Err(StoreError::duplicate_key(&self.name, &[ID_FIELD.to_string()]));
            }
        }
        self.assert_unique(&docs, &stamped, None)?;

        let doc = Value::Object(stamped);
        docs.push(doc.clone());
        Ok(doc)
    }

    /// Merges a patch into the identified document. Returns the prior
    /// and the updated state, or `None` when the id is unknown.
    pub(crate) fn update_by_id(
        &self,
        id: &str,
        patch: &Map<String, Value>,
    ) -> StoreResult<Option<(Value, Value)>> {
        let mut docs = self.write()?;
        let position = match docs.iter().position(|doc| has_id(doc, id)) {
            Some(position) => position,
            None => return Ok(None),
        };

        let previous = docs[position].clone();
        let mut updated = match previous.as_object() {
            Some(fields) => fields.clone(),
            None => {
                return Err(StoreError::Internal(format!(
                    "non-object document in '{}'",
                    self.name
                )))
            }
        };
        document::apply_patch(&mut updated, patch);
        self.assert_unique(&docs, &updated, Some(id))?;

        let updated = Value::Object(updated);
        docs[position] = updated.clone();
        Ok(Some((previous, updated)))
    }

    /// Removes the identified document, returning it.
    pub(crate) fn delete_by_id(&self, id: &str) -> StoreResult<Option<Value>> {
        let mut docs = self.write()?;
        match docs.iter().position(|doc| has_id(doc, id)) {
            Some(position) => Ok(Some(docs.remove(position))),
            None => Ok(None),
        }
    }

    /// Rejects a candidate document violating any unique key. A key
    /// whose fields are not all present on the candidate cannot
    /// conflict; required-field enforcement lives with the models.
    fn assert_unique(
        &self,
        docs: &[Value],
        candidate: &Map<String, Value>,
        skip_id: Option<&str>,
    ) -> StoreResult<()> {
        for key in &self.unique_keys {
            let values: Vec<&Value> = match key
                .fields
                .iter()
                .map(|f| candidate.get(f))
                .collect::<Option<Vec<_>>>()
            {
                Some(values) => values,
                None => continue,
            };

            let conflict = docs.iter().any(|doc| {
                if let Some(skip) = skip_id {
                    if has_id(doc, skip) {
                        return false;
                    }
                }
                key.fields.iter().zip(&values).all(|(field, candidate_value)| {
                    doc.get(field)
                        .map(|existing| values_equal(existing, candidate_value))
                        .unwrap_or(false)
                })
            });

            if conflict {
                return Err(StoreError::duplicate_key(&self.name, &key.fields));
            }
        }
        Ok(())
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Vec<Value>>> {
        self.documents
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Vec<Value>>> {
        self.documents
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))
    }
}

fn has_id(doc: &Value, id: &str) -> bool {
    document::document_id(doc) == Some(id)
}
