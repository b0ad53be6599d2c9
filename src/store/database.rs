//! # Database
//!
//! The collection registry and the single place documents are mutated.
//! Every insert, update and delete emits a sequenced `ChangeEvent` on a
//! broadcast feed; reads go straight to the collection handles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::info;

use crate::store::collection::{Collection, UniqueKey};
use crate::store::document;
use crate::store::errors::{StoreError, StoreResult};
use crate::store::events::ChangeEvent;

/// Events buffered per subscriber before a slow one starts lagging
const EVENT_BUFFER: usize = 256;

/// In-memory document database with a change feed
pub struct Database {
    collections: RwLock<HashMap<String, Arc<Collection>>>,
    events: broadcast::Sender<ChangeEvent>,
    sequence: AtomicU64,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            collections: RwLock::new(HashMap::new()),
            events,
            sequence: AtomicU64::new(0),
        }
    }

    /// Registers a collection with its unique keys. Registering the same
    /// name twice returns the existing handle unchanged.
    pub fn create_collection(
        &self,
        name: &str,
        unique_keys: Vec<UniqueKey>,
    ) -> StoreResult<Arc<Collection>> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))?;
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Collection::new(name, unique_keys)));
        Ok(Arc::clone(collection))
    }

    /// Handle to a registered collection
    pub fn collection(&self, name: &str) -> StoreResult<Arc<Collection>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))?;
        collections
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    /// Subscribes to the change feed. Delivery is best effort: a
    /// receiver that falls more than the buffer behind observes a lag.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    /// Sequence of the most recently emitted event (0 before any write)
    pub fn last_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Inserts a document and emits a `created` event.
    pub fn insert(&self, collection: &str, body: Map<String, Value>) -> StoreResult<Value> {
        let handle = self.collection(collection)?;
        let doc = handle.insert(body)?;
        let id = document::document_id(&doc).unwrap_or_default().to_string();
        info!(collection, id = %id, "document created");
        self.emit(|seq| ChangeEvent::created(seq, collection, doc.clone()));
        Ok(doc)
    }

    /// Merges a patch into a document and emits an `updated` event.
    /// Returns the updated document, or `None` when the id is unknown.
    pub fn update(
        &self,
        collection: &str,
        id: &str,
        patch: &Map<String, Value>,
    ) -> StoreResult<Option<Value>> {
        let handle = self.collection(collection)?;
        match handle.update_by_id(id, patch)? {
            Some((previous, updated)) => {
                info!(collection, id, "document updated");
                self.emit(|seq| {
                    ChangeEvent::updated(seq, collection, previous.clone(), updated.clone())
                });
                Ok(Some(updated))
            }
            None => Ok(None),
        }
    }

    /// Deletes a document and emits a `deleted` event carrying its
    /// final state. Returns the removed document.
    pub fn delete(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let handle = self.collection(collection)?;
        match handle.delete_by_id(id)? {
            Some(previous) => {
                info!(collection, id, "document deleted");
                self.emit(|seq| ChangeEvent::deleted(seq, collection, previous.clone()));
                Ok(Some(previous))
            }
            None => Ok(None),
        }
    }

    fn emit<F>(&self, build: F)
    where
        F: FnOnce(u64) -> ChangeEvent,
    {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        // No subscribers is fine; send only fails when nobody listens.
        let _ = self.events.send(build(sequence));
    }
}
