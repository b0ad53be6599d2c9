//! # Change Events
//!
//! Every document mutation emits one sequenced `ChangeEvent` on the
//! database's broadcast feed. Events carry both the prior and the new
//! document state, so a subscriber reacting to a deletion still sees the
//! deleted document's fields (the rating aggregator depends on this to
//! find the parent of a removed review). Delivery is best effort: a
//! subscriber that falls behind the buffer observes a lag and is
//! expected to reconcile from the store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::document;

/// What happened to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Created => "created",
            ChangeKind::Updated => "updated",
            ChangeKind::Deleted => "deleted",
        };
        write!(f, "{}", s)
    }
}

/// One mutation of one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Monotonically increasing per database, starting at 1
    pub sequence: u64,
    pub kind: ChangeKind,
    pub collection: String,
    pub document_id: String,
    /// Document state after the mutation; `None` for deletions
    pub document: Option<Value>,
    /// Document state before the mutation; `None` for creations
    pub previous: Option<Value>,
    pub occurred_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn created(sequence: u64, collection: &str, doc: Value) -> Self {
        Self {
            sequence,
            kind: ChangeKind::Created,
            collection: collection.to_string(),
            document_id: id_of(&doc),
            document: Some(doc),
            previous: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn updated(sequence: u64, collection: &str, previous: Value, doc: Value) -> Self {
        Self {
            sequence,
            kind: ChangeKind::Updated,
            collection: collection.to_string(),
            document_id: id_of(&doc),
            document: Some(doc),
            previous: Some(previous),
            occurred_at: Utc::now(),
        }
    }

    pub fn deleted(sequence: u64, collection: &str, previous: Value) -> Self {
        Self {
            sequence,
            kind: ChangeKind::Deleted,
            collection: collection.to_string(),
            document_id: id_of(&previous),
            document: None,
            previous: Some(previous),
            occurred_at: Utc::now(),
        }
    }

    /// The most recent state the event knows about: the new document,
    /// or the prior one for deletions.
    pub fn latest_state(&self) -> Option<&Value> {
        self.document.as_ref().or(self.previous.as_ref())
    }
}

fn id_of(doc: &Value) -> String {
    document::document_id(doc).unwrap_or_default().to_string()
}
