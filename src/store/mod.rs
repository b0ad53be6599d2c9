//! # Document Store
//!
//! In-memory document database: named collections of JSON documents with
//! store-managed metadata, unique keys, list-query execution, grouped
//! aggregation, and a sequenced change-event feed every mutation passes
//! through.

pub mod aggregate;
pub mod collection;
pub mod database;
pub mod document;
pub mod errors;
pub mod events;

pub use aggregate::{Accumulator, Reducer};
pub use collection::{Collection, UniqueKey};
pub use database::Database;
pub use document::{CREATED_AT_FIELD, ID_FIELD, VERSION_FIELD};
pub use errors::{StoreError, StoreResult};
pub use events::{ChangeEvent, ChangeKind};
