//! # List Query Layer
//!
//! Translates request parameters into an immutable `ListQuery` value
//! combining the four facets of a list read: filter, sort, projection and
//! pagination. Building performs no I/O; the store executes the finished
//! value. Each facet parses independently, so callers can also assemble
//! queries directly through the fluent `with_*` methods.

pub mod errors;
pub mod filter;
pub mod pagination;
pub mod params;
pub mod projection;
pub mod sort;

pub use errors::{QueryError, QueryResult};
pub use filter::{FilterOp, Predicate};
pub use pagination::Pagination;
pub use params::{RequestParams, RESERVED_KEYS};
pub use projection::Projection;
pub use sort::{SortDirection, SortKey};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A fully specified list read, ready for execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    pub filter: Vec<Predicate>,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub pagination: Pagination,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filter: Vec::new(),
            sort: sort::default_sort(),
            projection: Projection::default(),
            pagination: Pagination::default(),
        }
    }
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a request parameter mapping into a query value, applying
    /// the documented defaults for absent facets. The caller's mapping
    /// is not modified.
    pub fn from_params(params: &RequestParams) -> QueryResult<ListQuery> {
        let filter = params::parse_filters(params)?;

        let sort = params
            .get("sort")
            .and_then(|v| v.as_str())
            .map(sort::parse_sort)
            .filter(|keys| !keys.is_empty())
            .unwrap_or_else(sort::default_sort);

        let projection = match params.get("fields").and_then(|v| v.as_str()) {
            Some(raw) => Projection::parse(raw)?,
            None => Projection::default(),
        };

        let pagination = Pagination::from_params(params);

        debug!(
            predicates = filter.len(),
            sort_keys = sort.len(),
            page = pagination.page,
            limit = pagination.limit,
            "parsed list query"
        );

        Ok(ListQuery {
            filter,
            sort,
            projection,
            pagination,
        })
    }

    /// Adds one predicate, keeping the existing ones
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.filter.push(predicate);
        self
    }

    pub fn with_sort(mut self, sort: Vec<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    /// Narrows only the window size, keeping the current page
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.pagination.limit = limit;
        self
    }
}
