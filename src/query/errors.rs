//! # Query Errors
//!
//! Parse-time errors for the list-query layer. Malformed pagination input
//! is deliberately not represented here: bad `page`/`limit` values fall
//! back to their defaults instead of failing the request.

use thiserror::Error;

/// Result type for query parsing
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while turning request parameters into a `ListQuery`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Operator name outside the closed set accepted from requests
    #[error("Unknown filter operator '{operator}' on field '{field}'")]
    UnknownOperator { field: String, operator: String },

    /// Operator operand was an object or array
    #[error("Filter value for '{field}' ({operator}) must be a scalar")]
    NonScalarOperand { field: String, operator: String },

    /// A `fields` value listed both included and excluded fields
    #[error("Projection cannot mix included and excluded fields")]
    MixedProjection,
}

impl QueryError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            QueryError::UnknownOperator { .. } => 400,
            QueryError::NonScalarOperand { .. } => 400,
            QueryError::MixedProjection => 400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_query_errors_are_client_errors() {
        let errors = [
            QueryError::UnknownOperator {
                field: "price".to_string(),
                operator: "between".to_string(),
            },
            QueryError::NonScalarOperand {
                field: "price".to_string(),
                operator: "gte".to_string(),
            },
            QueryError::MixedProjection,
        ];
        for err in errors {
            assert_eq!(err.status_code(), 400);
        }
    }

    #[test]
    fn test_unknown_operator_message_names_field_and_operator() {
        let err = QueryError::UnknownOperator {
            field: "duration".to_string(),
            operator: "approx".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("duration"));
        assert!(msg.contains("approx"));
    }
}
