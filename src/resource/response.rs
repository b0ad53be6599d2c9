//! # Response Envelopes
//!
//! The JSON shapes every successful operation returns:
//! lists as `{"status": "success", "results": N, "data": {"data": [...]}}`,
//! single entities as `{"status": "success", "data": {"data": {...}}}`,
//! deletions as `{"status": "success", "data": null}` with code 204.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STATUS_SUCCESS: &str = "success";

/// Envelope of a list read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEnvelope {
    pub status: String,
    pub results: usize,
    pub data: ListData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListData {
    pub data: Vec<Value>,
}

impl ListEnvelope {
    pub fn new(docs: Vec<Value>) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            results: docs.len(),
            data: ListData { data: docs },
        }
    }

    pub fn status_code(&self) -> u16 {
        200
    }
}

/// Envelope of a single-entity read, creation or update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocEnvelope {
    pub status: String,
    pub data: DocData,
    #[serde(skip)]
    code: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocData {
    pub data: Value,
}

impl DocEnvelope {
    /// A read or update result, code 200
    pub fn ok(doc: Value) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            data: DocData { data: doc },
            code: 200,
        }
    }

    /// A creation result, code 201
    pub fn created(doc: Value) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            data: DocData { data: doc },
            code: 201,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.code
    }

    /// The enclosed document
    pub fn document(&self) -> &Value {
        &self.data.data
    }
}

/// Envelope of a successful deletion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteEnvelope {
    pub status: String,
    pub data: Option<Value>,
}

impl DeleteEnvelope {
    pub fn new() -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            data: None,
        }
    }

    pub fn status_code(&self) -> u16 {
        204
    }
}

impl Default for DeleteEnvelope {
    fn default() -> Self {
        Self::new()
    }
}
