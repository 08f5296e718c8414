// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Backend search engine boundary.
//!
//! [`SearchBackend`] is the only place the gateway suspends. [`SolrClient`]
//! talks to a real backend over HTTP; [`memory::InMemoryBackend`] records
//! calls for tests.

pub mod memory;
mod solr;

pub use solr::SolrClient;

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::schema::SchemaPayload;

/// A stored document as sent to or returned by the backend
pub type Document = Map<String, Value>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend unreachable: {0}")]
    Unreachable(String),
    #[error("Backend timed out: {0}")]
    Timeout(String),
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Backend response could not be decoded: {0}")]
    Decode(String),
}

impl BackendError {
    /// Connection-level failure, as opposed to a backend that answered badly.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, BackendError::Unreachable(_) | BackendError::Timeout(_))
    }

    /// Metric label
    pub fn error_type(&self) -> &'static str {
        match self {
            BackendError::Unreachable(_) => "unreachable",
            BackendError::Timeout(_) => "timeout",
            BackendError::Status { .. } => "status",
            BackendError::Decode(_) => "decode",
        }
    }
}

/// Decoded search response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendSearchResult {
    pub total: u64,
    pub docs: Vec<Document>,
    /// Raw facet section, keyed by facet key
    pub facets: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct RawSearchResponse {
    response: RawDocList,
    #[serde(default)]
    facets: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct RawDocList {
    #[serde(rename = "numFound")]
    num_found: u64,
    #[serde(default)]
    docs: Vec<Document>,
}

impl BackendSearchResult {
    /// Decode `{response: {numFound, docs}, facets}`.
    pub fn from_response(body: Value) -> Result<Self, BackendError> {
        let raw: RawSearchResponse =
            serde_json::from_value(body).map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(Self {
            total: raw.response.num_found,
            docs: raw.response.docs,
            facets: raw.facets,
        })
    }
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a JSON query against a core.
    async fn search(&self, core: &str, query: &Value) -> Result<BackendSearchResult, BackendError>;

    /// Add or replace documents, committed on return.
    async fn upsert(&self, core: &str, docs: &[Document]) -> Result<(), BackendError>;

    /// Delete documents by identity key, committed on return.
    async fn delete(&self, core: &str, keys: &[Value]) -> Result<(), BackendError>;

    /// Names of the cores that exist.
    async fn core_names(&self) -> Result<BTreeSet<String>, BackendError>;

    async fn create_core(&self, core: &str) -> Result<(), BackendError>;

    /// Remove a core together with its data.
    async fn unload_core(&self, core: &str) -> Result<(), BackendError>;

    async fn apply_schema(&self, core: &str, payload: &SchemaPayload) -> Result<(), BackendError>;
}
