// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory backend that records every call.
//!
//! Documents are keyed by `id`, or by the copy-field source of the core's
//! applied schema. Search ignores the query text and filter and pages over
//! all stored documents using `offset`/`limit`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::{BackendError, BackendSearchResult, Document, SearchBackend};
use crate::schema::{SchemaPayload, BACKEND_ID_FIELD};

/// One recorded backend interaction
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Search { core: String, query: Value },
    Upsert { core: String, count: usize },
    Delete { core: String, keys: Vec<Value> },
    CoreNames,
    CreateCore { core: String },
    UnloadCore { core: String },
    ApplySchema { core: String, payload: SchemaPayload },
}

#[derive(Debug, Default)]
struct Core {
    docs: BTreeMap<String, Document>,
    id_source: Option<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    cores: Mutex<HashMap<String, Core>>,
    calls: Mutex<Vec<BackendCall>>,
    failures: Mutex<HashMap<&'static str, BackendError>>,
    facets: Mutex<Option<serde_json::Map<String, Value>>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with the given cores already present.
    #[must_use]
    pub fn with_cores<I, S>(cores: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::new();
        {
            let mut map = backend.cores.lock();
            for core in cores {
                map.insert(core.into(), Core::default());
            }
        }
        backend
    }

    /// Make every call of `operation` fail with `error` until cleared.
    ///
    /// Operations: search, upsert, delete, core_status, create_core,
    /// unload_core, schema.
    pub fn fail(&self, operation: &'static str, error: BackendError) {
        self.failures.lock().insert(operation, error);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// Facet section returned with every search.
    pub fn set_facets(&self, facets: serde_json::Map<String, Value>) {
        *self.facets.lock() = Some(facets);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    #[must_use]
    pub fn document_count(&self, core: &str) -> usize {
        self.cores.lock().get(core).map_or(0, |c| c.docs.len())
    }

    #[must_use]
    pub fn document(&self, core: &str, id: &str) -> Option<Document> {
        self.cores.lock().get(core).and_then(|c| c.docs.get(id).cloned())
    }

    fn record(&self, operation: &'static str, call: BackendCall) -> Result<(), BackendError> {
        self.calls.lock().push(call);
        match self.failures.lock().get(operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn missing_core(core: &str) -> BackendError {
        BackendError::Status {
            status: 404,
            body: format!("Core {} not found", core),
        }
    }
}

fn key_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn page(query: &Value, field: &str, default: usize) -> usize {
    query
        .get(field)
        .and_then(Value::as_u64)
        .map_or(default, |n| n as usize)
}

#[async_trait]
impl SearchBackend for InMemoryBackend {
    async fn search(&self, core: &str, query: &Value) -> Result<BackendSearchResult, BackendError> {
        self.record(
            "search",
            BackendCall::Search {
                core: core.to_string(),
                query: query.clone(),
            },
        )?;

        let cores = self.cores.lock();
        let stored = cores.get(core).ok_or_else(|| Self::missing_core(core))?;
        let offset = page(query, "offset", 0);
        let limit = page(query, "limit", 10);

        let docs = stored
            .docs
            .values()
            .skip(offset)
            .take(limit)
            .map(|doc| {
                let mut doc = doc.clone();
                doc.insert("score".into(), json!(1.0));
                doc
            })
            .collect();

        Ok(BackendSearchResult {
            total: stored.docs.len() as u64,
            docs,
            facets: self.facets.lock().clone(),
        })
    }

    async fn upsert(&self, core: &str, docs: &[Document]) -> Result<(), BackendError> {
        self.record(
            "upsert",
            BackendCall::Upsert {
                core: core.to_string(),
                count: docs.len(),
            },
        )?;

        let mut cores = self.cores.lock();
        let stored = cores.get_mut(core).ok_or_else(|| Self::missing_core(core))?;
        let id_field = stored
            .id_source
            .clone()
            .unwrap_or_else(|| BACKEND_ID_FIELD.to_string());

        for doc in docs {
            let id = doc.get(&id_field).map(key_text).ok_or_else(|| BackendError::Status {
                status: 400,
                body: format!("Document is missing mandatory uniqueKey field: {}", id_field),
            })?;
            let mut doc = doc.clone();
            doc.insert(BACKEND_ID_FIELD.into(), json!(id));
            stored.docs.insert(id, doc);
        }
        Ok(())
    }

    async fn delete(&self, core: &str, keys: &[Value]) -> Result<(), BackendError> {
        self.record(
            "delete",
            BackendCall::Delete {
                core: core.to_string(),
                keys: keys.to_vec(),
            },
        )?;

        let mut cores = self.cores.lock();
        let stored = cores.get_mut(core).ok_or_else(|| Self::missing_core(core))?;
        for key in keys {
            stored.docs.remove(&key_text(key));
        }
        Ok(())
    }

    async fn core_names(&self) -> Result<BTreeSet<String>, BackendError> {
        self.record("core_status", BackendCall::CoreNames)?;
        Ok(self.cores.lock().keys().cloned().collect())
    }

    async fn create_core(&self, core: &str) -> Result<(), BackendError> {
        self.record(
            "create_core",
            BackendCall::CreateCore {
                core: core.to_string(),
            },
        )?;
        self.cores.lock().entry(core.to_string()).or_default();
        Ok(())
    }

    async fn unload_core(&self, core: &str) -> Result<(), BackendError> {
        self.record(
            "unload_core",
            BackendCall::UnloadCore {
                core: core.to_string(),
            },
        )?;
        self.cores
            .lock()
            .remove(core)
            .map(|_| ())
            .ok_or_else(|| Self::missing_core(core))
    }

    async fn apply_schema(&self, core: &str, payload: &SchemaPayload) -> Result<(), BackendError> {
        self.record(
            "schema",
            BackendCall::ApplySchema {
                core: core.to_string(),
                payload: payload.clone(),
            },
        )?;
        let mut cores = self.cores.lock();
        let stored = cores.get_mut(core).ok_or_else(|| Self::missing_core(core))?;
        stored.id_source = payload.add_copy_field.as_ref().map(|c| c.source.clone());
        Ok(())
    }
}
