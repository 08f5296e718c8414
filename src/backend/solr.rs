// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Solr HTTP client.
//!
//! Endpoints, relative to the configured base URL:
//!
//! ```text
//! POST {core}/query                          JSON request API
//! POST {core}/update?commit=true             [doc, ...] or {"delete": [key, ...]}
//! GET  admin/cores?action=STATUS&wt=json
//! GET  admin/cores?action=CREATE&name={core}&configSet={set}&wt=json
//! GET  admin/cores?action=UNLOAD&core={core}&deleteInstanceDir=true&wt=json
//! POST {core}/schema                         {"add-field": [...], "add-copy-field": {...}}
//! ```
//!
//! Every request holds a semaphore permit, so at most
//! `max_concurrent_requests` are in flight per client.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use super::{BackendError, BackendSearchResult, Document, SearchBackend};
use crate::config::GatewayConfig;
use crate::metrics::{self, LatencyTimer};
use crate::schema::SchemaPayload;

pub struct SolrClient {
    client: Client,
    base_url: String,
    config_set: String,
    permits: Arc<Semaphore>,
    max_permits: usize,
}

impl SolrClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| BackendError::Unreachable(format!("failed to build HTTP client: {}", e)))?;
        let max_permits = config.max_concurrent_requests.max(1);

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            config_set: config.config_set.clone(),
            permits: Arc::new(Semaphore::new(max_permits)),
            max_permits,
        })
    }

    fn core_url(&self, core: &str, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, urlencoding::encode(core), path)
    }

    fn admin_url(&self) -> String {
        format!("{}/admin/cores", self.base_url)
    }

    /// Send a request and decode the JSON body of a successful response.
    async fn send(&self, operation: &'static str, request: RequestBuilder) -> Result<Value, BackendError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| BackendError::Unreachable("backend client is shut down".into()))?;
        metrics::set_backend_in_flight(self.max_permits - self.permits.available_permits());
        let _timer = LatencyTimer::new(operation);

        let result = self.send_inner(operation, request).await;
        if let Err(e) = &result {
            metrics::record_backend_error(operation, e.error_type());
        }
        result
    }

    async fn send_inner(&self, operation: &'static str, request: RequestBuilder) -> Result<Value, BackendError> {
        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        if !status.is_success() {
            error!(operation, status = %status, body = %body, "Backend request failed");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(operation, body = %body, "Backend response is not valid JSON");
            BackendError::Decode(e.to_string())
        })
    }

    async fn update(&self, operation: &'static str, core: &str, body: &Value) -> Result<(), BackendError> {
        let request = self
            .client
            .post(self.core_url(core, "update"))
            .query(&[("commit", "true")])
            .json(body);
        self.send(operation, request).await.map(|_| ())
    }
}

fn classify(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout(e.to_string())
    } else if e.is_decode() {
        BackendError::Decode(e.to_string())
    } else {
        BackendError::Unreachable(e.to_string())
    }
}

#[async_trait]
impl SearchBackend for SolrClient {
    async fn search(&self, core: &str, query: &Value) -> Result<BackendSearchResult, BackendError> {
        debug!(core, %query, "Backend search");
        let request = self.client.post(self.core_url(core, "query")).json(query);
        let body = self.send("search", request).await?;
        BackendSearchResult::from_response(body)
    }

    async fn upsert(&self, core: &str, docs: &[Document]) -> Result<(), BackendError> {
        debug!(core, count = docs.len(), "Backend upsert");
        self.update("upsert", core, &json!(docs)).await
    }

    async fn delete(&self, core: &str, keys: &[Value]) -> Result<(), BackendError> {
        debug!(core, count = keys.len(), "Backend delete");
        self.update("delete", core, &json!({ "delete": keys })).await
    }

    async fn core_names(&self) -> Result<BTreeSet<String>, BackendError> {
        let request = self
            .client
            .get(self.admin_url())
            .query(&[("action", "STATUS"), ("wt", "json")]);
        let body = self.send("core_status", request).await?;

        let status = body
            .get("status")
            .and_then(Value::as_object)
            .ok_or_else(|| BackendError::Decode("core status response has no status section".into()))?;
        Ok(status.keys().cloned().collect())
    }

    async fn create_core(&self, core: &str) -> Result<(), BackendError> {
        let request = self.client.get(self.admin_url()).query(&[
            ("action", "CREATE"),
            ("name", core),
            ("configSet", self.config_set.as_str()),
            ("wt", "json"),
        ]);
        self.send("create_core", request).await?;
        info!(core, config_set = %self.config_set, "Created core");
        Ok(())
    }

    async fn unload_core(&self, core: &str) -> Result<(), BackendError> {
        let request = self.client.get(self.admin_url()).query(&[
            ("action", "UNLOAD"),
            ("core", core),
            ("deleteInstanceDir", "true"),
            ("wt", "json"),
        ]);
        self.send("unload_core", request).await?;
        info!(core, "Unloaded core");
        Ok(())
    }

    async fn apply_schema(&self, core: &str, payload: &SchemaPayload) -> Result<(), BackendError> {
        let request = self.client.post(self.core_url(core, "schema")).json(payload);
        self.send("schema", request).await?;
        info!(core, fields = payload.add_field.len(), "Applied schema");
        Ok(())
    }
}
