// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Batch indexing.
//!
//! A batch is `{"value": [doc, ...]}` where each document carries an
//! `@search.action`. Upload, merge and mergeOrUpload documents are upserted
//! together; deletes are sent as a list of keys. The two sub-batches run
//! concurrently and fail independently, and every document gets its own
//! result:
//!
//! ```text
//! {"value": [{"key": "1", "status": true,  "errorMessage": null, "statusCode": 200},
//!            {"key": "2", "status": false, "errorMessage": "...", "statusCode": 503}]}
//! ```
//!
//! Validation happens before any backend call: an unknown action or a
//! document without its key field rejects the whole batch.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::backend::{BackendError, Document, SearchBackend};
use crate::error::GatewayError;
use crate::metrics;

pub const ACTION_FIELD: &str = "@search.action";

const INDEXING_ERROR: &str = "An error occurred during indexing";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexAction {
    Upload,
    Merge,
    MergeOrUpload,
    Delete,
}

impl IndexAction {
    pub fn is_delete(self) -> bool {
        matches!(self, IndexAction::Delete)
    }
}

impl FromStr for IndexAction {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(IndexAction::Upload),
            "merge" => Ok(IndexAction::Merge),
            "mergeOrUpload" => Ok(IndexAction::MergeOrUpload),
            "delete" => Ok(IndexAction::Delete),
            other => Err(GatewayError::ValueParse(format!(
                "Unknown indexing action: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for IndexAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexAction::Upload => "upload",
            IndexAction::Merge => "merge",
            IndexAction::MergeOrUpload => "mergeOrUpload",
            IndexAction::Delete => "delete",
        };
        write!(f, "{}", name)
    }
}

/// Outcome for one document of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexingResult {
    pub key: String,
    pub status: bool,
    #[serde(rename = "errorMessage")]
    pub error_message: Option<String>,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl IndexingResult {
    fn succeeded(key: String) -> Self {
        Self {
            key,
            status: true,
            error_message: None,
            status_code: 200,
        }
    }

    fn failed(key: String, err: &BackendError) -> Self {
        let status_code = match err {
            BackendError::Unreachable(_) | BackendError::Timeout(_) => 503,
            BackendError::Status { status, .. } => *status,
            BackendError::Decode(_) => 500,
        };
        Self {
            key,
            status: false,
            error_message: Some(INDEXING_ERROR.to_string()),
            status_code,
        }
    }
}

/// Per-document results in input order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBatchResponse {
    pub results: Vec<IndexingResult>,
}

impl IndexBatchResponse {
    /// 200 when every document succeeded, 207 otherwise.
    pub fn http_status(&self) -> u16 {
        if self.results.iter().all(|r| r.status) {
            200
        } else {
            207
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ "value": self.results })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct BatchItem {
    action: IndexAction,
    key: String,
}

/// A validated batch, split into its two sub-batches.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBatch {
    items: Vec<BatchItem>,
    upserts: Vec<Document>,
    deletes: Vec<Value>,
}

impl IndexBatch {
    /// Validate a batch payload against the index's key field.
    pub fn parse(payload: &Value, primary_key: &str) -> Result<Self, GatewayError> {
        let docs = payload
            .get("value")
            .and_then(Value::as_array)
            .ok_or_else(|| GatewayError::ValueParse("Indexing batch must contain a value array".into()))?;

        let mut batch = IndexBatch {
            items: Vec::with_capacity(docs.len()),
            upserts: Vec::new(),
            deletes: Vec::new(),
        };

        for (position, doc) in docs.iter().enumerate() {
            let doc = doc.as_object().ok_or_else(|| {
                GatewayError::ValueParse(format!("Indexing batch item {} is not an object", position))
            })?;

            let action = match doc.get(ACTION_FIELD) {
                None | Some(Value::Null) => IndexAction::Upload,
                Some(Value::String(action)) => action.parse()?,
                Some(other) => {
                    return Err(GatewayError::ValueParse(format!(
                        "Unknown indexing action: {}",
                        other
                    )))
                }
            };

            let key_value = match doc.get(primary_key) {
                Some(value) if !value.is_null() => value.clone(),
                _ => {
                    return Err(GatewayError::ValueParse(format!(
                        "Indexing batch item {} is missing key field {}",
                        position, primary_key
                    )))
                }
            };
            let key = match &key_value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };

            if action.is_delete() {
                batch.deletes.push(key_value);
            } else {
                let mut stripped = doc.clone();
                stripped.remove(ACTION_FIELD);
                batch.upserts.push(stripped);
            }
            batch.items.push(BatchItem { action, key });
        }

        Ok(batch)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Run both sub-batches concurrently and report per document.
    ///
    /// Escalates to a backend error only when every issued sub-batch failed
    /// to reach the backend at all.
    pub async fn execute(
        self,
        backend: &dyn SearchBackend,
        core: &str,
    ) -> Result<IndexBatchResponse, GatewayError> {
        let upserts = async {
            if self.upserts.is_empty() {
                None
            } else {
                Some(backend.upsert(core, &self.upserts).await)
            }
        };
        let deletes = async {
            if self.deletes.is_empty() {
                None
            } else {
                Some(backend.delete(core, &self.deletes).await)
            }
        };
        let (upsert_outcome, delete_outcome) = tokio::join!(upserts, deletes);

        let issued: Vec<&Result<(), BackendError>> =
            [&upsert_outcome, &delete_outcome].into_iter().flatten().collect();
        if !issued.is_empty() && issued.iter().all(|r| matches!(r, Err(e) if e.is_connectivity())) {
            if let Some(Err(err)) = issued.into_iter().next() {
                error!(core, error = %err, "Backend unreachable during indexing");
                return Err(GatewayError::Backend(err.clone()));
            }
        }

        for (label, outcome) in [("upsert", &upsert_outcome), ("delete", &delete_outcome)] {
            if let Some(Err(err)) = outcome {
                error!(core, operation = label, error = %err, "Indexing sub-batch failed");
            }
        }

        let mut tally: BTreeMap<(IndexAction, bool), usize> = BTreeMap::new();
        let results: Vec<IndexingResult> = self
            .items
            .into_iter()
            .map(|item| {
                let outcome = if item.action.is_delete() {
                    &delete_outcome
                } else {
                    &upsert_outcome
                };
                let result = match outcome {
                    Some(Err(err)) => IndexingResult::failed(item.key, err),
                    _ => IndexingResult::succeeded(item.key),
                };
                *tally.entry((item.action, result.status)).or_default() += 1;
                result
            })
            .collect();

        for ((action, ok), count) in tally {
            let outcome = if ok { "success" } else { "failure" };
            metrics::record_indexed_documents(&action.to_string(), outcome, count);
        }

        let succeeded = results.iter().filter(|r| r.status).count();
        let failed = results.len() - succeeded;
        info!(core, succeeded, failed, "Indexed batch");

        Ok(IndexBatchResponse { results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{BackendCall, InMemoryBackend};

    fn batch(value: Value) -> IndexBatch {
        IndexBatch::parse(&value, "hotelId").unwrap()
    }

    #[test]
    fn test_action_names() {
        for name in ["upload", "merge", "mergeOrUpload", "delete"] {
            let action: IndexAction = name.parse().unwrap();
            assert_eq!(action.to_string(), name);
        }
        assert!("remove".parse::<IndexAction>().is_err());
    }

    #[test]
    fn test_missing_action_defaults_to_upload() {
        let parsed = batch(json!({"value": [{"hotelId": "1", "name": "A"}]}));
        assert_eq!(parsed.items[0].action, IndexAction::Upload);
        assert_eq!(parsed.upserts.len(), 1);
    }

    #[test]
    fn test_split_and_strip() {
        let parsed = batch(json!({"value": [
            {"@search.action": "upload", "hotelId": "1", "name": "A"},
            {"@search.action": "delete", "hotelId": "2"},
            {"@search.action": "mergeOrUpload", "hotelId": 3},
        ]}));

        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed.upserts.len(), 2);
        assert!(parsed.upserts.iter().all(|d| !d.contains_key(ACTION_FIELD)));
        assert_eq!(parsed.deletes, vec![json!("2")]);
        assert_eq!(parsed.items[2].key, "3");
    }

    #[test]
    fn test_unknown_action_rejects_batch() {
        let err = IndexBatch::parse(
            &json!({"value": [{"hotelId": "1"}, {"@search.action": "purge", "hotelId": "2"}]}),
            "hotelId",
        )
        .unwrap_err();
        assert_eq!(err.kind(), "parse_fail");
        assert!(err.to_string().contains("purge"));
    }

    #[test]
    fn test_missing_key_rejects_batch() {
        let err = IndexBatch::parse(
            &json!({"value": [{"@search.action": "delete"}]}),
            "hotelId",
        )
        .unwrap_err();
        assert!(err.to_string().contains("hotelId"));
    }

    #[test]
    fn test_payload_must_have_value_array() {
        assert!(IndexBatch::parse(&json!({"docs": []}), "id").is_err());
        assert!(IndexBatch::parse(&json!({"value": [1]}), "id").is_err());
    }

    #[tokio::test]
    async fn test_all_succeed() {
        let backend = InMemoryBackend::with_cores(["hotels"]);
        let parsed = IndexBatch::parse(
            &json!({"value": [
                {"@search.action": "upload", "id": "1"},
                {"@search.action": "delete", "id": "2"},
            ]}),
            "id",
        )
        .unwrap();

        let response = parsed.execute(&backend, "hotels").await.unwrap();
        assert_eq!(response.http_status(), 200);
        assert_eq!(
            response.results,
            vec![
                IndexingResult::succeeded("1".into()),
                IndexingResult::succeeded("2".into())
            ]
        );
        assert_eq!(backend.document_count("hotels"), 1);
    }

    #[tokio::test]
    async fn test_partial_failure_is_per_document() {
        let backend = InMemoryBackend::with_cores(["hotels"]);
        backend.fail(
            "delete",
            BackendError::Status {
                status: 400,
                body: "bad delete".into(),
            },
        );

        let parsed = IndexBatch::parse(
            &json!({"value": [
                {"@search.action": "delete", "id": "9"},
                {"@search.action": "upload", "id": "1"},
            ]}),
            "id",
        )
        .unwrap();
        let response = parsed.execute(&backend, "hotels").await.unwrap();

        assert_eq!(response.http_status(), 207);
        assert!(!response.results[0].status);
        assert_eq!(response.results[0].status_code, 400);
        assert_eq!(response.results[0].error_message.as_deref(), Some(INDEXING_ERROR));
        assert!(response.results[1].status);
        // The failed delete did not block the upsert
        assert_eq!(backend.document_count("hotels"), 1);

        let json = response.to_json();
        assert_eq!(json["value"][0]["key"], "9");
        assert_eq!(json["value"][1]["errorMessage"], Value::Null);
    }

    #[tokio::test]
    async fn test_unreachable_backend_escalates() {
        let backend = InMemoryBackend::with_cores(["hotels"]);
        backend.fail("upsert", BackendError::Unreachable("refused".into()));
        backend.fail("delete", BackendError::Timeout("slow".into()));

        let parsed = IndexBatch::parse(
            &json!({"value": [
                {"@search.action": "upload", "id": "1"},
                {"@search.action": "delete", "id": "2"},
            ]}),
            "id",
        )
        .unwrap();
        let err = parsed.execute(&backend, "hotels").await.unwrap_err();
        assert_eq!(err.status_code(), 502);
    }

    #[tokio::test]
    async fn test_one_unreachable_sub_batch_stays_partial() {
        let backend = InMemoryBackend::with_cores(["hotels"]);
        backend.fail("upsert", BackendError::Unreachable("refused".into()));

        let parsed = IndexBatch::parse(
            &json!({"value": [
                {"@search.action": "upload", "id": "1"},
                {"@search.action": "delete", "id": "2"},
            ]}),
            "id",
        )
        .unwrap();
        let response = parsed.execute(&backend, "hotels").await.unwrap();
        assert_eq!(response.http_status(), 207);
        assert_eq!(response.results[0].status_code, 503);
        assert!(response.results[1].status);
    }

    #[tokio::test]
    async fn test_empty_batch_issues_no_calls() {
        let backend = InMemoryBackend::with_cores(["hotels"]);
        let parsed = IndexBatch::parse(&json!({"value": []}), "id").unwrap();
        assert!(parsed.is_empty());

        let response = parsed.execute(&backend, "hotels").await.unwrap();
        assert_eq!(response.http_status(), 200);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_document_metrics_are_labelled_by_action() {
        use metrics_util::debugging::{DebugValue, DebuggingRecorder};

        let backend = InMemoryBackend::with_cores(["hotels"]);
        backend.fail("delete", BackendError::Timeout("slow".into()));
        let parsed = IndexBatch::parse(
            &json!({"value": [
                {"@search.action": "upload", "id": "1"},
                {"@search.action": "mergeOrUpload", "id": "2"},
                {"@search.action": "upload", "id": "3"},
                {"@search.action": "delete", "id": "4"},
            ]}),
            "id",
        )
        .unwrap();

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        ::metrics::with_local_recorder(&recorder, || {
            runtime.block_on(parsed.execute(&backend, "hotels")).unwrap();
        });

        let mut counts: Vec<(String, String, u64)> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, ..)| key.key().name() == "search_gateway_indexed_documents_total")
            .map(|(key, _, _, value)| {
                let label = |name: &str| {
                    key.key()
                        .labels()
                        .find(|l| l.key() == name)
                        .map(|l| l.value().to_string())
                        .unwrap_or_default()
                };
                let count = match value {
                    DebugValue::Counter(n) => n,
                    other => panic!("unexpected metric value {:?}", other),
                };
                (label("action"), label("outcome"), count)
            })
            .collect();
        counts.sort();

        assert_eq!(
            counts,
            vec![
                ("delete".to_string(), "failure".to_string(), 1),
                ("mergeOrUpload".to_string(), "success".to_string(), 1),
                ("upload".to_string(), "success".to_string(), 2),
            ]
        );
    }

    #[tokio::test]
    async fn test_only_needed_sub_batches_issued() {
        let backend = InMemoryBackend::with_cores(["hotels"]);
        let parsed = IndexBatch::parse(&json!({"value": [{"id": "1"}]}), "id").unwrap();
        parsed.execute(&backend, "hotels").await.unwrap();
        assert_eq!(
            backend.calls(),
            vec![BackendCall::Upsert {
                core: "hotels".into(),
                count: 1
            }]
        );
    }
}
