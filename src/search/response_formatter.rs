// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Response Formatter
//!
//! Reshapes a backend result into the managed-service search response:
//!
//! ```text
//! {
//!   "value": [{"@search.score": 1.2, ...stored fields}],
//!   "@odata.count": 120,                       (only when count requested)
//!   "@search.facets": {"city": [{"value": "Paris", "count": 3}]},
//!   "@odata.nextLink": "...",                  (only when more pages exist)
//!   "@odata.nextPageParameters": {...}         (body dialect only)
//! }
//! ```
//!
//! Continuations echo the caller's raw parameters with only the skip value
//! replaced, in both dialects.

use serde_json::{json, Map, Value};

use super::facet::FACET_KEY_PREFIX;
use super::query_request::{QueryRequest, RequestParams};
use crate::backend::BackendSearchResult;

/// Backend bookkeeping fields never returned to callers
const INTERNAL_FIELDS: &[&str] = &["_version_"];

pub struct ResponseFormatter<'a> {
    public_url: &'a str,
    index: &'a str,
}

impl<'a> ResponseFormatter<'a> {
    pub fn new(public_url: &'a str, index: &'a str) -> Self {
        Self {
            public_url: public_url.trim_end_matches('/'),
            index,
        }
    }

    pub fn format(
        &self,
        request: &QueryRequest,
        params: &RequestParams,
        result: &BackendSearchResult,
    ) -> Value {
        let mut response = Map::new();

        let docs: Vec<Value> = result.docs.iter().map(format_document).collect();
        response.insert("value".into(), Value::Array(docs));

        if request.count {
            response.insert("@odata.count".into(), json!(result.total));
        }

        if let Some(facets) = result.facets.as_ref().and_then(format_facets) {
            response.insert("@search.facets".into(), facets);
        }

        if let Some(next_skip) = next_skip(request, result.total) {
            match params {
                RequestParams::QueryString(pairs) => {
                    response.insert(
                        "@odata.nextLink".into(),
                        json!(self.next_link_query(pairs, next_skip)),
                    );
                }
                RequestParams::Body(body) => {
                    let mut next = body.clone();
                    next.insert("skip".into(), json!(next_skip));
                    response.insert(
                        "@odata.nextLink".into(),
                        json!(format!("{}/indexes/{}/docs/search", self.public_url, self.index)),
                    );
                    response.insert("@odata.nextPageParameters".into(), Value::Object(next));
                }
            }
        }

        Value::Object(response)
    }

    fn next_link_query(&self, pairs: &[(String, String)], next_skip: usize) -> String {
        let skip = next_skip.to_string();
        let mut replaced = false;
        let mut encoded: Vec<String> = Vec::with_capacity(pairs.len() + 1);
        for (key, value) in pairs {
            if key == "$skip" {
                if replaced {
                    continue;
                }
                replaced = true;
                encoded.push(encode_pair(key, &skip));
            } else {
                encoded.push(encode_pair(key, value));
            }
        }
        if !replaced {
            encoded.push(encode_pair("$skip", &skip));
        }
        format!(
            "{}/indexes/{}/docs?{}",
            self.public_url,
            self.index,
            encoded.join("&")
        )
    }
}

fn encode_pair(key: &str, value: &str) -> String {
    format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
}

/// Skip value of the next page, if the result extends past this one.
fn next_skip(request: &QueryRequest, total: u64) -> Option<usize> {
    if request.limit == 0 {
        return None;
    }
    let next = request.skip.saturating_add(request.limit);
    ((next as u64) < total).then_some(next)
}

fn format_document(doc: &Map<String, Value>) -> Value {
    let mut item = Map::with_capacity(doc.len());
    item.insert(
        "@search.score".into(),
        doc.get("score").cloned().unwrap_or(Value::Null),
    );
    for (key, value) in doc {
        if key == "score" || INTERNAL_FIELDS.contains(&key.as_str()) {
            continue;
        }
        item.insert(key.clone(), value.clone());
    }
    Value::Object(item)
}

/// `{facet_city: {buckets: [{val, count}]}}` → `{city: [{value, count}]}`
fn format_facets(facets: &Map<String, Value>) -> Option<Value> {
    let mut out = Map::new();
    for (key, group) in facets {
        let Some(field) = key.strip_prefix(FACET_KEY_PREFIX) else {
            continue;
        };
        let buckets = group
            .get("buckets")
            .and_then(Value::as_array)
            .map(|buckets| {
                buckets
                    .iter()
                    .map(|b| {
                        json!({
                            "value": b.get("val").cloned().unwrap_or(Value::Null),
                            "count": b.get("count").cloned().unwrap_or(json!(0)),
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        out.insert(field.to_string(), Value::Array(buckets));
    }
    if out.is_empty() {
        None
    } else {
        Some(Value::Object(out))
    }
}
