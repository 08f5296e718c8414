// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! HTTP surface.
//!
//! ```text
//! GET  /                               hello document
//! GET  /indexes/:index/docs            search, query-string dialect
//! POST /indexes/:index/docs            search, body dialect
//! POST /indexes/:index/docs/search     search, body dialect
//! POST /indexes/:index/docs/index      batch indexing
//! PUT  /indexes/:index                 create or update an index
//! ```
//!
//! Errors are answered with `{error, message, detail}` and the status from
//! [`GatewayError::status_code`]. Credentials are never checked.

use std::sync::Arc;

use poem::http::{header, StatusCode};
use poem::listener::TcpListener;
use poem::middleware::Tracing;
use poem::web::{Data, Path, Query};
use poem::{get, handler, post, put, Endpoint, EndpointExt, Response, Route, Server};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::coordinator::{IndexProvisioning, SearchGateway};
use crate::error::GatewayError;
use crate::metrics;
use crate::schema::IndexDefinition;
use crate::search::RequestParams;

fn json_response(status: StatusCode, body: &Value) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
}

fn respond(endpoint: &'static str, status: u16, body: &Value) -> Response {
    metrics::record_request(endpoint, status);
    json_response(
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        body,
    )
}

fn error_response(endpoint: &'static str, err: &GatewayError) -> Response {
    let status = err.status_code();
    metrics::record_request_error(err.kind());
    if status >= 500 {
        error!(endpoint, kind = err.kind(), error = %err, "Request failed");
    } else {
        warn!(endpoint, kind = err.kind(), error = %err, "Request rejected");
    }
    respond(endpoint, status, &err.envelope())
}

fn parse_body(body: &str) -> Result<Value, GatewayError> {
    serde_json::from_str(body)
        .map_err(|e| GatewayError::ValueParse(format!("Invalid JSON body: {}", e)))
}

fn parse_object(body: &str) -> Result<Map<String, Value>, GatewayError> {
    match parse_body(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(GatewayError::ValueParse("Request body must be a JSON object".into())),
    }
}

#[handler]
async fn hello(gateway: Data<&Arc<SearchGateway>>) -> Response {
    respond("hello", 200, &gateway.hello())
}

#[handler]
async fn search_get(
    gateway: Data<&Arc<SearchGateway>>,
    Path(index): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let params = RequestParams::QueryString(pairs);
    match gateway.search(&index, &params).await {
        Ok(body) => respond("search", 200, &body),
        Err(e) => error_response("search", &e),
    }
}

#[handler]
async fn search_post(
    gateway: Data<&Arc<SearchGateway>>,
    Path(index): Path<String>,
    body: String,
) -> Response {
    let result = match parse_object(&body) {
        Ok(map) => gateway.search(&index, &RequestParams::Body(map)).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(body) => respond("search", 200, &body),
        Err(e) => error_response("search", &e),
    }
}

#[handler]
async fn index_documents(
    gateway: Data<&Arc<SearchGateway>>,
    Path(index): Path<String>,
    body: String,
) -> Response {
    let result = match parse_body(&body) {
        Ok(payload) => gateway.index_documents(&index, &payload).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(response) => respond("index", response.http_status(), &response.to_json()),
        Err(e) => error_response("index", &e),
    }
}

#[handler]
async fn create_index(
    gateway: Data<&Arc<SearchGateway>>,
    Path(index): Path<String>,
    body: String,
) -> Response {
    let definition = serde_json::from_str::<IndexDefinition>(&body)
        .map_err(|e| GatewayError::ValueParse(format!("Invalid index definition: {}", e)));
    let result = match definition {
        Ok(definition) => gateway
            .create_index(&index, definition.clone())
            .await
            .map(|outcome| (outcome, definition)),
        Err(e) => Err(e),
    };
    match result {
        Ok((outcome, definition)) => {
            let status = match outcome {
                IndexProvisioning::Created => 201,
                IndexProvisioning::Registered => 200,
            };
            let body = serde_json::to_value(&definition).unwrap_or(Value::Null);
            respond("create_index", status, &body)
        }
        Err(e) => error_response("create_index", &e),
    }
}

/// All routes, with the gateway attached as shared data.
pub fn routes(gateway: Arc<SearchGateway>) -> impl Endpoint {
    Route::new()
        .at("/", get(hello))
        .at("/indexes/:index", put(create_index))
        .at("/indexes/:index/docs", get(search_get).post(search_post))
        .at("/indexes/:index/docs/search", post(search_post))
        .at("/indexes/:index/docs/index", post(index_documents))
        .data(gateway)
        .with(Tracing)
}

/// Listen on the configured address until the server stops.
pub async fn serve(gateway: Arc<SearchGateway>) -> std::io::Result<()> {
    let addr = gateway.config().listen_addr.clone();
    info!(addr = %addr, "Starting search gateway");
    Server::new(TcpListener::bind(addr)).run(routes(gateway)).await
}
