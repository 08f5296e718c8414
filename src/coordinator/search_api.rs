// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search API for SearchGateway
//!
//! ```text
//! search(index, params)
//!       │
//!       ├─→ Registry lookup (404 on unknown index)
//!       ├─→ QueryRequest::from_params (rejects before any backend call)
//!       ├─→ SearchBackend::search(to_backend_query())
//!       └─→ ResponseFormatter
//! ```

use serde_json::Value;
use tracing::debug;

use crate::error::GatewayError;
use crate::metrics;
use crate::search::{QueryRequest, RequestParams, ResponseFormatter};

use super::SearchGateway;

impl SearchGateway {
    /// Run a search in either parameter dialect.
    pub async fn search(&self, index: &str, params: &RequestParams) -> Result<Value, GatewayError> {
        self.lookup(index)?;
        let request = QueryRequest::from_params(params)?;
        let query = request.to_backend_query();
        debug!(index, dialect = ?params.dialect(), "Dispatching search");

        let result = self.backend.search(index, &query).await?;
        metrics::record_search_results(result.total);

        Ok(ResponseFormatter::new(&self.config.public_url, index).format(&request, params, &result))
    }
}
