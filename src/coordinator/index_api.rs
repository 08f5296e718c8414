// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Document indexing API for SearchGateway

use serde_json::Value;

use crate::error::GatewayError;
use crate::indexing::{IndexBatch, IndexBatchResponse};

use super::SearchGateway;

impl SearchGateway {
    /// Apply an indexing batch to a registered index.
    ///
    /// The whole batch is validated before the backend sees any of it.
    pub async fn index_documents(
        &self,
        index: &str,
        payload: &Value,
    ) -> Result<IndexBatchResponse, GatewayError> {
        let registered = self.lookup(index)?;
        let batch = IndexBatch::parse(payload, &registered.primary_key)?;
        batch.execute(self.backend.as_ref(), index).await
    }
}
