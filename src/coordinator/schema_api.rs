// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Index management API for SearchGateway
//!
//! Creating an index at runtime takes the same path as bootstrap: create
//! the core if the backend lacks it, apply the translated schema to the new
//! core, then register the definition.

use tracing::info;

use crate::error::GatewayError;
use crate::metrics;
use crate::schema::IndexDefinition;

use super::{IndexProvisioning, SearchGateway};

impl SearchGateway {
    /// Create or update an index definition.
    ///
    /// `index` is the name from the request path; a definition naming a
    /// different index is rejected.
    pub async fn create_index(
        &self,
        index: &str,
        definition: IndexDefinition,
    ) -> Result<IndexProvisioning, GatewayError> {
        if definition.name != index {
            return Err(GatewayError::ValueParse(format!(
                "Index name {} does not match definition name {}",
                index, definition.name
            )));
        }

        let payload = definition.schema_payload()?;
        let existing = self.backend.core_names().await?;

        let outcome = if existing.contains(index) {
            IndexProvisioning::Registered
        } else {
            self.provision_core(index, &payload).await?;
            IndexProvisioning::Created
        };

        self.registry.register(definition)?;
        metrics::set_registered_indexes(self.registry.len());
        info!(index, outcome = ?outcome, "Index provisioned");
        Ok(outcome)
    }
}
