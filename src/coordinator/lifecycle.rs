// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Bootstrap: wait for the backend, create missing cores, register indexes.

use std::collections::BTreeSet;

use tracing::{error, info, warn};

use crate::error::GatewayError;
use crate::metrics;
use crate::resilience::retry::{retry, RetryConfig};
use crate::schema::{IndexDefinition, SchemaPayload};

use super::{BootstrapReport, GatewayState, SearchGateway};

impl SearchGateway {
    /// Bring the gateway up for the given index definitions.
    ///
    /// Startup flow:
    /// 1. Translate every definition's schema (fails before any backend call)
    /// 2. Poll the backend's core list with a fixed retry budget; exhaustion is fatal
    /// 3. Create each missing core and apply its schema
    /// 4. Register every definition and move to `Ready`
    #[tracing::instrument(skip_all, fields(indexes = definitions.len()))]
    pub async fn bootstrap(
        &self,
        definitions: Vec<IndexDefinition>,
    ) -> Result<BootstrapReport, GatewayError> {
        self.set_state(GatewayState::Bootstrapping);
        info!("Bootstrapping search gateway...");

        let result = self.bootstrap_inner(definitions).await;
        match &result {
            Ok(report) => {
                metrics::record_bootstrap("success");
                metrics::set_registered_indexes(self.registry.len());
                self.set_state(GatewayState::Ready);
                info!(
                    created = report.created.len(),
                    existing = report.existing.len(),
                    "Search gateway ready"
                );
            }
            Err(e) => {
                metrics::record_bootstrap("failure");
                error!(error = %e, "Bootstrap failed");
            }
        }
        result
    }

    async fn bootstrap_inner(
        &self,
        definitions: Vec<IndexDefinition>,
    ) -> Result<BootstrapReport, GatewayError> {
        let mut payloads = Vec::with_capacity(definitions.len());
        for definition in &definitions {
            payloads.push(definition.schema_payload()?);
        }

        let existing = self.wait_for_backend().await?;
        let mut report = BootstrapReport::default();

        for (definition, payload) in definitions.into_iter().zip(payloads) {
            let name = definition.name.clone();
            if existing.contains(&name) {
                info!(index = %name, "Core already exists");
                report.existing.push(name);
            } else {
                self.provision_core(&name, &payload).await?;
                report.created.push(name);
            }
            self.registry.register(definition)?;
        }

        Ok(report)
    }

    /// Create a core and apply its schema.
    ///
    /// A core whose schema failed to apply is unloaded again, so the next
    /// bootstrap or PUT sees it as missing and retries from scratch.
    pub(super) async fn provision_core(
        &self,
        name: &str,
        payload: &SchemaPayload,
    ) -> Result<(), GatewayError> {
        info!(index = %name, "Creating core");
        self.backend.create_core(name).await?;

        if let Err(e) = self.backend.apply_schema(name, payload).await {
            warn!(index = %name, error = %e, "Schema rejected, unloading core");
            if let Err(unload) = self.backend.unload_core(name).await {
                error!(index = %name, error = %unload, "Failed to unload core without schema");
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Poll the backend until it lists its cores.
    async fn wait_for_backend(&self) -> Result<BTreeSet<String>, GatewayError> {
        let config = RetryConfig::fixed(
            self.config.bootstrap_retries,
            self.config.bootstrap_retry_delay(),
        );
        let cores = retry("core_status", &config, || self.backend.core_names()).await?;
        info!(cores = cores.len(), "Backend reachable");
        Ok(cores)
    }
}
