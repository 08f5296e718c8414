// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Gateway coordinator.
//!
//! The [`SearchGateway`] ties the translation layer to a backend:
//! - request normalization and response formatting ([`crate::search`])
//! - batch indexing ([`crate::indexing`])
//! - index registry and schema translation ([`crate::schema`])
//! - backend I/O through [`SearchBackend`]
//!
//! # Lifecycle
//!
//! ```text
//! Created → Bootstrapping → Ready
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use search_gateway::{GatewayConfig, GatewayState, SearchGateway};
//! use search_gateway::backend::memory::InMemoryBackend;
//!
//! let gateway = SearchGateway::new(GatewayConfig::default(), Arc::new(InMemoryBackend::new()));
//! assert_eq!(gateway.state(), GatewayState::Created);
//! assert_eq!(gateway.hello()["id"], "AzureSearchEmulator");
//! ```

mod index_api;
mod lifecycle;
mod schema_api;
mod search_api;
mod types;

pub use types::{BootstrapReport, GatewayState, IndexProvisioning};

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::watch;

use crate::backend::{BackendError, SearchBackend, SolrClient};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::schema::{IndexRegistry, RegisteredIndex};

/// Main gateway coordinator.
///
/// `Send + Sync`; share it behind an `Arc` across request handlers.
pub struct SearchGateway {
    pub(super) config: GatewayConfig,
    pub(super) backend: Arc<dyn SearchBackend>,
    pub(super) registry: IndexRegistry,
    pub(super) state: watch::Sender<GatewayState>,
}

impl SearchGateway {
    /// Create a gateway over an existing backend.
    pub fn new(config: GatewayConfig, backend: Arc<dyn SearchBackend>) -> Self {
        let (state, _) = watch::channel(GatewayState::Created);
        Self {
            config,
            backend,
            registry: IndexRegistry::new(),
            state,
        }
    }

    /// Create a gateway talking to the configured backend URL.
    pub fn connect(config: GatewayConfig) -> Result<Self, BackendError> {
        let backend = Arc::new(SolrClient::new(&config)?);
        Ok(Self::new(config, backend))
    }

    #[must_use]
    pub fn state(&self) -> GatewayState {
        *self.state.borrow()
    }

    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// Service identification document. Any API key is accepted.
    #[must_use]
    pub fn hello(&self) -> Value {
        json!({
            "id": "AzureSearchEmulator",
            "message": "Hello, I'm a SOLR pretending to be Azure Search",
            "usage": "Any supplied API key will be accepted, really",
        })
    }

    pub(super) fn set_state(&self, state: GatewayState) {
        self.state.send_replace(state);
    }

    pub(super) fn lookup(&self, index: &str) -> Result<Arc<RegisteredIndex>, GatewayError> {
        self.registry
            .get(index)
            .ok_or_else(|| GatewayError::UnknownIndex(index.to_string()))
    }
}
