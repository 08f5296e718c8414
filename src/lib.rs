//! # Search Gateway
//!
//! A gateway that speaks a managed search service's REST dialect (OData
//! filters, simple query syntax, facet expressions, index definitions) and
//! serves it from a Solr backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       HTTP Surface                          │
//! │  • GET/POST /indexes/{index}/docs[/search]                 │
//! │  • POST /indexes/{index}/docs/index, PUT /indexes/{index}  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Translation Layer                       │
//! │  • OData $filter → AST → Lucene                            │
//! │  • Simple syntax → Lucene, facets → JSON facet request     │
//! │  • Index definitions → schema field rules                  │
//! │  • Backend results → value / count / facets / nextLink     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                     (SearchBackend trait)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Solr Backend                           │
//! │  • JSON query API, update handler, core admin, schema API  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use search_gateway::{GatewayConfig, SearchGateway};
//! use search_gateway::search::RequestParams;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GatewayConfig {
//!         backend_url: "http://localhost:8983/solr/".into(),
//!         ..Default::default()
//!     };
//!     let definitions = config.load_index_definitions()?;
//!     let gateway = Arc::new(SearchGateway::connect(config)?);
//!     gateway.bootstrap(definitions).await?;
//!
//!     let params = RequestParams::QueryString(vec![
//!         ("search".into(), "wifi".into()),
//!         ("$filter".into(), "rating gt 3".into()),
//!     ]);
//!     let response = gateway.search("hotels", &params).await?;
//!     println!("{}", response["value"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`coordinator`]: The [`SearchGateway`] tying translation to a backend
//! - [`search`]: Filter grammar, query and facet translation, response formatting
//! - [`schema`]: Index definitions, field translation, the index registry
//! - [`indexing`]: Batch indexing actions and per-document results
//! - [`backend`]: The [`SearchBackend`] trait, Solr client and in-memory backend
//! - [`resilience`]: Retry logic for backend startup
//! - [`server`]: HTTP routes

pub mod backend;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod indexing;
pub mod metrics;
pub mod resilience;
pub mod schema;
pub mod search;
pub mod server;

// Note: We don't expose a `tracing` module to avoid conflict with the tracing crate

pub use backend::{BackendError, BackendSearchResult, Document, SearchBackend, SolrClient};
pub use config::{ConfigError, GatewayConfig};
pub use coordinator::{BootstrapReport, GatewayState, IndexProvisioning, SearchGateway};
pub use error::GatewayError;
pub use indexing::{IndexAction, IndexBatch, IndexBatchResponse, IndexingResult};
pub use metrics::LatencyTimer;
pub use resilience::retry::RetryConfig;
pub use schema::{IndexDefinition, IndexField, IndexRegistry, SchemaError, SchemaTranslator};
pub use search::{QueryRequest, RequestParams, ResponseFormatter};
