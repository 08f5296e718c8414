// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the search gateway.
//!
//! # Example
//!
//! ```
//! use search_gateway::GatewayConfig;
//!
//! // Minimal config (uses defaults)
//! let config = GatewayConfig::default();
//! assert_eq!(config.backend_url, "http://solr:8983/solr/");
//!
//! // Explicit overrides
//! let config = GatewayConfig {
//!     backend_url: "http://localhost:8983/solr/".into(),
//!     max_concurrent_requests: 4,
//!     ..Default::default()
//! };
//! assert_eq!(config.request_timeout_ms, 30_000);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::schema::IndexDefinition;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
    #[error("Failed to read index definitions from {path}: {source}")]
    ReadDefinitions {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse index definitions from {path}: {source}")]
    ParseDefinitions {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Configuration for the gateway and its backend client.
///
/// All fields have defaults matching a compose-style deployment where the
/// backend is reachable as `solr`.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Backend base URL, core names are appended (e.g. "http://solr:8983/solr/")
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Address the HTTP surface binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Externally visible base URL, used for continuation links
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Index definitions file created at bootstrap
    #[serde(default)]
    pub index_definitions: Option<PathBuf>,

    /// Backend config set new cores are created from
    #[serde(default = "default_config_set")]
    pub config_set: String,

    /// Per-request backend timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Concurrent backend requests allowed per client
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Bootstrap connection attempts before giving up
    #[serde(default = "default_bootstrap_retries")]
    pub bootstrap_retries: usize,
    #[serde(default = "default_bootstrap_retry_delay_ms")]
    pub bootstrap_retry_delay_ms: u64,
}

fn default_backend_url() -> String { "http://solr:8983/solr/".to_string() }
fn default_listen_addr() -> String { "0.0.0.0:8080".to_string() }
fn default_public_url() -> String { "http://localhost:8080".to_string() }
fn default_config_set() -> String { "data_driven_schema_configs".to_string() }
fn default_request_timeout_ms() -> u64 { 30_000 }
fn default_max_concurrent_requests() -> usize { 16 }
fn default_bootstrap_retries() -> usize { 10 }
fn default_bootstrap_retry_delay_ms() -> u64 { 3_000 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            listen_addr: default_listen_addr(),
            public_url: default_public_url(),
            index_definitions: None,
            config_set: default_config_set(),
            request_timeout_ms: default_request_timeout_ms(),
            max_concurrent_requests: default_max_concurrent_requests(),
            bootstrap_retries: default_bootstrap_retries(),
            bootstrap_retry_delay_ms: default_bootstrap_retry_delay_ms(),
        }
    }
}

impl GatewayConfig {
    /// Defaults overlaid with process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns. Empty values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get("SOLR_URL") {
            config.backend_url = url;
        }
        if let Some(addr) = get("LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(url) = get("PUBLIC_URL") {
            config.public_url = url;
        }
        if let Some(path) = get("INDEX_DEFINITIONS") {
            config.index_definitions = Some(PathBuf::from(path));
        }
        if let Some(set) = get("SOLR_CONFIG_SET") {
            config.config_set = set;
        }
        if let Some(raw) = get("SOLR_TIMEOUT_MS") {
            config.request_timeout_ms = parse_number("SOLR_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = get("SOLR_MAX_CONCURRENCY") {
            config.max_concurrent_requests = parse_number("SOLR_MAX_CONCURRENCY", &raw)?;
        }
        if let Some(raw) = get("BOOTSTRAP_RETRIES") {
            config.bootstrap_retries = parse_number("BOOTSTRAP_RETRIES", &raw)?;
        }
        if let Some(raw) = get("BOOTSTRAP_RETRY_DELAY_MS") {
            config.bootstrap_retry_delay_ms = parse_number("BOOTSTRAP_RETRY_DELAY_MS", &raw)?;
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn bootstrap_retry_delay(&self) -> Duration {
        Duration::from_millis(self.bootstrap_retry_delay_ms)
    }

    /// Read the configured index definitions file, if any.
    pub fn load_index_definitions(&self) -> Result<Vec<IndexDefinition>, ConfigError> {
        match &self.index_definitions {
            Some(path) => load_index_definitions(path),
            None => Ok(Vec::new()),
        }
    }
}

/// Parse an index definitions file (a JSON array of definitions).
pub fn load_index_definitions(path: &Path) -> Result<Vec<IndexDefinition>, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadDefinitions {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::ParseDefinitions {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.config_set, "data_driven_schema_configs");
        assert_eq!(config.max_concurrent_requests, 16);
        assert_eq!(config.bootstrap_retries, 10);
        assert_eq!(config.bootstrap_retry_delay(), Duration::from_secs(3));
        assert!(config.index_definitions.is_none());
    }

    #[test]
    fn test_env_overlay() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("SOLR_URL", "http://localhost:8983/solr/"),
            ("SOLR_TIMEOUT_MS", "500"),
            ("SOLR_MAX_CONCURRENCY", "2"),
            ("INDEX_DEFINITIONS", "/etc/gateway/indexes.json"),
            ("PUBLIC_URL", ""),
        ]))
        .unwrap();

        assert_eq!(config.backend_url, "http://localhost:8983/solr/");
        assert_eq!(config.request_timeout(), Duration::from_millis(500));
        assert_eq!(config.max_concurrent_requests, 2);
        assert_eq!(
            config.index_definitions,
            Some(PathBuf::from("/etc/gateway/indexes.json"))
        );
        // Empty values keep the default
        assert_eq!(config.public_url, "http://localhost:8080");
    }

    #[test]
    fn test_invalid_number_is_error() {
        let err = GatewayConfig::from_lookup(lookup(&[("BOOTSTRAP_RETRIES", "lots")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for BOOTSTRAP_RETRIES: lots");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"backend_url": "http://backend/solr/"}"#).unwrap();
        assert_eq!(config.backend_url, "http://backend/solr/");
        assert_eq!(config.request_timeout_ms, 30_000);
    }

    #[test]
    fn test_load_index_definitions() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name": "hotels", "fields": [{{"name": "id", "type": "Edm.String", "key": true}}]}}]"#
        )
        .unwrap();

        let config = GatewayConfig {
            index_definitions: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let defs = config.load_index_definitions().unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "hotels");
    }

    #[test]
    fn test_load_index_definitions_errors() {
        let missing = load_index_definitions(Path::new("/nonexistent/indexes.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::ReadDefinitions { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let bad = load_index_definitions(file.path()).unwrap_err();
        assert!(matches!(bad, ConfigError::ParseDefinitions { .. }));
    }

    #[test]
    fn test_no_definitions_configured() {
        assert!(GatewayConfig::default().load_index_definitions().unwrap().is_empty());
    }
}
