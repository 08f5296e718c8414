// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Request-level error taxonomy and the error envelope returned to callers.

use serde_json::{json, Value};
use thiserror::Error;

use crate::backend::BackendError;
use crate::schema::SchemaError;
use crate::search::FilterParseError;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// A blocklisted request parameter was supplied
    #[error("Parameter {0} not implemented")]
    UnsupportedParameter(String),
    /// A recognized facet modifier that is not emulated
    #[error("Facet modifier {0} not implemented")]
    UnsupportedFacetModifier(String),
    #[error(transparent)]
    FilterParse(#[from] FilterParseError),
    /// Malformed value (pagination, count flag, facet option, batch payload)
    #[error("{0}")]
    ValueParse(String),
    #[error("Index {0} does not exist")]
    UnknownIndex(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl GatewayError {
    /// Error kind as it appears in the `error` field of the envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedParameter(_) | Self::UnsupportedFacetModifier(_) => "unsupported_param",
            Self::FilterParse(_) => "odata_parse_fail",
            Self::ValueParse(_) | Self::Schema(_) => "parse_fail",
            Self::UnknownIndex(_) | Self::Backend(_) => "failure",
        }
    }

    /// HTTP status the error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UnsupportedParameter(_)
            | Self::UnsupportedFacetModifier(_)
            | Self::FilterParse(_)
            | Self::ValueParse(_)
            | Self::Schema(_) => 400,
            Self::UnknownIndex(_) => 404,
            Self::Backend(_) => 502,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::UnsupportedParameter(_) | Self::UnsupportedFacetModifier(_) => {
                "The emulator does not currently support this parameter"
            }
            Self::FilterParse(_) => "Error while parsing filter query",
            Self::ValueParse(_) => "Error while parsing request parameters",
            Self::Schema(_) => "Error while translating index definition",
            Self::UnknownIndex(_) => "The requested index was not found",
            Self::Backend(_) => "The search backend failed to process the request",
        }
    }

    /// `{error, message, detail}` envelope
    pub fn envelope(&self) -> Value {
        json!({
            "error": self.kind(),
            "message": self.message(),
            "detail": self.to_string(),
        })
    }
}
