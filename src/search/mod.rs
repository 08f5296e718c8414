// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Translation
//!
//! Translates managed-service search requests into backend (Solr) queries
//! and backend results back into managed-service responses.
//!
//! # Architecture
//!
//! ```text
//! RequestParams (query string | JSON body)
//!     ↓
//! QueryRequest::from_params
//!     ├─→ simple_to_lucene      search text, simple syntax
//!     ├─→ FacetSpec::parse      facet expressions
//!     └─→ FilterParser (AST) → LuceneTranslator   $filter
//!     ↓
//! QueryRequest::to_backend_query → backend JSON request
//!     ↓
//! ResponseFormatter → {value, @odata.count, @search.facets, @odata.nextLink}
//! ```
//!
//! # Filter Language
//!
//! ```text
//! rating gt 3                   - Comparison (eq, neq, lt, lte, gt, gte)
//! city eq 'Paris'               - Quoted literal
//! a eq 1 and b eq 2             - Conjunction
//! a eq 1 b eq 2                 - Implicit conjunction
//! a eq 1 or b eq 2              - Disjunction
//! not (a eq 1)                  - Negation and grouping
//! ```
//!
//! Everything here is pure and synchronous; I/O lives in [`crate::backend`].

mod facet;
mod filter_ast;
mod filter_parser;
mod lucene_translator;
mod query_request;
mod response_formatter;
mod simple_syntax;

pub use facet::{parse_facets, FacetSort, FacetSpec, FACET_KEY_PREFIX};
pub use filter_ast::{ComparisonOp, FilterNode, Operand};
pub use filter_parser::{FilterParseError, FilterParser};
pub use lucene_translator::LuceneTranslator;
pub use query_request::{
    Dialect, QueryRequest, RequestParams, SearchMode, DEFAULT_LIMIT, UNSUPPORTED_PARAMS,
};
pub use response_formatter::ResponseFormatter;
pub use simple_syntax::simple_to_lucene;
