// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Request normalization.
//!
//! Turns raw search parameters, in either the query-string dialect
//! (`$top`, `$filter`, repeated `facet`) or the body dialect (`top`,
//! `filter`, `facets` list), into one canonical [`QueryRequest`], and renders
//! that into the backend's JSON request payload.
//!
//! # Example
//!
//! ```
//! use search_gateway::search::{QueryRequest, RequestParams};
//!
//! let params = RequestParams::QueryString(vec![
//!     ("search".into(), "wifi+pool".into()),
//!     ("$filter".into(), "rating gt 3".into()),
//!     ("$top".into(), "10".into()),
//! ]);
//! let request = QueryRequest::from_params(&params).unwrap();
//! assert_eq!(request.query, "wifi AND pool");
//! assert_eq!(request.filter_query.as_deref(), Some("rating:{3 TO *]"));
//! assert_eq!(request.limit, 10);
//! ```

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};
use tracing::debug;

use super::facet::{parse_facets, FacetSpec};
use super::lucene_translator::LuceneTranslator;
use super::simple_syntax::simple_to_lucene;
use crate::error::GatewayError;

/// Parameters the gateway refuses outright.
pub const UNSUPPORTED_PARAMS: &[&str] = &[
    "minimumCoverage",
    "scoringParameter",
    "scoringProfile",
    "highlightPostTag",
    "highlightPreTag",
    "highlight",
];

/// Parameters spelled with a `$` prefix in the query-string dialect.
const DOLLAR_PARAMS: &[&str] = &["top", "skip", "count", "orderby", "select", "filter"];

pub const DEFAULT_LIMIT: usize = 50;

/// Which parameter spelling a request uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// GET with `$`-prefixed names
    QueryString,
    /// POST with a JSON body and bare names
    Body,
}

/// Raw search parameters as received
#[derive(Debug, Clone, PartialEq)]
pub enum RequestParams {
    /// Ordered key/value pairs; keys may repeat
    QueryString(Vec<(String, String)>),
    /// JSON object body
    Body(Map<String, Value>),
}

impl RequestParams {
    pub fn dialect(&self) -> Dialect {
        match self {
            RequestParams::QueryString(_) => Dialect::QueryString,
            RequestParams::Body(_) => Dialect::Body,
        }
    }

    /// Dialect spelling of a parameter, e.g. `top` → `$top` for query strings.
    pub fn name(&self, bare: &str) -> String {
        match self {
            RequestParams::QueryString(_) if DOLLAR_PARAMS.contains(&bare) => format!("${}", bare),
            _ => bare.to_string(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            RequestParams::QueryString(pairs) => pairs.iter().any(|(k, _)| k == name),
            RequestParams::Body(map) => map.contains_key(name),
        }
    }

    /// Scalar parameter value as a string. JSON `null` counts as absent.
    pub fn get(&self, name: &str) -> Result<Option<String>, GatewayError> {
        match self {
            RequestParams::QueryString(pairs) => Ok(pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())),
            RequestParams::Body(map) => match map.get(name) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(s)) => Ok(Some(s.clone())),
                Some(Value::Number(n)) => Ok(Some(n.to_string())),
                Some(Value::Bool(b)) => Ok(Some(b.to_string())),
                Some(Value::Array(items)) => {
                    let parts = items
                        .iter()
                        .map(|item| match item {
                            Value::String(s) => Ok(s.clone()),
                            _ => Err(invalid_value(name, item)),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Some(parts.join(",")))
                }
                Some(other) => Err(invalid_value(name, other)),
            },
        }
    }

    /// Facet expressions: repeated `facet` pairs, or the body's `facets` list.
    pub fn facet_expressions(&self) -> Result<Vec<String>, GatewayError> {
        match self {
            RequestParams::QueryString(pairs) => Ok(pairs
                .iter()
                .filter(|(k, _)| k == "facet")
                .map(|(_, v)| v.clone())
                .collect()),
            RequestParams::Body(map) => match map.get("facets") {
                None | Some(Value::Null) => Ok(Vec::new()),
                Some(Value::Array(items)) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s.clone()),
                        _ => Err(invalid_value("facets", item)),
                    })
                    .collect(),
                Some(other) => Err(invalid_value("facets", other)),
            },
        }
    }
}

fn invalid_value(name: &str, value: &Value) -> GatewayError {
    GatewayError::ValueParse(format!("Invalid value for {}: {}", name, value))
}

/// How multiple search terms combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Any,
    All,
}

/// Canonical search request, fully translated
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub mode: SearchMode,
    pub search_fields: Option<Vec<String>>,
    /// Backend query text (already translated for simple syntax)
    pub query: String,
    pub skip: usize,
    pub limit: usize,
    pub count: bool,
    pub order_by: Option<Vec<String>>,
    pub select: Option<Vec<String>>,
    /// Keyed by backend facet key
    pub facets: Option<BTreeMap<String, FacetSpec>>,
    /// Backend filter query (already translated)
    pub filter_query: Option<String>,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            mode: SearchMode::Any,
            search_fields: None,
            query: "*".to_string(),
            skip: 0,
            limit: DEFAULT_LIMIT,
            count: false,
            order_by: None,
            select: None,
            facets: None,
            filter_query: None,
        }
    }
}

impl QueryRequest {
    /// Normalize raw parameters. Any failure aborts the whole request.
    pub fn from_params(params: &RequestParams) -> Result<Self, GatewayError> {
        if let Some(name) = UNSUPPORTED_PARAMS.iter().find(|p| params.contains(p)) {
            return Err(GatewayError::UnsupportedParameter(name.to_string()));
        }

        let query_type = params.get("queryType")?.unwrap_or_else(|| "simple".to_string());
        let search = params
            .get("search")?
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "*".to_string());
        let query = if query_type == "simple" {
            simple_to_lucene(&search)
        } else {
            search
        };

        let mode = match params.get("searchMode")?.as_deref() {
            None | Some("any") => SearchMode::Any,
            Some("all") => SearchMode::All,
            Some(other) => {
                return Err(GatewayError::ValueParse(format!(
                    "Invalid value for searchMode: {}",
                    other
                )))
            }
        };

        let skip = parse_unsigned(params, &params.name("skip"))?.unwrap_or(0);
        let limit = parse_unsigned(params, &params.name("top"))?.unwrap_or(DEFAULT_LIMIT);
        let count = parse_flag(params, &params.name("count"))?;

        let facets = parse_facets(params.facet_expressions()?)?;

        let filter_query = match params.get(&params.name("filter"))? {
            Some(filter) if !filter.trim().is_empty() => {
                Some(LuceneTranslator::translate_filter(&filter)?)
            }
            _ => None,
        };

        let request = Self {
            mode,
            search_fields: split_list(params.get("searchFields")?),
            query,
            skip,
            limit,
            count,
            order_by: split_list(params.get(&params.name("orderby"))?),
            select: split_list(params.get(&params.name("select"))?),
            facets,
            filter_query,
        };
        debug!(query = %request.query, filter = ?request.filter_query, "Normalized search request");
        Ok(request)
    }

    /// Backend JSON request payload
    pub fn to_backend_query(&self) -> Value {
        let mut params = json!({
            "q.op": match self.mode {
                SearchMode::All => "AND",
                SearchMode::Any => "OR",
            }
        });
        if let Some(field) = self.search_fields.as_ref().and_then(|f| f.first()) {
            params["df"] = json!(field);
        }

        let fields: Vec<&str> = match &self.select {
            Some(select) => select.iter().map(String::as_str).chain(["score"]).collect(),
            None => vec!["*", "score"],
        };

        let mut query = json!({
            "query": self.query,
            "params": params,
            "fields": fields,
            "offset": self.skip,
            "limit": self.limit,
        });

        if let Some(order_by) = &self.order_by {
            let sort: Vec<String> = order_by.iter().map(|o| sort_clause(o)).collect();
            query["sort"] = json!(sort.join(","));
        }
        if let Some(filter) = &self.filter_query {
            query["filter"] = json!(filter);
        }
        if let Some(facets) = &self.facets {
            let facet: Map<String, Value> = facets
                .iter()
                .map(|(key, spec)| (key.clone(), spec.to_backend_facet()))
                .collect();
            query["facet"] = Value::Object(facet);
        }

        query
    }
}

/// `rating desc` stays as is; a bare `name` becomes `name asc`.
fn sort_clause(order_by: &str) -> String {
    let mut parts = order_by.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(field), Some(direction)) => format!("{} {}", field, direction.to_ascii_lowercase()),
        (Some(field), None) => format!("{} asc", field),
        _ => String::new(),
    }
}

fn split_list(value: Option<String>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn parse_unsigned(params: &RequestParams, name: &str) -> Result<Option<usize>, GatewayError> {
    params
        .get(name)?
        .map(|raw| {
            raw.trim().parse::<usize>().map_err(|_| {
                GatewayError::ValueParse(format!("Invalid value for {}: {}", name, raw))
            })
        })
        .transpose()
}

fn parse_flag(params: &RequestParams, name: &str) -> Result<bool, GatewayError> {
    match params.get(name)? {
        None => Ok(false),
        Some(raw) if raw.eq_ignore_ascii_case("true") => Ok(true),
        Some(raw) if raw.eq_ignore_ascii_case("false") || raw.is_empty() => Ok(false),
        Some(raw) => Err(GatewayError::ValueParse(format!(
            "Invalid value for {}: {}",
            name, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::FacetSort;

    fn query_string(pairs: &[(&str, &str)]) -> RequestParams {
        RequestParams::QueryString(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn body(value: Value) -> RequestParams {
        match value {
            Value::Object(map) => RequestParams::Body(map),
            _ => panic!("body must be an object"),
        }
    }

    #[test]
    fn test_defaults() {
        let request = QueryRequest::from_params(&query_string(&[])).unwrap();
        assert_eq!(request, QueryRequest::default());
    }

    #[test]
    fn test_unsupported_params_rejected() {
        for name in UNSUPPORTED_PARAMS {
            let err = QueryRequest::from_params(&query_string(&[(name, "x")])).unwrap_err();
            assert!(matches!(err, GatewayError::UnsupportedParameter(ref p) if p == name));

            let mut map = Map::new();
            map.insert(name.to_string(), json!("x"));
            let err = QueryRequest::from_params(&RequestParams::Body(map)).unwrap_err();
            assert_eq!(err.kind(), "unsupported_param");
        }
    }

    #[test]
    fn test_simple_query_translated() {
        let request = QueryRequest::from_params(&query_string(&[("search", "wifi -smoking")])).unwrap();
        assert_eq!(request.query, "wifi !smoking");
    }

    #[test]
    fn test_full_query_passed_through() {
        let request = QueryRequest::from_params(&query_string(&[
            ("search", "wifi+pool"),
            ("queryType", "full"),
        ]))
        .unwrap();
        assert_eq!(request.query, "wifi+pool");
    }

    #[test]
    fn test_query_string_dialect() {
        let request = QueryRequest::from_params(&query_string(&[
            ("search", "hotel"),
            ("searchMode", "all"),
            ("searchFields", "name,description"),
            ("$skip", "20"),
            ("$top", "10"),
            ("$count", "TRUE"),
            ("$orderby", "rating desc,name"),
            ("$select", "name, rating"),
            ("facet", "city,count:3"),
            ("facet", "rating,sort:value"),
            ("$filter", "rating ge 3"),
        ]));
        // `ge` is not an operator of the grammar
        assert_eq!(request.unwrap_err().kind(), "odata_parse_fail");

        let request = QueryRequest::from_params(&query_string(&[
            ("search", "hotel"),
            ("searchMode", "all"),
            ("searchFields", "name,description"),
            ("$skip", "20"),
            ("$top", "10"),
            ("$count", "TRUE"),
            ("$orderby", "rating desc,name"),
            ("$select", "name, rating"),
            ("facet", "city,count:3"),
            ("facet", "rating,sort:value"),
            ("$filter", "rating gte 3"),
        ]))
        .unwrap();

        assert_eq!(request.mode, SearchMode::All);
        assert_eq!(request.search_fields, Some(vec!["name".into(), "description".into()]));
        assert_eq!(request.skip, 20);
        assert_eq!(request.limit, 10);
        assert!(request.count);
        assert_eq!(request.order_by, Some(vec!["rating desc".into(), "name".into()]));
        assert_eq!(request.select, Some(vec!["name".into(), "rating".into()]));
        let facets = request.facets.unwrap();
        assert_eq!(facets["facet_city"].limit, Some(3));
        assert_eq!(facets["facet_rating"].sort, Some(FacetSort::ByValueAscending));
        assert_eq!(request.filter_query.as_deref(), Some("rating:[3 TO *]"));
    }

    #[test]
    fn test_body_dialect() {
        let request = QueryRequest::from_params(&body(json!({
            "search": "spa|pool",
            "top": 5,
            "skip": "15",
            "count": true,
            "select": "name",
            "facets": ["city,sort:count"],
            "filter": "city eq 'Paris'",
        })))
        .unwrap();

        assert_eq!(request.query, "spa OR pool");
        assert_eq!(request.limit, 5);
        assert_eq!(request.skip, 15);
        assert!(request.count);
        assert_eq!(request.select, Some(vec!["name".into()]));
        assert!(request.facets.unwrap().contains_key("facet_city"));
        assert_eq!(request.filter_query.as_deref(), Some("city:\"Paris\""));
    }

    #[test]
    fn test_dialect_names_do_not_cross() {
        // Bare names are ignored on the query string, `$` names in bodies
        let request = QueryRequest::from_params(&query_string(&[("top", "5")])).unwrap();
        assert_eq!(request.limit, DEFAULT_LIMIT);
        let request = QueryRequest::from_params(&body(json!({"$top": 5}))).unwrap();
        assert_eq!(request.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn test_invalid_pagination() {
        let err = QueryRequest::from_params(&query_string(&[("$top", "ten")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for $top: ten");
        assert!(QueryRequest::from_params(&query_string(&[("$skip", "-1")])).is_err());
        assert!(QueryRequest::from_params(&body(json!({"top": {"n": 1}}))).is_err());
    }

    #[test]
    fn test_count_flag() {
        let parse = |v: &str| QueryRequest::from_params(&query_string(&[("$count", v)]));
        assert!(parse("true").unwrap().count);
        assert!(!parse("False").unwrap().count);
        assert!(parse("yes").is_err());
    }

    #[test]
    fn test_empty_filter_is_no_filter() {
        let request = QueryRequest::from_params(&query_string(&[("$filter", "  ")])).unwrap();
        assert_eq!(request.filter_query, None);
    }

    #[test]
    fn test_facet_failure_aborts() {
        let err = QueryRequest::from_params(&query_string(&[("facet", "city,sort:-count")]))
            .unwrap_err();
        assert_eq!(err.kind(), "unsupported_param");
    }

    #[test]
    fn test_body_facets_must_be_list() {
        let err = QueryRequest::from_params(&body(json!({"facets": "city"}))).unwrap_err();
        assert_eq!(err.kind(), "parse_fail");
    }

    #[test]
    fn test_backend_query_minimal() {
        let query = QueryRequest::default().to_backend_query();
        assert_eq!(
            query,
            json!({
                "query": "*",
                "params": {"q.op": "OR"},
                "fields": ["*", "score"],
                "offset": 0,
                "limit": 50,
            })
        );
    }

    #[test]
    fn test_backend_query_full() {
        let request = QueryRequest::from_params(&query_string(&[
            ("search", "hotel"),
            ("searchMode", "all"),
            ("searchFields", "description,name"),
            ("$orderby", "rating DESC,name"),
            ("$select", "name"),
            ("facet", "city,count:2"),
            ("$filter", "rating lt 4"),
        ]))
        .unwrap();

        let query = request.to_backend_query();
        assert_eq!(query["params"]["q.op"], "AND");
        assert_eq!(query["params"]["df"], "description");
        assert_eq!(query["fields"], json!(["name", "score"]));
        assert_eq!(query["sort"], "rating desc,name asc");
        assert_eq!(query["filter"], "rating:[* TO 4}");
        assert_eq!(
            query["facet"],
            json!({"facet_city": {"type": "terms", "field": "city", "limit": 2}})
        );
    }
}
