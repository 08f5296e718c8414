//! Facet expression translation.
//!
//! Facet expressions look like `field[,option:value]*`:
//!
//! ```text
//! city                      - terms facet on city
//! city,count:3              - top 3 buckets
//! city,sort:count           - ascending by count
//! city,sort:value           - ascending by value
//! ```
//!
//! `sort:-count`, `sort:-value`, `values:`, `interval:` and `timeoffset:`
//! are recognized and rejected. Any other option is ignored.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use crate::error::GatewayError;

/// Prefix the backend facet keys carry; stripped again when formatting.
pub const FACET_KEY_PREFIX: &str = "facet_";

/// Supported facet ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetSort {
    ByCountAscending,
    ByValueAscending,
}

impl FacetSort {
    fn backend_sort(self) -> &'static str {
        match self {
            FacetSort::ByCountAscending => "count asc",
            FacetSort::ByValueAscending => "index asc",
        }
    }
}

/// One parsed facet directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetSpec {
    pub field: String,
    pub limit: Option<usize>,
    pub sort: Option<FacetSort>,
}

impl FacetSpec {
    /// Parse a single facet expression.
    pub fn parse(expr: &str) -> Result<Self, GatewayError> {
        let mut parts = expr.split(',');
        let field = parts.next().unwrap_or_default().trim();
        if field.is_empty() {
            return Err(GatewayError::ValueParse(format!(
                "Facet expression '{}' has no field",
                expr
            )));
        }

        let mut spec = FacetSpec {
            field: field.to_string(),
            limit: None,
            sort: None,
        };

        for option in parts {
            let Some((key, value)) = option.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "count" => {
                    let limit = value.parse::<usize>().map_err(|_| {
                        GatewayError::ValueParse(format!("Invalid facet count: {}", value))
                    })?;
                    spec.limit = Some(limit);
                }
                "sort" => {
                    spec.sort = Some(match value {
                        "count" => FacetSort::ByCountAscending,
                        "value" => FacetSort::ByValueAscending,
                        "-count" | "-value" => {
                            return Err(GatewayError::UnsupportedFacetModifier(value.to_string()))
                        }
                        other => {
                            return Err(GatewayError::ValueParse(format!(
                                "Invalid facet sort: {}",
                                other
                            )))
                        }
                    });
                }
                modifier @ ("values" | "interval" | "timeoffset") => {
                    return Err(GatewayError::UnsupportedFacetModifier(modifier.to_string()));
                }
                _ => {}
            }
        }

        Ok(spec)
    }

    /// Key used for this facet in the backend request and response
    pub fn key(&self) -> String {
        format!("{}{}", FACET_KEY_PREFIX, self.field)
    }

    /// Terms facet definition for the backend JSON facet API
    pub fn to_backend_facet(&self) -> Value {
        let mut facet = json!({
            "type": "terms",
            "field": self.field,
        });
        if let Some(limit) = self.limit {
            facet["limit"] = json!(limit);
        }
        if let Some(sort) = self.sort {
            facet["sort"] = json!(sort.backend_sort());
        }
        facet
    }
}

/// Parse a list of facet expressions keyed by backend facet key.
///
/// Returns `None` when there is nothing to facet on.
pub fn parse_facets<I, S>(exprs: I) -> Result<Option<BTreeMap<String, FacetSpec>>, GatewayError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut facets = BTreeMap::new();
    for expr in exprs {
        let spec = FacetSpec::parse(expr.as_ref())?;
        facets.insert(spec.key(), spec);
    }
    Ok(if facets.is_empty() { None } else { Some(facets) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_and_sort() {
        let spec = FacetSpec::parse("city,count:3,sort:count").unwrap();
        assert_eq!(spec.field, "city");
        assert_eq!(spec.limit, Some(3));
        assert_eq!(spec.sort, Some(FacetSort::ByCountAscending));
    }

    #[test]
    fn test_sort_by_value() {
        let spec = FacetSpec::parse("rating,sort:value").unwrap();
        assert_eq!(spec.sort, Some(FacetSort::ByValueAscending));
        assert_eq!(spec.limit, None);
    }

    #[test]
    fn test_descending_sort_rejected() {
        let err = FacetSpec::parse("city,sort:-count").unwrap_err();
        assert!(matches!(err, GatewayError::UnsupportedFacetModifier(ref m) if m == "-count"));
        assert!(err.to_string().contains("-count"));

        let err = FacetSpec::parse("city,sort:-value").unwrap_err();
        assert!(err.to_string().contains("-value"));
    }

    #[test]
    fn test_unsupported_modifiers_rejected() {
        for expr in [
            "rating,values:1|2|3",
            "price,interval:10",
            "date,timeoffset:-01:00",
        ] {
            let err = FacetSpec::parse(expr).unwrap_err();
            assert_eq!(err.kind(), "unsupported_param", "{}", expr);
        }
    }

    #[test]
    fn test_bad_count_is_value_error() {
        let err = FacetSpec::parse("city,count:lots").unwrap_err();
        assert!(matches!(err, GatewayError::ValueParse(_)));
        assert!(FacetSpec::parse("city,count:-1").is_err());
    }

    #[test]
    fn test_unknown_options_ignored() {
        let spec = FacetSpec::parse("city,colour:blue,flag").unwrap();
        assert_eq!(
            spec,
            FacetSpec {
                field: "city".into(),
                limit: None,
                sort: None
            }
        );
    }

    #[test]
    fn test_empty_field_rejected() {
        assert!(FacetSpec::parse("").is_err());
        assert!(FacetSpec::parse(",count:3").is_err());
    }

    #[test]
    fn test_backend_facet() {
        let spec = FacetSpec::parse("city,count:5,sort:value").unwrap();
        assert_eq!(spec.key(), "facet_city");
        assert_eq!(
            spec.to_backend_facet(),
            json!({"type": "terms", "field": "city", "limit": 5, "sort": "index asc"})
        );
    }

    #[test]
    fn test_parse_facets_empty_is_none() {
        let none: Vec<&str> = Vec::new();
        assert!(parse_facets(none).unwrap().is_none());

        let facets = parse_facets(["city", "rating,count:2"]).unwrap().unwrap();
        assert_eq!(facets.len(), 2);
        assert_eq!(facets["facet_rating"].limit, Some(2));
    }
}
