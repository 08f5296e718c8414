// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Schema field translation.
//!
//! Maps managed-service field definitions (abstract type plus tags) onto
//! backend schema API commands.
//!
//! # Example
//!
//! ```rust
//! use search_gateway::schema::{FieldType, SchemaFieldDef, SchemaTranslator};
//!
//! let fields = vec![
//!     SchemaFieldDef::new("sku", FieldType::String).primary().retrievable(),
//!     SchemaFieldDef::new("tags", FieldType::StringCollection).searchable(),
//! ];
//!
//! let payload = SchemaTranslator::translate(&fields).unwrap();
//! assert_eq!(payload.add_field.len(), 1);
//! assert_eq!(payload.add_field[0].field_type, "text_general");
//! assert!(payload.add_field[0].multi_valued);
//! assert_eq!(payload.add_copy_field.unwrap().dest, "id");
//! ```
//!
//! # Type Mapping
//!
//! ```text
//! Edm.String              → string      (text_general when searchable)
//! Collection(Edm.String)  → string      (text_general when searchable), multiValued
//! Edm.Int32               → pint
//! Edm.Int64               → plong
//! Edm.Boolean             → boolean
//! Edm.Double              → pdouble
//! Edm.DateTimeOffset      → pdate
//! ```
//!
//! The backend's own identity field is always `id`. A primary key with any
//! other name is aliased by a copy rule into `id` instead of a field rule of
//! its own, and no field rule is ever emitted for `id` itself.

mod registry;

pub use registry::{IndexDefinition, IndexField, IndexRegistry, RegisteredIndex};

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Identity field name on the backend side
pub const BACKEND_ID_FIELD: &str = "id";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Unknown field type: {0}")]
    UnknownType(String),
    #[error("Index definition has no key field")]
    MissingPrimary,
    #[error("Index definition has more than one key field: {0}")]
    MultiplePrimary(String),
}

/// Abstract field types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    StringCollection,
    Int32,
    Int64,
    Boolean,
    Double,
    DateTime,
}

impl FieldType {
    /// Backend type name.
    pub fn backend_type(self, searchable: bool) -> &'static str {
        match self {
            FieldType::String | FieldType::StringCollection => {
                if searchable {
                    "text_general"
                } else {
                    "string"
                }
            }
            FieldType::Int32 => "pint",
            FieldType::Int64 => "plong",
            FieldType::Boolean => "boolean",
            FieldType::Double => "pdouble",
            FieldType::DateTime => "pdate",
        }
    }

    pub fn is_collection(self) -> bool {
        matches!(self, FieldType::StringCollection)
    }
}

impl FromStr for FieldType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Edm.String" => Ok(FieldType::String),
            "Collection(Edm.String)" => Ok(FieldType::StringCollection),
            "Edm.Int32" => Ok(FieldType::Int32),
            "Edm.Int64" => Ok(FieldType::Int64),
            "Edm.Boolean" => Ok(FieldType::Boolean),
            "Edm.Double" => Ok(FieldType::Double),
            "Edm.DateTimeOffset" => Ok(FieldType::DateTime),
            other => Err(SchemaError::UnknownType(other.to_string())),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "Edm.String",
            FieldType::StringCollection => "Collection(Edm.String)",
            FieldType::Int32 => "Edm.Int32",
            FieldType::Int64 => "Edm.Int64",
            FieldType::Boolean => "Edm.Boolean",
            FieldType::Double => "Edm.Double",
            FieldType::DateTime => "Edm.DateTimeOffset",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldTag {
    Searchable,
    Retrievable,
}

/// One abstract field definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFieldDef {
    pub name: String,
    pub field_type: FieldType,
    pub tags: BTreeSet<FieldTag>,
    pub is_primary: bool,
}

impl SchemaFieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            tags: BTreeSet::new(),
            is_primary: false,
        }
    }

    pub fn searchable(mut self) -> Self {
        self.tags.insert(FieldTag::Searchable);
        self
    }

    pub fn retrievable(mut self) -> Self {
        self.tags.insert(FieldTag::Retrievable);
        self
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    pub fn has_tag(&self, tag: FieldTag) -> bool {
        self.tags.contains(&tag)
    }
}

/// `add-field` command entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRule {
    pub name: String,
    pub indexed: bool,
    #[serde(rename = "type")]
    pub field_type: &'static str,
    #[serde(rename = "multiValued")]
    pub multi_valued: bool,
    pub stored: bool,
}

/// `add-copy-field` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyFieldRule {
    pub source: String,
    pub dest: String,
}

/// Body of a backend schema API request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaPayload {
    #[serde(rename = "add-field")]
    pub add_field: Vec<FieldRule>,
    #[serde(rename = "add-copy-field", skip_serializing_if = "Option::is_none")]
    pub add_copy_field: Option<CopyFieldRule>,
}

pub struct SchemaTranslator;

impl SchemaTranslator {
    /// Translate field definitions, in order, into a schema payload.
    pub fn translate(fields: &[SchemaFieldDef]) -> Result<SchemaPayload, SchemaError> {
        let primary = Self::primary_key(fields)?;

        let add_field = fields
            .iter()
            .filter(|f| !f.is_primary && f.name != BACKEND_ID_FIELD)
            .map(|f| FieldRule {
                name: f.name.clone(),
                indexed: true,
                field_type: f.field_type.backend_type(f.has_tag(FieldTag::Searchable)),
                multi_valued: f.field_type.is_collection(),
                stored: f.has_tag(FieldTag::Retrievable),
            })
            .collect();

        let add_copy_field = (primary != BACKEND_ID_FIELD).then(|| CopyFieldRule {
            source: primary.to_string(),
            dest: BACKEND_ID_FIELD.to_string(),
        });

        Ok(SchemaPayload {
            add_field,
            add_copy_field,
        })
    }

    /// Name of the single primary field.
    pub fn primary_key(fields: &[SchemaFieldDef]) -> Result<&str, SchemaError> {
        let mut primaries = fields.iter().filter(|f| f.is_primary);
        match (primaries.next(), primaries.next()) {
            (Some(field), None) => Ok(&field.name),
            (None, _) => Err(SchemaError::MissingPrimary),
            (Some(_), Some(_)) => Err(SchemaError::MultiplePrimary(
                fields
                    .iter()
                    .filter(|f| f.is_primary)
                    .map(|f| f.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_table() {
        let cases = [
            ("Edm.String", false, "string"),
            ("Edm.String", true, "text_general"),
            ("Collection(Edm.String)", false, "string"),
            ("Edm.Int32", false, "pint"),
            ("Edm.Int64", false, "plong"),
            ("Edm.Boolean", false, "boolean"),
            ("Edm.Double", false, "pdouble"),
            ("Edm.DateTimeOffset", true, "pdate"),
        ];
        for (name, searchable, expected) in cases {
            let field_type: FieldType = name.parse().unwrap();
            assert_eq!(field_type.backend_type(searchable), expected, "{}", name);
            assert_eq!(field_type.to_string(), name);
        }
    }

    #[test]
    fn test_unknown_type_fails() {
        let err = "Edm.GeographyPoint".parse::<FieldType>().unwrap_err();
        assert_eq!(err, SchemaError::UnknownType("Edm.GeographyPoint".into()));
    }

    #[test]
    fn test_primary_alias_copies_to_id() {
        let fields = vec![
            SchemaFieldDef::new("sku", FieldType::String).primary().retrievable(),
            SchemaFieldDef::new("name", FieldType::String).searchable().retrievable(),
        ];
        let payload = SchemaTranslator::translate(&fields).unwrap();

        assert_eq!(
            payload.add_copy_field,
            Some(CopyFieldRule {
                source: "sku".into(),
                dest: "id".into()
            })
        );
        assert!(payload.add_field.iter().all(|f| f.name != "id"));
        assert!(payload.add_field.iter().all(|f| f.name != "sku"));
        assert_eq!(payload.add_field.len(), 1);
    }

    #[test]
    fn test_primary_named_id_needs_no_rules() {
        let fields = vec![
            SchemaFieldDef::new("id", FieldType::String).primary(),
            SchemaFieldDef::new("rating", FieldType::Int32).retrievable(),
        ];
        let payload = SchemaTranslator::translate(&fields).unwrap();
        assert!(payload.add_copy_field.is_none());
        assert_eq!(payload.add_field.len(), 1);
        assert_eq!(payload.add_field[0].name, "rating");
    }

    #[test]
    fn test_searchable_collection_is_full_text_multi_valued() {
        let fields = vec![
            SchemaFieldDef::new("id", FieldType::String).primary(),
            SchemaFieldDef::new("tags", FieldType::StringCollection).searchable(),
        ];
        let payload = SchemaTranslator::translate(&fields).unwrap();
        assert_eq!(
            payload.add_field[0],
            FieldRule {
                name: "tags".into(),
                indexed: true,
                field_type: "text_general",
                multi_valued: true,
                stored: false,
            }
        );
    }

    #[test]
    fn test_primary_key_count_enforced() {
        let none = vec![SchemaFieldDef::new("name", FieldType::String)];
        assert_eq!(
            SchemaTranslator::translate(&none).unwrap_err(),
            SchemaError::MissingPrimary
        );

        let two = vec![
            SchemaFieldDef::new("a", FieldType::String).primary(),
            SchemaFieldDef::new("b", FieldType::String).primary(),
        ];
        assert_eq!(
            SchemaTranslator::translate(&two).unwrap_err(),
            SchemaError::MultiplePrimary("a, b".into())
        );
    }

    #[test]
    fn test_payload_serialization() {
        let fields = vec![
            SchemaFieldDef::new("sku", FieldType::String).primary().retrievable(),
            SchemaFieldDef::new("price", FieldType::Double).retrievable(),
        ];
        let payload = serde_json::to_value(SchemaTranslator::translate(&fields).unwrap()).unwrap();
        assert_eq!(
            payload,
            json!({
                "add-field": [
                    {"name": "price", "indexed": true, "type": "pdouble", "multiValued": false, "stored": true},
                ],
                "add-copy-field": {"source": "sku", "dest": "id"},
            })
        );
    }
}
