// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Index definitions and the registry of served indexes.
//!
//! Definitions use the managed-service JSON format:
//!
//! ```json
//! [{"name": "hotels", "fields": [
//!     {"name": "hotelId", "type": "Edm.String", "key": true},
//!     {"name": "description", "type": "Edm.String", "searchable": true}
//! ]}]
//! ```
//!
//! The registry is thread-safe (`parking_lot::RwLock`): written at bootstrap
//! and on index creation, read on every request.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{SchemaError, SchemaFieldDef, SchemaPayload, SchemaTranslator};

fn default_true() -> bool {
    true
}

/// A field as written in an index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default = "default_true")]
    pub retrievable: bool,
}

/// A managed-service index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub fields: Vec<IndexField>,
}

impl IndexDefinition {
    /// Abstract field definitions. Fails on unknown types.
    pub fn schema_fields(&self) -> Result<Vec<SchemaFieldDef>, SchemaError> {
        self.fields
            .iter()
            .map(|f| {
                let mut def = SchemaFieldDef::new(f.name.clone(), f.field_type.parse()?);
                if f.searchable {
                    def = def.searchable();
                }
                if f.retrievable {
                    def = def.retrievable();
                }
                if f.key {
                    def = def.primary();
                }
                Ok(def)
            })
            .collect()
    }

    /// Backend schema payload for this index.
    pub fn schema_payload(&self) -> Result<SchemaPayload, SchemaError> {
        SchemaTranslator::translate(&self.schema_fields()?)
    }

    /// Name of the key field.
    pub fn primary_key(&self) -> Result<String, SchemaError> {
        let fields = self.schema_fields()?;
        SchemaTranslator::primary_key(&fields).map(str::to_string)
    }
}

/// A definition accepted into the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredIndex {
    pub definition: IndexDefinition,
    pub primary_key: String,
}

/// Indexes the gateway currently serves.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    indexes: RwLock<HashMap<String, Arc<RegisteredIndex>>>,
}

impl IndexRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace an index. Validates the definition first.
    pub fn register(&self, definition: IndexDefinition) -> Result<Arc<RegisteredIndex>, SchemaError> {
        let primary_key = definition.primary_key()?;
        let entry = Arc::new(RegisteredIndex {
            definition,
            primary_key,
        });
        self.indexes
            .write()
            .insert(entry.definition.name.clone(), Arc::clone(&entry));
        Ok(entry)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<RegisteredIndex>> {
        self.indexes.read().get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.indexes.read().contains_key(name)
    }

    /// Registered index names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indexes.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indexes.read().is_empty()
    }
}
