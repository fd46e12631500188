//! Collection descriptions and the schema catalog.
//!
//! A collection description declares, per provider collection, where
//! the entry list lives in a fetched page, which paths yield the
//! mandatory fields (with their parser tags), how to template output
//! resources, and which extras and tags to carry. Descriptions are
//! static declarative data: the catalog loads them once from JSON,
//! validates them, and is read-only for the rest of the process.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{HarvesterError, Result};
use crate::parsers::FieldParser;
use crate::path::PathSegment;

/// How the page-start parameter advances between pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum PaginationMode {
    /// The parameter is a result offset: advance by the number of
    /// entries consumed.
    #[default]
    #[serde(rename = "offset")]
    Offset,

    /// The parameter is a page number: advance by a flat `+1`
    /// regardless of how many entries the page returned. Some
    /// providers' harvesters behave this way; under partial pages it
    /// can skip or re-read entries, which is reproduced here rather
    /// than corrected.
    #[serde(rename = "page")]
    Page,
}

/// Path plus optional parser for one mandatory field.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    /// Path to the raw value within an entry.
    pub path: Vec<PathSegment>,

    /// Parser applied to the raw value, if any.
    #[serde(default)]
    pub parse_function: Option<FieldParser>,
}

/// One sub-field of a resource template: literal text copied verbatim,
/// or a path resolved against the entry.
#[derive(Debug, Clone, Deserialize)]
pub enum ResourceField {
    #[serde(rename = "literal")]
    Literal(String),

    #[serde(rename = "path")]
    Path(Vec<PathSegment>),
}

/// Template for one output resource (name, url, mimetype, ...).
///
/// Resources are all-or-nothing: if any `path`-typed sub-field fails
/// to resolve, the whole resource is dropped.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct ResourceSpec {
    pub fields: BTreeMap<String, ResourceField>,
}

/// One provider-specific extra carried outside the mandatory fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtraSpec {
    /// Output key of the extra.
    pub key: String,

    /// Path to its value within an entry.
    pub path: Vec<PathSegment>,
}

/// Declarative mapping from one provider collection's record shape to
/// the common output schema.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSchema {
    /// Path to the array of raw entries within a fetched page.
    pub entry_list_path: Vec<PathSegment>,

    /// Mandatory fields by logical name (`identifier`, `title`,
    /// `timerange_start`, `timerange_end`, `spatial`).
    pub mandatory_fields: BTreeMap<String, FieldSpec>,

    /// Resource templates, applied in order.
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,

    /// Extra fields, applied in order.
    #[serde(default)]
    pub extras: Vec<ExtraSpec>,

    /// Provider-side filter token sent with the query.
    #[serde(default)]
    pub search_keyword: Option<String>,

    /// Static tags attached to every record of this collection.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Cursor-advance behavior for this provider.
    #[serde(default)]
    pub pagination_mode: PaginationMode,
}

/// In-memory registry of named collection descriptions.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    collections: BTreeMap<String, CollectionSchema>,
}

impl SchemaCatalog {
    /// Load and validate a catalog from its JSON text.
    ///
    /// # Errors
    /// `InvalidSchema` when a description fails to deserialize (which
    /// covers unknown parser tags) or declares an empty path.
    pub fn from_json(raw: &str) -> Result<Self> {
        let collections: BTreeMap<String, CollectionSchema> = serde_json::from_str(raw)
            .map_err(|e| HarvesterError::InvalidSchema {
                collection: "<catalog>".to_string(),
                reason: e.to_string(),
            })?;
        let catalog = Self { collections };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Build a catalog from already-constructed descriptions.
    pub fn new(collections: BTreeMap<String, CollectionSchema>) -> Result<Self> {
        let catalog = Self { collections };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Look up a collection description.
    ///
    /// # Errors
    /// `UnknownCollection` if the key is not in the catalog.
    pub fn get(&self, collection_key: &str) -> Result<&CollectionSchema> {
        self.collections
            .get(collection_key)
            .ok_or_else(|| HarvesterError::UnknownCollection(collection_key.to_string()))
    }

    /// Keys of all loaded collections.
    pub fn collection_keys(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    fn validate(&self) -> Result<()> {
        for (key, schema) in &self.collections {
            let invalid = |reason: String| HarvesterError::InvalidSchema {
                collection: key.clone(),
                reason,
            };

            if schema.entry_list_path.is_empty() {
                return Err(invalid("'entry_list_path' must not be empty".to_string()));
            }
            for (field, spec) in &schema.mandatory_fields {
                if spec.path.is_empty() {
                    return Err(invalid(format!(
                        "mandatory field '{field}' declares an empty path"
                    )));
                }
            }
            for (index, resource) in schema.resources.iter().enumerate() {
                for (field, value) in &resource.fields {
                    if let ResourceField::Path(path) = value {
                        if path.is_empty() {
                            return Err(invalid(format!(
                                "resource {index} field '{field}' declares an empty path"
                            )));
                        }
                    }
                }
            }
            for extra in &schema.extras {
                if extra.path.is_empty() {
                    return Err(invalid(format!(
                        "extra '{}' declares an empty path",
                        extra.key
                    )));
                }
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::SENTINEL_CATALOG;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_catalog_loads_and_resolves() {
        let catalog = SchemaCatalog::from_json(SENTINEL_CATALOG).unwrap();
        let schema = catalog.get("SENTINEL2_L1C").unwrap();
        assert_eq!(schema.search_keyword.as_deref(), Some("S2MSI1C"));
        assert_eq!(schema.mandatory_fields.len(), 5);
        assert_eq!(schema.resources.len(), 2);
        assert_eq!(schema.pagination_mode, PaginationMode::Offset);
        assert_eq!(
            schema.mandatory_fields["spatial"].parse_function,
            Some(FieldParser::Wkt)
        );
    }

    #[test]
    fn test_unknown_collection() {
        let catalog = SchemaCatalog::from_json(SENTINEL_CATALOG).unwrap();
        let err = catalog.get("SENTINEL5P").unwrap_err();
        assert!(matches!(err, HarvesterError::UnknownCollection(_)));
    }

    #[test]
    fn test_unknown_parser_tag_fails_at_load() {
        let raw = r#"{
            "C": {
                "entry_list_path": ["feed", "entry"],
                "mandatory_fields": {
                    "identifier": {"path": ["id"], "parse_function": "iso8601"}
                }
            }
        }"#;
        let err = SchemaCatalog::from_json(raw).unwrap_err();
        assert!(matches!(err, HarvesterError::InvalidSchema { .. }));
    }

    #[test]
    fn test_empty_mandatory_path_fails_at_load() {
        let raw = r#"{
            "C": {
                "entry_list_path": ["feed", "entry"],
                "mandatory_fields": {
                    "identifier": {"path": []}
                }
            }
        }"#;
        let err = SchemaCatalog::from_json(raw).unwrap_err();
        assert!(err.to_string().contains("identifier"));
    }

    #[test]
    fn test_resource_field_must_be_literal_or_path() {
        let raw = r#"{
            "C": {
                "entry_list_path": ["feed", "entry"],
                "mandatory_fields": {"identifier": {"path": ["id"]}},
                "resources": [
                    {"url": {"template": "https://example.com/{id}"}}
                ]
            }
        }"#;
        assert!(SchemaCatalog::from_json(raw).is_err());
    }

    #[test]
    fn test_page_pagination_mode_parses() {
        let raw = r#"{
            "C": {
                "entry_list_path": ["results"],
                "mandatory_fields": {"identifier": {"path": ["id"]}},
                "pagination_mode": "page"
            }
        }"#;
        let catalog = SchemaCatalog::from_json(raw).unwrap();
        assert_eq!(
            catalog.get("C").unwrap().pagination_mode,
            PaginationMode::Page
        );
    }

    #[test]
    fn test_collection_keys_sorted() {
        let raw = r#"{
            "B": {"entry_list_path": ["r"], "mandatory_fields": {"identifier": {"path": ["id"]}}},
            "A": {"entry_list_path": ["r"], "mandatory_fields": {"identifier": {"path": ["id"]}}}
        }"#;
        let catalog = SchemaCatalog::from_json(raw).unwrap();
        let keys: Vec<&str> = catalog.collection_keys().collect();
        assert_eq!(keys, vec!["A", "B"]);
    }
}
