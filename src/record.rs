//! Normalized output records and the per-entry record builder.
//!
//! The builder orchestrates path resolution and field parsing for one
//! raw entry against one collection description, producing a
//! [`NormalizedRecord`]. Building is deterministic: the same entry and
//! schema always yield byte-identical output (extras and tags are kept
//! in ordered collections).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{HarvesterError, Result};
use crate::parsers::{FieldParser, Role};
use crate::path::{as_scalar_string, resolve};
use crate::schema::{CollectionSchema, ResourceField};

/// Import status of a record relative to the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    New,
    Change,
    Unchanged,
}

/// One downloadable or linkable artifact attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Resource {
    pub fields: BTreeMap<String, String>,
}

/// The core's output: one catalogue dataset in the common schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRecord {
    /// Derived dataset name; the de-duplication key.
    pub name: String,

    /// Provider identifier, when the entry carried one.
    pub identifier: Option<String>,

    pub title: Option<String>,
    pub timerange_start: Option<String>,
    pub timerange_end: Option<String>,

    /// Serialized GeoJSON geometry.
    pub spatial: Option<String>,

    pub status: RecordStatus,
    pub resources: Vec<Resource>,
    pub extras: BTreeMap<String, String>,
    pub tags: BTreeSet<String>,
}

/// Lookup seam to the host catalogue's existing datasets.
pub trait DatasetStore {
    /// Whether a dataset with this derived name was harvested before.
    fn contains(&self, name: &str) -> bool;
}

/// Characters not allowed in a derived dataset name.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NAME_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9._-]+").expect("valid regex"));

/// Derive the internal dataset name from a URL-like identifier: final
/// path segment, extension stripped, lower-cased, disallowed
/// characters replaced.
#[must_use]
pub fn derive_name(identifier: &str) -> String {
    let tail = identifier.rsplit('/').next().unwrap_or(identifier);
    let stem = match tail.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => tail,
    };
    let lowered = stem.to_lowercase();
    NAME_DISALLOWED.replace_all(&lowered, "_").trim_matches('_').to_string()
}

/// Builds normalized records for one collection.
#[derive(Debug)]
pub struct HarvestRecordBuilder<'a> {
    schema: &'a CollectionSchema,
    collection_key: &'a str,
    update_all: bool,
}

impl<'a> HarvestRecordBuilder<'a> {
    #[must_use]
    pub fn new(schema: &'a CollectionSchema, collection_key: &'a str, update_all: bool) -> Self {
        Self {
            schema,
            collection_key,
            update_all,
        }
    }

    /// Build one normalized record from a raw entry.
    ///
    /// Missing mandatory fields degrade to absent values; only the
    /// spatial parsers fail the entry, with a `FieldParse` error. An
    /// entry resolving neither an identifier nor a title cannot be
    /// de-duplicated and also fails with `FieldParse`.
    pub fn build(&self, entry: &Value, store: &dyn DatasetStore) -> Result<NormalizedRecord> {
        let mut identifier = None;
        let mut title = None;
        let mut timerange_start = None;
        let mut timerange_end = None;
        let mut spatial = None;
        let mut extras = BTreeMap::new();

        for (field, spec) in &self.schema.mandatory_fields {
            let Some(raw) = resolve(entry, &spec.path) else {
                tracing::debug!(field = %field, "Mandatory field not found in entry");
                continue;
            };

            let role = if field == "timerange_end" {
                Role::End
            } else {
                Role::Start
            };

            let value = match spec.parse_function {
                Some(parser) => match parser.apply(raw, role) {
                    Ok(value) => Some(value),
                    // Spatial parse failures are entry-scoped errors;
                    // anything else degrades to an absent value.
                    Err(e) if matches!(parser, FieldParser::Wkt | FieldParser::GeoJson) => {
                        return Err(e);
                    }
                    Err(e) => {
                        tracing::warn!(field = %field, error = %e, "Field parser failed, leaving field absent");
                        None
                    }
                },
                None => as_scalar_string(raw),
            };

            match field.as_str() {
                "identifier" => identifier = value,
                "title" => title = value,
                "timerange_start" => timerange_start = value,
                "timerange_end" => timerange_end = value,
                "spatial" => spatial = value,
                other => {
                    // Names outside the common schema are preserved as extras.
                    if let Some(value) = value {
                        extras.insert(other.to_string(), value);
                    }
                }
            }
        }

        let name_source = identifier.as_deref().or(title.as_deref()).ok_or_else(|| {
            HarvesterError::field_parse("identifier", "entry has no identifier or title")
        })?;
        let name = derive_name(name_source);

        let resources = self.build_resources(entry);

        for extra in &self.schema.extras {
            if let Some(value) = resolve(entry, &extra.path).and_then(as_scalar_string) {
                extras.insert(extra.key.clone(), value);
            }
        }

        let mut tags: BTreeSet<String> = self.schema.tags.iter().cloned().collect();
        tags.insert(self.collection_key.to_string());

        let status = if !store.contains(&name) {
            RecordStatus::New
        } else if self.update_all {
            RecordStatus::Change
        } else {
            RecordStatus::Unchanged
        };

        Ok(NormalizedRecord {
            name,
            identifier,
            title,
            timerange_start,
            timerange_end,
            spatial,
            status,
            resources,
            extras,
            tags,
        })
    }

    /// Apply the resource templates. Resources are all-or-nothing: a
    /// template with any unresolvable `path` sub-field yields no
    /// resource at all.
    fn build_resources(&self, entry: &Value) -> Vec<Resource> {
        let mut resources = Vec::new();
        'templates: for template in &self.schema.resources {
            let mut fields = BTreeMap::new();
            for (field, value) in &template.fields {
                match value {
                    ResourceField::Literal(text) => {
                        fields.insert(field.clone(), text.clone());
                    }
                    ResourceField::Path(path) => {
                        match resolve(entry, path).and_then(as_scalar_string) {
                            Some(resolved) => {
                                fields.insert(field.clone(), resolved);
                            }
                            None => {
                                tracing::debug!(field = %field, "Resource path unresolved, dropping resource");
                                continue 'templates;
                            }
                        }
                    }
                }
            }
            resources.push(Resource { fields });
        }
        resources
    }
}
