//! OpenSearch Harvester - gather catalogue records from OpenSearch-style providers.
//!
//! This crate provides a configuration-driven extraction engine for
//! harvesting external data catalogues: declarative collection
//! descriptions map each provider's record shape onto a common dataset
//! schema, and a restart-safe pagination cursor lets independent
//! harvest runs resume where the last completed run left off.
//!
//! # Example
//!
//! ```
//! use opensearch_harvester::path::{resolve, PathSegment};
//! use serde_json::json;
//!
//! let entry = json!({"properties": {"title": "S2A_MSIL1C_20200101"}});
//! let path = [PathSegment::new("properties"), PathSegment::new("title")];
//! assert_eq!(resolve(&entry, &path), Some(&json!("S2A_MSIL1C_20200101")));
//! ```
//!
//! # Architecture
//!
//! The harvester is organized into several modules:
//!
//! - [`config`]: Harvest source configuration and validation
//! - [`error`]: Error types and Result alias
//! - [`path`]: Declarative path resolution over nested records
//! - [`schema`]: Collection descriptions and the schema catalog
//! - [`parsers`]: Named field parsers (dates, ranges, geometry)
//! - [`spatial`]: WKT and GeoJSON footprint conversion
//! - [`xml`]: XML normalization into the common nested-mapping shape
//! - [`http`]: HTTP client, pacing, and page fetching
//! - [`pagination`]: Paginated query state machine
//! - [`record`]: Normalized records and the per-entry builder
//! - [`cursor`]: Restart-safe pagination cursor recovery
//! - [`store`]: In-memory host-store implementation
//! - [`harvester`]: Gather-phase orchestration
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod cursor;
pub mod error;
pub mod harvester;
pub mod http;
pub mod pagination;
pub mod parsers;
pub mod path;
pub mod record;
pub mod schema;
pub mod spatial;
pub mod store;
pub mod xml;

// Re-export main functions
pub use harvester::{gather, GatherOutcome};

// Re-export commonly used items
pub use config::HarvestConfig;
pub use cursor::{CursorStore, HarvestCursor, RestartCursor};
pub use error::{HarvesterError, Result};
pub use record::{DatasetStore, NormalizedRecord, RecordStatus, Resource};
pub use schema::{CollectionSchema, SchemaCatalog};
