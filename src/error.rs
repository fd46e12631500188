//! Error types for the harvester.
//!
//! Uses a single library-level error enum: fatal configuration and
//! schema errors abort a run before any network call, page-level
//! network errors end the current run's page loop, and `FieldParse`
//! errors are scoped to a single entry.

use thiserror::Error;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// Missing or invalid required configuration key.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The requested collection is not in the schema catalog.
    #[error("Unknown collection: '{0}'")]
    UnknownCollection(String),

    /// A collection description failed load-time validation.
    #[error("Invalid collection schema for '{collection}': {reason}")]
    InvalidSchema { collection: String, reason: String },

    /// A page fetch timed out.
    #[error("Request timed out after {timeout_secs}s: {url}")]
    RequestTimeout { url: String, timeout_secs: u64 },

    /// A page fetch returned a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a body we cannot interpret.
    #[error("Unsupported content type '{content_type}' from {url}")]
    UnsupportedContentType { url: String, content_type: String },

    /// A field value could not be parsed; scoped to one entry.
    #[error("Failed to parse field '{field}': {reason}")]
    FieldParse { field: String, reason: String },

    /// The base query URL could not be parsed.
    #[error("Invalid base query URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// JSON parsing failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    Xml(#[from] roxmltree::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvesterError {
    /// Build a `FieldParse` error for a named field.
    pub fn field_parse(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FieldParse {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
