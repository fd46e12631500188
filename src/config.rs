//! Harvest source configuration and validation.
//!
//! The host catalogue hands each harvest source a JSON configuration
//! object. `HarvestConfig` parses and validates it before any network
//! call is made, so misconfiguration always surfaces as a fatal
//! `Config` error rather than a mid-run failure.

use reqwest::Url;
use serde::Deserialize;

use crate::error::{HarvesterError, Result};

/// User agent string identifying this harvester.
pub const USER_AGENT: &str = concat!("opensearch-harvester/", env!("CARGO_PKG_VERSION"));

/// Minimum pagination start value; providers index results from 1.
pub const MIN_PAGE_START: u64 = 1;

/// Default page size (`max_dataset`) when the source does not set one.
pub const DEFAULT_MAX_DATASET: u64 = 100;

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Minimum delay between consecutive page requests to the same
/// provider, in milliseconds. Crawled endpoints get at most one
/// request per second.
pub const CRAWL_DELAY_MS: u64 = 1000;

/// Configuration for one harvest source.
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Base query URL of the provider's search endpoint.
    pub base_query_url: String,

    /// Literal query-parameter name the provider uses for page size.
    pub page_size_keyword: String,

    /// Literal query-parameter name the provider uses for page start.
    pub page_start_keyword: String,

    /// Key of the collection description to harvest.
    pub collection: String,

    /// Query-parameter name for the provider-side collection filter.
    #[serde(default)]
    pub collection_keyword: Option<String>,

    /// Number of entries requested per page.
    #[serde(default = "default_max_dataset")]
    pub max_dataset: u64,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Optional basic-auth username.
    #[serde(default)]
    pub username: Option<String>,

    /// Optional basic-auth password.
    #[serde(default)]
    pub password: Option<String>,

    /// Re-import datasets that already exist in the catalogue.
    #[serde(default)]
    pub update_all: bool,
}

fn default_max_dataset() -> u64 {
    DEFAULT_MAX_DATASET
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl HarvestConfig {
    /// Parse and validate a source configuration from its JSON text.
    ///
    /// # Errors
    /// `Config` if a required key is missing, empty, or the base query
    /// URL does not parse as an absolute URL.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| HarvesterError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate an already-deserialized configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_query_url.trim().is_empty() {
            return Err(HarvesterError::Config(
                "'base_query_url' must not be empty".to_string(),
            ));
        }
        Url::parse(&self.base_query_url).map_err(|e| HarvesterError::InvalidUrl {
            url: self.base_query_url.clone(),
            reason: e.to_string(),
        })?;

        for (key, value) in [
            ("page_size_keyword", &self.page_size_keyword),
            ("page_start_keyword", &self.page_start_keyword),
            ("collection", &self.collection),
        ] {
            if value.trim().is_empty() {
                return Err(HarvesterError::Config(format!(
                    "'{key}' must not be empty"
                )));
            }
        }

        if self.max_dataset == 0 {
            return Err(HarvesterError::Config(
                "'max_dataset' must be at least 1".to_string(),
            ));
        }

        if self.username.is_some() != self.password.is_some() {
            return Err(HarvesterError::Config(
                "'username' and 'password' must be provided together".to_string(),
            ));
        }

        Ok(())
    }
}
