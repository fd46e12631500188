//! Paginated query construction and the page-fetch state machine.
//!
//! A query walks `Idle → Built → Fetched → Built → ... → Exhausted`,
//! with `Failed` terminal on any fetch error. Pagination is strictly
//! sequential: a page's entries are fully consumed and the cursor
//! persisted before the next page is requested, because the cursor is
//! the sole recovery point of an interrupted run.

use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::Value;

use crate::config::HarvestConfig;
use crate::error::{HarvesterError, Result};
use crate::http::{fetch_page, Pacer};
use crate::schema::{CollectionSchema, PaginationMode};

/// Lifecycle state of a paginated query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Idle,
    Built,
    Fetched,
    Exhausted,
    Failed,
}

/// Builds page URLs, fetches pages, and tracks the page-start cursor.
#[derive(Debug)]
pub struct PaginatedQuery {
    base_url: Url,
    page_size_keyword: String,
    page_start_keyword: String,
    collection_param: Option<(String, String)>,
    page_size: u64,
    page_start: u64,
    mode: PaginationMode,
    state: QueryState,
    current_url: Option<Url>,
}

impl PaginatedQuery {
    /// Create a query for one source, starting at the given cursor.
    pub fn new(
        config: &HarvestConfig,
        schema: &CollectionSchema,
        page_start: u64,
    ) -> Result<Self> {
        let base_url =
            Url::parse(&config.base_query_url).map_err(|e| HarvesterError::InvalidUrl {
                url: config.base_query_url.clone(),
                reason: e.to_string(),
            })?;

        // The filter parameter name comes from the source config, its
        // value from the collection description.
        let collection_param = config.collection_keyword.as_ref().map(|keyword| {
            let token = schema
                .search_keyword
                .clone()
                .unwrap_or_else(|| config.collection.clone());
            (keyword.clone(), token)
        });

        Ok(Self {
            base_url,
            page_size_keyword: config.page_size_keyword.clone(),
            page_start_keyword: config.page_start_keyword.clone(),
            collection_param,
            page_size: config.max_dataset,
            page_start,
            mode: schema.pagination_mode,
            state: QueryState::Idle,
            current_url: None,
        })
    }

    /// Compose the request URL for the current cursor position.
    ///
    /// Pre-existing occurrences of the pagination and filter
    /// parameters in the base URL are overwritten in place; each
    /// parameter occurs exactly once in the result.
    pub fn build(&mut self) {
        let mut params = vec![
            (self.page_size_keyword.clone(), self.page_size.to_string()),
            (self.page_start_keyword.clone(), self.page_start.to_string()),
        ];
        if let Some((keyword, token)) = &self.collection_param {
            params.push((keyword.clone(), token.clone()));
        }
        self.current_url = Some(set_query_params(&self.base_url, &params));
        self.state = QueryState::Built;
    }

    /// Fetch the page addressed by the current URL.
    ///
    /// Blocks on the pacer first. On error the query moves to `Failed`
    /// and the error is surfaced to the caller.
    pub fn fetch(
        &mut self,
        client: &Client,
        pacer: &mut Pacer,
        config: &HarvestConfig,
    ) -> Result<Value> {
        debug_assert_eq!(self.state, QueryState::Built, "fetch requires a built URL");
        if self.current_url.is_none() {
            self.build();
        }
        let url = self
            .current_url
            .as_ref()
            .map(Url::to_string)
            .unwrap_or_default();

        pacer.wait();
        match fetch_page(client, &url, config) {
            Ok(page) => {
                self.state = QueryState::Fetched;
                Ok(page)
            }
            Err(e) => {
                self.state = QueryState::Failed;
                Err(e)
            }
        }
    }

    /// Advance the cursor after a fully consumed page and rebuild the
    /// URL, or become `Exhausted` when the page came up short.
    ///
    /// `Offset` mode advances by the number of entries consumed;
    /// `Page` mode advances by a flat `+1` regardless.
    pub fn advance(&mut self, consumed: usize) {
        debug_assert_eq!(self.state, QueryState::Fetched, "advance requires a fetch");
        if (consumed as u64) < self.page_size {
            self.state = QueryState::Exhausted;
            return;
        }
        self.page_start = match self.mode {
            PaginationMode::Offset => self.page_start + consumed as u64,
            PaginationMode::Page => self.page_start + 1,
        };
        self.build();
    }

    /// Current page-start cursor value.
    #[must_use]
    pub fn page_start(&self) -> u64 {
        self.page_start
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> QueryState {
        self.state
    }

    /// The composed URL, if built.
    #[must_use]
    pub fn current_url(&self) -> Option<&Url> {
        self.current_url.as_ref()
    }
}

/// Overwrite-or-append query parameters on a URL.
///
/// The first pre-existing occurrence of each parameter keeps its
/// position and gets the new value; later duplicates are removed;
/// parameters not yet present are appended in order.
fn set_query_params(url: &Url, params: &[(String, String)]) -> Url {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    for (key, value) in params {
        let mut seen = false;
        pairs.retain_mut(|(existing_key, existing_value)| {
            if existing_key == key {
                if seen {
                    return false;
                }
                seen = true;
                *existing_value = value.clone();
            }
            true
        });
        if !seen {
            pairs.push((key.clone(), value.clone()));
        }
    }

    let mut out = url.clone();
    if pairs.is_empty() {
        out.set_query(None);
    } else {
        out.query_pairs_mut().clear().extend_pairs(pairs);
    }
    out
}
