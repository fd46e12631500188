//! HTTP client wrapper for fetching provider pages.
//!
//! One blocking GET per page, bounded by the source's timeout. There
//! is no retry here: a failed page fetch ends the current run, and the
//! last persisted cursor is the recovery point for the next one.

use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::config::{HarvestConfig, CRAWL_DELAY_MS, USER_AGENT};
use crate::error::{HarvesterError, Result};
use crate::xml::xml_to_value;

/// Create a configured HTTP client for one harvest source.
pub fn create_client(config: &HarvestConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Enforces the minimum delay between consecutive requests to one
/// provider. Crawled endpoints get at most one request per second.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    last_request: Option<Instant>,
}

impl Pacer {
    /// Pacer with the crate-wide crawl delay.
    #[must_use]
    pub fn new() -> Self {
        Self::with_delay(Duration::from_millis(CRAWL_DELAY_MS))
    }

    /// Pacer with an explicit delay.
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            last_request: None,
        }
    }

    /// Block until the delay since the previous request has elapsed,
    /// then mark now as the latest request time.
    pub fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                thread::sleep(self.delay - elapsed);
            }
        }
        self.last_request = Some(Instant::now());
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch one page and normalize its body to the nested-mapping shape
/// the path resolver consumes.
///
/// The response content type selects the parser: JSON bodies go
/// through serde, XML bodies through the XML normalizer. Anything
/// else, a non-success status, or a timeout surfaces as a typed error.
pub fn fetch_page(client: &Client, url: &str, config: &HarvestConfig) -> Result<Value> {
    let mut request = client.get(url);
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        request = request.basic_auth(username, Some(password));
    }

    tracing::debug!(url, "Fetching page");
    let response = request.send().map_err(|e| {
        if e.is_timeout() {
            HarvesterError::RequestTimeout {
                url: url.to_string(),
                timeout_secs: config.timeout,
            }
        } else {
            HarvesterError::Http(e)
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(HarvesterError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let body = response.text()?;

    if content_type.contains("json") {
        Ok(serde_json::from_str(&body)?)
    } else if content_type.contains("xml") {
        xml_to_value(&body)
    } else {
        Err(HarvesterError::UnsupportedContentType {
            url: url.to_string(),
            content_type,
        })
    }
}
