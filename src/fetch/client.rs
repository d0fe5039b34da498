// src/fetch/client.rs
// =============================================================================
// HTTP client for the test-case service.
//
// Endpoints (relative to the base URL):
//   GET stages                                     -> stage list + git hash
//   GET stages/{stage}/testcases                   -> one stage's listing
//   GET file-content?stageName=..&filePath=..      -> {"content": "..."}
//
// Every response is JSON. This module only knows how to get it; the extract
// module knows what's inside. There are no retries: a failed request is
// reported to the caller as-is.
// =============================================================================

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::{Result, ScrapeError};
use crate::extract::{self, StagesPayload};

const USER_AGENT_VALUE: &str = concat!("rcomp-cases/", env!("CARGO_PKG_VERSION"));

// Cheap to clone: reqwest::Client is reference counted internally
#[derive(Debug, Clone)]
pub struct CaseClient {
    client: Client,
    base_url: Url,
}

impl CaseClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|source| ScrapeError::Network {
                url: base_url.to_string(),
                source,
            })?;

        Ok(CaseClient { client, base_url })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.base_url.clone(), config.timeout)
    }

    // Fetches the stage list
    //
    // Fails with EmptyResult if the service lists no stages at all.
    pub async fn fetch_stages(&self) -> Result<StagesPayload> {
        let url = self.stages_url();
        let document = self.get_json(&url).await?;
        let payload = extract::parse_stages(url.as_str(), document)?;

        if payload.stages.is_empty() {
            return Err(ScrapeError::EmptyResult {
                url: url.to_string(),
            });
        }

        Ok(payload)
    }

    /// Raw listing document for one stage
    pub async fn fetch_testcases(&self, stage: &str) -> Result<Value> {
        self.get_json(&self.testcases_url(stage)).await
    }

    /// Raw file-content document for one remote path
    pub async fn fetch_file_content(&self, stage: &str, remote_path: &str) -> Result<Value> {
        self.get_json(&self.file_content_url(stage, remote_path)).await
    }

    pub fn stages_url(&self) -> Url {
        self.endpoint(&["stages"])
    }

    pub fn testcases_url(&self, stage: &str) -> Url {
        self.endpoint(&["stages", stage, "testcases"])
    }

    // The file path goes in the query string, so slashes in it are encoded
    pub fn file_content_url(&self, stage: &str, remote_path: &str) -> Url {
        let mut url = self.endpoint(&["file-content"]);
        url.query_pairs_mut()
            .append_pair("stageName", stage)
            .append_pair("filePath", remote_path);
        url
    }

    // Appends path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json(&self, url: &Url) -> Result<Value> {
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ScrapeError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|source| ScrapeError::Network {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_slice(&body)
            .map_err(|e| ScrapeError::parse(url.as_str(), format!("invalid JSON: {}", e)))
    }
}
