use std::time::Duration;

use async_trait::async_trait;
use banter_core::{BackendError, Document, RetrievalBackend};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Web-evidence retrieval backed by the Tavily search API.
#[derive(Clone)]
pub struct TavilyRetriever {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl TavilyRetriever {
    pub fn new(api_key: String) -> Self {
        info!("Creating TavilyRetriever");
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    url: String,
    #[serde(default)]
    content: String,
}

fn parse_results(body: &str) -> Result<Vec<Document>, BackendError> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

    Ok(response
        .results
        .into_iter()
        .map(|r| Document::new(r.url, r.content))
        .collect())
}

#[async_trait]
impl RetrievalBackend for TavilyRetriever {
    async fn query(&self, text: &str, result_count: usize) -> Result<Vec<Document>, BackendError> {
        debug!("Searching web: {} chars, top {result_count}", text.len());

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&json!({
                "query": text,
                "max_results": result_count,
                "search_depth": "basic",
            }))
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let documents = parse_results(&body)?;
        info!("Web search returned {} documents", documents.len());
        Ok(documents)
    }
}
