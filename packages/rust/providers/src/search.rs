//! Insight retrieval: keyword web search returning short ranked snippets.

use std::time::Duration;

use async_trait::async_trait;
use contentcrew_shared::{ContentCrewError, Result, SearchConfig};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::USER_AGENT;

/// One search hit. Results without a snippet are kept as `None` so callers
/// can preserve the service's ranking positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Insight {
    #[serde(default)]
    pub snippet: Option<String>,
}

impl Insight {
    pub fn new(snippet: impl Into<String>) -> Self {
        Self {
            snippet: Some(snippet.into()),
        }
    }
}

/// Stateless keyword search.
///
/// Implementations report problems as [`ContentCrewError::Retrieval`]; the
/// orchestrator decides whether that is fatal (it never is for grounding).
#[async_trait]
pub trait InsightService: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Insight>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<Insight>,
    #[serde(default)]
    error: Option<String>,
}

/// SerpAPI-compatible search client (`GET /search.json`).
pub struct SerpApiClient {
    client: Client,
    endpoint: String,
    engine: String,
    api_key: String,
}

impl SerpApiClient {
    pub fn new(
        base_url: &str,
        engine: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ContentCrewError::Retrieval(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/search.json", base_url.trim_end_matches('/')),
            engine: engine.into(),
            api_key: api_key.into(),
        })
    }

    /// Build a client from the `[search]` config section.
    pub fn from_config(config: &SearchConfig, api_key: impl Into<String>) -> Result<Self> {
        Self::new(
            &config.base_url,
            config.engine.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl InsightService for SerpApiClient {
    #[instrument(skip(self), fields(engine = %self.engine))]
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Insight>> {
        let num = k.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("engine", self.engine.as_str()),
                ("q", query),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                // The request URL carries the API key; keep it out of the message.
                let kind = if e.is_timeout() { "timed out" } else { "request failed" };
                ContentCrewError::Retrieval(format!("{}: {kind}: {}", self.endpoint, e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContentCrewError::Retrieval(format!(
                "{}: HTTP {status}",
                self.endpoint
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| {
                ContentCrewError::Retrieval(format!("invalid search response: {}", e.without_url()))
            })?;

        if let Some(error) = parsed.error {
            return Err(ContentCrewError::Retrieval(error));
        }

        let mut results = parsed.organic_results;
        results.truncate(k);
        debug!(count = results.len(), "search complete");
        Ok(results)
    }
}
