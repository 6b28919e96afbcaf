//! Tavily web search client.

use crate::config::TavilySettings;
use crate::error::{Result, TrellisError};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

/// Search depth accepted by Tavily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

/// Search topic accepted by Tavily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchTopic {
    #[default]
    General,
    News,
}

/// Restrict results to a recent time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    Day,
    Week,
    Month,
    Year,
}

/// Parameters of a single search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub search_depth: SearchDepth,
    pub topic: SearchTopic,
    pub time_range: Option<TimeRange>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            search_depth: SearchDepth::default(),
            topic: SearchTopic::default(),
            time_range: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: SearchDepth,
    topic: SearchTopic,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_range: Option<TimeRange>,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub content: String,
    #[serde(default)]
    pub score: f64,
}

/// Client for the Tavily search API.
#[derive(Clone)]
pub struct TavilyClient {
    client: reqwest::Client,
    api_key: String,
    search_url: Url,
    max_results: u32,
}

impl TavilyClient {
    /// Create a client from settings. Requires an API key.
    pub fn from_settings(settings: &TavilySettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                TrellisError::Config(
                    "TAVILY_API_KEY not set. Set it with: export TAVILY_API_KEY='tvly-...'"
                        .to_string(),
                )
            })?;

        Self::new(api_key, &settings.endpoint, settings.max_results)
    }

    /// Create a client against `endpoint` (e.g. `https://api.tavily.com`).
    pub fn new(api_key: impl Into<String>, endpoint: &str, max_results: u32) -> Result<Self> {
        let mut base = endpoint.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let search_url = Url::parse(&base)
            .and_then(|u| u.join("search"))
            .map_err(|e| TrellisError::Config(format!("Invalid Tavily endpoint '{}': {}", endpoint, e)))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            search_url,
            max_results,
        })
    }

    /// URL searches are posted to.
    pub fn search_url(&self) -> &Url {
        &self.search_url
    }

    /// Run a search.
    #[instrument(skip(self), fields(query = %query.query))]
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let request = TavilyRequest {
            api_key: &self.api_key,
            query: &query.query,
            search_depth: query.search_depth,
            topic: query.topic,
            time_range: query.time_range,
            max_results: self.max_results,
        };

        let response = self
            .client
            .post(self.search_url.clone())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TrellisError::Tool(format!(
                "Tavily API error: {} - {}",
                status, body
            )));
        }

        let parsed: TavilyResponse = response.json().await?;
        debug!("Tavily returned {} results", parsed.results.len());
        Ok(parsed.results)
    }
}
