//! Static fetching: a single GET per URL.

use super::{FetchError, PageFetcher};
use crate::models::PageContent;
use rand::rng;
use rand::seq::IndexedRandom;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Settings for the static fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Browser-like User-Agent strings; one is picked per request.
    pub user_agents: Vec<String>,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3".to_string(),
                FALLBACK_USER_AGENT.to_string(),
            ],
            timeout_secs: 20,
        }
    }
}

/// Fetches raw HTML with `reqwest`.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agents: Vec<String>,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher with a shared connection pool.
    ///
    /// # Arguments
    ///
    /// * `settings` - User-Agent pool and whole-request timeout
    ///
    /// # Returns
    ///
    /// A fetcher ready to be reused for every URL of a run, or
    /// [`FetchError::Http`] if the TLS backend cannot be initialised.
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            user_agents: settings.user_agents.clone(),
            timeout,
        })
    }

    fn user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rng())
            .map(String::as_str)
            .unwrap_or(FALLBACK_USER_AGENT)
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Http(e)
        }
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let user_agent = self.user_agent().to_string();
        debug!(%user_agent, "Sending GET");
        let response = self
            .client
            .get(parsed)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        debug!(status = status.as_u16(), bytes = body.len(), "Fetched page");
        Ok(PageContent::Html(body))
    }
}
