//! HTTP client for assessor page fetches with rate limiting
//!
//! Status classification is left to callers: a 404 is an answer, not an
//! error, so `get_page` only fails on transport problems.

use anyhow::{Context, Result};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client, StatusCode,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use std::num::NonZeroU32;
use std::time::Duration;

use crate::infrastructure::config::AssessorConfig;

/// HTTP client configuration
#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from(&AssessorConfig::default())
    }
}

impl From<&AssessorConfig> for HttpClientConfig {
    fn from(config: &AssessorConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout_seconds: config.request_timeout_seconds,
            max_requests_per_second: config.max_requests_per_second,
            follow_redirects: config.follow_redirects,
        }
    }
}

/// Raw page response: status code plus body text
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: StatusCode,
    pub body: String,
}

/// HTTP client with an optional request-rate ceiling
pub struct HttpClient {
    client: Client,
    rate_limiter: Option<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        // 0 disables limiting
        let rate_limiter = NonZeroU32::new(config.max_requests_per_second)
            .map(|rps| RateLimiter::direct(Quota::per_second(rps)));

        Ok(Self {
            client,
            rate_limiter,
            config,
        })
    }

    /// Fetch a URL, returning whatever status the server answered with
    pub async fn get_page(&self, url: &str) -> Result<PageResponse> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        tracing::debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {url}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from: {url}"))?;

        tracing::debug!("Fetched {} ({}, {} chars)", url, status, body.len());
        Ok(PageResponse { status, body })
    }

    /// Get the configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}
