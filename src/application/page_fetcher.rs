//! Detail page fetch and classification
//!
//! No retry at this stage: anything but a 200 is reported and the PIN is skipped.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::domain::PaddedPin;
use crate::infrastructure::config::{AssessorConfig, utils::detail_page_url};
use crate::infrastructure::{HttpClient, HttpClientConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// HTTP 200 with the raw markup
    Success(String),
    /// Any other status
    NotFound(u16),
    /// The request or body read did not complete
    TransportFailure(String),
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, pin: &PaddedPin) -> FetchOutcome;
}

/// Fetches `<base>/pin/<padded>#address` from the assessor site
pub struct AssessorPageFetcher {
    client: HttpClient,
    base_url: String,
}

impl AssessorPageFetcher {
    pub fn new(config: &AssessorConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid assessor base URL: {}", config.base_url))?;
        if !matches!(base.scheme(), "http" | "https") {
            bail!("Assessor base URL must be http(s): {}", config.base_url);
        }

        let client = HttpClient::new(HttpClientConfig::from(config))?;
        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    pub fn url_for(&self, pin: &PaddedPin) -> String {
        detail_page_url(&self.base_url, pin)
    }
}

#[async_trait]
impl PageFetcher for AssessorPageFetcher {
    async fn fetch(&self, pin: &PaddedPin) -> FetchOutcome {
        let url = self.url_for(pin);

        match self.client.get_page(&url).await {
            Ok(page) if page.status == StatusCode::OK => FetchOutcome::Success(page.body),
            Ok(page) => {
                debug!("{} answered {}", url, page.status);
                FetchOutcome::NotFound(page.status.as_u16())
            }
            Err(e) => FetchOutcome::TransportFailure(format!("{e:#}")),
        }
    }
}
