use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, REFERER};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::ScraperConfig;
use crate::utils::error::{AppError, Result};

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const JSON_ACCEPT: &str = "application/json";

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
    pub response_time_ms: u64,
}

impl FetchedPage {
    pub fn html(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: body.into(),
            response_time_ms: 0,
        }
    }

    pub fn json(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            content_type: Some("application/json".to_string()),
            ..Self::html(url, body)
        }
    }

    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
    }
}

/// Whether `url` points at a structured price API rather than a product page.
pub fn is_structured_api(url: &str) -> bool {
    if url.contains("display-price-lite") {
        return true;
    }
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| host.contains("gdx-api.costco.com")))
        .unwrap_or(false)
}

/// Source of raw documents for the extractor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`. Statuses the site uses for bot detection come back as
    /// [`AppError::Blocked`]; any other failure is [`AppError::Transport`].
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

pub struct HttpFetcher {
    client: Client,
    config: ScraperConfig,
}

impl HttpFetcher {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    fn request_profile(&self, url: &str) -> (&'static str, Duration) {
        if is_structured_api(url) {
            (JSON_ACCEPT, Duration::from_secs(self.config.api_timeout))
        } else {
            (HTML_ACCEPT, Duration::from_secs(self.config.request_timeout))
        }
    }

    fn referer_for(url: &str) -> Option<String> {
        let parsed = url::Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        // API hosts want the storefront as referer
        let host = host.strip_prefix("gdx-api.").map(|rest| format!("www.{}", rest));
        Some(format!(
            "{}://{}/",
            parsed.scheme(),
            host.as_deref().or(parsed.host_str())?
        ))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let start_time = std::time::Instant::now();
        let (accept, timeout) = self.request_profile(url);

        let mut request = self.client.get(url).header(ACCEPT, accept).timeout(timeout);
        if let Some(referer) = Self::referer_for(url) {
            request = request.header(REFERER, referer);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if self.config.blocked_statuses.contains(&status.as_u16()) {
            return Err(AppError::Blocked { status: status.as_u16() });
        }
        if !status.is_success() {
            return Err(AppError::Transport(format!("{} returned {}", url, status)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let final_url = response.url().to_string();

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Transport(format!("reading body from {} failed: {}", url, e)))?;

        let response_time_ms = start_time.elapsed().as_millis() as u64;
        debug!("Fetched {} ({} bytes, {} ms)", final_url, body.len(), response_time_ms);

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body,
            response_time_ms,
        })
    }
}
