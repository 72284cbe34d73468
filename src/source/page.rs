//! Web page source implementation.

use super::html::extract_page;
use super::robots::RobotsPolicy;
use super::{ContentSource, FetchedContent, SourceKind};
use crate::error::{DistillError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Web page source. Honors robots.txt before fetching anything else.
pub struct PageSource {
    client: reqwest::Client,
}

impl PageSource {
    /// The client should carry a browser user agent (see `http::create_client`).
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn parse_locator(locator: &str) -> Result<Url> {
        let url = Url::parse(locator.trim())
            .map_err(|e| DistillError::InvalidInput(format!("Invalid page URL '{}': {}", locator, e)))?;

        match url.scheme() {
            "http" | "https" if url.host_str().is_some() => Ok(url),
            _ => Err(DistillError::InvalidInput(format!(
                "Page URL must be http(s) with a host: {}",
                locator
            ))),
        }
    }

    /// Location of the robots.txt covering `url`.
    pub fn robots_url(url: &Url) -> Result<Url> {
        url.join("/robots.txt")
            .map_err(|e| DistillError::PageFetch(format!("Cannot build robots.txt URL: {}", e)))
    }

    /// Read and parse the site's robots.txt.
    async fn fetch_robots(&self, url: &Url) -> Result<RobotsPolicy> {
        let robots_url = Self::robots_url(url)?;
        debug!("Reading {}", robots_url);

        let response = self.client.get(robots_url.clone()).send().await.map_err(|e| {
            DistillError::PageFetch(format!("Could not read {}: {}", robots_url, e))
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Ok(RobotsPolicy::deny_all());
        }
        if status.is_client_error() {
            return Ok(RobotsPolicy::allow_all());
        }
        if !status.is_success() {
            return Err(DistillError::PageFetch(format!(
                "Could not read {}: HTTP {}",
                robots_url, status
            )));
        }

        let body = response.text().await.map_err(|e| {
            DistillError::PageFetch(format!("Could not read {}: {}", robots_url, e))
        })?;

        Ok(RobotsPolicy::parse(&body))
    }

    async fn fetch_markup(&self, url: &Url) -> Result<String> {
        self.client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DistillError::PageFetch(format!("Failed to fetch {}: {}", url, e)))?
            .text()
            .await
            .map_err(|e| DistillError::PageFetch(format!("Failed to read {}: {}", url, e)))
    }
}

/// Path and query of a URL, as robots rules see it.
fn robots_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

#[async_trait]
impl ContentSource for PageSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Page
    }

    fn can_handle(&self, locator: &str) -> bool {
        Self::parse_locator(locator).is_ok()
    }

    #[instrument(skip(self))]
    async fn fetch(&self, locator: &str) -> Result<FetchedContent> {
        let url = Self::parse_locator(locator)?;

        let policy = self.fetch_robots(&url).await?;
        if !policy.is_allowed(&robots_path(&url)) {
            warn!("robots.txt disallows {}", url);
            return Err(DistillError::FetchDenied(url.to_string()));
        }

        let markup = self.fetch_markup(&url).await?;
        let page = extract_page(&markup, Some(&url));

        if page.text.is_empty() {
            return Err(DistillError::PageFetch(format!("No visible text found at {}", url)));
        }

        info!("Fetched page '{}' ({} chars)", page.title, page.text.len());

        Ok(FetchedContent {
            text: page.text,
            title: Some(page.title),
            preview_image_url: page.preview_image_url,
        })
    }
}
