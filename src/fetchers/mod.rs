//! Page fetchers: the two ways of turning a URL into content.
//!
//! | Strategy | Type | Returns | Notes |
//! |----------|------|---------|-------|
//! | Static | [`http::HttpFetcher`] | [`PageContent::Html`] | One GET with a browser User-Agent and a timeout |
//! | Dynamic | `browser::BrowserFetcher` | [`PageContent::Text`] | Headless Chromium with bounded infinite-scroll (`browser` feature) |
//!
//! Fetchers never panic and never retry. Every failure is a typed
//! [`FetchError`] that the pipeline logs and records before moving on to the
//! next URL.

use crate::models::PageContent;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

pub mod browser;
pub mod http;

/// Why a URL produced no content.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {0:?}")]
    InvalidUrl(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("browser error: {0}")]
    #[cfg_attr(not(feature = "browser"), allow(dead_code))]
    Browser(String),
}

/// Something that can fetch the content behind a URL.
pub trait PageFetcher {
    /// Fetch `url`, returning its content or the reason it could not be fetched.
    async fn fetch(&self, url: &str) -> Result<PageContent, FetchError>;
}
