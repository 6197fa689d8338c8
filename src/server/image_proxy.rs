//! Same-origin proxy for meme template images.
//!
//! The browser draws captions onto a canvas, which requires the image to be
//! same-origin. Only URLs under the configured host prefix are fetched.

use anyhow::{Context, Result};
use reqwest::{header, Client};
use std::time::Duration;
use tracing::debug;

use crate::config::MemesConfig;
use crate::error::ImageError;

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone)]
pub struct ProxiedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub struct ImageProxy {
    http: Client,
    host_prefix: String,
    cache_max_age_secs: u64,
}

impl ImageProxy {
    pub fn new(cfg: &MemesConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("Failed to build HTTP client for image proxy")?;

        Ok(Self {
            http,
            host_prefix: cfg.image_host_prefix.clone(),
            cache_max_age_secs: cfg.cache_max_age_secs,
        })
    }

    /// `Cache-Control` value sent with proxied images.
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.cache_max_age_secs)
    }

    /// Reject anything but a non-empty URL on the allowed host.
    pub fn check_url<'a>(&self, url: Option<&'a str>) -> Result<&'a str, ImageError> {
        let url = url.map(str::trim).filter(|u| !u.is_empty()).ok_or(ImageError::MissingUrl)?;
        if !url.starts_with(&self.host_prefix) {
            return Err(ImageError::ForeignHost(self.host_prefix.clone()));
        }
        Ok(url)
    }

    pub async fn fetch(&self, url: Option<&str>) -> Result<ProxiedImage, ImageError> {
        let url = self.check_url(url)?;
        debug!(url, "Proxying meme image");

        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ImageError::Upstream(format!("image host returned {status}")));
        }

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let bytes = resp.bytes().await?.to_vec();

        Ok(ProxiedImage {
            content_type,
            bytes,
        })
    }
}
