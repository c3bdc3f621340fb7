use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::{header, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const WIDE_IMAGE: &str = "OfferImageWide";
pub const TALL_IMAGE: &str = "OfferImageTall";
pub const UNKNOWN_CURRENCY: &str = "Unknown";

const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rate limited by the catalog API, retry after {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },
    #[error("catalog rejected the bearer token ({0})")]
    Unauthorized(StatusCode),
    #[error("catalog returned {0}")]
    UnexpectedStatus(StatusCode),
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("catalog returned no items")]
    Empty,
}

#[derive(Debug, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub elements: Vec<CatalogItem>,
}

/// One raw catalog offer. Every field the API may omit falls back to a
/// sentinel so a sparse offer still produces a record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default)]
    pub current_price: i64,
    #[serde(default = "default_currency")]
    pub currency_code: String,
    #[serde(default)]
    pub key_images: Vec<KeyImage>,
    #[serde(default)]
    pub effective_date: String,
    #[serde(default)]
    pub expiry_date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyImage {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub url: String,
}

impl CatalogItem {
    /// First image carrying the given tag, or "" when none is present.
    pub fn image_url(&self, kind: &str) -> &str {
        self.key_images
            .iter()
            .find(|image| image.kind == kind)
            .map(|image| image.url.as_str())
            .unwrap_or("")
    }
}

fn default_title() -> String {
    "Unknown Name".into()
}

fn default_description() -> String {
    "No Description".into()
}

fn default_currency() -> String {
    UNKNOWN_CURRENCY.into()
}

pub struct CatalogClient {
    client: Client,
    url: Url,
}

impl CatalogClient {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }

    pub fn fetch(&self, token: &str) -> Result<Vec<CatalogItem>, FetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .bearer_auth(token)
            .send()?;

        let status = response.status();
        if status == StatusCode::OK {
            let catalog: CatalogResponse = response.json()?;
            if catalog.elements.is_empty() {
                Err(FetchError::Empty)
            } else {
                Ok(catalog.elements)
            }
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_RETRY_AFTER);
            Err(FetchError::RateLimited { retry_after })
        } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(FetchError::Unauthorized(status))
        } else {
            Err(FetchError::UnexpectedStatus(status))
        }
    }
}
