use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::retry::{is_retryable_status, with_retry_if, RetryConfig};

const USER_AGENT: &str = concat!("Storefront/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum StoreApiError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("API request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl StoreApiError {
    /// Whether asking again has a chance of a different answer
    pub fn is_transient(&self) -> bool {
        match self {
            StoreApiError::RateLimitExceeded | StoreApiError::NetworkError(_) => true,
            StoreApiError::RequestFailed { status, .. } => StatusCode::from_u16(*status)
                .map(is_retryable_status)
                .unwrap_or(false),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreApiError>;

/// Product record exactly as the catalog API sends it.
///
/// Everything but the id is optional; the API has been seen returning
/// prices as strings, so `price` accepts whatever shows up. The id may come
/// as a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiProduct {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<ApiPrice>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub rating: Option<ApiRating>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiPrice {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("unusable product id {:?}", text))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRating {
    #[serde(default)]
    pub rate: f64,
    #[serde(default)]
    pub count: u64,
}

/// Read-only client for the `/products` resource
pub struct ProductClient {
    client: reqwest::Client,
    base_url: Url,
    retry_config: RetryConfig,
}

impl ProductClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_options(base_url, DEFAULT_TIMEOUT, RetryConfig::default())
    }

    pub fn with_options(base_url: &str, timeout: Duration, retry_config: RetryConfig) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| StoreApiError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            retry_config,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// `GET {base}/products`
    pub async fn list_products(&self) -> Result<Vec<ApiProduct>> {
        let url = endpoint(&self.base_url, &["products"]);
        info!("Fetching product catalog from {}", url);

        let products = with_retry_if(
            &self.retry_config,
            || async {
                let response = self.client.get(url.clone()).send().await?;
                let body = read_success_body(response).await?;
                parse_product_list(&body)
            },
            StoreApiError::is_transient,
        )
        .await?;

        debug!("Catalog returned {} products", products.len());
        Ok(products)
    }

    /// `GET {base}/products/{id}`; `None` when the API has no such product
    pub async fn get_product(&self, id: u64) -> Result<Option<ApiProduct>> {
        let url = endpoint(&self.base_url, &["products", &id.to_string()]);
        debug!("Fetching product {} from {}", id, url);

        with_retry_if(
            &self.retry_config,
            || async {
                let response = self.client.get(url.clone()).send().await?;
                if response.status() == StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                let body = read_success_body(response).await?;
                parse_optional_product(&body)
            },
            StoreApiError::is_transient,
        )
        .await
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| StoreApiError::InvalidBaseUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(StoreApiError::InvalidBaseUrl {
            url: trimmed.to_string(),
            reason: "expected an http(s) URL".to_string(),
        });
    }

    Ok(url)
}

/// Append path segments to the base, keeping any path prefix the base carries
fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

async fn read_success_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(StoreApiError::RateLimitExceeded);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreApiError::RequestFailed {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.text().await?)
}

/// Parse the catalog array record by record. A record that can't be read
/// (say, an id that isn't a number) is skipped instead of failing the list.
fn parse_product_list(body: &str) -> Result<Vec<ApiProduct>> {
    let records: Vec<serde_json::Value> = serde_json::from_str(body)?;
    let total = records.len();

    let products: Vec<ApiProduct> = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<ApiProduct>(record) {
            Ok(product) => Some(product),
            Err(e) => {
                warn!("Skipping malformed catalog record: {}", e);
                None
            }
        })
        .collect();

    if products.len() < total {
        warn!("Dropped {} of {} catalog records", total - products.len(), total);
    }
    Ok(products)
}

/// The catalog answers unknown ids with an empty body (or `null`) and a 200
fn parse_optional_product(body: &str) -> Result<Option<ApiProduct>> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_str::<Option<ApiProduct>>(body)?)
}
