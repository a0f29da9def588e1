// HTTP provider - bridges the catalog API client with the ProductSource trait
use async_trait::async_trait;
use storefront_api::{ApiPrice, ApiProduct, ApiRating, ProductClient};
use tracing::{info, warn};

use crate::{
    config::ApiConfig,
    models::{Price, Product, ProductId, Rating},
    source::ProductSource,
    Error, Result,
};

/// Product source backed by the remote catalog.
///
/// A missing or broken base URL doesn't stop construction. The source just
/// answers every fetch with a configuration error, which shows up as a
/// failed query the user can read.
pub struct HttpProductSource {
    client: std::result::Result<ProductClient, String>,
}

impl HttpProductSource {
    pub fn new(client: ProductClient) -> Self {
        Self { client: Ok(client) }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        let base_url = config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty());

        let Some(base_url) = base_url else {
            warn!("No catalog base URL configured");
            return Self {
                client: Err(format!(
                    "No catalog base URL configured. Set {} or api.base_url in config.toml",
                    crate::config::BASE_URL_ENV
                )),
            };
        };

        match ProductClient::with_options(base_url, config.timeout(), (&config.retry).into()) {
            Ok(client) => {
                info!("Using catalog at {}", client.base_url());
                Self::new(client)
            }
            Err(e) => {
                warn!("Catalog client unusable: {}", e);
                Self {
                    client: Err(e.to_string()),
                }
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_ok()
    }

    fn client(&self) -> Result<&ProductClient> {
        self.client
            .as_ref()
            .map_err(|message| Error::ConfigError(message.clone()))
    }
}

#[async_trait]
impl ProductSource for HttpProductSource {
    async fn fetch_products(&self) -> Result<Vec<Product>> {
        let products = self.client()?.list_products().await?;
        Ok(products.into_iter().map(api_to_product).collect())
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>> {
        let product = self.client()?.get_product(id.0).await?;
        Ok(product.map(api_to_product))
    }
}

/// Convert the wire record to our Product model
fn api_to_product(api: ApiProduct) -> Product {
    Product {
        id: ProductId(api.id),
        title: api.title.unwrap_or_default(),
        price: match api.price {
            Some(ApiPrice::Number(n)) => Price::Number(n),
            Some(ApiPrice::Text(text)) => Price::Text(text),
            // anything else can't be read as a price
            Some(ApiPrice::Other(_)) | None => Price::Missing,
        },
        description: api.description,
        category: api.category,
        image: api.image,
        rating: api.rating.map(|ApiRating { rate, count }| Rating { rate, count }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_base_url_fails_fetches() {
        let source = HttpProductSource::from_config(&ApiConfig::default());
        assert!(!source.is_configured());

        let err = source.fetch_products().await.unwrap_err();
        assert!(matches!(err, Error::ConfigError(ref msg) if msg.contains("STOREFRONT_BASE_URL")));

        let err = source.fetch_product(ProductId(1)).await.unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_invalid_base_url_fails_fetches() {
        let config = ApiConfig {
            base_url: Some("definitely not a url".into()),
            ..ApiConfig::default()
        };
        let source = HttpProductSource::from_config(&config);
        assert!(!source.is_configured());
        assert!(source.fetch_products().await.is_err());
    }

    #[test]
    fn test_blank_base_url_counts_as_missing() {
        let config = ApiConfig {
            base_url: Some("   ".into()),
            ..ApiConfig::default()
        };
        assert!(!HttpProductSource::from_config(&config).is_configured());
    }

    #[test]
    fn test_api_conversion() {
        let api: ApiProduct = serde_json::from_str(
            r#"{
                "id": 3,
                "title": "Mens Cotton Jacket",
                "price": "55.99",
                "category": "men's clothing",
                "rating": { "rate": 4.7, "count": 500 }
            }"#,
        )
        .unwrap();

        let product = api_to_product(api);
        assert_eq!(product.id, ProductId(3));
        assert_eq!(product.price_value(), 55.99);
        assert_eq!(product.description, None);
        assert_eq!(product.rating, Some(Rating { rate: 4.7, count: 500 }));
    }

    #[test]
    fn test_untitled_product_gets_empty_title() {
        let api: ApiProduct = serde_json::from_str(r#"{ "id": 8, "price": true }"#).unwrap();
        let product = api_to_product(api);
        assert_eq!(product.title, "");
        assert_eq!(product.price, Price::Missing);
    }
}
