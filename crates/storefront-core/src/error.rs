use thiserror::Error;

/// All the ways the catalog pipeline can fail
///
/// None of these are fatal: a failed fetch becomes a `Failed` query state
/// with this error's message, and the user gets a retry.
#[derive(Error, Debug)]
pub enum Error {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid product id: {0:?}")]
    InvalidProductId(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<storefront_api::StoreApiError> for Error {
    fn from(err: storefront_api::StoreApiError) -> Self {
        match err {
            storefront_api::StoreApiError::InvalidBaseUrl { .. } => Error::ConfigError(err.to_string()),
            storefront_api::StoreApiError::NetworkError(e) => Error::NetworkError(e),
            other => Error::ApiError(other.to_string()),
        }
    }
}
