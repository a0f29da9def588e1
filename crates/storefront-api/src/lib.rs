// HTTP client for the remote product catalog
pub mod products;
pub mod retry;

// Re-export common types
pub use products::{ApiPrice, ApiProduct, ApiRating, ProductClient, StoreApiError};
pub use retry::RetryConfig;
