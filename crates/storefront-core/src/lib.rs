// Catalog pipeline: fetch, debounce, derive, favorite
pub mod config;
pub mod debounce;
pub mod error;
pub mod favorites;
pub mod models;
pub mod providers;
pub mod query;
pub mod routes;
pub mod source;
pub mod views;

pub use config::Config;
pub use debounce::Debouncer;
pub use error::Error;
pub use favorites::FavoritesStore;
pub use models::{Category, Price, Product, ProductId, ProductQuery, Rating, SortOrder};
pub use providers::HttpProductSource;
pub use routes::Route;
pub use source::{ProductQueries, ProductSource, QueryKey, QueryState, SharedQuery};

/// Result type alias for the whole pipeline
pub type Result<T> = std::result::Result<T, Error>;
