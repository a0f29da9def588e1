use std::fmt;

use crate::models::ProductId;

/// Screens the app can navigate to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Products,
    /// Raw id segment as it appeared in the path; see [`Route::product_id`]
    ProductDetails(String),
    Favorites,
    NotFound(String),
}

impl Route {
    /// Resolve a path like `/products/3`. Never fails: unknown paths become
    /// `NotFound`.
    pub fn parse(path: &str) -> Self {
        let segments: Vec<&str> = path
            .trim()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        match segments.as_slice() {
            [] | ["products"] => Route::Products,
            ["products", id] => Route::ProductDetails((*id).to_string()),
            ["favorites"] => Route::Favorites,
            _ => Route::NotFound(path.to_string()),
        }
    }

    pub fn product(id: ProductId) -> Self {
        Route::ProductDetails(id.to_string())
    }

    /// The product a detail route points at, if the segment is a valid id.
    /// An invalid id means "not found" without asking the catalog.
    pub fn product_id(&self) -> Option<ProductId> {
        match self {
            Route::ProductDetails(raw) => raw.parse().ok(),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Products => "Products",
            Route::ProductDetails(_) => "Product Details",
            Route::Favorites => "Favorites",
            Route::NotFound(_) => "Not Found",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Products => write!(f, "/products"),
            Route::ProductDetails(id) => write!(f, "/products/{}", id),
            Route::Favorites => write!(f, "/favorites"),
            Route::NotFound(path) => write!(f, "{}", path),
        }
    }
}
