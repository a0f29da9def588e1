// What each screen should show, decided without touching any rendering code
use crate::favorites::FavoritesStore;
use crate::models::{Product, ProductQuery, StarRating};
use crate::query;
use crate::source::QueryState;

pub const PRODUCTS_FAILED_TITLE: &str = "Failed to load products";
pub const PRODUCTS_FAILED_FALLBACK: &str = "Unable to fetch products. Please try again.";
pub const NO_MATCHING_PRODUCTS: &str = "No products found matching your search.";

pub const PRODUCT_FAILED_TITLE: &str = "Failed to load product";
pub const PRODUCT_FAILED_FALLBACK: &str = "Unable to fetch product details. Please try again.";
pub const PRODUCT_NOT_FOUND: &str = "Product not found";

pub const NO_FAVORITES: &str = "No favorites yet";
pub const NO_FAVORITES_HINT: &str = "Start adding products to your favorites!";

/// A product plus its favorite badge
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow<'a> {
    pub product: &'a Product,
    pub is_favorite: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProductListView<'a> {
    Loading,
    Failed { title: &'static str, message: String },
    Empty { message: &'static str },
    Products(Vec<ProductRow<'a>>),
}

impl ProductListView<'_> {
    pub fn len(&self) -> usize {
        match self {
            ProductListView::Products(rows) => rows.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Product list screen: derive the rows and attach favorite membership
pub fn product_list<'a>(
    state: &'a QueryState<Vec<Product>>,
    query: &ProductQuery,
    favorites: &FavoritesStore,
) -> ProductListView<'a> {
    match state {
        QueryState::Pending => ProductListView::Loading,
        QueryState::Failed { message } => ProductListView::Failed {
            title: PRODUCTS_FAILED_TITLE,
            message: message_or(message, PRODUCTS_FAILED_FALLBACK),
        },
        QueryState::Succeeded { data, .. } => {
            let rows: Vec<ProductRow<'a>> = query::derive(Some(data.as_slice()), query)
                .into_iter()
                .map(|product| ProductRow {
                    product,
                    is_favorite: favorites.is_favorite(product.id),
                })
                .collect();

            if rows.is_empty() {
                ProductListView::Empty {
                    message: NO_MATCHING_PRODUCTS,
                }
            } else {
                ProductListView::Products(rows)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProductDetailView<'a> {
    Loading,
    Failed { title: &'static str, message: String },
    NotFound { message: &'static str },
    Loaded {
        product: &'a Product,
        is_favorite: bool,
        stars: Option<StarRating>,
    },
}

/// Detail screen. `state` is `None` when the route's id didn't parse, in
/// which case nothing was fetched and the answer is simply "not found".
pub fn product_detail<'a>(
    state: Option<&'a QueryState<Option<Product>>>,
    favorites: &FavoritesStore,
) -> ProductDetailView<'a> {
    let not_found = ProductDetailView::NotFound {
        message: PRODUCT_NOT_FOUND,
    };

    match state {
        None => not_found,
        Some(QueryState::Pending) => ProductDetailView::Loading,
        Some(QueryState::Failed { message }) => ProductDetailView::Failed {
            title: PRODUCT_FAILED_TITLE,
            message: message_or(message, PRODUCT_FAILED_FALLBACK),
        },
        Some(QueryState::Succeeded { data, .. }) => match data.as_ref() {
            None => not_found,
            Some(product) => ProductDetailView::Loaded {
                product,
                is_favorite: favorites.is_favorite(product.id),
                stars: product.rating.map(|r| r.stars()),
            },
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FavoritesView {
    Empty { title: &'static str, hint: &'static str },
    Products(Vec<Product>),
}

pub fn favorites_page(favorites: &FavoritesStore) -> FavoritesView {
    let entries = favorites.favorites();
    if entries.is_empty() {
        FavoritesView::Empty {
            title: NO_FAVORITES,
            hint: NO_FAVORITES_HINT,
        }
    } else {
        FavoritesView::Products(entries)
    }
}

fn message_or(message: &str, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ProductId, Rating};
    use chrono::Utc;
    use std::sync::Arc;

    fn succeeded<T>(data: T) -> QueryState<T> {
        QueryState::Succeeded {
            data: Arc::new(data),
            fetched_at: Utc::now(),
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            Product::new(1, "Test Product 1", 19.99).with_category("men's clothing"),
            Product::new(2, "Test Product 2", 29.99).with_category("women's clothing"),
        ]
    }

    #[test]
    fn test_list_loading_and_failure() {
        let favorites = FavoritesStore::new();
        let query = ProductQuery::new();

        assert_eq!(
            product_list(&QueryState::Pending, &query, &favorites),
            ProductListView::Loading
        );

        let failed = QueryState::Failed {
            message: "Network error: connection refused".into(),
        };
        assert_eq!(
            product_list(&failed, &query, &favorites),
            ProductListView::Failed {
                title: PRODUCTS_FAILED_TITLE,
                message: "Network error: connection refused".into(),
            }
        );
    }

    #[test]
    fn test_list_failure_without_message_uses_fallback() {
        let failed = QueryState::Failed { message: String::new() };
        let view = product_list(&failed, &ProductQuery::new(), &FavoritesStore::new());
        assert!(matches!(view, ProductListView::Failed { ref message, .. } if message == PRODUCTS_FAILED_FALLBACK));
    }

    #[test]
    fn test_list_empty_search() {
        let state = succeeded(catalog());
        let query = ProductQuery::new().search("NonExistentProduct");
        assert_eq!(
            product_list(&state, &query, &FavoritesStore::new()),
            ProductListView::Empty {
                message: NO_MATCHING_PRODUCTS
            }
        );
    }

    #[test]
    fn test_list_rows_carry_favorite_badge_regardless_of_filter() {
        let state = succeeded(catalog());
        let favorites = FavoritesStore::new();
        favorites.add_favorite(catalog()[1].clone());

        let all = product_list(&state, &ProductQuery::new(), &favorites);
        let ProductListView::Products(rows) = all else {
            panic!("expected rows");
        };
        assert_eq!(
            rows.iter().map(|r| r.is_favorite).collect::<Vec<_>>(),
            vec![false, true]
        );

        let filtered = product_list(
            &state,
            &ProductQuery::new().category(Category::WomensClothing),
            &favorites,
        );
        assert_eq!(filtered.len(), 1);
        assert!(matches!(filtered, ProductListView::Products(ref rows) if rows[0].is_favorite));
    }

    #[test]
    fn test_detail_states() {
        let favorites = FavoritesStore::new();

        assert_eq!(
            product_detail(None, &favorites),
            ProductDetailView::NotFound {
                message: PRODUCT_NOT_FOUND
            }
        );
        assert_eq!(
            product_detail(Some(&QueryState::Pending), &favorites),
            ProductDetailView::Loading
        );

        let missing = succeeded(None);
        assert_eq!(
            product_detail(Some(&missing), &favorites),
            ProductDetailView::NotFound {
                message: PRODUCT_NOT_FOUND
            }
        );

        let failed = QueryState::Failed { message: " ".into() };
        assert!(matches!(
            product_detail(Some(&failed), &favorites),
            ProductDetailView::Failed { message, .. } if message == PRODUCT_FAILED_FALLBACK
        ));
    }

    #[test]
    fn test_detail_loaded_with_rating() {
        let mut product = Product::new(4, "Ring", 9.99);
        product.rating = Some(Rating { rate: 4.5, count: 12 });
        let state = succeeded(Some(product));

        let favorites = FavoritesStore::new();
        favorites.add_favorite(Product::new(4, "Ring", 9.99));

        match product_detail(Some(&state), &favorites) {
            ProductDetailView::Loaded {
                product,
                is_favorite,
                stars,
            } => {
                assert_eq!(product.id, ProductId(4));
                assert!(is_favorite);
                assert_eq!(stars.map(|s| (s.full, s.half)), Some((4, true)));
            }
            other => panic!("unexpected view: {:?}", other),
        }
    }

    #[test]
    fn test_favorites_page() {
        let favorites = FavoritesStore::new();
        assert_eq!(
            favorites_page(&favorites),
            FavoritesView::Empty {
                title: NO_FAVORITES,
                hint: NO_FAVORITES_HINT
            }
        );

        favorites.add_favorite(catalog()[0].clone());
        assert_eq!(
            favorites_page(&favorites),
            FavoritesView::Products(vec![catalog()[0].clone()])
        );
    }
}
