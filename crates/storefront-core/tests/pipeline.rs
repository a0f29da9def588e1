// End-to-end: fetch the catalog, type a search, filter, sort, favorite
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use storefront_core::views::{self, ProductDetailView, ProductListView};
use storefront_core::{
    query, Category, Debouncer, Error, FavoritesStore, Product, ProductId, ProductQueries,
    ProductQuery, ProductSource, Result, Route, SortOrder,
};

struct InMemorySource {
    products: Vec<Product>,
    list_calls: AtomicUsize,
    fail_first: bool,
}

impl InMemorySource {
    fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            list_calls: AtomicUsize::new(0),
            fail_first: false,
        }
    }

    fn flaky(products: Vec<Product>) -> Self {
        Self {
            fail_first: true,
            ..Self::new(products)
        }
    }
}

#[async_trait::async_trait]
impl ProductSource for InMemorySource {
    async fn fetch_products(&self) -> Result<Vec<Product>> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_first && call == 0 {
            return Err(Error::ApiError("Status 503: try later".into()));
        }
        Ok(self.products.clone())
    }

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }
}

fn catalog() -> Vec<Product> {
    vec![
        Product::new(1, "Test Product 1", 99.99)
            .with_category("men's clothing")
            .with_description("This is a test product description"),
        Product::new(2, "Test Product 2", 19.99)
            .with_category("men's clothing")
            .with_description("Another test product description"),
        Product::new(3, "Electronics Product", 49.99)
            .with_category("electronics")
            .with_description("An electronic device"),
        Product::new(4, "Another Men Product", 39.99)
            .with_category("men's clothing")
            .with_description("Another men product"),
    ]
}

fn ids(products: &[&Product]) -> Vec<u64> {
    products.iter().map(|p| p.id.0).collect()
}

async fn settle() {
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn typing_filters_only_after_debounce() {
    let queries = ProductQueries::new(Arc::new(InMemorySource::new(catalog())));
    let state = queries.products().settled().await;
    let products = state.data().map(Vec::as_slice).expect("catalog loaded");

    let search = Debouncer::new(String::new(), Duration::from_millis(500));
    let mut typed = String::new();
    for ch in "electronics".chars() {
        typed.push(ch);
        search.set(typed.clone());
        tokio::time::advance(Duration::from_millis(50)).await;
        settle().await;
    }

    // still unfiltered mid-burst
    let query = ProductQuery::new().search(search.get());
    assert_eq!(query::derive(Some(products), &query).len(), 4);

    tokio::time::advance(Duration::from_millis(500)).await;
    settle().await;

    let typed_query = ProductQuery::new().search(search.get());
    let programmatic = ProductQuery::new().search("electronics");
    assert_eq!(
        query::derive(Some(products), &typed_query),
        query::derive(Some(products), &programmatic)
    );
    assert_eq!(ids(&query::derive(Some(products), &typed_query)), vec![3]);
}

#[tokio::test]
async fn category_search_and_sort_compose() {
    let queries = ProductQueries::new(Arc::new(InMemorySource::new(catalog())));
    let state = queries.products().settled().await;

    let query = ProductQuery::new()
        .category(Category::MensClothing)
        .sort(SortOrder::Ascending);
    let result = query::derive(state.data().map(|p| p.as_slice()), &query);
    assert_eq!(ids(&result), vec![2, 4, 1]);

    let query = query.search("another").sort(SortOrder::Descending);
    let result = query::derive(state.data().map(|p| p.as_slice()), &query);
    assert_eq!(ids(&result), vec![4, 2]);
}

#[tokio::test]
async fn failed_catalog_recovers_on_retry() {
    let source = Arc::new(InMemorySource::flaky(catalog()));
    let queries = ProductQueries::new(source.clone());
    let products = queries.products();
    let favorites = FavoritesStore::new();

    let state = products.settled().await;
    match views::product_list(&state, &ProductQuery::new(), &favorites) {
        ProductListView::Failed { message, .. } => assert!(message.contains("503")),
        other => panic!("expected failure, got {:?}", other),
    }

    products.refetch();
    let state = products.settled().await;
    assert_eq!(views::product_list(&state, &ProductQuery::new(), &favorites).len(), 4);
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn favorites_stay_in_sync_across_views() {
    let queries = ProductQueries::new(Arc::new(InMemorySource::new(catalog())));
    let favorites = FavoritesStore::new();

    // detail page favorites product 3
    let route = Route::parse("/products/3");
    let detail = queries.product(route.product_id().expect("valid id"));
    let detail_state = detail.settled().await;
    let product = match views::product_detail(Some(&detail_state), &favorites) {
        ProductDetailView::Loaded { product, is_favorite, .. } => {
            assert!(!is_favorite);
            product.clone()
        }
        other => panic!("unexpected detail view: {:?}", other),
    };
    assert!(favorites.toggle_favorite(&product));

    // the list, filtered to something else entirely, still knows
    let list_state = queries.products().settled().await;
    let electronics = ProductQuery::new().category(Category::Electronics);
    match views::product_list(&list_state, &electronics, &favorites) {
        ProductListView::Products(rows) => assert!(rows[0].is_favorite),
        other => panic!("unexpected list view: {:?}", other),
    }

    // favorites page removes it, detail badge follows
    favorites.remove_favorite(ProductId(3));
    assert!(matches!(
        views::product_detail(Some(&detail_state), &favorites),
        ProductDetailView::Loaded { is_favorite: false, .. }
    ));
}

#[tokio::test]
async fn unknown_and_invalid_ids_are_not_found() {
    let queries = ProductQueries::new(Arc::new(InMemorySource::new(catalog())));
    let favorites = FavoritesStore::new();

    let missing = queries.product(ProductId(999)).settled().await;
    assert!(matches!(
        views::product_detail(Some(&missing), &favorites),
        ProductDetailView::NotFound { .. }
    ));

    let route = Route::parse("/products/not-a-number");
    assert_eq!(route.product_id(), None);
    assert!(matches!(
        views::product_detail(None, &favorites),
        ProductDetailView::NotFound { .. }
    ));
}

#[tokio::test]
async fn duplicate_favorites_then_single_removal() {
    let favorites = FavoritesStore::new();
    let product = catalog().remove(0);

    favorites.add_favorite(product.clone());
    favorites.add_favorite(product.clone());
    assert_eq!(favorites.favorites(), vec![product.clone(), product]);

    favorites.remove_favorite(ProductId(1));
    assert!(favorites.is_empty());
}
