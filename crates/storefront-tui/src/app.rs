// TUI application state and event handling
use std::sync::Arc;
use std::time::Duration;

use ratatui::widgets::ListState;
use storefront_core::query;
use storefront_core::{
    Category, Debouncer, FavoritesStore, Product, ProductQueries, ProductQuery, QueryState,
    Route, SharedQuery, SortOrder,
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,    // Navigating the current screen
    Searching, // Typing in search box
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub route: Route,
    history: Vec<Route>,
    /// What is in the search box right now
    pub search_input: String,
    /// What the list is actually filtered by
    pub search: Debouncer<String>,
    pub category: Option<Category>,
    pub sort: SortOrder,
    pub favorites: FavoritesStore,
    queries: Arc<ProductQueries>,
    pub products: Arc<SharedQuery<Vec<Product>>>,
    pub detail: Option<Arc<SharedQuery<Option<Product>>>>,
    pub selected_index: usize,
    pub list_state: ListState,
    pub status_message: Option<String>,
}

impl App {
    /// Starts the catalog fetch, so call it from inside a Tokio runtime
    pub fn new(queries: Arc<ProductQueries>, favorites: FavoritesStore, debounce: Duration) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        let products = queries.products();

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            route: Route::Products,
            history: Vec::new(),
            search_input: String::new(),
            search: Debouncer::new(String::new(), debounce),
            category: None,
            sort: SortOrder::default(),
            favorites,
            queries,
            products,
            detail: None,
            selected_index: 0,
            list_state,
            status_message: None,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn enter_search_mode(&mut self) {
        if self.route != Route::Products {
            self.navigate(Route::Products);
        }
        self.input_mode = InputMode::Searching;
    }

    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Filters as they currently apply to the list
    pub fn query(&self) -> ProductQuery {
        ProductQuery {
            search: self.search.get(),
            category: self.category,
            sort: self.sort,
        }
    }

    pub fn products_state(&self) -> QueryState<Vec<Product>> {
        self.products.state()
    }

    pub fn detail_state(&self) -> Option<QueryState<Option<Product>>> {
        self.detail.as_ref().map(|query| query.state())
    }

    /// The product list after category, search and sort
    pub fn visible_products(&self) -> Vec<Product> {
        let state = self.products_state();
        query::derive_owned(state.data().map(Vec::as_slice), &self.query())
    }

    /// Rows on the current screen, for keeping the selection in range
    pub fn row_count(&self) -> usize {
        match self.route {
            Route::Products => self.visible_products().len(),
            Route::Favorites => self.favorites.len(),
            Route::ProductDetails(_) | Route::NotFound(_) => 0,
        }
    }

    /// The product the next action applies to on the current screen
    pub fn selected_product(&self) -> Option<Product> {
        match &self.route {
            Route::Products => self.visible_products().into_iter().nth(self.selected_index),
            Route::Favorites => self.favorites.favorites().into_iter().nth(self.selected_index),
            Route::ProductDetails(_) => self
                .detail_state()
                .and_then(|state| state.data().and_then(|p| p.clone())),
            Route::NotFound(_) => None,
        }
    }

    pub fn next_result(&mut self) {
        let count = self.row_count();
        if count > 0 {
            self.selected_index = (self.selected_index + 1).min(count - 1);
            self.list_state.select(Some(self.selected_index));
        }
    }

    pub fn previous_result(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
            self.list_state.select(Some(self.selected_index));
        }
    }

    fn reset_selection(&mut self) {
        self.selected_index = 0;
        self.list_state.select(Some(0));
    }

    /// Pull the selection back in range after the list shrank
    pub fn clamp_selection(&mut self) {
        let count = self.row_count();
        if self.selected_index >= count {
            self.selected_index = count.saturating_sub(1);
            self.list_state.select(Some(self.selected_index));
        }
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search_input.push(c);
        self.search.set(self.search_input.clone());
        self.reset_selection();
    }

    pub fn pop_search_char(&mut self) {
        self.search_input.pop();
        self.search.set(self.search_input.clone());
        self.reset_selection();
    }

    /// Apply what has been typed without waiting out the debounce
    pub fn submit_search(&mut self) {
        self.search.flush();
        self.enter_normal_mode();
    }

    /// Empty the search box; the list catches up after the usual debounce
    pub fn clear_search(&mut self) {
        self.search_input.clear();
        self.search.set(String::new());
        self.reset_selection();
    }

    pub fn cycle_category(&mut self) {
        self.category = Category::cycle(self.category);
        self.reset_selection();
    }

    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        self.reset_selection();
    }

    /// Go to `route`, remembering where we came from
    pub fn navigate(&mut self, route: Route) {
        if route == self.route {
            return;
        }
        debug!("Navigating {} -> {}", self.route, route);
        let previous = std::mem::replace(&mut self.route, route);
        self.history.push(previous);
        self.enter_route();
    }

    pub fn back(&mut self) {
        let previous = self.history.pop().unwrap_or(Route::Products);
        if previous == self.route {
            return;
        }
        self.route = previous;
        self.enter_route();
    }

    fn enter_route(&mut self) {
        self.input_mode = InputMode::Normal;
        self.status_message = None;
        self.reset_selection();

        self.detail = self.route.product_id().map(|id| {
            let query = self.queries.product(id);
            if query.state().error().is_some() {
                query.refetch();
            }
            query
        });
    }

    pub fn open_selected(&mut self) {
        if let Some(product) = self.selected_product() {
            self.navigate(Route::product(product.id));
        }
    }

    /// Favorites screen, or back out of it if already there
    pub fn toggle_favorites_screen(&mut self) {
        if self.route == Route::Favorites {
            self.back();
        } else {
            self.navigate(Route::Favorites);
        }
    }

    pub fn toggle_selected_favorite(&mut self) {
        let Some(product) = self.selected_product() else {
            return;
        };

        let message = if self.favorites.toggle_favorite(&product) {
            format!("Added \"{}\" to favorites", product.title)
        } else {
            format!("Removed \"{}\" from favorites", product.title)
        };
        self.status_message = Some(message);

        if self.route == Route::Favorites {
            self.clamp_selection();
        }
    }

    /// Re-issue whatever request the current screen depends on
    pub fn retry(&mut self) {
        match &self.route {
            Route::Products => self.products.refetch(),
            Route::ProductDetails(_) => {
                if let Some(detail) = &self.detail {
                    detail.refetch();
                }
            }
            Route::Favorites | Route::NotFound(_) => {}
        }
        self.status_message = None;
    }
}
