use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::models::{Product, ProductId};

/// Shared, observable list of favorite products.
///
/// Cloning the store hands out another handle to the same list, so every
/// screen that shows a favorite badge reads from one place. Entries are
/// snapshots taken when added, kept in insertion order. Adding a product
/// that is already there adds it again; removing an id drops every entry
/// carrying it.
#[derive(Debug, Clone)]
pub struct FavoritesStore {
    favorites: Arc<watch::Sender<Vec<Product>>>,
}

impl FavoritesStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            favorites: Arc::new(tx),
        }
    }

    /// Append a snapshot of `product`, no existence check
    pub fn add_favorite(&self, product: Product) {
        let id = product.id;
        self.favorites.send_modify(|favorites| favorites.push(product));
        info!("Added product {} to favorites", id);
    }

    /// Remove every entry with `id`. Returns how many went; 0 is fine.
    pub fn remove_favorite(&self, id: ProductId) -> usize {
        let mut removed = 0;
        self.favorites.send_if_modified(|favorites| {
            let before = favorites.len();
            favorites.retain(|p| p.id != id);
            removed = before - favorites.len();
            removed > 0
        });

        if removed > 0 {
            info!("Removed product {} from favorites ({} entries)", id, removed);
        } else {
            debug!("Product {} was not a favorite, nothing removed", id);
        }
        removed
    }

    /// Add if absent, otherwise remove all entries for its id.
    /// Returns whether the product is a favorite afterwards.
    pub fn toggle_favorite(&self, product: &Product) -> bool {
        let mut now_favorite = false;
        self.favorites.send_modify(|favorites| {
            if favorites.iter().any(|p| p.id == product.id) {
                favorites.retain(|p| p.id != product.id);
            } else {
                favorites.push(product.clone());
                now_favorite = true;
            }
        });
        debug!("Toggled product {} (favorite: {})", product.id, now_favorite);
        now_favorite
    }

    pub fn is_favorite(&self, id: ProductId) -> bool {
        self.favorites.borrow().iter().any(|p| p.id == id)
    }

    /// Current entries in insertion order
    pub fn favorites(&self) -> Vec<Product> {
        self.favorites.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.favorites.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.borrow().is_empty()
    }

    /// Receiver that is marked changed after every mutation that did something
    pub fn subscribe(&self) -> watch::Receiver<Vec<Product>> {
        self.favorites.subscribe()
    }
}

impl Default for FavoritesStore {
    fn default() -> Self {
        Self::new()
    }
}
