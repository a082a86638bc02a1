//! Cart state container bound to a client-side key/value store.

use super::{cart_reducer, codec, total_amount, total_items, CartAction, CartItem};
use anyhow::Context;
use checkout_service::models::Book;
use dashmap::DashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

pub const CART_STORAGE_KEY: &str = "bookstore-cart";

/// Durable string storage scoped to one client.
pub trait ClientStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryClientStore {
    entries: DashMap<String, String>,
}

impl InMemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStore for InMemoryClientStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|value| value.clone())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileClientStore {
    dir: PathBuf,
}

impl FileClientStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl ClientStore for FileClientStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let path = self.path(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)
            .with_context(|| format!("Failed to write {}", staging.display()))?;
        fs::rename(&staging, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

/// Owns one session's cart. Every change that produces a new item list is
/// written back to the client store.
pub struct CartStore {
    items: Arc<Vec<CartItem>>,
    store: Arc<dyn ClientStore>,
}

impl CartStore {
    /// Restore the saved snapshot by replaying it through the reducer.
    pub fn hydrate(store: Arc<dyn ClientStore>) -> Self {
        let mut items = Arc::new(Vec::new());

        if let Some(saved) = store.get(CART_STORAGE_KEY) {
            for item in codec::deserialize(&saved) {
                let book_id = item.book.id.clone();
                items = cart_reducer(&items, &CartAction::AddItem { book: item.book });
                if item.quantity > 1 {
                    items = cart_reducer(
                        &items,
                        &CartAction::UpdateQuantity {
                            book_id,
                            quantity: i64::from(item.quantity),
                        },
                    );
                }
            }
        }

        tracing::debug!(lines = items.len(), "Cart hydrated");
        let cart = Self { items, store };
        cart.persist();
        cart
    }

    pub fn dispatch(&mut self, action: CartAction) {
        let next = cart_reducer(&self.items, &action);
        if Arc::ptr_eq(&next, &self.items) {
            return;
        }
        self.items = next;
        self.persist();
    }

    pub fn add_item(&mut self, book: Book) {
        self.dispatch(CartAction::AddItem { book });
    }

    pub fn remove_item(&mut self, book_id: &str) {
        self.dispatch(CartAction::RemoveItem {
            book_id: book_id.to_string(),
        });
    }

    pub fn update_quantity(&mut self, book_id: &str, quantity: i64) {
        self.dispatch(CartAction::UpdateQuantity {
            book_id: book_id.to_string(),
            quantity,
        });
    }

    pub fn clear(&mut self) {
        self.dispatch(CartAction::Clear);
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Shared handle to the current list; unchanged across no-op actions.
    pub fn snapshot(&self) -> Arc<Vec<CartItem>> {
        Arc::clone(&self.items)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_amount(&self) -> u64 {
        total_amount(&self.items)
    }

    pub fn total_items(&self) -> u64 {
        total_items(&self.items)
    }

    // Write failures are logged and otherwise ignored.
    fn persist(&self) {
        if let Err(err) = self
            .store
            .set(CART_STORAGE_KEY, &codec::serialize(&self.items))
        {
            tracing::warn!("Failed to save cart: {:#}", err);
        }
    }
}
