//! Cart state engine.
//!
//! [`cart_reducer`] is a pure transition function over an immutable item
//! list. A transition that changes nothing hands back the same `Arc`, so an
//! observer can skip work with `Arc::ptr_eq`.

pub mod codec;
pub mod store;

use checkout_service::models::Book;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use store::{CartStore, ClientStore, FileClientStore, InMemoryClientStore, CART_STORAGE_KEY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub book: Book,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> u64 {
        self.book.price.saturating_mul(u64::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartAction {
    AddItem {
        book: Book,
    },
    RemoveItem {
        #[serde(rename = "bookId")]
        book_id: String,
    },
    /// A quantity of zero or less removes the line.
    UpdateQuantity {
        #[serde(rename = "bookId")]
        book_id: String,
        quantity: i64,
    },
    Clear,
    /// Any action type this engine does not know. Leaves the cart as is.
    #[serde(other)]
    Unknown,
}

pub fn cart_reducer(state: &Arc<Vec<CartItem>>, action: &CartAction) -> Arc<Vec<CartItem>> {
    match action {
        CartAction::AddItem { book } => {
            let mut next = state.as_ref().clone();
            match next.iter_mut().find(|item| item.book.id == book.id) {
                Some(item) => item.quantity = item.quantity.saturating_add(1),
                None => next.push(CartItem {
                    book: book.clone(),
                    quantity: 1,
                }),
            }
            Arc::new(next)
        }
        CartAction::RemoveItem { book_id } => without(state, book_id),
        CartAction::UpdateQuantity { book_id, quantity } => {
            if *quantity <= 0 {
                return without(state, book_id);
            }
            if !contains(state, book_id) {
                return Arc::clone(state);
            }
            let quantity = u32::try_from(*quantity).unwrap_or(u32::MAX);
            Arc::new(
                state
                    .iter()
                    .map(|item| {
                        if item.book.id == *book_id {
                            CartItem {
                                book: item.book.clone(),
                                quantity,
                            }
                        } else {
                            item.clone()
                        }
                    })
                    .collect(),
            )
        }
        CartAction::Clear => Arc::new(Vec::new()),
        CartAction::Unknown => Arc::clone(state),
    }
}

fn contains(state: &[CartItem], book_id: &str) -> bool {
    state.iter().any(|item| item.book.id == book_id)
}

fn without(state: &Arc<Vec<CartItem>>, book_id: &str) -> Arc<Vec<CartItem>> {
    if !contains(state, book_id) {
        return Arc::clone(state);
    }
    Arc::new(
        state
            .iter()
            .filter(|item| item.book.id != book_id)
            .cloned()
            .collect(),
    )
}

/// Sum of price x quantity, in paise. Saturates instead of overflowing on
/// an edited snapshot; checkout-service then rejects the amount.
pub fn total_amount(items: &[CartItem]) -> u64 {
    items
        .iter()
        .fold(0u64, |total, item| total.saturating_add(item.line_total()))
}

pub fn total_items(items: &[CartItem]) -> u64 {
    items
        .iter()
        .fold(0u64, |total, item| total.saturating_add(u64::from(item.quantity)))
}
