//! Session cart.
//!
//! Holds the ordered list of items the user intends to buy and the single
//! "last order" slot. Mutated only by the session owner, one event at a time.

use chrono::Utc;
use delivery_core::{CartItem, Order, items_total};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// In-memory cart plus the most recently confirmed order.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    items: Vec<CartItem>,
    last_order: Option<Order>,
}

impl CartStore {
    /// Create an empty cart with no previous order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item. Duplicates are kept as separate lines.
    pub fn add(&mut self, item: CartItem) {
        debug!(name = %item.name, price = %item.price, "Adding item to cart");
        self.items.push(item);
    }

    /// Remove the item at `index`.
    ///
    /// Returns `None` and leaves the cart untouched when `index` is out of
    /// bounds.
    pub fn remove(&mut self, index: usize) -> Option<CartItem> {
        if index >= self.items.len() {
            debug!(index, len = self.items.len(), "Ignoring out-of-bounds cart removal");
            return None;
        }
        Some(self.items.remove(index))
    }

    /// Empty the cart. Safe to call on an empty cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Items in the order they were added.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of lines in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of the current items' prices.
    #[must_use]
    pub fn total(&self) -> Decimal {
        items_total(&self.items)
    }

    /// The most recently confirmed order, if any.
    #[must_use]
    pub const fn last_order(&self) -> Option<&Order> {
        self.last_order.as_ref()
    }

    /// Snapshot the cart into a new order, store it as the last order and
    /// clear the cart.
    ///
    /// Any previous last order is replaced. The caller is responsible for
    /// refusing an empty cart; this layer records whatever it holds.
    pub fn confirm_order(&mut self, delivery_address: impl Into<String>) -> &Order {
        let order = Order::snapshot(&self.items, delivery_address, Utc::now());
        info!(
            items = order.item_count(),
            total = %order.total(),
            "Order confirmed"
        );
        self.clear();
        self.last_order.insert(order)
    }
}
