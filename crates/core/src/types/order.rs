//! Cart line items and confirmed orders.

use core::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{MenuItemId, RestaurantId};

/// A menu item placed in the cart.
///
/// Prices are taken as given; upstream forms are trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Menu item name.
    pub name: String,
    /// Unit price in the currency's standard unit.
    pub price: Decimal,
    /// Menu item the line was created from, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_item_id: Option<MenuItemId>,
    /// Restaurant serving the item, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<RestaurantId>,
    /// Restaurant display name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_name: Option<String>,
}

impl CartItem {
    /// Create a line item with just a name and price.
    #[must_use]
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            price,
            menu_item_id: None,
            restaurant_id: None,
            restaurant_name: None,
        }
    }

    /// Attach the restaurant the item comes from.
    #[must_use]
    pub fn with_restaurant(mut self, id: RestaurantId, name: impl Into<String>) -> Self {
        self.restaurant_id = Some(id);
        self.restaurant_name = Some(name.into());
        self
    }

    /// Attach the source menu item id.
    #[must_use]
    pub const fn with_menu_item(mut self, id: MenuItemId) -> Self {
        self.menu_item_id = Some(id);
        self
    }
}

/// Sum of item prices.
#[must_use]
pub fn items_total(items: &[CartItem]) -> Decimal {
    items.iter().map(|item| item.price).sum()
}

/// A confirmed order.
///
/// Holds its own copy of the cart lines, so later cart edits never reach it.
/// There are no setters; an order is fixed once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    items: Vec<CartItem>,
    total: Decimal,
    date: DateTime<Utc>,
    delivery_address: String,
}

impl Order {
    /// Snapshot `items` into a new order placed at `date`.
    #[must_use]
    pub fn snapshot(
        items: &[CartItem],
        delivery_address: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            items: items.to_vec(),
            total: items_total(items),
            date,
            delivery_address: delivery_address.into(),
        }
    }

    /// Ordered lines.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Number of lines in the order.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of line prices, computed when the order was confirmed.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// When the order was confirmed.
    #[must_use]
    pub const fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// Resolved delivery address line.
    #[must_use]
    pub fn delivery_address(&self) -> &str {
        &self.delivery_address
    }
}

/// Human-readable order number, e.g. `PED1718000000000427`.
///
/// Built from a millisecond timestamp and a small random suffix, so two
/// orders in the same millisecond can collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Prefix shared by every order number.
    pub const PREFIX: &'static str = "PED";

    /// Build an order number from its timestamp and suffix parts.
    #[must_use]
    pub fn from_parts(unix_millis: i64, suffix: u16) -> Self {
        Self(format!("{}{unix_millis}{suffix}", Self::PREFIX))
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
