//! Core types for the delivery client.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod id;
pub mod order;
pub mod price;

pub use address::{AddressError, AddressField, AddressForm, StructuredAddress, format_address};
pub use id::*;
pub use order::{CartItem, Order, OrderNumber, items_total};
pub use price::{CurrencyCode, Price, UnknownCurrency};
