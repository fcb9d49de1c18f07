//! Delivery Core - Shared domain types.
//!
//! This crate provides the types shared by the delivery client components:
//! - `checkout` - Session-scoped cart, address resolution and checkout flow
//! - `cli` - Terminal front end driving a checkout session
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clocks. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Ids, prices, cart lines, orders and delivery addresses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
