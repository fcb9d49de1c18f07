//! Integration tests for the delivery cart and checkout.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p delivery-integration-tests
//! ```
//!
//! No running backend is needed: the profile API is served by `mockito`.
//!
//! # Test Categories
//!
//! - `checkout_flow` - Cart, four-step checkout, quick checkout and invoice
//! - `profile_api` - Saved-address fetch, save and delete over HTTP
