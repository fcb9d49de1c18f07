//! Delivery Checkout - Cart, address resolution and checkout flow.
//!
//! Everything a shopper's session needs between adding the first item and
//! reading the invoice:
//!
//! - [`cart`] - In-memory cart and the last confirmed order
//! - [`address`] - Saved / manual / form address resolution
//! - [`checkout`] - Four-step checkout (Cart, Address, Confirmation, Invoice)
//! - [`quick`] - Single-page checkout
//! - [`invoice`] - Priced breakdown of the last order
//! - [`profile`] - HTTP client for the user-profile address API
//! - [`persistence`] - Fire-and-forget saving of new addresses
//! - [`session`] - Owns all of the above for one shopper
//! - [`config`] - Environment configuration
//!
//! # Example
//!
//! ```
//! use delivery_checkout::{AddressInput, CheckoutConfig, Session};
//! use delivery_core::CartItem;
//! use rust_decimal::Decimal;
//!
//! let mut session = Session::new(&CheckoutConfig::default());
//! session.add_to_cart(CartItem::new("Pizza", Decimal::new(1000, 2)));
//! session.proceed()?;
//! session.submit_address(&AddressInput::Manual("Rua A, 10".to_string()))?;
//! let number = session.finish_order()?;
//! assert!(number.as_str().starts_with("PED"));
//! # Ok::<(), delivery_checkout::CheckoutError>(())
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod invoice;
pub mod persistence;
pub mod profile;
pub mod quick;
pub mod session;

pub use address::{AddressInput, AddressMode, AddressResolver, ResolvedAddress};
pub use cart::CartStore;
pub use checkout::{CheckoutFlow, CheckoutStep, Destination, generate_order_number};
pub use config::{ApiConfig, CheckoutConfig, ConfigError, DEFAULT_DELIVERY_FEE};
pub use error::{CheckoutError, Result};
pub use invoice::{Invoice, InvoiceView};
pub use persistence::{AddressPersistence, PersistenceFailure};
pub use profile::{ProfileClient, ProfileError, SavedAddress};
pub use quick::QuickCheckout;
pub use session::Session;
