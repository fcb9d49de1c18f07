//! Shopping session state.
//!
//! A [`Session`] owns everything one shopper touches between opening the app
//! and leaving it: the cart, the checkout flow, the saved-address lookup and
//! the background save channel. It is created empty, passed explicitly to
//! whatever drives it, and torn down with [`Session::end`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use delivery_core::{CartItem, CurrencyCode, Order, OrderNumber, UserId};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::address::{AddressInput, AddressResolver};
use crate::cart::CartStore;
use crate::checkout::{CheckoutFlow, CheckoutStep, Destination};
use crate::config::CheckoutConfig;
use crate::error::Result;
use crate::invoice::{Invoice, InvoiceView};
use crate::persistence::{AddressPersistence, PersistenceFailure};
use crate::profile::{ProfileClient, ProfileError};
use crate::quick::QuickCheckout;

/// One shopper's in-memory session.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    user_id: Option<UserId>,
    cart: CartStore,
    flow: CheckoutFlow,
    resolver: AddressResolver,
    profile: Option<ProfileClient>,
    persistence: Option<AddressPersistence>,
    failures: Option<mpsc::UnboundedReceiver<PersistenceFailure>>,
    delivery_fee: Decimal,
    currency: CurrencyCode,
}

impl Session {
    /// Start an offline session: empty cart, no last order, no profile API.
    #[must_use]
    pub fn new(config: &CheckoutConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            user_id: config.user_id,
            cart: CartStore::new(),
            flow: CheckoutFlow::new(),
            resolver: AddressResolver::default(),
            profile: None,
            persistence: None,
            failures: None,
            delivery_fee: config.delivery_fee,
            currency: config.currency,
        }
    }

    /// Start a session wired to the profile API, when one is configured.
    ///
    /// With a signed-in user, the saved address is fetched once here and
    /// background address saving is enabled. A failed fetch is logged and the
    /// session continues without a saved address.
    ///
    /// # Errors
    ///
    /// Returns error if the profile client cannot be built.
    #[instrument(skip(config), fields(user_id = ?config.user_id))]
    pub async fn connect(config: &CheckoutConfig) -> std::result::Result<Self, ProfileError> {
        let mut session = Self::new(config);

        let Some(api) = &config.api else {
            info!(session_id = %session.id, "Profile API not configured; running offline");
            return Ok(session);
        };

        let client = ProfileClient::new(api)?;
        if let Some(user_id) = session.user_id {
            session.resolver = AddressResolver::load(&client, user_id).await;
            let (persistence, failures) = AddressPersistence::new(client.clone(), user_id);
            session.persistence = Some(persistence);
            session.failures = Some(failures);
        }
        session.profile = Some(client);

        info!(session_id = %session.id, "Session started");
        Ok(session)
    }

    /// Session identifier, used to correlate log lines.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Signed-in user, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// The cart.
    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// The four-step checkout flow.
    #[must_use]
    pub const fn flow(&self) -> &CheckoutFlow {
        &self.flow
    }

    /// Address resolver holding the saved address.
    #[must_use]
    pub const fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    /// Profile API client, when configured.
    #[must_use]
    pub const fn profile(&self) -> Option<&ProfileClient> {
        self.profile.as_ref()
    }

    /// Currency used to display amounts.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Flat delivery fee shown on the invoice.
    #[must_use]
    pub const fn delivery_fee(&self) -> Decimal {
        self.delivery_fee
    }

    /// Add a menu item to the cart.
    pub fn add_to_cart(&mut self, item: CartItem) {
        self.cart.add(item);
    }

    /// Remove the cart line at `index`; `None` when out of bounds.
    pub fn remove_from_cart(&mut self, index: usize) -> Option<CartItem> {
        self.cart.remove(index)
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    /// Cart → Address.
    ///
    /// # Errors
    ///
    /// See [`CheckoutFlow::proceed`].
    pub fn proceed(&mut self) -> Result<()> {
        self.flow.proceed(&self.cart)
    }

    /// Address → Confirmation.
    ///
    /// # Errors
    ///
    /// See [`CheckoutFlow::submit_address`].
    pub fn submit_address(&mut self, input: &AddressInput) -> Result<()> {
        self.flow.submit_address(&self.resolver, input)
    }

    /// One step back.
    ///
    /// # Errors
    ///
    /// See [`CheckoutFlow::back`].
    pub fn back(&mut self) -> Result<CheckoutStep> {
        self.flow.back()
    }

    /// Confirmation → Invoice.
    ///
    /// # Errors
    ///
    /// See [`CheckoutFlow::finish_order`].
    pub fn finish_order(&mut self) -> Result<OrderNumber> {
        self.flow.finish_order(&mut self.cart, self.persistence.as_ref())
    }

    /// Leave the invoice.
    ///
    /// # Errors
    ///
    /// See [`CheckoutFlow::complete`].
    pub fn complete(&mut self, destination: Destination) -> Result<Destination> {
        self.flow.complete(&mut self.cart, destination)
    }

    /// Confirm the order from the single-page checkout.
    ///
    /// On success the stepper is reset, so a number issued for an earlier
    /// stepper order is never shown against this one.
    ///
    /// # Errors
    ///
    /// See [`QuickCheckout::confirm`].
    pub fn quick_checkout(&mut self, input: &AddressInput) -> Result<&Order> {
        let order = QuickCheckout::new(&self.resolver).confirm(
            &mut self.cart,
            input,
            self.persistence.as_ref(),
        )?;
        self.flow.reset();
        Ok(order)
    }

    /// Invoice for the last confirmed order.
    #[must_use]
    pub fn invoice(&self) -> InvoiceView<'_> {
        match (self.cart.last_order(), self.flow.order_number()) {
            (Some(order), Some(number)) => InvoiceView::Ready(
                Invoice::new(order, self.delivery_fee, self.currency).with_order_number(number),
            ),
            _ => InvoiceView::from_last_order(&self.cart, self.delivery_fee, self.currency),
        }
    }

    /// Wait up to `timeout` for background address saves to finish.
    ///
    /// Returns `true` when nothing is left in flight.
    pub async fn settle_saves(&self, timeout: Duration) -> bool {
        match &self.persistence {
            Some(persistence) => persistence.settle(timeout).await,
            None => true,
        }
    }

    /// Background save failures reported since the last call.
    pub fn drain_failures(&mut self) -> Vec<PersistenceFailure> {
        let mut drained = Vec::new();
        if let Some(failures) = &mut self.failures {
            while let Ok(failure) = failures.try_recv() {
                drained.push(failure);
            }
        }
        drained
    }

    /// Tear the session down, returning failures nobody drained yet.
    ///
    /// Saves still in flight are abandoned.
    pub fn end(mut self) -> Vec<PersistenceFailure> {
        let undrained = self.drain_failures();
        let duration = Utc::now() - self.started_at;
        if !undrained.is_empty() {
            warn!(
                session_id = %self.id,
                failures = undrained.len(),
                "Session ended with unreported address save failures"
            );
        }
        info!(
            session_id = %self.id,
            seconds = duration.num_seconds(),
            cart_items = self.cart.len(),
            placed_order = self.cart.last_order().is_some(),
            "Session ended"
        );
        undrained
    }
}
