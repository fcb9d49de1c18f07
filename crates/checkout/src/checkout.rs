//! Four-step checkout flow.
//!
//! ```text
//! Cart ──proceed──▶ Address ──submit_address──▶ Confirmation ──finish_order──▶ Invoice
//!  ▲                  │  ▲                          │                          │
//!  └──────back────────┘  └──────────back────────────┘                      complete
//! ```
//!
//! The flow tracks the step and the data gathered so far. It does not own the
//! cart; callers pass the session's [`CartStore`] into the transitions that
//! need it. A refused transition returns an error and changes nothing.

use core::fmt;

use chrono::Utc;
use delivery_core::OrderNumber;
use rand::Rng;
use tracing::{debug, info};

use crate::address::{AddressInput, AddressResolver, ResolvedAddress};
use crate::cart::CartStore;
use crate::error::{CheckoutError, Result};
use crate::persistence::{AddressPersistence, save_if_requested};

/// Steps of the checkout flow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutStep {
    Cart,
    Address,
    Confirmation,
    Invoice,
}

impl CheckoutStep {
    /// Every step, in flow order.
    pub const ALL: [Self; 4] = [Self::Cart, Self::Address, Self::Confirmation, Self::Invoice];

    /// Zero-based position in the flow.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Cart => 0,
            Self::Address => 1,
            Self::Confirmation => 2,
            Self::Invoice => 3,
        }
    }

    /// Heading shown for the step.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Cart => "Cart",
            Self::Address => "Delivery address",
            Self::Confirmation => "Confirmation",
            Self::Invoice => "Invoice",
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cart => "cart",
            Self::Address => "address",
            Self::Confirmation => "confirmation",
            Self::Invoice => "invoice",
        })
    }
}

/// Where the user goes after leaving the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Back to the menu to place a new order.
    Menu,
    /// Back to the dashboard.
    Dashboard,
}

#[derive(Debug, Clone, Default)]
enum Stage {
    #[default]
    Cart,
    Address,
    Confirmation(ResolvedAddress),
    Invoice(OrderNumber),
}

/// The stepper driving one checkout.
#[derive(Debug, Clone, Default)]
pub struct CheckoutFlow {
    stage: Stage,
}

impl CheckoutFlow {
    /// Start a flow at the cart step.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        match self.stage {
            Stage::Cart => CheckoutStep::Cart,
            Stage::Address => CheckoutStep::Address,
            Stage::Confirmation(_) => CheckoutStep::Confirmation,
            Stage::Invoice(_) => CheckoutStep::Invoice,
        }
    }

    /// Drop back to the cart step, forgetting any resolved address or issued
    /// number. Used when an order is placed outside the stepper.
    pub fn reset(&mut self) {
        if !matches!(self.stage, Stage::Cart) {
            debug!(step = %self.step(), "Checkout flow reset");
        }
        self.stage = Stage::Cart;
    }

    /// Zero-based index of the current step.
    #[must_use]
    pub const fn step_index(&self) -> usize {
        self.step().index()
    }

    /// Address accepted at the address step, while on the confirmation step.
    #[must_use]
    pub const fn resolved_address(&self) -> Option<&ResolvedAddress> {
        match &self.stage {
            Stage::Confirmation(resolved) => Some(resolved),
            _ => None,
        }
    }

    /// Number of the order placed by this flow, while on the invoice step.
    #[must_use]
    pub const fn order_number(&self) -> Option<&OrderNumber> {
        match &self.stage {
            Stage::Invoice(number) => Some(number),
            _ => None,
        }
    }

    /// Move from the cart to the address step.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::EmptyCart`] when the cart has no items,
    /// [`CheckoutError::InvalidTransition`] when not on the cart step.
    pub fn proceed(&mut self, cart: &CartStore) -> Result<()> {
        self.expect(CheckoutStep::Cart, "continue to the address")?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        self.stage = Stage::Address;
        debug!(step = %self.step(), "Checkout advanced");
        Ok(())
    }

    /// Validate the address and move to the confirmation step.
    ///
    /// # Errors
    ///
    /// Any address resolution error, or [`CheckoutError::InvalidTransition`]
    /// when not on the address step.
    pub fn submit_address(
        &mut self,
        resolver: &AddressResolver,
        input: &AddressInput,
    ) -> Result<()> {
        self.expect(CheckoutStep::Address, "submit an address")?;
        let resolved = resolver.resolve(input)?;
        debug!(mode = %input.mode(), "Delivery address accepted");
        self.stage = Stage::Confirmation(resolved);
        Ok(())
    }

    /// Go back one step. Never touches the cart or repeats side effects.
    ///
    /// Leaving the confirmation step drops the accepted address.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidTransition`] on the cart and invoice steps.
    pub fn back(&mut self) -> Result<CheckoutStep> {
        self.stage = match self.stage {
            Stage::Address => Stage::Cart,
            Stage::Confirmation(_) => Stage::Address,
            Stage::Cart | Stage::Invoice(_) => {
                return Err(invalid(self.step(), "go back"));
            }
        };
        Ok(self.step())
    }

    /// Place the order: snapshot the cart, clear it, and move to the invoice.
    ///
    /// If the address came from the form with "save" ticked, a background
    /// save is started through `persistence`; the order does not wait for it.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::EmptyCart`] if the cart was emptied meanwhile,
    /// [`CheckoutError::InvalidTransition`] when not on the confirmation step.
    pub fn finish_order(
        &mut self,
        cart: &mut CartStore,
        persistence: Option<&AddressPersistence>,
    ) -> Result<OrderNumber> {
        let Stage::Confirmation(resolved) = &self.stage else {
            return Err(invalid(self.step(), "finish the order"));
        };
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let number = generate_order_number();
        save_if_requested(resolved, persistence);
        cart.confirm_order(resolved.display());
        info!(order_number = %number, "Checkout finished");

        self.stage = Stage::Invoice(number.clone());
        Ok(number)
    }

    /// Leave the invoice: clear the cart and reset the flow for a new order.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidTransition`] when not on the invoice step.
    pub fn complete(
        &mut self,
        cart: &mut CartStore,
        destination: Destination,
    ) -> Result<Destination> {
        self.expect(CheckoutStep::Invoice, "leave the invoice")?;
        cart.clear();
        self.stage = Stage::Cart;
        debug!(?destination, "Checkout completed");
        Ok(destination)
    }

    fn expect(&self, step: CheckoutStep, action: &'static str) -> Result<()> {
        if self.step() == step {
            Ok(())
        } else {
            Err(invalid(self.step(), action))
        }
    }
}

const fn invalid(step: CheckoutStep, action: &'static str) -> CheckoutError {
    CheckoutError::InvalidTransition { step, action }
}

/// Generate an order number from the current time and a random suffix in
/// `0..1000`.
#[must_use]
pub fn generate_order_number() -> OrderNumber {
    let suffix = rand::rng().random_range(0..1000u16);
    OrderNumber::from_parts(Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use delivery_core::{AddressForm, CartItem};
    use rust_decimal::Decimal;

    use super::*;
    use crate::profile::SavedAddress;

    fn cart_with_items() -> CartStore {
        let mut cart = CartStore::new();
        cart.add(CartItem::new("Pizza", Decimal::new(1000, 2)));
        cart.add(CartItem::new("Suco", Decimal::new(1550, 2)));
        cart
    }

    fn manual(text: &str) -> AddressInput {
        AddressInput::Manual(text.to_string())
    }

    fn at_confirmation(cart: &CartStore) -> CheckoutFlow {
        let mut flow = CheckoutFlow::new();
        flow.proceed(cart).unwrap();
        flow.submit_address(&AddressResolver::default(), &manual("Rua A, 10"))
            .unwrap();
        flow
    }

    #[test]
    fn test_empty_cart_cannot_proceed() {
        let cart = CartStore::new();
        let mut flow = CheckoutFlow::new();

        assert_eq!(flow.proceed(&cart), Err(CheckoutError::EmptyCart));
        assert_eq!(flow.step(), CheckoutStep::Cart);
        assert_eq!(flow.step_index(), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_proceed_with_items() {
        let cart = cart_with_items();
        let mut flow = CheckoutFlow::new();
        flow.proceed(&cart).unwrap();
        assert_eq!(flow.step(), CheckoutStep::Address);
        assert_eq!(flow.step_index(), 1);
    }

    #[test]
    fn test_invalid_address_keeps_step() {
        let cart = cart_with_items();
        let mut flow = CheckoutFlow::new();
        flow.proceed(&cart).unwrap();

        let err = flow
            .submit_address(
                &AddressResolver::default(),
                &AddressInput::Form {
                    form: AddressForm::default(),
                    save: false,
                },
            )
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Address(_)));
        assert_eq!(flow.step(), CheckoutStep::Address);

        assert_eq!(
            flow.submit_address(&AddressResolver::default(), &AddressInput::Saved)
                .unwrap_err(),
            CheckoutError::SavedAddressUnavailable
        );
        assert_eq!(flow.step(), CheckoutStep::Address);
    }

    #[test]
    fn test_submit_saved_address() {
        let cart = cart_with_items();
        let resolver = AddressResolver::new(Some(SavedAddress::Text("Av. Brasil, 1".to_string())));
        let mut flow = CheckoutFlow::new();
        flow.proceed(&cart).unwrap();

        flow.submit_address(&resolver, &AddressInput::Saved).unwrap();
        assert_eq!(flow.resolved_address().unwrap().display(), "Av. Brasil, 1");
        assert_eq!(flow.step(), CheckoutStep::Confirmation);
    }

    #[test]
    fn test_back_transitions_leave_cart_alone() {
        let cart = cart_with_items();
        let mut flow = at_confirmation(&cart);

        assert_eq!(flow.back().unwrap(), CheckoutStep::Address);
        assert!(flow.resolved_address().is_none());
        assert_eq!(flow.back().unwrap(), CheckoutStep::Cart);
        assert_eq!(cart.len(), 2);

        let err = flow.back().unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidTransition { .. }));
        assert_eq!(flow.step(), CheckoutStep::Cart);
    }

    #[test]
    fn test_finish_order_confirms_and_clears() {
        let mut cart = cart_with_items();
        let mut flow = at_confirmation(&cart);

        let number = flow.finish_order(&mut cart, None).unwrap();
        assert!(number.as_str().starts_with(OrderNumber::PREFIX));
        assert_eq!(flow.step(), CheckoutStep::Invoice);
        assert_eq!(flow.order_number(), Some(&number));

        assert!(cart.is_empty());
        let order = cart.last_order().unwrap();
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.total(), Decimal::new(2550, 2));
        assert_eq!(order.delivery_address(), "Rua A, 10");
    }

    #[test]
    fn test_finish_order_only_from_confirmation() {
        let mut cart = cart_with_items();
        let mut flow = CheckoutFlow::new();
        let err = flow.finish_order(&mut cart, None).unwrap_err();
        assert_eq!(
            err,
            CheckoutError::InvalidTransition {
                step: CheckoutStep::Cart,
                action: "finish the order",
            }
        );
        assert_eq!(cart.len(), 2);
        assert!(cart.last_order().is_none());
    }

    #[test]
    fn test_finish_order_refuses_emptied_cart() {
        let mut cart = cart_with_items();
        let mut flow = at_confirmation(&cart);
        cart.clear();

        assert_eq!(
            flow.finish_order(&mut cart, None).unwrap_err(),
            CheckoutError::EmptyCart
        );
        assert_eq!(flow.step(), CheckoutStep::Confirmation);
    }

    #[test]
    fn test_form_save_without_user_is_skipped() {
        let mut cart = cart_with_items();
        let mut flow = CheckoutFlow::new();
        flow.proceed(&cart).unwrap();
        let form = AddressForm {
            street: "Rua A".to_string(),
            number: "10".to_string(),
            complement: String::new(),
            neighborhood: "Centro".to_string(),
            city: "SP".to_string(),
            state: "SP".to_string(),
            zipcode: "01000-000".to_string(),
        };
        flow.submit_address(&AddressResolver::default(), &AddressInput::Form { form, save: true })
            .unwrap();

        // No runtime and no persistence: must not try to spawn.
        flow.finish_order(&mut cart, None).unwrap();
        assert_eq!(
            cart.last_order().unwrap().delivery_address(),
            "Rua A, 10, Centro, SP - SP, 01000-000"
        );
    }

    #[test]
    fn test_complete_resets_flow() {
        let mut cart = cart_with_items();
        let mut flow = at_confirmation(&cart);
        flow.finish_order(&mut cart, None).unwrap();

        let destination = flow.complete(&mut cart, Destination::Menu).unwrap();
        assert_eq!(destination, Destination::Menu);
        assert_eq!(flow.step(), CheckoutStep::Cart);
        assert!(cart.is_empty());
        assert!(cart.last_order().is_some());
    }

    #[test]
    fn test_complete_only_from_invoice() {
        let mut cart = cart_with_items();
        let mut flow = CheckoutFlow::new();
        assert!(flow.complete(&mut cart, Destination::Dashboard).is_err());
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn test_reset_forgets_issued_number() {
        let mut cart = cart_with_items();
        let mut flow = at_confirmation(&cart);
        flow.finish_order(&mut cart, None).unwrap();
        assert!(flow.order_number().is_some());

        flow.reset();
        assert_eq!(flow.step(), CheckoutStep::Cart);
        assert!(flow.order_number().is_none());
        assert!(cart.last_order().is_some());
    }

    #[test]
    fn test_generated_order_numbers_have_prefix_and_digits() {
        let number = generate_order_number();
        let digits = number.as_str().strip_prefix("PED").unwrap();
        assert!(digits.len() >= 14);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_step_order() {
        let indices: Vec<_> = CheckoutStep::ALL.iter().map(|s| s.index()).collect();
        assert_eq!(indices, [0, 1, 2, 3]);
        assert_eq!(CheckoutStep::Confirmation.to_string(), "confirmation");
    }
}
