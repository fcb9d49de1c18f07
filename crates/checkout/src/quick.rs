//! Single-page checkout.
//!
//! The short path: pick an address and confirm, with no stepper. Ends in the
//! same [`CartStore::confirm_order`] call as the four-step flow.

use delivery_core::Order;
use tracing::info;

use crate::address::{AddressInput, AddressResolver};
use crate::cart::CartStore;
use crate::error::{CheckoutError, Result};
use crate::persistence::{AddressPersistence, save_if_requested};

/// One-screen order confirmation.
#[derive(Debug, Clone, Copy)]
pub struct QuickCheckout<'r> {
    resolver: &'r AddressResolver,
}

impl<'r> QuickCheckout<'r> {
    /// Create a quick checkout around the session's address resolver.
    #[must_use]
    pub const fn new(resolver: &'r AddressResolver) -> Self {
        Self { resolver }
    }

    /// The resolver used for address input.
    #[must_use]
    pub const fn resolver(&self) -> &'r AddressResolver {
        self.resolver
    }

    /// Resolve the address and confirm the order in one go.
    ///
    /// Nothing changes when this fails.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::EmptyCart`] for an empty cart, or any address
    /// resolution error.
    pub fn confirm<'c>(
        &self,
        cart: &'c mut CartStore,
        input: &AddressInput,
        persistence: Option<&AddressPersistence>,
    ) -> Result<&'c Order> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let resolved = self.resolver.resolve(input)?;
        save_if_requested(&resolved, persistence);

        info!(mode = %input.mode(), items = cart.len(), "Quick checkout confirmed");
        Ok(cart.confirm_order(resolved.display()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use delivery_core::{AddressError, AddressField, AddressForm, CartItem};
    use rust_decimal::Decimal;

    use super::*;
    use crate::profile::SavedAddress;

    fn cart() -> CartStore {
        let mut cart = CartStore::new();
        cart.add(CartItem::new("Pastel", Decimal::new(800, 2)));
        cart
    }

    #[test]
    fn test_confirm_with_saved_address() {
        let resolver =
            AddressResolver::new(Some(SavedAddress::Text("Rua das Flores, 5".to_string())));
        let quick = QuickCheckout::new(&resolver);
        let mut cart = cart();

        let order = quick.confirm(&mut cart, &AddressInput::Saved, None).unwrap();
        assert_eq!(order.delivery_address(), "Rua das Flores, 5");
        assert_eq!(order.total(), Decimal::new(800, 2));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_empty_cart_rejected() {
        let resolver = AddressResolver::default();
        let quick = QuickCheckout::new(&resolver);
        let mut cart = CartStore::new();
        assert_eq!(
            quick
                .confirm(&mut cart, &AddressInput::Manual("Rua A".to_string()), None)
                .unwrap_err(),
            CheckoutError::EmptyCart
        );
        assert!(cart.last_order().is_none());
    }

    #[test]
    fn test_failed_validation_leaves_cart_untouched() {
        let resolver = AddressResolver::default();
        let quick = QuickCheckout::new(&resolver);
        let mut cart = cart();

        let err = quick
            .confirm(
                &mut cart,
                &AddressInput::Form {
                    form: AddressForm {
                        street: "Rua A".to_string(),
                        ..AddressForm::default()
                    },
                    save: true,
                },
                None,
            )
            .unwrap_err();
        assert_eq!(
            err,
            CheckoutError::Address(AddressError::MissingField(AddressField::Number))
        );
        assert_eq!(cart.len(), 1);
        assert!(cart.last_order().is_none());

        let err = quick
            .confirm(&mut cart, &AddressInput::Manual("   ".to_string()), None)
            .unwrap_err();
        assert_eq!(err, CheckoutError::EmptyAddress);
        assert_eq!(cart.len(), 1);
    }
}
