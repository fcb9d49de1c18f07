//! Checkout validation errors.
//!
//! Every variant is recoverable: the caller shows [`CheckoutError::user_message`]
//! next to the step and the flow stays where it was. Network failures never
//! show up here; they are logged and swallowed by the profile and persistence
//! layers.

use delivery_core::AddressError;
use thiserror::Error;

use crate::checkout::CheckoutStep;

/// Reasons a checkout action was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// The cart has no items.
    #[error("cart is empty")]
    EmptyCart,

    /// The resolved delivery address is blank.
    #[error("delivery address is empty")]
    EmptyAddress,

    /// The saved-address mode was chosen but the user has none.
    #[error("no saved address on file")]
    SavedAddressUnavailable,

    /// The structured form is incomplete.
    #[error("invalid address: {0}")]
    Address(#[from] AddressError),

    /// The action is not allowed from the current step.
    #[error("cannot {action} from the {step} step")]
    InvalidTransition {
        step: CheckoutStep,
        action: &'static str,
    },
}

impl CheckoutError {
    /// Message suitable for showing inline next to the failing step.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyCart => "Your cart is empty. Add an item before checking out.".to_string(),
            Self::EmptyAddress => "Please provide a delivery address.".to_string(),
            Self::SavedAddressUnavailable => {
                "You have no saved address. Please choose another option.".to_string()
            }
            Self::Address(_) => "Please fill in all required address fields.".to_string(),
            Self::InvalidTransition { .. } => self.to_string(),
        }
    }
}

/// Result type alias for `CheckoutError`.
pub type Result<T> = std::result::Result<T, CheckoutError>;
