//! Delivery address resolution.
//!
//! Turns one of three user choices into the single address line attached to
//! an order:
//!
//! - **Saved** - the address on the user's profile, fetched once per session
//! - **Manual** - free text, used verbatim
//! - **Form** - the structured seven-field form, optionally saved back to the
//!   profile after the order goes through

use core::fmt;

use delivery_core::{AddressForm, StructuredAddress, UserId};
use tracing::{info, warn};

use crate::error::{CheckoutError, Result};
use crate::profile::{ProfileClient, SavedAddress};

/// The three ways to provide a delivery address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Saved,
    Manual,
    Form,
}

impl fmt::Display for AddressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Saved => "saved",
            Self::Manual => "manual",
            Self::Form => "form",
        })
    }
}

/// The user's address choice together with what they entered for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressInput {
    /// Use the address saved on the profile.
    Saved,
    /// Free-text address.
    Manual(String),
    /// Structured form; `save` asks for it to be stored on the profile.
    Form { form: AddressForm, save: bool },
}

impl AddressInput {
    /// Which mode this input belongs to.
    #[must_use]
    pub const fn mode(&self) -> AddressMode {
        match self {
            Self::Saved => AddressMode::Saved,
            Self::Manual(_) => AddressMode::Manual,
            Self::Form { .. } => AddressMode::Form,
        }
    }
}

/// A validated delivery address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    display: String,
    save_request: Option<StructuredAddress>,
}

impl ResolvedAddress {
    /// The delivery line attached to the order.
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }

    /// Address to store on the profile once the order is placed.
    #[must_use]
    pub const fn save_request(&self) -> Option<&StructuredAddress> {
        self.save_request.as_ref()
    }
}

/// Resolves address input against the session's saved address.
#[derive(Debug, Clone, Default)]
pub struct AddressResolver {
    saved: Option<String>,
}

impl AddressResolver {
    /// Create a resolver around an already known saved address.
    #[must_use]
    pub fn new(saved: Option<SavedAddress>) -> Self {
        let saved = saved
            .map(|address| address.display_line())
            .filter(|line| !line.is_empty());
        Self { saved }
    }

    /// Fetch the user's saved address and build a resolver around it.
    ///
    /// Fetch failures are logged and treated as "no saved address"; they
    /// never block checkout.
    pub async fn load(client: &ProfileClient, user_id: UserId) -> Self {
        match client.get_address(user_id).await {
            Ok(saved) => {
                info!(user_id = %user_id, found = saved.is_some(), "Loaded saved address");
                Self::new(saved)
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to fetch saved address");
                Self::default()
            }
        }
    }

    /// The saved address line, if the user has one.
    #[must_use]
    pub fn saved_address(&self) -> Option<&str> {
        self.saved.as_deref()
    }

    /// Modes the user may pick from. `Saved` is offered only when a saved
    /// address exists.
    #[must_use]
    pub fn available_modes(&self) -> Vec<AddressMode> {
        let mut modes = Vec::with_capacity(3);
        if self.saved.is_some() {
            modes.push(AddressMode::Saved);
        }
        modes.push(AddressMode::Manual);
        modes.push(AddressMode::Form);
        modes
    }

    /// Preselected mode: the saved address when there is one.
    #[must_use]
    pub const fn default_mode(&self) -> AddressMode {
        if self.saved.is_some() {
            AddressMode::Saved
        } else {
            AddressMode::Manual
        }
    }

    /// Resolve `input` to a delivery line.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::SavedAddressUnavailable`] for `Saved` without a saved address
    /// - [`CheckoutError::EmptyAddress`] for blank manual text
    /// - [`CheckoutError::Address`] for a form with a blank required field
    pub fn resolve(&self, input: &AddressInput) -> Result<ResolvedAddress> {
        let resolved = match input {
            AddressInput::Saved => ResolvedAddress {
                display: self
                    .saved
                    .clone()
                    .ok_or(CheckoutError::SavedAddressUnavailable)?,
                save_request: None,
            },
            AddressInput::Manual(text) => ResolvedAddress {
                display: text.clone(),
                save_request: None,
            },
            AddressInput::Form { form, save } => {
                let address = StructuredAddress::try_from(form.clone())?;
                ResolvedAddress {
                    display: address.to_string(),
                    save_request: save.then_some(address),
                }
            }
        };

        if resolved.display.trim().is_empty() {
            return Err(CheckoutError::EmptyAddress);
        }

        Ok(resolved)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use delivery_core::{AddressError, AddressField};

    use super::*;

    fn form() -> AddressForm {
        AddressForm {
            street: "Rua A".to_string(),
            number: "10".to_string(),
            complement: String::new(),
            neighborhood: "Centro".to_string(),
            city: "SP".to_string(),
            state: "SP".to_string(),
            zipcode: "01000-000".to_string(),
        }
    }

    #[test]
    fn test_saved_mode_uses_formatted_profile_address() {
        let resolver = AddressResolver::new(Some(SavedAddress::Structured(form())));
        let resolved = resolver.resolve(&AddressInput::Saved).unwrap();
        assert_eq!(resolved.display(), "Rua A, 10, Centro, SP - SP, 01000-000");
        assert!(resolved.save_request().is_none());
        assert_eq!(resolver.default_mode(), AddressMode::Saved);
    }

    #[test]
    fn test_saved_mode_without_saved_address() {
        let resolver = AddressResolver::default();
        assert_eq!(
            resolver.resolve(&AddressInput::Saved),
            Err(CheckoutError::SavedAddressUnavailable)
        );
        assert_eq!(
            resolver.available_modes(),
            vec![AddressMode::Manual, AddressMode::Form]
        );
        assert_eq!(resolver.default_mode(), AddressMode::Manual);
    }

    #[test]
    fn test_blank_saved_address_is_treated_as_missing() {
        let resolver = AddressResolver::new(Some(SavedAddress::Text("   ".to_string())));
        assert!(resolver.saved_address().is_none());
        assert!(!resolver.available_modes().contains(&AddressMode::Saved));
    }

    #[test]
    fn test_manual_mode_is_verbatim() {
        let resolver = AddressResolver::default();
        let resolved = resolver
            .resolve(&AddressInput::Manual("Av. Brasil 500, fundos".to_string()))
            .unwrap();
        assert_eq!(resolved.display(), "Av. Brasil 500, fundos");
    }

    #[test]
    fn test_manual_mode_rejects_whitespace() {
        let resolver = AddressResolver::default();
        assert_eq!(
            resolver.resolve(&AddressInput::Manual(" \n\t ".to_string())),
            Err(CheckoutError::EmptyAddress)
        );
    }

    #[test]
    fn test_form_mode_formats_and_requests_save() {
        let resolver = AddressResolver::default();
        let resolved = resolver
            .resolve(&AddressInput::Form {
                form: form(),
                save: true,
            })
            .unwrap();
        assert_eq!(resolved.display(), "Rua A, 10, Centro, SP - SP, 01000-000");
        assert_eq!(resolved.save_request().unwrap().as_form(), &form());
    }

    #[test]
    fn test_form_mode_without_save() {
        let resolver = AddressResolver::default();
        let resolved = resolver
            .resolve(&AddressInput::Form {
                form: form(),
                save: false,
            })
            .unwrap();
        assert!(resolved.save_request().is_none());
    }

    #[test]
    fn test_form_mode_missing_required_field() {
        let mut incomplete = form();
        incomplete.neighborhood.clear();
        let resolver = AddressResolver::default();
        assert_eq!(
            resolver.resolve(&AddressInput::Form {
                form: incomplete,
                save: true,
            }),
            Err(CheckoutError::Address(AddressError::MissingField(
                AddressField::Neighborhood
            )))
        );
    }

    #[test]
    fn test_input_mode() {
        assert_eq!(AddressInput::Saved.mode(), AddressMode::Saved);
        assert_eq!(
            AddressInput::Manual(String::new()).mode(),
            AddressMode::Manual
        );
        assert_eq!(AddressMode::Form.to_string(), "form");
    }
}
