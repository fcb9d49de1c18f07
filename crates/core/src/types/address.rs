//! Delivery address types.
//!
//! [`AddressForm`] is the raw seven-field form as typed by the user (and as
//! exchanged with the profile endpoint). [`StructuredAddress`] is a form that
//! passed validation; the only way to obtain one is [`TryFrom<AddressForm>`],
//! so holding a `StructuredAddress` proves every required field is filled.

use core::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// One field of the structured address form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    Street,
    Number,
    Complement,
    Neighborhood,
    City,
    State,
    Zipcode,
}

impl AddressField {
    /// Every field, in form order.
    pub const ALL: [Self; 7] = [
        Self::Street,
        Self::Number,
        Self::Complement,
        Self::Neighborhood,
        Self::City,
        Self::State,
        Self::Zipcode,
    ];

    /// Fields that must be non-blank for the form to validate.
    pub const REQUIRED: [Self; 6] = [
        Self::Street,
        Self::Number,
        Self::Neighborhood,
        Self::City,
        Self::State,
        Self::Zipcode,
    ];

    /// Wire/form key for this field.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Street => "street",
            Self::Number => "number",
            Self::Complement => "complement",
            Self::Neighborhood => "neighborhood",
            Self::City => "city",
            Self::State => "state",
            Self::Zipcode => "zipcode",
        }
    }

    /// Look up a field by its form key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Whether the field must be filled in.
    #[must_use]
    pub const fn is_required(self) -> bool {
        !matches!(self, Self::Complement)
    }
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Errors produced when validating an [`AddressForm`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is blank.
    #[error("address field `{0}` is required")]
    MissingField(AddressField),
}

/// The structured address form.
///
/// Blank and `null` values deserialize to empty strings, so a partially
/// filled profile address still loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressForm {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub street: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub number: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub complement: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub neighborhood: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub zipcode: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl AddressForm {
    /// Read a field's current value.
    #[must_use]
    pub fn get(&self, field: AddressField) -> &str {
        match field {
            AddressField::Street => &self.street,
            AddressField::Number => &self.number,
            AddressField::Complement => &self.complement,
            AddressField::Neighborhood => &self.neighborhood,
            AddressField::City => &self.city,
            AddressField::State => &self.state,
            AddressField::Zipcode => &self.zipcode,
        }
    }

    /// Overwrite a field's value.
    pub fn set(&mut self, field: AddressField, value: impl Into<String>) {
        let slot = match field {
            AddressField::Street => &mut self.street,
            AddressField::Number => &mut self.number,
            AddressField::Complement => &mut self.complement,
            AddressField::Neighborhood => &mut self.neighborhood,
            AddressField::City => &mut self.city,
            AddressField::State => &mut self.state,
            AddressField::Zipcode => &mut self.zipcode,
        };
        *slot = value.into();
    }

    /// Required fields that are still blank, in form order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<AddressField> {
        AddressField::REQUIRED
            .into_iter()
            .filter(|field| self.get(*field).trim().is_empty())
            .collect()
    }

    /// Check that every required field is filled.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::MissingField`] naming the first blank
    /// required field.
    pub fn validate(&self) -> Result<(), AddressError> {
        match self.missing_fields().first() {
            Some(field) => Err(AddressError::MissingField(*field)),
            None => Ok(()),
        }
    }

    /// Render the form as a single delivery line.
    ///
    /// Works on incomplete forms too: parts whose inputs are blank are left
    /// out rather than producing dangling separators.
    #[must_use]
    pub fn display_line(&self) -> String {
        format_address(self)
    }
}

/// Join the present parts of an address with `", "`.
///
/// `street, number` and `city - state` are only emitted when both halves are
/// present.
#[must_use]
pub fn format_address(form: &AddressForm) -> String {
    let street = form.street.trim();
    let number = form.number.trim();
    let city = form.city.trim();
    let state = form.state.trim();

    let street_line = if street.is_empty() || number.is_empty() {
        String::new()
    } else {
        format!("{street}, {number}")
    };
    let city_line = if city.is_empty() || state.is_empty() {
        String::new()
    } else {
        format!("{city} - {state}")
    };

    [
        street_line.as_str(),
        form.complement.trim(),
        form.neighborhood.trim(),
        city_line.as_str(),
        form.zipcode.trim(),
    ]
    .into_iter()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(", ")
}

/// An address form whose required fields are all present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AddressForm", into = "AddressForm")]
pub struct StructuredAddress(AddressForm);

impl StructuredAddress {
    /// Borrow the underlying form values.
    #[must_use]
    pub const fn as_form(&self) -> &AddressForm {
        &self.0
    }

    /// Consume the address and return its form values.
    #[must_use]
    pub fn into_form(self) -> AddressForm {
        self.0
    }
}

impl TryFrom<AddressForm> for StructuredAddress {
    type Error = AddressError;

    fn try_from(form: AddressForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self(form))
    }
}

impl From<StructuredAddress> for AddressForm {
    fn from(address: StructuredAddress) -> Self {
        address.0
    }
}

impl fmt::Display for StructuredAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_address(&self.0))
    }
}
