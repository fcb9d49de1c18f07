//! CLI subcommands and the argument parsing they share.

pub mod address;
pub mod checkout;
pub mod shell;

use std::str::FromStr;

use delivery_core::{AddressField, AddressForm, CartItem};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from parsing user-typed arguments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command `{0}` (type `help` for a list)")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid price `{0}`")]
    InvalidPrice(String),

    #[error("unknown address field `{0}`")]
    UnknownField(String),

    #[error("expected `field=value`, got `{0}`")]
    MalformedField(String),
}

/// Parse a non-negative price; a decimal comma is accepted.
pub fn parse_price(raw: &str) -> Result<Decimal, ParseError> {
    let normalized = raw.trim().replace(',', ".");
    Decimal::from_str(&normalized)
        .ok()
        .filter(|price| !price.is_sign_negative())
        .ok_or_else(|| ParseError::InvalidPrice(raw.to_string()))
}

/// Parse `NAME=PRICE` into a cart line.
pub fn parse_item(raw: &str) -> Result<CartItem, ParseError> {
    let (name, price) = raw
        .rsplit_once('=')
        .ok_or(ParseError::Usage("--item NAME=PRICE"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(ParseError::Usage("--item NAME=PRICE"));
    }
    Ok(CartItem::new(name, parse_price(price)?))
}

/// Parse `field=value; field=value` pairs into an address form.
///
/// Unnamed fields stay empty; validation happens later.
pub fn parse_form(raw: &str) -> Result<AddressForm, ParseError> {
    let mut form = AddressForm::default();
    for pair in raw.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| ParseError::MalformedField(pair.to_string()))?;
        let field = AddressField::from_key(key.trim())
            .ok_or_else(|| ParseError::UnknownField(key.trim().to_string()))?;
        form.set(field, value.trim());
    }
    Ok(form)
}
