//! One-shot quick checkout.
//!
//! # Usage
//!
//! ```bash
//! # Deliver to free text
//! delivery checkout --item "Pizza=32.90" --address "Rua A, 10"
//!
//! # Deliver to the saved profile address
//! delivery checkout --item "Pizza=32.90" --saved
//!
//! # Fill the form and store it on the profile
//! delivery checkout --item "Pizza=32.90" --street "Rua A" --number 10 \
//!     --neighborhood Centro --city "São Paulo" --state SP --zipcode 01000-000 \
//!     --save-address
//! ```

use std::io::Write as _;
use std::time::Duration;

use clap::Args;
use delivery_checkout::{AddressInput, CheckoutConfig, Session};
use delivery_core::{AddressForm, CartItem};
use tracing::{info, warn};

use super::parse_item;

/// How long to wait for the address save before exiting.
const SAVE_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Cart line as NAME=PRICE (repeatable)
    #[arg(short, long = "item", value_name = "NAME=PRICE", value_parser = parse_item, required = true)]
    items: Vec<CartItem>,

    /// Deliver to the address saved on the profile
    #[arg(long, conflicts_with_all = ["address", "street"])]
    saved: bool,

    /// Deliver to this free-text address
    #[arg(short, long, conflicts_with = "street")]
    address: Option<String>,

    #[command(flatten)]
    form: FormArgs,

    /// Store the form address on the profile after ordering
    #[arg(long, requires = "street")]
    save_address: bool,
}

/// Structured address fields.
#[derive(Debug, Default, Args)]
struct FormArgs {
    #[arg(long)]
    street: Option<String>,
    #[arg(long)]
    number: Option<String>,
    #[arg(long)]
    complement: Option<String>,
    #[arg(long)]
    neighborhood: Option<String>,
    #[arg(long)]
    city: Option<String>,
    #[arg(long)]
    state: Option<String>,
    #[arg(long)]
    zipcode: Option<String>,
}

impl FormArgs {
    fn into_form(self) -> AddressForm {
        AddressForm {
            street: self.street.unwrap_or_default(),
            number: self.number.unwrap_or_default(),
            complement: self.complement.unwrap_or_default(),
            neighborhood: self.neighborhood.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
            zipcode: self.zipcode.unwrap_or_default(),
        }
    }
}

impl CheckoutArgs {
    /// Address choice implied by the flags. No flag at all means the form,
    /// which then fails validation with the first missing field.
    fn address_input(&mut self) -> AddressInput {
        if self.saved {
            return AddressInput::Saved;
        }
        if let Some(text) = self.address.take() {
            return AddressInput::Manual(text);
        }
        AddressInput::Form {
            form: std::mem::take(&mut self.form).into_form(),
            save: self.save_address,
        }
    }
}

/// Place one order with the quick checkout and print its invoice.
///
/// # Errors
///
/// Returns an error if the session cannot be created, the cart or address
/// is rejected, or stdout fails.
pub async fn run(
    config: &CheckoutConfig,
    mut args: CheckoutArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::connect(config).await?;
    let input = args.address_input();

    for item in args.items {
        session.add_to_cart(item);
    }
    info!(items = session.cart().len(), mode = %input.mode(), "Quick checkout requested");

    if let Err(e) = session.quick_checkout(&input) {
        return Err(e.user_message().into());
    }

    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}", session.invoice())?;

    if !session.settle_saves(SAVE_GRACE).await {
        warn!("Address save did not finish in time");
    }
    for failure in session.end() {
        writeln!(stdout, "Could not save your address: {}", failure.message)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: CheckoutArgs,
    }

    fn parse(argv: &[&str]) -> Result<CheckoutArgs, clap::Error> {
        TestCli::try_parse_from(std::iter::once("checkout").chain(argv.iter().copied()))
            .map(|cli| cli.args)
    }

    #[test]
    fn test_manual_address() {
        let mut args = parse(&["--item", "Pizza=10.00", "--address", "Rua A, 10"]).unwrap();
        assert_eq!(args.items.len(), 1);
        assert_eq!(args.address_input(), AddressInput::Manual("Rua A, 10".to_string()));
    }

    #[test]
    fn test_form_address_with_save() {
        let mut args = parse(&[
            "--item",
            "Pizza=10.00",
            "--street",
            "Rua A",
            "--number",
            "10",
            "--save-address",
        ])
        .unwrap();
        let AddressInput::Form { form, save } = args.address_input() else {
            panic!("expected form input");
        };
        assert!(save);
        assert_eq!(form.street, "Rua A");
        assert_eq!(form.number, "10");
        assert!(form.city.is_empty());
    }

    #[test]
    fn test_conflicting_flags_rejected() {
        assert!(parse(&["--item", "Pizza=10", "--saved", "--address", "Rua A"]).is_err());
        assert!(parse(&["--item", "Pizza=10", "--address", "Rua A", "--street", "Rua B"]).is_err());
        assert!(parse(&["--address", "Rua A"]).is_err());
        assert!(parse(&["--item", "Pizza"]).is_err());
    }
}
