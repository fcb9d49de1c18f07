//! Interactive cart and checkout session.
//!
//! Reads one command per line from stdin and drives a [`Session`] through
//! the cart, the four checkout steps and the invoice.

use std::fmt::Write as _;
use std::io::Write as _;
use std::str::FromStr;
use std::time::Duration;

use delivery_checkout::{
    AddressInput, AddressMode, CheckoutConfig, CheckoutStep, Destination, Session,
};
use delivery_core::{CartItem, Price};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use super::{ParseError, parse_form, parse_price};

const HELP: &str = "\
Commands:
  add NAME PRICE          add an item to the cart
  remove N                remove cart line N
  cart                    show the cart
  clear                   empty the cart
  next                    go from the cart to the address step
  address                 list address options
  address saved           deliver to the saved address
  address manual TEXT     deliver to TEXT
  address form [save] k=v; k=v
                          fill the address form (street, number, complement,
                          neighborhood, city, state, zipcode)
  back                    go one step back
  finish                  confirm the order
  quick saved|manual TEXT|form ...
                          confirm the order in one go, skipping the steps
  invoice                 show the last order
  done [menu|dashboard]   leave the invoice
  help                    show this list
  quit                    leave the shell";

/// How long to wait for address saves when the shell exits.
const SAVE_GRACE: Duration = Duration::from_secs(5);

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Help,
    Add(CartItem),
    Remove(usize),
    Cart,
    Clear,
    Next,
    Addresses,
    Address(AddressInput),
    Back,
    Finish,
    Quick(AddressInput),
    Invoice,
    Done(Destination),
    Quit,
}

impl FromStr for ShellCommand {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match verb.to_lowercase().as_str() {
            "help" | "?" => Ok(Self::Help),
            "add" => {
                let (name, price) = rest
                    .rsplit_once(char::is_whitespace)
                    .ok_or(ParseError::Usage("add NAME PRICE"))?;
                Ok(Self::Add(CartItem::new(name.trim(), parse_price(price)?)))
            }
            "remove" | "rm" => rest
                .parse::<usize>()
                .ok()
                .filter(|line| *line > 0)
                .map(|line| Self::Remove(line - 1))
                .ok_or(ParseError::Usage("remove N (N starts at 1)")),
            "cart" => Ok(Self::Cart),
            "clear" => Ok(Self::Clear),
            "next" => Ok(Self::Next),
            "address" if rest.is_empty() => Ok(Self::Addresses),
            "address" => parse_address(rest).map(Self::Address),
            "back" => Ok(Self::Back),
            "finish" => Ok(Self::Finish),
            "quick" => parse_address(rest).map(Self::Quick),
            "invoice" => Ok(Self::Invoice),
            "done" => match rest {
                "" | "menu" => Ok(Self::Done(Destination::Menu)),
                "dashboard" => Ok(Self::Done(Destination::Dashboard)),
                _ => Err(ParseError::Usage("done [menu|dashboard]")),
            },
            "quit" | "exit" => Ok(Self::Quit),
            _ => Err(ParseError::UnknownCommand(verb.to_string())),
        }
    }
}

fn parse_address(raw: &str) -> Result<AddressInput, ParseError> {
    let (mode, rest) = raw.split_once(char::is_whitespace).unwrap_or((raw, ""));
    let rest = rest.trim();
    match mode {
        "saved" => Ok(AddressInput::Saved),
        "manual" => Ok(AddressInput::Manual(rest.to_string())),
        "form" => {
            let (save, fields) = match rest.strip_prefix("save") {
                Some(fields) if fields.is_empty() || fields.starts_with(char::is_whitespace) => {
                    (true, fields)
                }
                _ => (false, rest),
            };
            Ok(AddressInput::Form {
                form: parse_form(fields)?,
                save,
            })
        }
        _ => Err(ParseError::Usage("address saved|manual TEXT|form [save] k=v; ...")),
    }
}

/// What the shell does after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Show(String),
    Quit,
}

/// Apply one command to the session and describe the result.
pub fn execute(session: &mut Session, command: ShellCommand) -> Reply {
    let text = match command {
        ShellCommand::Help => HELP.to_string(),
        ShellCommand::Add(item) => {
            let line = format!("Added {}.", item.name);
            session.add_to_cart(item);
            line
        }
        ShellCommand::Remove(index) => session.remove_from_cart(index).map_or_else(
            || format!("There is no line {} in the cart.", index + 1),
            |item| format!("Removed {}.", item.name),
        ),
        ShellCommand::Cart => render_cart(session),
        ShellCommand::Clear => {
            session.clear_cart();
            "Cart cleared.".to_string()
        }
        ShellCommand::Next => match session.proceed() {
            Ok(()) => render_addresses(session),
            Err(e) => e.user_message(),
        },
        ShellCommand::Addresses => render_addresses(session),
        ShellCommand::Address(input) => match session.submit_address(&input) {
            Ok(()) => render_confirmation(session),
            Err(e) => e.user_message(),
        },
        ShellCommand::Back => match session.back() {
            Ok(CheckoutStep::Cart) => render_cart(session),
            Ok(_) => render_addresses(session),
            Err(e) => e.user_message(),
        },
        ShellCommand::Finish => match session.finish_order() {
            Ok(_) => session.invoice().to_string(),
            Err(e) => e.user_message(),
        },
        ShellCommand::Quick(input) => match session.quick_checkout(&input).map(|_| ()) {
            Ok(()) => session.invoice().to_string(),
            Err(e) => e.user_message(),
        },
        ShellCommand::Invoice => session.invoice().to_string(),
        ShellCommand::Done(destination) => match session.complete(destination) {
            Ok(Destination::Menu) => "Back to the menu. Your cart is empty.".to_string(),
            Ok(Destination::Dashboard) => "Back to the dashboard.".to_string(),
            Err(e) => e.user_message(),
        },
        ShellCommand::Quit => return Reply::Quit,
    };
    Reply::Show(text)
}

fn render_cart(session: &Session) -> String {
    let cart = session.cart();
    if cart.is_empty() {
        return "Your cart is empty.".to_string();
    }
    let currency = session.currency();
    let mut out = String::from("Cart:\n");
    for (line, item) in cart.items().iter().enumerate() {
        let price = Price::new(item.price, currency);
        let _ = writeln!(out, "  {}. {} - {price}", line + 1, item.name);
    }
    let _ = write!(out, "Total: {}", Price::new(cart.total(), currency));
    out
}

fn render_addresses(session: &Session) -> String {
    let resolver = session.resolver();
    let mut out = String::from("Choose a delivery address:\n");
    for mode in resolver.available_modes() {
        let marker = if mode == resolver.default_mode() { "*" } else { " " };
        let _ = write!(out, " {marker} {mode}");
        if let (AddressMode::Saved, Some(saved)) = (mode, resolver.saved_address()) {
            let _ = write!(out, ": {saved}");
        }
        out.push('\n');
    }
    out.push_str("Use `address saved`, `address manual TEXT` or `address form ...`.");
    out
}

fn render_confirmation(session: &Session) -> String {
    let mut out = render_cart(session);
    if let Some(address) = session.flow().resolved_address() {
        let _ = write!(out, "\nDeliver to: {}", address.display());
    }
    out.push_str("\nType `finish` to place the order or `back` to change the address.");
    out
}

/// Run the interactive shell until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if the session cannot be created or stdio fails.
pub async fn run(config: &CheckoutConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::connect(config).await?;
    info!(session_id = %session.id(), "Shell started");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = std::io::stdout();
    writeln!(stdout, "Type `help` for a list of commands.")?;

    loop {
        write!(stdout, "[{}] > ", session.flow().step())?;
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = match line.parse::<ShellCommand>() {
            Ok(command) => execute(&mut session, command),
            Err(e) => Reply::Show(e.to_string()),
        };
        match reply {
            Reply::Show(text) => writeln!(stdout, "{text}")?,
            Reply::Quit => break,
        }

        for failure in session.drain_failures() {
            writeln!(stdout, "Could not save your address: {}", failure.message)?;
        }
    }

    if !session.settle_saves(SAVE_GRACE).await {
        warn!("Leaving with address saves still in flight");
    }
    for failure in session.end() {
        writeln!(stdout, "Could not save your address: {}", failure.message)?;
    }
    Ok(())
}
