//! Invoice for the last confirmed order.
//!
//! A read-only projection: prices come from the stored order, never from the
//! live cart (which is already empty by the time the invoice is shown).

use core::fmt;

use chrono::{DateTime, Local, Utc};
use delivery_core::{CartItem, CurrencyCode, Order, OrderNumber, Price};
use rust_decimal::Decimal;

use crate::cart::CartStore;

/// Priced breakdown of a confirmed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice<'a> {
    order: &'a Order,
    order_number: Option<&'a OrderNumber>,
    delivery_fee: Decimal,
    currency: CurrencyCode,
}

impl<'a> Invoice<'a> {
    /// Build the invoice for `order` with a flat delivery fee.
    #[must_use]
    pub const fn new(order: &'a Order, delivery_fee: Decimal, currency: CurrencyCode) -> Self {
        Self {
            order,
            order_number: None,
            delivery_fee,
            currency,
        }
    }

    /// Show the order number issued by the checkout flow.
    #[must_use]
    pub const fn with_order_number(mut self, number: &'a OrderNumber) -> Self {
        self.order_number = Some(number);
        self
    }

    /// Ordered lines.
    #[must_use]
    pub fn items(&self) -> &'a [CartItem] {
        self.order.items()
    }

    /// Order total as computed at confirmation.
    #[must_use]
    pub const fn subtotal(&self) -> Decimal {
        self.order.total()
    }

    /// Flat delivery fee.
    #[must_use]
    pub const fn delivery_fee(&self) -> Decimal {
        self.delivery_fee
    }

    /// Subtotal plus delivery fee.
    #[must_use]
    pub fn grand_total(&self) -> Decimal {
        self.subtotal() + self.delivery_fee
    }

    /// When the order was confirmed.
    #[must_use]
    pub const fn date(&self) -> DateTime<Utc> {
        self.order.date()
    }

    /// Delivery address line.
    #[must_use]
    pub fn delivery_address(&self) -> &'a str {
        self.order.delivery_address()
    }

    /// Currency used for display.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Order number, when the flow issued one.
    #[must_use]
    pub const fn order_number(&self) -> Option<&'a OrderNumber> {
        self.order_number
    }

    fn price(&self, amount: Decimal) -> Price {
        Price::new(amount, self.currency)
    }
}

impl fmt::Display for Invoice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Order confirmed!")?;
        if let Some(number) = self.order_number {
            writeln!(f, "Order number: {number}")?;
        }
        let local = self.date().with_timezone(&Local);
        writeln!(f, "Date: {}", local.format("%d/%m/%Y at %H:%M:%S"))?;
        writeln!(f)?;
        writeln!(f, "Delivery address:")?;
        writeln!(f, "  {}", self.delivery_address())?;
        writeln!(f)?;
        writeln!(f, "Items:")?;
        for item in self.items() {
            write!(f, "  {} - {}", item.name, self.price(item.price))?;
            if let Some(restaurant) = &item.restaurant_name {
                write!(f, " ({restaurant})")?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;
        writeln!(f, "Subtotal:     {}", self.price(self.subtotal()))?;
        writeln!(f, "Delivery fee: {}", self.price(self.delivery_fee))?;
        write!(f, "Total:        {}", self.price(self.grand_total()))
    }
}

/// What the invoice screen shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceView<'a> {
    /// No order has been confirmed this session.
    NoOrder,
    /// Breakdown of the last order.
    Ready(Invoice<'a>),
}

impl<'a> InvoiceView<'a> {
    /// Project the cart's last order, if any.
    #[must_use]
    pub fn from_last_order(
        cart: &'a CartStore,
        delivery_fee: Decimal,
        currency: CurrencyCode,
    ) -> Self {
        cart.last_order().map_or(Self::NoOrder, |order| {
            Self::Ready(Invoice::new(order, delivery_fee, currency))
        })
    }

    /// The invoice, when there is one.
    #[must_use]
    pub const fn invoice(&self) -> Option<&Invoice<'a>> {
        match self {
            Self::NoOrder => None,
            Self::Ready(invoice) => Some(invoice),
        }
    }
}

impl fmt::Display for InvoiceView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOrder => f.write_str("No order has been placed yet."),
            Self::Ready(invoice) => invoice.fmt(f),
        }
    }
}
