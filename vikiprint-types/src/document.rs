//! Document kinds and sale item attributes

use crate::amount::Amount;
use crate::error::{Error, Result};

/// Type of a fiscal document, as passed to "open document" (0x30)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DocumentType {
    Service = 1,
    /// Sale receipt (income)
    Income = 2,
    /// Sale return (return of income)
    ReturnOfIncome = 3,
    /// Cash deposit into the drawer
    MoneyDeposit = 4,
    /// Cash collection
    Collection = 5,
    /// Purchase receipt (expense)
    Expenses = 6,
    ReturnOfExpenses = 7,
}

impl DocumentType {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for DocumentType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Service),
            2 => Ok(Self::Income),
            3 => Ok(Self::ReturnOfIncome),
            4 => Ok(Self::MoneyDeposit),
            5 => Ok(Self::Collection),
            6 => Ok(Self::Expenses),
            7 => Ok(Self::ReturnOfExpenses),
            _ => Err(Error::Parse(format!("unknown document type: {value}"))),
        }
    }
}

/// Settlement method of a sale item (fiscal tag 1214)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SettlementMethod {
    FullPrepayment = 1,
    PartialPrepayment = 2,
    Advance = 3,
    #[default]
    FullPayment = 4,
    PartialPaymentAndCredit = 5,
    Credit = 6,
    CreditPayment = 7,
}

impl SettlementMethod {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Subject of a sale item (fiscal tag 1212)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ItemKind {
    #[default]
    Product = 1,
    Service = 4,
}

impl ItemKind {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Payment type code for "payment" (0x47)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PaymentKind {
    Cash = 0,
    Electronic = 1,
}

impl PaymentKind {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// One line of a receipt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleItem {
    pub name: String,
    pub article: String,
    pub quantity: Amount,
    pub price: Amount,
    pub discount: Amount,
    pub settlement: SettlementMethod,
    pub kind: ItemKind,
}

impl SaleItem {
    /// Create an item with no discount, full payment, sold as a product
    pub fn new(name: impl Into<String>, article: impl Into<String>, quantity: Amount, price: Amount) -> Self {
        Self {
            name: name.into(),
            article: article.into(),
            quantity,
            price,
            discount: Amount::ZERO,
            settlement: SettlementMethod::default(),
            kind: ItemKind::default(),
        }
    }

    pub fn with_discount(mut self, discount: Amount) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_settlement(mut self, settlement: SettlementMethod) -> Self {
        self.settlement = settlement;
        self
    }

    pub fn with_kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check the limits the register enforces on item fields
    pub fn validate(&self) -> Result<()> {
        if self.name.chars().count() > 256 {
            return Err(Error::Validation("item name longer than 256 characters".into()));
        }
        if self.article.chars().count() > 18 {
            return Err(Error::Validation("article longer than 18 characters".into()));
        }
        if self.quantity.nanos() <= 0 {
            return Err(Error::Validation(format!("quantity must be positive, got {}", self.quantity)));
        }
        if self.price.nanos() < 0 || self.discount.nanos() < 0 {
            return Err(Error::Validation("price and discount must not be negative".into()));
        }
        Ok(())
    }
}
