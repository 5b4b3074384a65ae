//! Statement domain types: sections, card context and transactions.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Region of the statement currently being read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// "Lançamentos: compras e saques"
    Purchases,
    /// "Lançamentos: produtos e serviços"
    ProductsAndServices,
    /// Installment schedules, credit limits, charges summaries.
    Ignored,
    #[default]
    Outside,
}

impl Section {
    /// Sections whose lines may carry transactions.
    pub fn is_relevant(self) -> bool {
        matches!(self, Section::Purchases | Section::ProductsAndServices)
    }
}

/// The card a transaction is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardContext {
    pub last4: String,
    pub holder: Option<String>,
}

impl CardContext {
    pub fn new(last4: impl Into<String>, holder: Option<String>) -> Self {
        Self {
            last4: last4.into(),
            holder,
        }
    }

    /// `"Final 1234"` or `"Final 1234 - JOHN DOE"`
    pub fn label(&self) -> String {
        match &self.holder {
            Some(h) if !h.is_empty() => format!("Final {} - {}", self.last4, h),
            _ => format!("Final {}", self.last4),
        }
    }
}

/// Direction of money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flux {
    /// A charge.
    #[serde(rename = "Saida")]
    Debit,
    /// A refund or credit back to the cardholder.
    #[serde(rename = "Entrada")]
    Credit,
}

impl Flux {
    pub fn as_str(self) -> &'static str {
        match self {
            Flux::Debit => "Saida",
            Flux::Credit => "Entrada",
        }
    }
}

/// A dated, valued, attributed statement line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    /// Always non-negative; direction lives in `flux`.
    pub amount: Decimal,
    pub flux: Flux,
    pub card: Option<CardContext>,
    pub installment_number: Option<u32>,
    pub installment_total: Option<u32>,
}

impl Transaction {
    pub fn card_last4(&self) -> Option<&str> {
        self.card.as_ref().map(|c| c.last4.as_str())
    }

    /// Contribution to a card total: debits add, credits subtract.
    pub fn signed_amount(&self) -> Decimal {
        match self.flux {
            Flux::Debit => self.amount,
            Flux::Credit => -self.amount,
        }
    }
}

/// A subtotal printed by the statement for one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlTotal {
    pub card_last4: String,
    pub printed_total: Decimal,
}
