//! Aggregates over a parsed statement.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bucket key for transactions whose card could not be resolved.
pub const UNKNOWN_CARD: &str = "unknown";

/// Printed vs computed totals for one card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStats {
    pub printed_total: Decimal,
    /// sum(debit) - sum(credit)
    pub computed_total: Decimal,
    /// |printed_total - computed_total|
    pub delta: Decimal,
}

impl CardStats {
    pub fn new(printed_total: Decimal, computed_total: Decimal) -> Self {
        Self {
            printed_total,
            computed_total,
            delta: (printed_total - computed_total).abs(),
        }
    }

    pub fn reconciles(&self, tolerance: Decimal) -> bool {
        self.delta <= tolerance
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub matched_count: usize,
    pub sum_debit: Decimal,
    pub sum_credit: Decimal,
    /// sum_debit - sum_credit
    pub net_sum: Decimal,
    /// Keyed by card last4, plus [`UNKNOWN_CARD`].
    pub per_card: BTreeMap<String, CardStats>,
}

/// A card whose computed total disagrees with the statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationMismatch {
    pub card_last4: String,
    pub printed_total: Decimal,
    pub computed_total: Decimal,
    pub delta: Decimal,
}

impl ParseStats {
    /// Cards (the unknown bucket excluded) whose delta exceeds `tolerance`.
    pub fn mismatches(&self, tolerance: Decimal) -> Vec<ReconciliationMismatch> {
        self.per_card
            .iter()
            .filter(|(card, stats)| card.as_str() != UNKNOWN_CARD && !stats.reconciles(tolerance))
            .map(|(card, stats)| ReconciliationMismatch {
                card_last4: card.clone(),
                printed_total: stats.printed_total,
                computed_total: stats.computed_total,
                delta: stats.delta,
            })
            .collect()
    }

    pub fn is_reconciled(&self, tolerance: Decimal) -> bool {
        self.mismatches(tolerance).is_empty()
    }
}
