//! Deduplicator and stats aggregator.

use fatura_core::{CardStats, Flux, ParseStats, Transaction};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};

/// Drop exact repeats of `(date, description, amount, card)`, keeping the
/// first. Returns the survivors and how many were removed.
pub fn deduplicate(items: Vec<Transaction>) -> (Vec<Transaction>, usize) {
    let before = items.len();
    let mut seen = HashSet::with_capacity(before);
    let unique: Vec<Transaction> = items
        .into_iter()
        .filter(|t| {
            seen.insert((
                t.date,
                t.description.clone(),
                t.amount,
                t.card_last4().map(str::to_string),
            ))
        })
        .collect();
    let removed = before - unique.len();
    (unique, removed)
}

pub fn aggregate(items: &[Transaction], per_card: BTreeMap<String, CardStats>) -> ParseStats {
    let (sum_debit, sum_credit) = items.iter().fold((Decimal::ZERO, Decimal::ZERO), |(d, c), t| match t.flux {
        Flux::Debit => (d + t.amount, c),
        Flux::Credit => (d, c + t.amount),
    });

    ParseStats {
        matched_count: items.len(),
        sum_debit,
        sum_credit,
        net_sum: sum_debit - sum_credit,
        per_card,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fatura_core::CardContext;

    fn item(description: &str, cents: i64, card: &str, flux: Flux) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            description: description.into(),
            amount: Decimal::new(cents, 2),
            flux,
            card: Some(CardContext::new(card, Some("JOHN DOE".into()))),
            installment_number: None,
            installment_total: None,
        }
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut first = item("PADARIA", 1200, "1234", Flux::Debit);
        first.installment_number = Some(1);
        let second = item("PADARIA", 1200, "1234", Flux::Debit);
        let other_card = item("PADARIA", 1200, "5678", Flux::Debit);

        let (items, removed) = deduplicate(vec![first.clone(), second, other_card]);
        assert_eq!(removed, 1);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], first);
    }

    #[test]
    fn test_aggregate_sums_by_flux() {
        let items = vec![
            item("A", 1000, "1234", Flux::Debit),
            item("B", 250, "1234", Flux::Credit),
            item("C", 125, "5678", Flux::Debit),
        ];
        let stats = aggregate(&items, BTreeMap::new());
        assert_eq!(stats.matched_count, 3);
        assert_eq!(stats.sum_debit, Decimal::new(1125, 2));
        assert_eq!(stats.sum_credit, Decimal::new(250, 2));
        assert_eq!(stats.net_sum, Decimal::new(875, 2));
    }

    #[test]
    fn test_empty_input_yields_zero_stats() {
        let stats = aggregate(&[], BTreeMap::new());
        assert_eq!(stats, ParseStats::default());
    }
}
