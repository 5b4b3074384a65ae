//! Control-total reconciler.

use fatura_core::{CardStats, ControlTotal, Flux, Transaction, UNKNOWN_CARD};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::warn;

/// Printed per-card totals; the last summary seen for a card wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlTotals {
    by_card: BTreeMap<String, Decimal>,
}

impl ControlTotals {
    pub fn record(&mut self, control: ControlTotal) {
        self.by_card.insert(control.card_last4, control.printed_total);
    }

    pub fn get(&self, last4: &str) -> Option<Decimal> {
        self.by_card.get(last4).copied()
    }

    pub fn len(&self) -> usize {
        self.by_card.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_card.is_empty()
    }

    pub fn to_vec(&self) -> Vec<ControlTotal> {
        self.by_card
            .iter()
            .map(|(card, total)| ControlTotal {
                card_last4: card.clone(),
                printed_total: *total,
            })
            .collect()
    }
}

impl FromIterator<ControlTotal> for ControlTotals {
    fn from_iter<I: IntoIterator<Item = ControlTotal>>(iter: I) -> Self {
        let mut totals = Self::default();
        for control in iter {
            totals.record(control);
        }
        totals
    }
}

/// Per-card printed vs computed totals over every card that has items or a
/// printed total. Items without a card land in [`UNKNOWN_CARD`].
pub fn reconcile(items: &[Transaction], controls: &ControlTotals, tolerance: Decimal) -> BTreeMap<String, CardStats> {
    let mut computed: BTreeMap<String, Decimal> = controls
        .by_card
        .keys()
        .map(|card| (card.clone(), Decimal::ZERO))
        .collect();

    for item in items {
        let key = item.card_last4().unwrap_or(UNKNOWN_CARD).to_string();
        let entry = computed.entry(key).or_default();
        match item.flux {
            Flux::Debit => *entry += item.amount,
            Flux::Credit => *entry -= item.amount,
        }
    }

    computed
        .into_iter()
        .map(|(card, computed_total)| {
            let printed_total = controls.get(&card).unwrap_or(Decimal::ZERO);
            let stats = CardStats::new(printed_total, computed_total);
            if card != UNKNOWN_CARD && !stats.reconciles(tolerance) {
                warn!(
                    card = %card,
                    printed = %stats.printed_total,
                    computed = %stats.computed_total,
                    delta = %stats.delta,
                    "card total does not reconcile"
                );
            }
            (card, stats)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fatura_core::CardContext;

    fn item(card: Option<&str>, cents: i64, flux: Flux) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            description: "LOJA".into(),
            amount: Decimal::new(cents, 2),
            flux,
            card: card.map(|c| CardContext::new(c, None)),
            installment_number: None,
            installment_total: None,
        }
    }

    fn control(card: &str, cents: i64) -> ControlTotal {
        ControlTotal {
            card_last4: card.into(),
            printed_total: Decimal::new(cents, 2),
        }
    }

    #[test]
    fn test_last_control_wins() {
        let totals: ControlTotals = [control("1234", 100), control("1234", 250)].into_iter().collect();
        assert_eq!(totals.len(), 1);
        assert_eq!(totals.get("1234"), Some(Decimal::new(250, 2)));
    }

    #[test]
    fn test_credits_reduce_computed_total() {
        let items = vec![item(Some("1234"), 1000, Flux::Debit), item(Some("1234"), 250, Flux::Credit)];
        let totals: ControlTotals = [control("1234", 750)].into_iter().collect();
        let per_card = reconcile(&items, &totals, Decimal::new(1, 2));
        let stats = &per_card["1234"];
        assert_eq!(stats.computed_total, Decimal::new(750, 2));
        assert_eq!(stats.delta, Decimal::ZERO);
    }

    #[test]
    fn test_union_of_cards_and_unknown_bucket() {
        let items = vec![item(None, 1019, Flux::Debit), item(Some("1111"), 500, Flux::Debit)];
        let totals: ControlTotals = [control("2222", 300)].into_iter().collect();
        let per_card = reconcile(&items, &totals, Decimal::new(1, 2));

        assert_eq!(per_card.len(), 3);
        assert_eq!(per_card[UNKNOWN_CARD].printed_total, Decimal::ZERO);
        assert_eq!(per_card[UNKNOWN_CARD].computed_total, Decimal::new(1019, 2));
        assert_eq!(per_card["1111"].delta, Decimal::new(500, 2));
        assert_eq!(per_card["2222"].computed_total, Decimal::ZERO);
        assert_eq!(per_card["2222"].delta, Decimal::new(300, 2));
    }
}
