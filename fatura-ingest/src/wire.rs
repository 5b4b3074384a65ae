//! JSON response shape handed to the HTTP layer.

use fatura_core::{CardStats, ParseStats, Transaction, format_brl, format_plain};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CREDIT_CARD_SOURCE: &str = "Cartão de Crédito";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireItem {
    /// `YYYY-MM-DD`
    pub date: String,
    pub description: String,
    /// `1234.56`
    pub amount: String,
    /// `Final 1234 - HOLDER`
    pub card: Option<String>,
    pub flux: String,
    pub source: String,
    pub installment_number: Option<u32>,
    pub installment_total: Option<u32>,
}

impl From<&Transaction> for WireItem {
    fn from(t: &Transaction) -> Self {
        Self {
            date: t.date.format("%Y-%m-%d").to_string(),
            description: t.description.clone(),
            amount: format_plain(t.amount),
            card: t.card.as_ref().map(|c| c.label()),
            flux: t.flux.as_str().to_string(),
            source: CREDIT_CARD_SOURCE.to_string(),
            installment_number: t.installment_number,
            installment_total: t.installment_total,
        }
    }
}

/// pt-BR formatted card totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCardStats {
    pub printed_total: String,
    pub computed_total: String,
    pub delta: String,
}

impl From<&CardStats> for WireCardStats {
    fn from(s: &CardStats) -> Self {
        Self {
            printed_total: format_brl(s.printed_total),
            computed_total: format_brl(s.computed_total),
            delta: format_brl(s.delta),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireStats {
    pub matched: usize,
    pub sum_debit: String,
    pub sum_credit: String,
    pub net_sum: String,
    pub by_card: BTreeMap<String, WireCardStats>,
}

impl From<&ParseStats> for WireStats {
    fn from(s: &ParseStats) -> Self {
        Self {
            matched: s.matched_count,
            sum_debit: format_brl(s.sum_debit),
            sum_credit: format_brl(s.sum_credit),
            net_sum: format_brl(s.net_sum),
            by_card: s.per_card.iter().map(|(k, v)| (k.clone(), v.into())).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementResponse {
    pub items: Vec<WireItem>,
    pub stats: WireStats,
}

impl StatementResponse {
    pub fn new(transactions: &[Transaction], stats: &ParseStats) -> Self {
        Self {
            items: transactions.iter().map(WireItem::from).collect(),
            stats: stats.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fatura_core::{CardContext, Flux};
    use rust_decimal::Decimal;

    #[test]
    fn test_item_shape() {
        let t = Transaction {
            date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            description: "SOME STORE".into(),
            amount: Decimal::new(123456, 2),
            flux: Flux::Debit,
            card: Some(CardContext::new("1234", Some("JOHN DOE".into()))),
            installment_number: Some(2),
            installment_total: Some(6),
        };
        let stats = ParseStats {
            matched_count: 1,
            sum_debit: Decimal::new(123456, 2),
            sum_credit: Decimal::ZERO,
            net_sum: Decimal::new(123456, 2),
            per_card: [("1234".to_string(), CardStats::new(Decimal::new(123456, 2), Decimal::new(123456, 2)))]
                .into_iter()
                .collect(),
        };

        let json: serde_json::Value = serde_json::from_str(&StatementResponse::new(&[t], &stats).to_json().unwrap()).unwrap();
        let item = &json["items"][0];
        assert_eq!(item["date"], "2025-03-31");
        assert_eq!(item["amount"], "1234.56");
        assert_eq!(item["card"], "Final 1234 - JOHN DOE");
        assert_eq!(item["flux"], "Saida");
        assert_eq!(item["source"], "Cartão de Crédito");
        assert_eq!(item["installment_number"], 2);

        assert_eq!(json["stats"]["matched"], 1);
        assert_eq!(json["stats"]["sum_debit"], "1.234,56");
        assert_eq!(json["stats"]["by_card"]["1234"]["delta"], "0,00");
    }
}
