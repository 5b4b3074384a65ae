//! Transaction matcher: turns a candidate line into zero or more transactions.

use chrono::{Datelike, NaiveDate};
use fatura_core::{Flux, LogicalLine, ParserConfig, Section, Transaction, parse_brl};
use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::debug;

use crate::patterns::transaction_re;
use crate::text::collapse_whitespace;
use crate::tracker::CandidateLine;

fn installment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d{2})/(\d{2})\b").expect("installment regex"))
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b20\d{2}\b").expect("year regex"))
}

/// Informational tails printed after a description.
fn noise_suffix_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"(?i)\s*simula[cç][aã]o\s+de\s+(?:compras|saques?).*$",
            r"(?i)\s*parc\.?\s*c/\s*juros.*$",
            r"(?i)\s*lan[cç]amentos\s+no\s+cart[aã]o.*$",
            r"(?i)\s*\(final\s*\d{4}\).*$",
            r"(?i)\s*total\s+(?:dos\s+)?lan[cç]amentos.*$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("noise suffix regex"))
        .collect()
    })
}

/// An `NN/NN` token found inside a transaction's middle text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallmentCandidate<'a> {
    /// The full candidate line.
    pub line: &'a str,
    /// Byte offset of the token in `line`.
    pub position: usize,
    pub number: u32,
    pub total: u32,
}

/// A rule's view of a candidate; any rejection wins.
pub type InstallmentRule = fn(&InstallmentCandidate<'_>, &ParserConfig) -> bool;

/// Evaluated in order; the first rejecting rule is reported.
pub const INSTALLMENT_RULES: &[(&str, InstallmentRule)] = &[
    ("plausible_range", plausible_range),
    ("past_leading_date_zone", past_leading_date_zone),
    ("descriptive_context", descriptive_context),
];

/// `1 <= number <= total <= 99`
pub fn plausible_range(c: &InstallmentCandidate<'_>, _config: &ParserConfig) -> bool {
    c.number >= 1 && c.number <= c.total && c.total <= 99
}

/// Tokens near the start of the line are dates, not installments.
pub fn past_leading_date_zone(c: &InstallmentCandidate<'_>, config: &ParserConfig) -> bool {
    c.position >= config.installment_min_offset
}

/// Some descriptive text must precede an installment marker.
pub fn descriptive_context(c: &InstallmentCandidate<'_>, _config: &ParserConfig) -> bool {
    c.line[..c.position].chars().any(char::is_alphabetic)
}

/// `None` if accepted, otherwise the name of the rejecting rule.
pub fn reject_installment(candidate: &InstallmentCandidate<'_>, config: &ParserConfig) -> Option<&'static str> {
    INSTALLMENT_RULES
        .iter()
        .find(|(_, rule)| !rule(candidate, config))
        .map(|(name, _)| *name)
}

/// First `20NN` in the opening lines, else the configured fallback, else this year.
pub fn detect_invoice_year(lines: &[LogicalLine], config: &ParserConfig) -> i32 {
    lines
        .iter()
        .take(config.year_scan_lines)
        .find_map(|l| year_re().find(&l.text))
        .and_then(|m| m.as_str().parse().ok())
        .or(config.fallback_year)
        .unwrap_or_else(|| chrono::Local::now().year())
}

/// `0731/03` -> (31, 3)
pub fn normalize_day_month(token: &str) -> Option<(u32, u32)> {
    let (day, month) = token.split_once('/')?;
    Some((last_two_digits(day)?, last_two_digits(month)?))
}

fn last_two_digits(fragment: &str) -> Option<u32> {
    let trimmed = fragment.trim_start_matches('0');
    let tail = &trimmed[trimmed.len().saturating_sub(2)..];
    if tail.is_empty() {
        return Some(0);
    }
    tail.parse().ok()
}

/// Collapse whitespace, drop noise tails and edge punctuation. `None` when
/// nothing descriptive is left.
pub fn clean_description(raw: &str) -> Option<String> {
    let mut text = collapse_whitespace(raw);
    for re in noise_suffix_res() {
        text = re.replace(&text, "").into_owned();
    }
    let text = text
        .trim_matches(|c: char| c.is_whitespace() || ".,;:()-".contains(c))
        .to_string();

    text.chars().any(char::is_alphabetic).then_some(text)
}

#[derive(Debug, Clone)]
pub struct TransactionMatcher<'a> {
    config: &'a ParserConfig,
    year: i32,
}

impl<'a> TransactionMatcher<'a> {
    pub fn new(config: &'a ParserConfig, year: i32) -> Self {
        Self { config, year }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Every transaction on the line, in left-to-right order.
    pub fn match_line(&self, line: &CandidateLine) -> Vec<Transaction> {
        transaction_re()
            .captures_iter(&line.text)
            .filter_map(|caps| self.build(&line.text, &caps, line))
            .collect()
    }

    fn build(&self, text: &str, caps: &Captures<'_>, line: &CandidateLine) -> Option<Transaction> {
        let date_token = caps.name("date")?.as_str();
        let middle = caps.name("middle")?;
        let amount_token = caps.name("amount")?.as_str();

        let Some(date) = normalize_day_month(date_token).and_then(|(d, m)| NaiveDate::from_ymd_opt(self.year, m, d))
        else {
            debug!(token = date_token, year = self.year, "invalid date, skipping match");
            return None;
        };

        let (description, installment) = self.split_installment(text, middle.start(), middle.as_str());
        let Some(description) = clean_description(&description) else {
            debug!(line = text, "empty description, skipping match");
            return None;
        };

        let signed = parse_brl(amount_token).ok()?;
        let flux = if amount_token.starts_with('-') {
            Flux::Credit
        } else {
            Flux::Debit
        };

        let card = match line.section {
            Section::Purchases => line.card.clone(),
            _ => None,
        };

        Some(Transaction {
            date,
            description,
            amount: signed.abs(),
            flux,
            card,
            installment_number: installment.map(|(n, _)| n),
            installment_total: installment.map(|(_, t)| t),
        })
    }

    /// The middle text without its last accepted `NN/NN` marker.
    fn split_installment(&self, line: &str, offset: usize, middle: &str) -> (String, Option<(u32, u32)>) {
        let Some(caps) = installment_re().captures_iter(middle).last() else {
            return (middle.to_string(), None);
        };
        let (Some(whole), Some(number), Some(total)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            return (middle.to_string(), None);
        };
        let (Ok(number), Ok(total)) = (number.as_str().parse(), total.as_str().parse()) else {
            return (middle.to_string(), None);
        };

        let candidate = InstallmentCandidate {
            line,
            position: offset + whole.start(),
            number,
            total,
        };
        if let Some(rule) = reject_installment(&candidate, self.config) {
            debug!(token = whole.as_str(), rule, "installment marker rejected");
            return (middle.to_string(), None);
        }

        let description = format!("{} {}", &middle[..whole.start()], &middle[whole.end()..]);
        (description, Some((number, total)))
    }
}
