//! Section & card state tracker.
//!
//! The tracker is a plain value folded over the line stream:
//! `state.advance(line) -> (state, events)`. It never looks ahead and never
//! counts lines; every transition is driven by what a line says.

use fatura_core::{CardContext, Column, ControlTotal, LogicalLine, ParserConfig, Section, parse_brl};
use regex::Regex;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::OnceLock;
use tracing::debug;

use crate::patterns::{detached_sign_re, transaction_re};
use crate::text::{FoldedText, collapse_whitespace};

/// Words that make a "NAME (final NNNN)" match a summary, not a card header.
const RESERVED_HOLDER_WORDS: &[&str] = &["lancamentos", "cartao", "total", "limites"];

/// Lines after which nothing more is read from the statement.
const END_OF_TRANSACTIONS: &[&str] = &[
    "novo teto de juros do cartao de credito",
    "total dos lancamentos atuais",
];

/// Table headings repeated at the top of each column.
const COLUMN_HEADINGS: &[&str] = &[
    "data estabelecimento valor em r$",
    "data produtos/servicos valor em r$",
];

fn card_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?P<holder>[a-z][a-z\s]*?)\s*\(final\s*(?P<last4>\d{4})\)").expect("card header regex")
    })
}

fn card_summary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"lancamentos\s*(?:no\s*)?cartao\s*\(final\s*(?P<last4>\d{4})\)\s+(?P<total>\d{1,3}(?:\.\d{3})*,\d{2})",
        )
        .expect("card summary regex")
    })
}

/// Card markers found in a line. Spans are byte ranges of the original text.
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    /// "HOLDER NAME (final NNNN)": a new card section starts.
    Start { card: CardContext, span: Range<usize> },
    /// "Lançamentos no cartão (final NNNN) 1.234,56": a card section's printed total.
    Total { control: ControlTotal, start: usize },
}

/// Every card marker in `text`, at most one of each kind.
pub fn scan_markers(text: &str, folded: &FoldedText, config: &ParserConfig) -> Vec<Marker> {
    let mut markers = Vec::new();

    if let Some(caps) = card_summary_re().captures(folded.as_str()) {
        let whole = caps.get(0).map(|m| m.start()).unwrap_or(0);
        if let Ok(printed_total) = parse_brl(&caps["total"]) {
            markers.push(Marker::Total {
                control: ControlTotal {
                    card_last4: caps["last4"].to_string(),
                    printed_total,
                },
                start: folded.original_offset(whole),
            });
        }
    }

    for caps in card_header_re().captures_iter(folded.as_str()) {
        let Some(holder_match) = caps.name("holder") else {
            continue;
        };
        if !is_valid_holder(holder_match.as_str(), config) {
            continue;
        }
        let Some(whole) = caps.get(0) else {
            continue;
        };

        let holder_range = folded.original_offset(holder_match.start())..folded.original_offset(holder_match.end());
        let holder = collapse_whitespace(&text[holder_range]).to_uppercase();
        markers.push(Marker::Start {
            card: CardContext::new(&caps["last4"], Some(holder)),
            span: folded.original_offset(whole.start())..folded.original_offset(whole.end()),
        });
        break;
    }

    markers
}

/// A real holder name: long enough and free of summary vocabulary.
///
/// Candidates come from the folded card header capture, so they are already
/// letters and spaces only.
pub fn is_valid_holder(candidate: &str, config: &ParserConfig) -> bool {
    let trimmed = candidate.trim();
    trimmed.chars().count() >= config.min_holder_len
        && !RESERVED_HOLDER_WORDS.iter().any(|w| trimmed.contains(w))
}

/// A line (or the part of it) that may hold transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLine {
    pub text: String,
    pub section: Section,
    /// Resolved card; always `None` outside `Purchases`.
    pub card: Option<CardContext>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent {
    SectionChanged(Section),
    CardSwitched(CardContext),
    Control(ControlTotal),
    Candidate(CandidateLine),
    /// Fully consumed as a heading, header or summary.
    Consumed,
    /// Outside any transaction section.
    Skipped,
}

/// Active card per column, plus the most recent card seen anywhere.
#[derive(Debug, Clone, Default, PartialEq)]
struct CardSlots {
    left: Option<CardContext>,
    right: Option<CardContext>,
    global: Option<CardContext>,
}

impl CardSlots {
    fn slot_mut(&mut self, column: Column) -> &mut Option<CardContext> {
        match column {
            Column::Left => &mut self.left,
            Column::Right => &mut self.right,
            Column::Unknown => &mut self.global,
        }
    }

    /// Own column first, then the other column, then the global fallback.
    fn active(&self, column: Column) -> Option<&CardContext> {
        let (own, other) = match column {
            Column::Left => (&self.left, &self.right),
            Column::Right => (&self.right, &self.left),
            Column::Unknown => (&self.global, &None),
        };
        own.as_ref().or(other.as_ref()).or(self.global.as_ref())
    }

    fn set(&mut self, column: Column, card: CardContext) {
        *self.slot_mut(column) = Some(card.clone());
        self.global = Some(card);
    }

    /// A column continues whatever card was active when reading left it.
    fn enter(&mut self, column: Column) {
        let carried = self.global.clone();
        *self.slot_mut(column) = carried;
    }

    fn clear_card(&mut self, last4: &str) {
        for slot in [&mut self.left, &mut self.right, &mut self.global] {
            if slot.as_ref().is_some_and(|c| c.last4 == last4) {
                *slot = None;
            }
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerState {
    section: Section,
    cards: CardSlots,
    /// Card whose summary was just read; its tail may follow in column order.
    summarized: Option<CardContext>,
    holders: BTreeMap<String, String>,
    position: Option<(usize, Column)>,
    sections_seen: usize,
    /// An end-of-transactions marker was read; every later line is skipped.
    finished: bool,
}

impl TrackerState {
    pub fn section(&self) -> Section {
        self.section
    }

    /// Section markers (opening or closing) recognized so far.
    pub fn sections_seen(&self) -> usize {
        self.sections_seen
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn active_card(&self, column: Column) -> Option<&CardContext> {
        self.cards.active(column)
    }

    /// Consume one line, returning the next state and what the line produced.
    pub fn advance(mut self, line: &LogicalLine, config: &ParserConfig) -> (Self, Vec<LineEvent>) {
        let mut events = Vec::new();
        let text = line.text.trim();
        if text.is_empty() {
            return (self, events);
        }
        if self.finished {
            events.push(LineEvent::Skipped);
            return (self, events);
        }

        let column = line.column;
        if self.position != Some((line.page_index, column)) {
            if self.position.is_some() {
                self.cards.enter(column);
            }
            self.position = Some((line.page_index, column));
        }

        let folded = FoldedText::new(text);

        // Printed totals count wherever they appear, even on heading lines.
        let markers = scan_markers(text, &folded, config);
        let mut summary: Option<(usize, String)> = None;
        for marker in &markers {
            if let Marker::Total { control, start } = marker {
                summary = Some((*start, control.card_last4.clone()));
                events.push(LineEvent::Control(control.clone()));
            }
        }

        if folded.contains_all(&["lancamentos", "compras", "saques"]) {
            self.transition(Section::Purchases, &mut events);
            events.push(LineEvent::Consumed);
            return (self, events);
        }
        if folded.contains_all(&["lancamentos", "produtos", "servicos"]) {
            self.cards.clear();
            self.transition(Section::ProductsAndServices, &mut events);
            events.push(LineEvent::Consumed);
            return (self, events);
        }

        // Merged columns can put a closing keyword and a transaction on one line.
        let has_transaction = transaction_re().is_match(text);
        let mut cut_at: Option<usize> = None;

        if folded.contains_all(&["compras", "parceladas", "proximas", "faturas"]) {
            if !has_transaction {
                self.cards.clear();
                self.transition(Section::Ignored, &mut events);
                events.push(LineEvent::Consumed);
                return (self, events);
            }
            if let Some(pos) = folded.find("compras").filter(|p| *p > 0) {
                cut_at = Some(folded.original_offset(pos));
            }
        }

        // "Encargos cobrados" is a sub-heading inside products and services.
        if folded.contains_all(&["encargos", "cobrados", "nesta", "fatura"])
            && !has_transaction
            && self.section != Section::ProductsAndServices
        {
            self.cards.clear();
            self.transition(Section::Ignored, &mut events);
            events.push(LineEvent::Consumed);
            return (self, events);
        }

        if folded.contains_all(&["limites", "credito"]) && !has_transaction {
            if self.cards.active(column).is_none() {
                self.transition(Section::Ignored, &mut events);
            }
            events.push(LineEvent::Consumed);
            return (self, events);
        }

        if END_OF_TRANSACTIONS.iter().any(|m| folded.starts_with(m)) {
            debug!(line = text, "end of transactions");
            self.cards.clear();
            self.finished = true;
            self.transition(Section::Ignored, &mut events);
            events.push(LineEvent::Consumed);
            return (self, events);
        }
        if COLUMN_HEADINGS.iter().any(|h| folded.starts_with(h)) {
            events.push(LineEvent::Consumed);
            return (self, events);
        }

        let mut header_span: Option<Range<usize>> = None;
        let mut line_card: Option<CardContext> = None;

        for marker in markers {
            if let Marker::Start { card, span } = marker {
                let previous = self.cards.active(column).cloned();
                if let Some(holder) = &card.holder {
                    self.holders.insert(card.last4.clone(), holder.clone());
                }
                self.summarized = None;
                if self.section == Section::Ignored {
                    self.transition(Section::Purchases, &mut events);
                }
                debug!(card = %card.label(), "card header");
                self.cards.set(column, card.clone());
                events.push(LineEvent::CardSwitched(card.clone()));

                // Trailing transaction text still belongs to the card
                // that was active before this header.
                line_card = match previous {
                    Some(prev) if prev != card => Some(prev),
                    _ => Some(card),
                };
                header_span = Some(span);
            }
        }

        if let (Some((_, last4)), None) = (&summary, &header_span) {
            self.cards.clear_card(last4);
            let holder = self.holders.get(last4).cloned();
            self.summarized = Some(CardContext::new(last4.clone(), holder));
        }
        let summary_start = summary.map(|(start, _)| start);

        if (header_span.is_some() || summary_start.is_some()) && !has_transaction {
            events.push(LineEvent::Consumed);
            return (self, events);
        }

        if !self.section.is_relevant() {
            events.push(LineEvent::Skipped);
            return (self, events);
        }

        let end = [Some(text.len()), summary_start, cut_at]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(text.len());

        let mut part = String::with_capacity(end);
        match &header_span {
            Some(span) => {
                part.push_str(&text[..span.start.min(end)]);
                if span.end < end {
                    part.push(' ');
                    part.push_str(&text[span.end..end]);
                }
            }
            None => part.push_str(&text[..end]),
        }
        let part = detached_sign_re().replace_all(part.trim(), "-$1").into_owned();

        let card = if self.section == Section::Purchases {
            line_card
                .or_else(|| self.summarized.clone())
                .or_else(|| self.cards.active(column).cloned())
        } else {
            None
        };

        events.push(LineEvent::Candidate(CandidateLine {
            text: part,
            section: self.section,
            card,
        }));
        (self, events)
    }

    fn transition(&mut self, to: Section, events: &mut Vec<LineEvent>) {
        self.sections_seen += 1;
        if self.section != to {
            debug!(from = ?self.section, to = ?to, "section change");
            self.section = to;
            events.push(LineEvent::SectionChanged(to));
        }
    }
}
