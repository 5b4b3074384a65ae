//! Statement parser: bytes in, transactions and reconciled stats out.

use fatura_core::{
    ControlTotal, LogicalLine, PageGeometry, ParseError, ParseStats, ParserConfig, ReconciliationMismatch, Section,
    Transaction,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::aggregate::{aggregate, deduplicate};
use crate::geometry::GeometryExtractor;
use crate::input::{StatementInput, ensure_pdf};
use crate::matcher::{TransactionMatcher, detect_invoice_year};
use crate::reconcile::{ControlTotals, reconcile};
use crate::reconstruct::reconstruct;
use crate::tracker::{LineEvent, TrackerState};
use crate::wire::StatementResponse;

/// Counters describing how the line stream was consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDiagnostics {
    pub total_lines: usize,
    /// Lines handed to the matcher.
    pub relevant_lines: usize,
    /// Relevant lines that produced no transaction.
    pub unrecognized_lines: usize,
    pub sections_seen: usize,
    pub pages: usize,
    pub split_pages: usize,
    /// Purchases matched before any card header.
    pub dropped_without_card: usize,
    pub duplicates_removed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStatement {
    pub transactions: Vec<Transaction>,
    pub stats: ParseStats,
    /// Printed totals, one per card.
    pub controls: Vec<ControlTotal>,
    pub invoice_year: i32,
    pub diagnostics: LineDiagnostics,
}

impl ParsedStatement {
    pub fn to_response(&self) -> StatementResponse {
        StatementResponse::new(&self.transactions, &self.stats)
    }

    pub fn mismatches(&self, config: &ParserConfig) -> Vec<ReconciliationMismatch> {
        self.stats.mismatches(config.reconcile_tolerance)
    }
}

/// Parses one bank's two-column credit-card statements.
///
/// Holds no per-document state; one parser can serve any number of
/// documents, from any number of threads when `E: Sync`.
#[derive(Debug, Clone)]
pub struct StatementParser<E> {
    extractor: E,
    config: ParserConfig,
}

impl<E: GeometryExtractor> StatementParser<E> {
    pub fn new(extractor: E) -> Self {
        Self::with_config(extractor, ParserConfig::default())
    }

    pub fn with_config(extractor: E, config: ParserConfig) -> Self {
        Self { extractor, config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    #[instrument(skip_all)]
    pub fn parse(&self, input: impl Into<StatementInput>) -> Result<ParsedStatement, ParseError> {
        let bytes = input
            .into()
            .into_bytes()
            .map_err(|e| ParseError::MalformedInput(format!("{e:#}")))?;
        ensure_pdf(&bytes)?;

        let pages = self
            .extractor
            .extract(&bytes)
            .map_err(|e| ParseError::MalformedInput(format!("{e:#}")))?;
        self.parse_pages(&pages)
    }

    /// Parse geometry that was already extracted.
    pub fn parse_pages(&self, pages: &[PageGeometry]) -> Result<ParsedStatement, ParseError> {
        let reconstruction = reconstruct(pages, &self.config);
        let mut parsed = parse_lines(&reconstruction.lines, &self.config);
        parsed.diagnostics.pages = reconstruction.pages.len();
        parsed.diagnostics.split_pages = reconstruction.split_pages();

        if parsed.diagnostics.sections_seen == 0 && !reconstruction.has_split() {
            return Err(ParseError::UnsupportedLayout {
                reason: "no column split and no statement sections".into(),
                pages: parsed.diagnostics.pages,
                lines: parsed.diagnostics.total_lines,
                sections_seen: 0,
            });
        }

        info!(
            items = parsed.stats.matched_count,
            cards = parsed.controls.len(),
            pages = parsed.diagnostics.pages,
            lines = parsed.diagnostics.total_lines,
            unrecognized = parsed.diagnostics.unrecognized_lines,
            duplicates = parsed.diagnostics.duplicates_removed,
            "parsed statement"
        );
        Ok(parsed)
    }
}

/// Run tracker, matcher, reconciler and aggregator over an ordered line stream.
pub fn parse_lines(lines: &[LogicalLine], config: &ParserConfig) -> ParsedStatement {
    let invoice_year = detect_invoice_year(lines, config);
    let matcher = TransactionMatcher::new(config, invoice_year);

    let mut diagnostics = LineDiagnostics {
        total_lines: lines.len(),
        ..LineDiagnostics::default()
    };
    let mut controls = ControlTotals::default();
    let mut matched = Vec::new();
    let mut state = TrackerState::default();

    for line in lines {
        let (next, events) = state.advance(line, config);
        state = next;

        for event in events {
            match event {
                LineEvent::Control(control) => controls.record(control),
                LineEvent::Candidate(candidate) => {
                    diagnostics.relevant_lines += 1;
                    let found = matcher.match_line(&candidate);
                    if found.is_empty() {
                        diagnostics.unrecognized_lines += 1;
                        debug!(line = %candidate.text, "unrecognized line");
                    }
                    for transaction in found {
                        if candidate.section == Section::Purchases && transaction.card.is_none() {
                            diagnostics.dropped_without_card += 1;
                            debug!(description = %transaction.description, "purchase before any card header");
                            continue;
                        }
                        matched.push(transaction);
                    }
                }
                LineEvent::Skipped => debug!(line = %line.text, "outside transaction sections"),
                LineEvent::SectionChanged(_) | LineEvent::CardSwitched(_) | LineEvent::Consumed => {}
            }
        }
    }
    diagnostics.sections_seen = state.sections_seen();

    let (transactions, removed) = deduplicate(matched);
    diagnostics.duplicates_removed = removed;

    let per_card = reconcile(&transactions, &controls, config.reconcile_tolerance);
    let stats = aggregate(&transactions, per_card);

    ParsedStatement {
        transactions,
        stats,
        controls: controls.to_vec(),
        invoice_year,
        diagnostics,
    }
}
