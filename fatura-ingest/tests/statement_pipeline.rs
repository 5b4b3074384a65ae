use anyhow::{Result, bail};
use fatura_core::{Column, Flux, LogicalLine, PageGeometry, ParseError, ParserConfig, PositionedWord, UNKNOWN_CARD};
use fatura_ingest::{GeometryExtractor, PrecomputedGeometry, StatementParser, parse_lines};
use rust_decimal::Decimal;

const PDF: &[u8] = b"%PDF-1.7\n%fixture";

/// Lay `text` out as 5-unit-per-char words starting at `x`.
fn words(page: usize, y: f32, x: f32, text: &str) -> Vec<PositionedWord> {
    let mut cursor = x;
    text.split_whitespace()
        .map(|w| {
            let width = w.chars().count() as f32 * 5.0;
            let word = PositionedWord::new(w, cursor, cursor + width, y, page);
            cursor += width + 5.0;
            word
        })
        .collect()
}

fn page(index: usize, rows: &[(f32, f32, &str)]) -> PageGeometry {
    PageGeometry::from_words(index, rows.iter().flat_map(|(y, x, text)| words(index, *y, *x, text)).collect())
}

/// Two pages: card 1234 with three purchases across both columns of page 0,
/// and its printed total on page 1.
fn statement_pages() -> Vec<PageGeometry> {
    vec![
        page(
            0,
            &[
                (50.0, 40.0, "Vencimento 10/04/2025"),
                (80.0, 40.0, "Lançamentos: compras e saques"),
                (100.0, 40.0, "JOHN DOE (final 1234)"),
                (120.0, 40.0, "10/03 PADARIA"),
                (120.0, 220.0, "1.000,00"),
                (140.0, 40.0, "12/03 MERCADO"),
                (140.0, 220.0, "200,00"),
                (160.0, 330.0, "15/03 FARMACIA"),
                (160.0, 510.0, "34,56"),
            ],
        ),
        page(1, &[(60.0, 40.0, "Lançamentos no cartão (final 1234) 1.234,56")]),
    ]
}

fn parser(pages: Vec<PageGeometry>) -> StatementParser<PrecomputedGeometry> {
    StatementParser::new(PrecomputedGeometry::new(pages))
}

#[test]
fn test_two_page_statement_reconciles() {
    let parsed = parser(statement_pages()).parse(PDF.to_vec()).unwrap();

    assert_eq!(parsed.transactions.len(), 3);
    for t in &parsed.transactions {
        assert_eq!(t.card.as_ref().unwrap().label(), "Final 1234 - JOHN DOE");
        assert_eq!(t.flux, Flux::Debit);
    }
    let descriptions: Vec<_> = parsed.transactions.iter().map(|t| t.description.as_str()).collect();
    assert_eq!(descriptions, vec!["PADARIA", "MERCADO", "FARMACIA"]);

    let card = &parsed.stats.per_card["1234"];
    assert_eq!(card.printed_total, Decimal::new(123456, 2));
    assert_eq!(card.computed_total, Decimal::new(123456, 2));
    assert_eq!(card.delta, Decimal::ZERO);
    assert!(parsed.mismatches(&ParserConfig::default()).is_empty());

    assert_eq!(parsed.diagnostics.pages, 2);
    assert_eq!(parsed.diagnostics.split_pages, 1);
    assert_eq!(parsed.invoice_year, 2025);
}

#[test]
fn test_wire_response_shape() {
    let parsed = parser(statement_pages()).parse(PDF.to_vec()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&parsed.to_response().to_json().unwrap()).unwrap();

    assert_eq!(json["items"].as_array().unwrap().len(), 3);
    assert_eq!(json["items"][0]["date"], "2025-03-10");
    assert_eq!(json["items"][0]["amount"], "1000.00");
    assert_eq!(json["items"][0]["card"], "Final 1234 - JOHN DOE");
    assert_eq!(json["stats"]["sum_debit"], "1.234,56");
    assert_eq!(json["stats"]["by_card"]["1234"]["printed_total"], "1.234,56");
    assert_eq!(json["stats"]["by_card"]["1234"]["delta"], "0,00");
}

#[test]
fn test_parsing_is_deterministic() {
    let p = parser(statement_pages());
    let first = p.parse(PDF.to_vec()).unwrap();
    let second = p.parse(PDF.to_vec()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_parses_share_nothing() {
    let p = parser(statement_pages());
    let expected = p.parse(PDF.to_vec()).unwrap();

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| p.parse(PDF.to_vec()).unwrap())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(results.iter().all(|r| *r == expected));
}

#[test]
fn test_merged_column_duplicate_is_collapsed() {
    let lines = vec![
        LogicalLine::plain("2025"),
        LogicalLine::plain("Lançamentos: compras e saques"),
        LogicalLine::plain("JOHN DOE (final 1234)"),
        LogicalLine::new("10/03 PADARIA 12,00", Column::Left, 0, 120.0),
        LogicalLine::new("10/03 PADARIA 12,00", Column::Right, 0, 120.0),
    ];
    let parsed = parse_lines(&lines, &ParserConfig::default());
    assert_eq!(parsed.transactions.len(), 1);
    assert_eq!(parsed.diagnostics.duplicates_removed, 1);
}

#[test]
fn test_single_merged_line_duplicate_is_collapsed() {
    let lines = vec![
        LogicalLine::plain("2025"),
        LogicalLine::plain("Lançamentos: compras e saques"),
        LogicalLine::plain("JOHN DOE (final 1234)"),
        LogicalLine::plain("10/03 PADARIA 12,00 10/03 PADARIA 12,00"),
    ];
    let parsed = parse_lines(&lines, &ParserConfig::default());
    assert_eq!(parsed.transactions.len(), 1);
    assert_eq!(parsed.transactions[0].description, "PADARIA");
    assert_eq!(parsed.diagnostics.duplicates_removed, 1);
}

#[test]
fn test_nothing_is_read_after_end_of_transactions() {
    let lines = vec![
        LogicalLine::plain("2025"),
        LogicalLine::plain("Lançamentos: compras e saques"),
        LogicalLine::plain("JOHN DOE (final 1234)"),
        LogicalLine::plain("10/03 PADARIA 12,00"),
        LogicalLine::plain("Lançamentos no cartão (final 1234) 12,00"),
        LogicalLine::plain("Total dos lançamentos atuais 12,00"),
        LogicalLine::plain("JOHN DOE (final 1234)"),
        LogicalLine::plain("10/04 LOJA FUTURA 02/06 100,00"),
    ];
    let parsed = parse_lines(&lines, &ParserConfig::default());

    assert_eq!(parsed.transactions.len(), 1);
    assert_eq!(parsed.transactions[0].description, "PADARIA");
    let card = &parsed.stats.per_card["1234"];
    assert_eq!(card.computed_total, Decimal::new(1200, 2));
    assert_eq!(card.delta, Decimal::ZERO);
}

#[test]
fn test_installment_disambiguation() {
    let lines = vec![
        LogicalLine::plain("2025"),
        LogicalLine::plain("Lançamentos: compras e saques"),
        LogicalLine::plain("JOHN DOE (final 1234)"),
        LogicalLine::plain("31/03 SOME STORE 02/06 1.234,56"),
        LogicalLine::plain("02/06 ANOTHER STORE 50,00"),
    ];
    let parsed = parse_lines(&lines, &ParserConfig::default());
    let [installment, plain] = parsed.transactions.as_slice() else {
        panic!("expected two transactions, got {:?}", parsed.transactions);
    };

    assert_eq!(installment.description, "SOME STORE");
    assert_eq!(installment.installment_number, Some(2));
    assert_eq!(installment.installment_total, Some(6));
    assert_eq!(plain.description, "ANOTHER STORE");
    assert_eq!(plain.installment_number, None);
}

#[test]
fn test_products_and_services_fall_in_unknown_bucket() {
    let mut pages = statement_pages();
    pages.push(page(
        2,
        &[
            (40.0, 40.0, "Lançamentos: produtos e serviços"),
            (60.0, 40.0, "18/03 SEG CARTAO PROTEGIDO 10,19"),
        ],
    ));
    let parsed = parser(pages).parse(PDF.to_vec()).unwrap();

    assert_eq!(parsed.transactions.len(), 4);
    assert!(parsed.transactions[3].card.is_none());
    assert_eq!(parsed.stats.per_card[UNKNOWN_CARD].computed_total, Decimal::new(1019, 2));
    assert_eq!(parsed.stats.per_card[UNKNOWN_CARD].printed_total, Decimal::ZERO);
    assert!(parsed.mismatches(&ParserConfig::default()).is_empty());
}

#[test]
fn test_empty_statement_is_not_an_error() {
    let pages = vec![page(
        0,
        &[
            (100.0, 40.0, "01/04 SALDO ANTERIOR 0,00"),
            (120.0, 330.0, "02/04 PAGAMENTO EFETUADO 0,00"),
        ],
    )];
    let parsed = parser(pages).parse(PDF.to_vec()).unwrap();

    assert!(parsed.transactions.is_empty());
    assert_eq!(parsed.stats.matched_count, 0);
    assert_eq!(parsed.stats.net_sum, Decimal::ZERO);
    assert_eq!(parsed.diagnostics.sections_seen, 0);
    assert_eq!(parsed.diagnostics.split_pages, 1);
}

#[test]
fn test_no_sections_and_no_split_is_unsupported() {
    let pages = vec![page(
        0,
        &[(100.0, 40.0, "Dear customer,"), (120.0, 40.0, "thank you for your business.")],
    )];
    let err = parser(pages).parse(PDF.to_vec()).unwrap_err();
    assert!(matches!(
        err,
        ParseError::UnsupportedLayout { pages: 1, lines: 2, sections_seen: 0, .. }
    ));
}

#[test]
fn test_non_pdf_bytes_are_malformed() {
    let err = parser(statement_pages()).parse(b"PK\x03\x04".to_vec()).unwrap_err();
    assert!(matches!(err, ParseError::MalformedInput(_)));
}

struct BrokenExtractor;

impl GeometryExtractor for BrokenExtractor {
    fn extract(&self, _pdf: &[u8]) -> Result<Vec<PageGeometry>> {
        bail!("document is encrypted")
    }
}

#[test]
fn test_extractor_failure_is_malformed() {
    let err = StatementParser::new(BrokenExtractor).parse(PDF.to_vec()).unwrap_err();
    match err {
        ParseError::MalformedInput(msg) => assert!(msg.contains("encrypted")),
        other => panic!("unexpected error: {other:?}"),
    }
}
