//! fatura-ingest: two-column credit-card statement parsing.
//!
//! ```text
//! PDF bytes -> GeometryExtractor -> reconstruct -> TrackerState -> TransactionMatcher
//!           -> deduplicate -> reconcile -> aggregate
//! ```

pub mod aggregate;
pub mod geometry;
pub mod input;
pub mod matcher;
pub mod parser;
pub mod patterns;
pub mod reconcile;
pub mod reconstruct;
pub mod text;
pub mod tracker;
pub mod wire;

#[cfg(feature = "pdfium")]
pub use geometry::PdfiumExtractor;
pub use geometry::{GeometryExtractor, PrecomputedGeometry};
pub use input::StatementInput;
pub use parser::{LineDiagnostics, ParsedStatement, StatementParser, parse_lines};
pub use reconstruct::{Reconstruction, reconstruct};
pub use tracker::{CandidateLine, LineEvent, Marker, TrackerState};
pub use wire::StatementResponse;
