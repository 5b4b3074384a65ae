//! fatura-core: shared types for credit-card statement extraction

pub mod config;
pub mod error;
pub mod geometry;
pub mod money;
pub mod statement;
pub mod stats;

pub use config::ParserConfig;
pub use error::{MoneyError, ParseError};
pub use geometry::{Column, LogicalLine, PageGeometry, PositionedChar, PositionedWord};
pub use money::{format_brl, format_plain, parse_brl};
pub use statement::{CardContext, ControlTotal, Flux, Section, Transaction};
pub use stats::{CardStats, ParseStats, ReconciliationMismatch, UNKNOWN_CARD};
