//! Heuristic thresholds used by the reconstructor, tracker and matcher.
//!
//! Every value here was tuned against a small set of reference statements.
//! They are knobs, not guarantees for every statement variant.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Words whose `y_top` differ by at most this much share a row (points).
    pub row_y_tolerance: f32,
    /// Smallest gap between date-token x positions that counts as a column split.
    pub column_gap_min: f32,
    /// Horizontal gap that starts a new segment inside a row.
    pub segment_gap: f32,
    /// Segments starting before `split + column_margin` stay in the left column.
    pub column_margin: f32,
    /// Horizontal gap between glyphs that separates words in the char fallback.
    pub char_word_gap: f32,
    /// Installment markers starting before this char offset are read as dates.
    pub installment_min_offset: usize,
    /// Shortest accepted card holder name (chars, trimmed).
    pub min_holder_len: usize,
    /// Allowed |printed - computed| per card.
    pub reconcile_tolerance: Decimal,
    /// How many leading lines are scanned for the invoice year.
    pub year_scan_lines: usize,
    /// Year used when none is printed; `None` means the current year.
    pub fallback_year: Option<i32>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            row_y_tolerance: 2.5,
            column_gap_min: 60.0,
            segment_gap: 40.0,
            column_margin: 90.0,
            char_word_gap: 1.5,
            installment_min_offset: 15,
            min_holder_len: 8,
            reconcile_tolerance: Decimal::new(1, 2),
            year_scan_lines: 100,
            fallback_year: None,
        }
    }
}

impl ParserConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parse parser config")
    }

    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let p = path.as_ref();
        if !p.exists() {
            return Ok(Self::default());
        }
        let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
        Self::from_toml_str(&s).with_context(|| format!("parse {}", p.display()))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serialize parser config")
    }
}
