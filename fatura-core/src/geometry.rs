//! Positioned text as supplied by a PDF geometry extractor, and the logical
//! lines rebuilt from it.
//!
//! Coordinates are PDF points with `y` growing downwards from the top of the
//! page (the convention of text-geometry tools, not of raw PDF user space).

use serde::{Deserialize, Serialize};

/// A run of text with its horizontal extent and top edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedWord {
    pub text: String,
    pub x_left: f32,
    pub x_right: f32,
    pub y_top: f32,
    pub page_index: usize,
}

impl PositionedWord {
    pub fn new(text: impl Into<String>, x_left: f32, x_right: f32, y_top: f32, page_index: usize) -> Self {
        Self {
            text: text.into(),
            x_left,
            x_right,
            y_top,
            page_index,
        }
    }
}

/// A single glyph box, used when an extractor yields no word tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedChar {
    pub ch: char,
    pub x_left: f32,
    pub x_right: f32,
    pub y_top: f32,
    pub page_index: usize,
}

/// Everything the extractor produced for one page. Either list may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page_index: usize,
    pub words: Vec<PositionedWord>,
    pub chars: Vec<PositionedChar>,
}

impl PageGeometry {
    pub fn from_words(page_index: usize, words: Vec<PositionedWord>) -> Self {
        Self {
            page_index,
            words,
            chars: Vec::new(),
        }
    }

    pub fn from_chars(page_index: usize, chars: Vec<PositionedChar>) -> Self {
        Self {
            page_index,
            words: Vec::new(),
            chars,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.chars.is_empty()
    }
}

/// Which half of a two-column page a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Left,
    Right,
    /// Page without a detected split.
    Unknown,
}

/// One line of plain text in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogicalLine {
    pub text: String,
    pub column: Column,
    pub page_index: usize,
    pub y_top: f32,
}

impl LogicalLine {
    pub fn new(text: impl Into<String>, column: Column, page_index: usize, y_top: f32) -> Self {
        Self {
            text: text.into(),
            column,
            page_index,
            y_top,
        }
    }

    /// A free-standing line with no geometry, handy for text-only callers.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Column::Unknown, 0, 0.0)
    }
}
