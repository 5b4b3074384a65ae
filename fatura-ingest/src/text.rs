//! Accent folding with a map back to the original text.
//!
//! Keywords are matched against a lowercase, diacritic-free copy of the line
//! ("LANÇAMENTOS" -> "lancamentos"). Spans found in the folded copy are mapped
//! back so that cuts are applied to the original text, keeping descriptions
//! exactly as printed.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

#[derive(Debug, Clone)]
pub struct FoldedText {
    text: String,
    /// Original byte offset for every folded byte, plus one past the end.
    origin: Vec<usize>,
}

impl FoldedText {
    pub fn new(original: &str) -> Self {
        let mut text = String::with_capacity(original.len());
        let mut origin = Vec::with_capacity(original.len() + 1);

        for (idx, ch) in original.char_indices() {
            for base in std::iter::once(ch).nfkd().filter(|c| !is_combining_mark(*c)) {
                for lower in base.to_lowercase() {
                    text.push(lower);
                    origin.extend(std::iter::repeat_n(idx, lower.len_utf8()));
                }
            }
        }
        origin.push(original.len());

        Self { text, origin }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Byte offset in the original text for a byte offset in the folded text.
    pub fn original_offset(&self, folded_pos: usize) -> usize {
        self.origin
            .get(folded_pos)
            .copied()
            .unwrap_or_else(|| self.origin.last().copied().unwrap_or(0))
    }

    pub fn contains_all(&self, keywords: &[&str]) -> bool {
        keywords.iter().all(|k| self.text.contains(k))
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.text.starts_with(prefix)
    }

    pub fn find(&self, needle: &str) -> Option<usize> {
        self.text.find(needle)
    }
}

/// Collapse every whitespace run to a single space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
