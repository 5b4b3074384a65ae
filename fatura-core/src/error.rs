//! Error taxonomy for statement parsing.

use thiserror::Error;

/// Fatal failures: no ordered line stream could be established.
///
/// Everything downstream of the line stream degrades gracefully instead of
/// returning one of these.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The bytes are not a PDF, or the geometry collaborator could not open them.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The document does not look like the two-column card statement layout.
    #[error(
        "unsupported layout: {reason} (pages: {pages}, lines: {lines}, sections: {sections_seen})"
    )]
    UnsupportedLayout {
        reason: String,
        pages: usize,
        lines: usize,
        sections_seen: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("invalid pt-BR amount: {0:?}")]
    Invalid(String),
}
