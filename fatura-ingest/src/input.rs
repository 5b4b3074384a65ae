//! Statement input adapter.

use anyhow::{Context, Result};
use fatura_core::ParseError;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementInput {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl StatementInput {
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).context("Failed to read statement")?;
        Ok(Self::Bytes(bytes))
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::Path(path) => {
                std::fs::read(&path).with_context(|| format!("Failed to read statement {}", path.display()))
            }
        }
    }
}

impl From<Vec<u8>> for StatementInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for StatementInput {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<PathBuf> for StatementInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for StatementInput {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// The document must open with the `%PDF` magic.
pub fn is_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF")
}

pub fn ensure_pdf(bytes: &[u8]) -> Result<(), ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::MalformedInput("empty input".into()));
    }
    if !is_pdf(bytes) {
        return Err(ParseError::MalformedInput("missing %PDF magic".into()));
    }
    Ok(())
}
