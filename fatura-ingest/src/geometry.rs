//! Geometry collaborators: where positioned text comes from.

use anyhow::Result;
use fatura_core::PageGeometry;

/// Supplies positioned words or glyphs for every page of a PDF.
pub trait GeometryExtractor {
    fn extract(&self, pdf: &[u8]) -> Result<Vec<PageGeometry>>;
}

/// Geometry that was already extracted elsewhere; ignores the bytes.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedGeometry {
    pages: Vec<PageGeometry>,
}

impl PrecomputedGeometry {
    pub fn new(pages: Vec<PageGeometry>) -> Self {
        Self { pages }
    }
}

impl GeometryExtractor for PrecomputedGeometry {
    fn extract(&self, _pdf: &[u8]) -> Result<Vec<PageGeometry>> {
        Ok(self.pages.clone())
    }
}

impl<E: GeometryExtractor + ?Sized> GeometryExtractor for &E {
    fn extract(&self, pdf: &[u8]) -> Result<Vec<PageGeometry>> {
        (**self).extract(pdf)
    }
}

#[cfg(feature = "pdfium")]
pub use self::pdfium::PdfiumExtractor;

#[cfg(feature = "pdfium")]
mod pdfium {
    use super::GeometryExtractor;
    use anyhow::{Context, Result};
    use fatura_core::{PageGeometry, PositionedChar};
    use pdfium_render::prelude::*;

    /// Glyph boxes from pdfium, converted to a top-down y axis.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PdfiumExtractor;

    impl GeometryExtractor for PdfiumExtractor {
        #[allow(deprecated)] // PdfRect field access deprecated in 0.8.28
        fn extract(&self, pdf: &[u8]) -> Result<Vec<PageGeometry>> {
            let pdfium = Pdfium::default();
            let doc = pdfium
                .load_pdf_from_byte_slice(pdf, None)
                .context("Failed to parse PDF")?;

            let mut pages = Vec::new();
            for (page_index, page) in doc.pages().iter().enumerate() {
                let height = page.height().value;
                let text = page.text().context("Failed to extract text from page")?;

                let chars = text
                    .chars()
                    .iter()
                    .filter_map(|ch| {
                        let (unicode_ch, rect) = (ch.unicode_char()?, ch.tight_bounds().ok()?);
                        Some(PositionedChar {
                            ch: unicode_ch,
                            x_left: rect.left.value,
                            x_right: rect.right.value,
                            y_top: height - rect.top.value,
                            page_index,
                        })
                    })
                    .collect();

                pages.push(PageGeometry::from_chars(page_index, chars));
            }
            Ok(pages)
        }
    }
}
