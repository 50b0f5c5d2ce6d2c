use mupdf::TextPageOptions;
use tracing::debug;

use super::document::PdfDocument;
use crate::error::{Error, Result};

/// Plain-text extraction from PDF pages.
pub struct TextExtractor<'a> {
    doc: &'a PdfDocument,
}

impl<'a> TextExtractor<'a> {
    pub const fn new(doc: &'a PdfDocument) -> Self {
        Self { doc }
    }

    /// Text of a single page (0-indexed), one `\n` after every text line.
    pub fn get_page_text(&self, page_num: usize) -> Result<String> {
        let doc = self.doc.open_document()?;
        Self::page_text(&doc, page_num, self.doc.page_count())
    }

    /// Text of every page in order. Pages are concatenated as-is; each line
    /// already ends with a newline, so words never merge across pages.
    pub fn extract_text(&self) -> Result<String> {
        let doc = self.doc.open_document()?;
        let total = self.doc.page_count();

        let mut text = String::new();
        for page_num in 0..total {
            let page_text = Self::page_text(&doc, page_num, total)?;
            debug!("Page {} yielded {} characters", page_num + 1, page_text.chars().count());
            text.push_str(&page_text);
        }

        Ok(text)
    }

    fn page_text(doc: &mupdf::Document, page_num: usize, total: usize) -> Result<String> {
        let index = mupdf_page_index(page_num, total)?;

        let page = doc.load_page(index).map_err(|e| Error::PdfTextExtraction {
            page: page_num,
            reason: format!("Failed to load page: {e}"),
        })?;

        let text_page = page
            .to_text_page(TextPageOptions::empty())
            .map_err(|e| Error::PdfTextExtraction {
                page: page_num,
                reason: format!("Failed to get text page: {e}"),
            })?;

        let mut text = String::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                for text_char in line.chars() {
                    if let Some(c) = text_char.char() {
                        text.push(c);
                    }
                }
                text.push('\n');
            }
        }

        Ok(text)
    }
}

/// Validate a 0-indexed page number and convert it to mupdf's `i32`.
fn mupdf_page_index(page_num: usize, total: usize) -> Result<i32> {
    let invalid = || Error::PdfInvalidPage {
        page: page_num,
        total,
    };

    if page_num >= total {
        return Err(invalid());
    }
    i32::try_from(page_num).map_err(|_| invalid())
}

/// Open `bytes` as a PDF and return the text of all pages.
pub fn extract_pdf_text(bytes: impl Into<bytes::Bytes>) -> Result<String> {
    let doc = PdfDocument::from_bytes(bytes)?;
    TextExtractor::new(&doc).extract_text()
}
