use std::path::Path;

use bytes::Bytes;
use mupdf::{Document as MuDocument, MetadataName};

use crate::error::{Error, Result};

/// A PDF that mupdf has parsed at least once.
///
/// Only the bytes are kept: mupdf handles are not `Send`, so extraction
/// reopens them on whichever blocking thread does the work.
#[derive(Clone)]
pub struct PdfDocument {
    bytes: Bytes,
    metadata: DocumentMetadata,
    page_count: usize,
    /// MD5 hex of the bytes
    content_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentMetadata {
    /// Used to title the translated PDF
    pub title: Option<String>,
}

impl PdfDocument {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(Error::PdfOpen("empty file".to_string()));
        }

        let doc = parse(&bytes)?;
        let page_count = doc
            .page_count()
            .map_err(|e| Error::PdfOpen(format!("Failed to get page count: {e}")))?;

        // Absent keys come back as empty strings
        let title = doc
            .metadata(MetadataName::Title)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(Self {
            content_id: format!("{:x}", md5::compute(&bytes)),
            bytes,
            metadata: DocumentMetadata { title },
            page_count: usize::try_from(page_count).unwrap_or(0),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| Error::PdfOpen(format!("Failed to read file {}: {e}", path.display())))?;
        Self::from_bytes(bytes)
    }

    pub const fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub const fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    pub(crate) fn open_document(&self) -> Result<MuDocument> {
        parse(&self.bytes)
    }
}

fn parse(bytes: &[u8]) -> Result<MuDocument> {
    MuDocument::from_bytes(bytes, "").map_err(|e| Error::PdfOpen(format!("Failed to parse PDF: {e}")))
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("content_id", &self.content_id)
            .field("page_count", &self.page_count)
            .field("title", &self.metadata.title)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pdf::export_text_pdf;

    #[test]
    fn test_open_exported_document() {
        let bytes = export_text_pdf("Perception\nAction").unwrap();
        let doc = PdfDocument::from_bytes(bytes.clone()).unwrap();

        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.content_id(), format!("{:x}", md5::compute(&bytes)));
        assert_eq!(doc.bytes().len(), bytes.len());
        assert_eq!(doc.metadata().title.as_deref(), Some("Translated document"));
    }

    #[test]
    fn test_empty_bytes_rejected() {
        assert!(matches!(PdfDocument::from_bytes(Vec::<u8>::new()), Err(Error::PdfOpen(_))));
    }
}
