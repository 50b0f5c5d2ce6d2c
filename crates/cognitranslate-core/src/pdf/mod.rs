mod document;
mod export;
mod text;

pub use document::{DocumentMetadata, PdfDocument};
pub use export::{PdfExporter, export_text_pdf};
pub use text::{TextExtractor, extract_pdf_text};
