use thiserror::Error;

/// Unified error type for cognitranslate-core
///
/// Every stage of the pipeline reports through this enum:
/// - PDF operations (opening, text extraction)
/// - Web extraction (URL validation, fetching)
/// - Translation (inference requests, responses, rate limiting)
/// - PDF export
/// - Cache and configuration
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// Failed to open or parse a PDF file
    #[error("failed to open PDF: {0}")]
    PdfOpen(String),

    /// Invalid page number requested
    #[error("invalid page number {page} (document has {total} pages)")]
    PdfInvalidPage { page: usize, total: usize },

    /// Failed to extract text from a PDF page
    #[error("failed to extract text from page {page}: {reason}")]
    PdfTextExtraction { page: usize, reason: String },

    // ==========================================================================
    // Web Errors
    // ==========================================================================
    /// URL could not be parsed or uses an unsupported scheme
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Fetching the web page failed at the transport level
    #[error("failed to fetch {url}: {reason}")]
    ScrapeRequest { url: String, reason: String },

    /// The web server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    ScrapeStatus { url: String, status: u16 },

    /// Extraction produced no usable text
    #[error("no text could be extracted from {0}")]
    NoTextExtracted(String),

    // ==========================================================================
    // Translation Errors
    // ==========================================================================
    /// Translation API request failed
    #[error("translation API request failed: {0}")]
    TranslationRequest(String),

    /// Invalid response from translation API
    #[error("invalid translation API response: {0}")]
    TranslationInvalidResponse(String),

    /// Rate limited by translation API
    #[error("translation rate limited{}", retry_after.map(|s| format!(", retry after {s} seconds")).unwrap_or_default())]
    TranslationRateLimited { retry_after: Option<u64> },

    /// Unsupported language for translation
    #[error("unsupported language for translation: {0}")]
    TranslationUnsupportedLanguage(String),

    /// Translation request timed out
    #[error("translation request timed out")]
    TranslationTimeout,

    /// Maximum retry attempts exceeded for translation
    #[error("translation failed after maximum retries")]
    TranslationMaxRetriesExceeded,

    // ==========================================================================
    // Export Errors
    // ==========================================================================
    /// Failed to build or serialize the output PDF
    #[error("failed to export PDF: {0}")]
    PdfExport(String),

    // ==========================================================================
    // Cache Errors
    // ==========================================================================
    /// Failed to initialize the cache
    #[error("failed to initialize cache: {0}")]
    CacheInit(String),

    /// Failed to write to cache
    #[error("failed to write to cache: {0}")]
    CacheWrite(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Pipeline stage the error belongs to, used as a prefix when shown to users.
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::PdfOpen(_) | Self::PdfInvalidPage { .. } | Self::PdfTextExtraction { .. } => {
                "Error extracting PDF"
            }
            Self::InvalidUrl { .. } | Self::ScrapeRequest { .. } | Self::ScrapeStatus { .. } => {
                "Error scraping website"
            }
            Self::NoTextExtracted(_) => "Error extracting text",
            Self::TranslationRequest(_)
            | Self::TranslationInvalidResponse(_)
            | Self::TranslationRateLimited { .. }
            | Self::TranslationUnsupportedLanguage(_)
            | Self::TranslationTimeout
            | Self::TranslationMaxRetriesExceeded => "Error translating text",
            Self::PdfExport(_) => "Error exporting PDF",
            Self::CacheInit(_) | Self::CacheWrite(_) => "Cache error",
            Self::ConfigLoad(_) | Self::ConfigInvalid { .. } => "Configuration error",
            Self::Io(_) => "I/O error",
        }
    }

    /// Message shown in the UI: stage prefix followed by the error itself.
    pub fn user_message(&self) -> String {
        format!("{}: {self}", self.stage())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
