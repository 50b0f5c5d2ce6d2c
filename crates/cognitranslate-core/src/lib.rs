//! CogniTranslate Core Library
//!
//! Translates cognitive science papers and articles:
//! - Text extraction from PDFs (mupdf) and web pages (paragraph scraping)
//! - Fixed-size chunking and translation with pretrained MarianMT models
//!   or an OpenAI-compatible endpoint
//! - Per-chunk caching (memory and disk)
//! - Export of the translated text as a PDF

pub mod cache;
pub mod config;
pub mod error;
pub mod pdf;
pub mod scrape;
pub mod translator;
pub mod util;

pub use cache::{CacheKey, TranslationCache};
pub use config::{
    AppConfig, DEFAULT_CHUNK_SIZE, DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG, Lang, LanguageOption,
    TranslatorBackend, TranslatorConfig, is_supported_target, language_name, target_languages,
};
pub use error::{Error, Result};
pub use pdf::{PdfDocument, PdfExporter, TextExtractor, export_text_pdf, extract_pdf_text};
pub use scrape::{ScrapedPage, WebScraper, extract_paragraphs};
pub use translator::{Translator, TranslatorInfo, chunk_text, create_translator};
pub use util::{clear_translation_cache, download_stem};

use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info};

/// Called with `(chunks_done, chunks_total)` after every chunk.
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Status line for a job that has finished `done` of `total` chunks.
///
/// `stage` is shown until the chunk count is known.
pub fn progress_message(stage: &str, done: usize, total: usize) -> String {
    match (done, total) {
        (_, 0) => stage.to_string(),
        (_, 1) if done >= 1 => "Translated 1 chunk".to_string(),
        (done, total) if done >= total => format!("Translated {total} chunks"),
        (done, total) => format!("Translating chunk {} of {total}", done + 1),
    }
}

/// Where the text to translate comes from
#[derive(Debug, Clone)]
pub enum Source {
    /// An uploaded or local PDF
    Pdf { filename: String, bytes: Bytes },
    /// A web page whose paragraphs are scraped
    Web { url: String },
}

impl Source {
    /// Short name used in logs, the UI and download file names.
    pub fn label(&self) -> &str {
        match self {
            Self::Pdf { filename, .. } => filename,
            Self::Web { url } => url,
        }
    }

    /// Stage description shown while extracting.
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Pdf { .. } => "Processing PDF...",
            Self::Web { .. } => "Processing Website...",
        }
    }
}

/// Text pulled out of a [`Source`]
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    /// PDF title metadata or HTML `<title>`
    pub title: Option<String>,
}

/// Output of [`CogniTranslator::translate_text`]
#[derive(Debug, Clone)]
pub struct TranslatedText {
    pub text: String,
    pub model: String,
    /// Non-blank chunks in the input
    pub chunk_count: usize,
    /// How many of those came from the cache
    pub cached_chunks: usize,
}

/// Everything produced by one [`CogniTranslator::run`]
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    pub source_label: String,
    pub title: Option<String>,
    pub target: Lang,
    pub model: String,
    pub source_text: String,
    pub translated_text: String,
    pub chunk_count: usize,
    pub cached_chunks: usize,
}

/// High-level translator that combines extraction, translation, caching and export
pub struct CogniTranslator {
    translator: Arc<dyn Translator>,
    cache: TranslationCache,
    scraper: WebScraper,
    config: AppConfig,
}

impl CogniTranslator {
    /// Create a new translator with the given configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        let translator = create_translator(&config.translator)?;
        let cache = TranslationCache::new(&config.cache)?;
        Ok(Self::from_parts(translator, cache, config))
    }

    /// Create with a shared cache (for cache sharing across instances)
    pub fn with_cache(config: AppConfig, cache: TranslationCache) -> Result<Self> {
        let translator = create_translator(&config.translator)?;
        Ok(Self::from_parts(translator, cache, config))
    }

    /// Create with a custom translator
    pub fn with_translator(translator: Arc<dyn Translator>, config: AppConfig) -> Result<Self> {
        let cache = TranslationCache::new(&config.cache)?;
        Ok(Self::from_parts(translator, cache, config))
    }

    fn from_parts(translator: Arc<dyn Translator>, cache: TranslationCache, config: AppConfig) -> Self {
        let scraper = WebScraper::new(&config.scraper);
        Self {
            translator,
            cache,
            scraper,
            config,
        }
    }

    /// Pull the raw text out of a source.
    ///
    /// PDF parsing runs on the blocking pool. Whitespace-only results are
    /// reported as [`Error::NoTextExtracted`].
    pub async fn extract(&self, source: &Source) -> Result<ExtractedText> {
        info!("Extracting text from {}", source.label());

        let extracted = match source {
            Source::Pdf { bytes, .. } => {
                let bytes = bytes.clone();
                tokio::task::spawn_blocking(move || -> Result<ExtractedText> {
                    let doc = PdfDocument::from_bytes(bytes)?;
                    debug!("PDF {} has {} pages", doc.content_id(), doc.page_count());
                    let text = TextExtractor::new(&doc).extract_text()?;
                    Ok(ExtractedText {
                        text,
                        title: doc.metadata().title.clone(),
                    })
                })
                .await
                .map_err(|e| Error::PdfOpen(format!("extraction task failed: {e}")))??
            }
            Source::Web { url } => {
                let page = self.scraper.scrape(url).await?;
                ExtractedText {
                    text: page.text,
                    title: page.title,
                }
            }
        };

        if extracted.text.trim().is_empty() {
            return Err(Error::NoTextExtracted(source.label().to_string()));
        }

        debug!(
            "Extracted {} characters from {}",
            extracted.text.chars().count(),
            source.label()
        );
        Ok(extracted)
    }

    /// Translate `text` from the configured source language into `target`.
    ///
    /// The text is cut into fixed windows of `translator.chunk_size`
    /// characters; blank windows are dropped and the translated windows are
    /// joined with a single space. The first failing chunk aborts the call.
    pub async fn translate_text(
        &self,
        text: &str,
        target: &Lang,
        progress: Option<ProgressCallback>,
    ) -> Result<TranslatedText> {
        if !is_supported_target(target.as_str()) {
            return Err(Error::TranslationUnsupportedLanguage(target.to_string()));
        }

        let source = &self.config.source_lang;
        let model = self.config.translator.model_for(source, target);
        let chunks: Vec<&str> = chunk_text(text, self.config.translator.chunk_size)
            .into_iter()
            .filter(|chunk| !translator::is_blank(chunk))
            .collect();
        let total = chunks.len();

        info!(
            "Translating {} chunks into {} with {} ({})",
            total,
            target,
            self.translator.name(),
            model
        );

        let mut outputs = Vec::with_capacity(total);
        let mut cached_chunks = 0;

        if let Some(ref callback) = progress {
            callback(0, total);
        }

        for (index, chunk) in chunks.into_iter().enumerate() {
            let key = CacheKey::new(chunk, self.translator.name(), &model, source, target);

            let translated = if let Some(hit) = self.cache.get(&key).await {
                debug!("Cache hit for chunk {}", index + 1);
                cached_chunks += 1;
                hit
            } else {
                let translated = self.translator.translate(chunk, source, target).await?;
                self.cache.insert(&key, &translated).await;
                translated
            };
            outputs.push(translated);

            if let Some(ref callback) = progress {
                callback(index + 1, total);
            }
        }

        Ok(TranslatedText {
            text: outputs.join(" "),
            model,
            chunk_count: total,
            cached_chunks,
        })
    }

    /// Extract and translate a source in one go.
    pub async fn run(
        &self,
        source: &Source,
        target: &Lang,
        progress: Option<ProgressCallback>,
    ) -> Result<TranslationOutcome> {
        let extracted = self.extract(source).await?;
        let translated = self.translate_text(&extracted.text, target, progress).await?;

        info!(
            "Translated {} ({} chunks, {} cached)",
            source.label(),
            translated.chunk_count,
            translated.cached_chunks
        );

        Ok(TranslationOutcome {
            source_label: source.label().to_string(),
            title: extracted.title,
            target: target.clone(),
            model: translated.model,
            source_text: extracted.text,
            translated_text: translated.text,
            chunk_count: translated.chunk_count,
            cached_chunks: translated.cached_chunks,
        })
    }

    /// Render translated text as a PDF using the configured layout.
    ///
    /// `title` replaces the configured document title when given.
    pub fn export_pdf(&self, text: &str, title: Option<&str>) -> Result<Vec<u8>> {
        let exporter = PdfExporter::new(&self.config.export);
        match title {
            Some(title) => exporter.with_title(title).export(text),
            None => exporter.export(text),
        }
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn translator_info(&self) -> TranslatorInfo {
        self.translator.info()
    }

    pub fn is_available(&self) -> bool {
        self.translator.is_available()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
