//! Askama templates for HTMX responses.
//!
//! - `base.html` - Common layout with CSS/JS
//! - `index.html` - The single page: source picker, language picker, results area
//! - `partials/progress.html` - Progress bar, connects to the job's SSE stream
//! - `partials/result.html` - Preview with copy and download actions
//! - `partials/error.html` - Error message for a failed job

use askama::Template;
use askama_web::WebTemplate;
use cognitranslate_core::{
    DEFAULT_TARGET_LANG, LanguageOption, TranslationOutcome, download_stem, language_name,
    target_languages,
};
use uuid::Uuid;

/// Characters of translated text shown before the preview is cut.
const PREVIEW_CHARS: usize = 5000;

// =============================================================================
// Full Page Templates
// =============================================================================

/// The application page.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub target_languages: Vec<LanguageOption>,
    pub default_target: &'static str,
}

impl Default for IndexTemplate {
    fn default() -> Self {
        Self {
            target_languages: target_languages(),
            default_target: DEFAULT_TARGET_LANG,
        }
    }
}

// =============================================================================
// Fragment Templates (HTMX partial responses)
// =============================================================================

/// Progress bar for a running job.
///
/// The first render (`connect = true`) opens the SSE connection; stream
/// updates re-render only the bar.
#[derive(Template, WebTemplate)]
#[template(path = "partials/progress.html")]
pub struct ProgressTemplate {
    pub job_id: Uuid,
    pub current: usize,
    pub total: usize,
    pub message: String,
    pub connect: bool,
}

impl ProgressTemplate {
    #[allow(clippy::missing_const_for_fn)] // String fields prevent const
    pub fn new(job_id: Uuid, current: usize, total: usize, message: String, connect: bool) -> Self {
        Self {
            job_id,
            current,
            total,
            message,
            connect,
        }
    }

    /// Percentage complete (0-100).
    pub const fn percent(&self) -> usize {
        if self.total > 0 {
            (self.current * 100) / self.total
        } else {
            0
        }
    }
}

/// Finished translation: preview, copy button and download link.
#[derive(Template, WebTemplate)]
#[template(path = "partials/result.html")]
pub struct ResultTemplate {
    pub job_id: Uuid,
    pub source_label: String,
    pub target_name: &'static str,
    pub model: String,
    pub preview: String,
    pub truncated: bool,
    pub chunk_count: usize,
    pub cached_chunks: usize,
    pub download_name: String,
}

impl ResultTemplate {
    pub fn new(job_id: Uuid, outcome: &TranslationOutcome) -> Self {
        let truncated = outcome.translated_text.chars().count() > PREVIEW_CHARS;
        let preview = if truncated {
            outcome.translated_text.chars().take(PREVIEW_CHARS).collect()
        } else {
            outcome.translated_text.clone()
        };

        Self {
            job_id,
            source_label: outcome.source_label.clone(),
            target_name: language_name(outcome.target.as_str()),
            model: outcome.model.clone(),
            preview,
            truncated,
            chunk_count: outcome.chunk_count,
            cached_chunks: outcome.cached_chunks,
            download_name: download_filename(&outcome.source_label),
        }
    }
}

/// Error shown in place of the result.
#[derive(Template, WebTemplate)]
#[template(path = "partials/error.html")]
pub struct ErrorTemplate {
    pub message: String,
}

/// File name offered for the translated PDF.
pub fn download_filename(source_label: &str) -> String {
    format!("translated_{}.pdf", download_stem(source_label))
}
