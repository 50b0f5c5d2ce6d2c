use async_trait::async_trait;

use crate::config::{Lang, TranslatorBackend};
use crate::error::Result;

/// Information about a translator backend
#[derive(Debug, Clone)]
pub struct TranslatorInfo {
    /// Human-readable name
    pub name: &'static str,
    /// Protocol spoken by this backend
    pub backend: TranslatorBackend,
    /// Whether this translator requires an API key
    pub requires_api_key: bool,
}

/// Trait for translation backends.
///
/// Implementations receive one chunk at a time and return its translation.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Get information about this translator
    fn info(&self) -> TranslatorInfo;

    /// Get the translator name (convenience method)
    fn name(&self) -> &'static str {
        self.info().name
    }

    /// Translate text from source language to target language
    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String>;

    /// Check if the translator is usable with its current configuration
    fn is_available(&self) -> bool {
        true
    }
}
