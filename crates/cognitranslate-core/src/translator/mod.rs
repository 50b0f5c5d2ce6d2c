mod chunk;
mod http;
mod marian;
mod openai;
mod traits;

pub use chunk::{chunk_text, is_blank};
pub use http::RetryPolicy;
pub use marian::MarianTranslator;
pub use openai::OpenAiTranslator;
pub use traits::{Translator, TranslatorInfo};

use std::sync::Arc;
use tracing::debug;

use crate::config::{TranslatorBackend, TranslatorConfig};
use crate::error::{Error, Result};

/// Create a translator from configuration
pub fn create_translator(config: &TranslatorConfig) -> Result<Arc<dyn Translator>> {
    if config.api_base.trim().is_empty() {
        return Err(Error::ConfigInvalid {
            field: "translator.api_base".to_string(),
            reason: "must not be empty".to_string(),
        });
    }

    debug!("Creating {} translator for {}", config.backend, config.api_base);

    let translator: Arc<dyn Translator> = match config.backend {
        TranslatorBackend::Marian => Arc::new(MarianTranslator::new(config)),
        TranslatorBackend::OpenAi => Arc::new(OpenAiTranslator::new(config)),
    };

    Ok(translator)
}
