use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::{RetryPolicy, build_client, post_json_with_retry};
use super::traits::{Translator, TranslatorInfo};
use crate::config::{Lang, TranslatorBackend, TranslatorConfig, is_supported_target};
use crate::error::{Error, Result};

/// Translator for pretrained MarianMT (opus-mt) models served behind a
/// Hugging Face style inference endpoint.
///
/// Each call posts one chunk to `{api_base}/{model}`; the model name comes
/// from the configured template, e.g. `Helsinki-NLP/opus-mt-en-fr`.
pub struct MarianTranslator {
    client: Client,
    api_base: String,
    api_key: Option<String>,
    model_template: String,
    policy: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
struct TranslationOutput {
    translation_text: String,
}

/// Endpoints answer with a list, some proxies unwrap single results.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Many(Vec<TranslationOutput>),
    One(TranslationOutput),
}

impl InferenceResponse {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Many(outputs) => outputs.into_iter().next().map(|o| o.translation_text),
            Self::One(output) => Some(output.translation_text),
        }
    }
}

impl MarianTranslator {
    /// Create a translator from the backend configuration.
    ///
    /// # Panics
    /// Panics if the HTTP client cannot be created.
    pub fn new(config: &TranslatorConfig) -> Self {
        Self {
            client: build_client(config.timeout_secs),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            model_template: config.model_template.clone(),
            policy: RetryPolicy::new(config.retry_count, config.retry_delay_ms),
        }
    }

    fn model_for(&self, source: &Lang, target: &Lang) -> String {
        self.model_template
            .replace("{source}", source.as_str())
            .replace("{target}", target.as_str())
    }
}

#[async_trait]
impl Translator for MarianTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "MarianMT",
            backend: TranslatorBackend::Marian,
            requires_api_key: true,
        }
    }

    /// The hosted inference API rejects anonymous requests; self-hosted
    /// endpoints usually don't need a token.
    fn is_available(&self) -> bool {
        self.api_key.is_some() || !self.api_base.contains("huggingface.co")
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        if text.trim().is_empty() || source == target {
            return Ok(text.to_string());
        }

        if !is_supported_target(target.as_str()) {
            return Err(Error::TranslationUnsupportedLanguage(target.to_string()));
        }

        let model = self.model_for(source, target);
        let url = format!("{}/{}", self.api_base, model);
        debug!("Translating {} characters with {}", text.chars().count(), model);

        let request = InferenceRequest {
            inputs: text,
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let response: InferenceResponse = post_json_with_retry(
            &self.client,
            &url,
            self.api_key.as_deref(),
            &request,
            self.policy,
        )
        .await?;

        response
            .into_text()
            .map(|t| t.trim().to_string())
            .ok_or_else(|| Error::TranslationInvalidResponse("empty output list".to_string()))
    }
}
