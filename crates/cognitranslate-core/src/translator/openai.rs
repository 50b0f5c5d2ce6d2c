use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{RetryPolicy, build_client, post_json_with_retry};
use super::traits::{Translator, TranslatorInfo};
use crate::config::{Lang, TranslatorBackend, TranslatorConfig, is_supported_target, language_name};
use crate::error::{Error, Result};

/// OpenAI-compatible chat completions translator.
/// Works with: llama.cpp server, Ollama, vLLM, OpenAI, etc.
pub struct OpenAiTranslator {
    client: Client,
    /// Base URL for the API (e.g., "http://localhost:8080/v1")
    api_base: String,
    api_key: Option<String>,
    model_template: String,
    policy: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OpenAiTranslator {
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

    fn create_prompt(text: &str, source: &Lang, target: &Lang) -> String {
        format!(
            "Translate the following text from {} into {}. Output only the translation, no explanations.\n\nText: \"{}\"",
            language_name(source.as_str()),
            language_name(target.as_str()),
            text
        )
    }
}

/// Strip whitespace and any quotes the model wrapped around its answer.
fn clean_completion(content: &str) -> String {
    content
        .trim()
        .trim_start_matches('"')
        .trim_end_matches('"')
        .to_string()
}

#[async_trait]
impl Translator for OpenAiTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "OpenAI Compatible",
            backend: TranslatorBackend::OpenAi,
            // Optional for local servers
            requires_api_key: false,
        }
    }

    async fn translate(&self, text: &str, source: &Lang, target: &Lang) -> Result<String> {
        if text.trim().is_empty() || source == target {
            return Ok(text.to_string());
        }

        if !is_supported_target(target.as_str()) {
            return Err(Error::TranslationUnsupportedLanguage(target.to_string()));
        }

        let url = format!("{}/chat/completions", self.api_base);
        let request = ChatRequest {
            model: self
                .model_template
                .replace("{source}", source.as_str())
                .replace("{target}", target.as_str()),
            messages: vec![Message {
                role: "user",
                content: Self::create_prompt(text, source, target),
            }],
            temperature: 0.3,
        };

        let response: ChatResponse = post_json_with_retry(
            &self.client,
            &url,
            self.api_key.as_deref(),
            &request,
            self.policy,
        )
        .await?;

        response
            .choices
            .first()
            .map(|choice| clean_completion(&choice.message.content))
            .ok_or_else(|| Error::TranslationInvalidResponse("No choices in response".to_string()))
    }
}
