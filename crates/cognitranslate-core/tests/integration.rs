//! Integration tests for cognitranslate-core
//!
//! These tests verify the end-to-end workflow:
//! - Chunked translation with a mock backend
//! - Cache hits across runs
//! - Inference backends against a local HTTP server
//! - Web and PDF extraction feeding the pipeline

#![allow(clippy::unwrap_used, clippy::panic)]

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use cognitranslate_core::config::CacheConfig;
use cognitranslate_core::{
    AppConfig, CogniTranslator, Error, Lang, PdfDocument, Result, Source, TranslationCache, Translator,
    TranslatorBackend, TranslatorInfo, create_translator, export_text_pdf,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// =============================================================================
// Mock Translator for Testing
// =============================================================================

/// Upper-cases its input and counts calls, without network access.
struct MockTranslator {
    calls: AtomicUsize,
    should_fail: bool,
}

impl MockTranslator {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            should_fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            should_fail: true,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    fn info(&self) -> TranslatorInfo {
        TranslatorInfo {
            name: "mock",
            backend: TranslatorBackend::Marian,
            requires_api_key: false,
        }
    }

    async fn translate(&self, text: &str, _source: &Lang, _target: &Lang) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(Error::TranslationRequest("Mock translation failure".to_string()));
        }
        Ok(text.to_uppercase())
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

/// Memory-only cache so tests never touch the user's cache directory.
fn test_config(chunk_size: usize) -> AppConfig {
    let mut config = AppConfig {
        cache: CacheConfig {
            memory_enabled: true,
            disk_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    config.translator.chunk_size = chunk_size;
    config.translator.retry_delay_ms = 10;
    config
}

fn pipeline(translator: Arc<MockTranslator>, chunk_size: usize) -> CogniTranslator {
    CogniTranslator::with_translator(translator, test_config(chunk_size)).unwrap()
}

/// Serve `app` on an ephemeral local port and return its base URL.
async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn french() -> Lang {
    Lang::new("fr")
}

// =============================================================================
// Pipeline Translation Tests
// =============================================================================

#[tokio::test]
async fn test_chunks_are_translated_and_joined_with_space() {
    let mock = MockTranslator::new();
    let translator = pipeline(mock.clone(), 4);

    let result = translator
        .translate_text("workingmemory", &french(), None)
        .await
        .unwrap();

    assert_eq!(result.text, "WORK INGM EMOR Y");
    assert_eq!(result.chunk_count, 4);
    assert_eq!(result.cached_chunks, 0);
    assert_eq!(result.model, "Helsinki-NLP/opus-mt-en-fr");
    assert_eq!(mock.calls(), 4);
}

#[tokio::test]
async fn test_blank_chunks_are_skipped() {
    let mock = MockTranslator::new();
    let translator = pipeline(mock.clone(), 2);

    let result = translator.translate_text("ab  cd", &french(), None).await.unwrap();

    assert_eq!(result.text, "AB CD");
    assert_eq!(result.chunk_count, 2);
    assert_eq!(mock.calls(), 2);
}

#[tokio::test]
async fn test_progress_reports_every_chunk() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    let translator = pipeline(MockTranslator::new(), 3);

    translator
        .translate_text(
            "abcdefgh",
            &french(),
            Some(Box::new(move |done, total| sink.lock().unwrap().push((done, total)))),
        )
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![(0, 3), (1, 3), (2, 3), (3, 3)]);
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let mock = MockTranslator::new();
    let translator = pipeline(mock.clone(), 5);
    let text = "Attention shapes perception.";

    let first = translator.translate_text(text, &french(), None).await.unwrap();
    let calls_after_first = mock.calls();
    let second = translator.translate_text(text, &french(), None).await.unwrap();

    assert_eq!(first.text, second.text);
    assert_eq!(second.cached_chunks, second.chunk_count);
    assert_eq!(mock.calls(), calls_after_first);

    // A different target must not reuse the French entries
    let spanish = translator
        .translate_text(text, &Lang::new("es"), None)
        .await
        .unwrap();
    assert_eq!(spanish.cached_chunks, 0);
}

#[tokio::test]
async fn test_disabled_cache_always_translates() {
    let mock = MockTranslator::new();
    let mut config = test_config(500);
    config.cache.memory_enabled = false;
    let translator = CogniTranslator::with_translator(mock.clone(), config).unwrap();

    translator.translate_text("Sleep", &french(), None).await.unwrap();
    translator.translate_text("Sleep", &french(), None).await.unwrap();
    assert_eq!(mock.calls(), 2);
}

#[tokio::test]
async fn test_translation_failure_aborts() {
    let mock = MockTranslator::failing();
    let translator = pipeline(mock.clone(), 2);

    let result = translator.translate_text("abcdef", &french(), None).await;

    assert!(matches!(result, Err(Error::TranslationRequest(_))));
    assert_eq!(mock.calls(), 1, "no chunk after the failing one is attempted");
}

#[tokio::test]
async fn test_unsupported_target_is_rejected() {
    let mock = MockTranslator::new();
    let translator = pipeline(mock.clone(), 500);

    let result = translator.translate_text("Memory", &Lang::new("de"), None).await;

    assert!(matches!(result, Err(Error::TranslationUnsupportedLanguage(_))));
    assert_eq!(mock.calls(), 0);
}

// =============================================================================
// Inference Backend Tests
// =============================================================================

async fn fake_marian(Path(model): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    let input = body["inputs"].as_str().unwrap_or_default();
    assert_eq!(body["options"]["wait_for_model"], json!(true));
    Json(json!([{ "translation_text": format!(" {model}|{input} ") }]))
}

fn marian_config(base: &str) -> AppConfig {
    let mut config = test_config(500);
    config.translator.api_base = format!("{base}/models/");
    config
}

#[tokio::test]
async fn test_marian_backend_end_to_end() {
    let base = spawn_server(Router::new().route("/models/{*model}", post(fake_marian))).await;
    let translator = CogniTranslator::new(marian_config(&base)).unwrap();

    let result = translator
        .translate_text("The hippocampus", &Lang::new("pt"), None)
        .await
        .unwrap();

    assert_eq!(result.text, "Helsinki-NLP/opus-mt-en-pt|The hippocampus");
}

#[derive(Clone, Default)]
struct Flaky {
    hits: Arc<AtomicUsize>,
}

async fn rate_limited_once(State(flaky): State<Flaky>) -> axum::response::Response {
    if flaky.hits.fetch_add(1, Ordering::SeqCst) == 0 {
        return (StatusCode::TOO_MANY_REQUESTS, [(header::RETRY_AFTER, "0")], "slow down")
            .into_response();
    }
    Json(json!([{ "translation_text": "Bonjour" }])).into_response()
}

async fn loading_once(State(flaky): State<Flaky>) -> axum::response::Response {
    if flaky.hits.fetch_add(1, Ordering::SeqCst) == 0 {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "Model is currently loading", "estimated_time": 0.01 })),
        )
            .into_response();
    }
    Json(json!([{ "translation_text": "Hola" }])).into_response()
}

async fn not_found(State(flaky): State<Flaky>) -> impl IntoResponse {
    flaky.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::NOT_FOUND, "Model not found")
}

#[tokio::test]
async fn test_marian_retries_after_rate_limit() {
    let flaky = Flaky::default();
    let app = Router::new()
        .route("/models/{*model}", post(rate_limited_once))
        .with_state(flaky.clone());
    let base = spawn_server(app).await;

    let mut config = marian_config(&base);
    config.translator.retry_count = 2;
    let translator = create_translator(&config.translator).unwrap();

    let out = translator.translate("Hello", &Lang::new("en"), &french()).await.unwrap();
    assert_eq!(out, "Bonjour");
    assert_eq!(flaky.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_marian_waits_for_loading_model() {
    let flaky = Flaky::default();
    let app = Router::new()
        .route("/models/{*model}", post(loading_once))
        .with_state(flaky.clone());
    let base = spawn_server(app).await;

    let translator = create_translator(&marian_config(&base).translator).unwrap();

    let out = translator
        .translate("Hello", &Lang::new("en"), &Lang::new("es"))
        .await
        .unwrap();
    assert_eq!(out, "Hola");
    assert_eq!(flaky.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let flaky = Flaky::default();
    let app = Router::new()
        .route("/models/{*model}", post(not_found))
        .with_state(flaky.clone());
    let base = spawn_server(app).await;

    let translator = create_translator(&marian_config(&base).translator).unwrap();
    let result = translator.translate("Hello", &Lang::new("en"), &french()).await;

    match result {
        Err(Error::TranslationRequest(message)) => assert!(message.starts_with("HTTP 404")),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(flaky.hits.load(Ordering::SeqCst), 1);
}

async fn fake_chat(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["model"], json!("opus-en-fr"));
    let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
    assert!(prompt.contains("into French"));
    Json(json!({ "choices": [{ "message": { "content": "\"La mémoire\"" } }] }))
}

#[tokio::test]
async fn test_openai_backend_end_to_end() {
    let base = spawn_server(Router::new().route("/v1/chat/completions", post(fake_chat))).await;

    let mut config = test_config(500);
    config.translator.backend = TranslatorBackend::OpenAi;
    config.translator.api_base = format!("{base}/v1");
    config.translator.model_template = "opus-{source}-{target}".to_string();
    let translator = CogniTranslator::new(config).unwrap();

    let result = translator.translate_text("Memory", &french(), None).await.unwrap();
    assert_eq!(result.text, "La mémoire");
}

// =============================================================================
// Extraction Tests
// =============================================================================

const ARTICLE: &str = r"<html>
  <head><title>Sleep and memory</title></head>
  <body>
    <h1>Ignored heading</h1>
    <p>Sleep consolidates memory.</p>
    <p>Dreams replay the day.</p>
  </body>
</html>";

fn article_server() -> Router {
    Router::new()
        .route("/article", get(|| async { Html(ARTICLE) }))
        .route("/empty", get(|| async { Html("<html><body><div>nav</div></body></html>") }))
}

#[tokio::test]
async fn test_web_source_runs_through_pipeline() {
    let base = spawn_server(article_server()).await;
    let translator = pipeline(MockTranslator::new(), 500);

    let outcome = translator
        .run(&Source::Web { url: format!("{base}/article") }, &french(), None)
        .await
        .unwrap();

    assert_eq!(outcome.source_text, "Sleep consolidates memory. Dreams replay the day.");
    assert_eq!(
        outcome.translated_text,
        "SLEEP CONSOLIDATES MEMORY. DREAMS REPLAY THE DAY."
    );
    assert_eq!(outcome.title.as_deref(), Some("Sleep and memory"));
    assert_eq!(outcome.chunk_count, 1);
}

#[tokio::test]
async fn test_web_error_status_is_reported() {
    let base = spawn_server(article_server()).await;
    let translator = pipeline(MockTranslator::new(), 500);

    let result = translator
        .extract(&Source::Web { url: format!("{base}/missing") })
        .await;

    match result {
        Err(err @ Error::ScrapeStatus { status: 404, .. }) => {
            assert!(err.user_message().starts_with("Error scraping website:"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_page_without_paragraphs_has_no_text() {
    let base = spawn_server(article_server()).await;
    let translator = pipeline(MockTranslator::new(), 500);

    let result = translator
        .extract(&Source::Web { url: format!("{base}/empty") })
        .await;
    assert!(matches!(result, Err(Error::NoTextExtracted(_))));
}

#[tokio::test]
async fn test_pdf_source_runs_through_pipeline() {
    let pdf = export_text_pdf("Working memory is limited.\nAttention selects.").unwrap();
    let mock = MockTranslator::new();
    let translator = pipeline(mock.clone(), 500);

    let source = Source::Pdf {
        filename: "memory.pdf".to_string(),
        bytes: Bytes::from(pdf),
    };
    let outcome = translator.run(&source, &french(), None).await.unwrap();

    assert!(outcome.source_text.contains("Working memory is limited."));
    assert!(outcome.translated_text.contains("WORKING MEMORY IS LIMITED."));
    assert!(outcome.translated_text.contains("ATTENTION SELECTS."));
    assert_eq!(outcome.source_label, "memory.pdf");
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_blank_pdf_has_no_text() {
    let pdf = export_text_pdf("").unwrap();
    let translator = pipeline(MockTranslator::new(), 500);

    let result = translator
        .extract(&Source::Pdf {
            filename: "blank.pdf".to_string(),
            bytes: Bytes::from(pdf),
        })
        .await;
    assert!(matches!(result, Err(Error::NoTextExtracted(_))));
}

#[tokio::test]
async fn test_invalid_pdf_bytes() {
    let translator = pipeline(MockTranslator::new(), 500);

    let result = translator
        .extract(&Source::Pdf {
            filename: "broken.pdf".to_string(),
            bytes: Bytes::from_static(b"not a pdf"),
        })
        .await;
    assert!(matches!(result, Err(Error::PdfOpen(_))));
}

#[test]
fn test_export_uses_configured_layout() {
    let translator =
        CogniTranslator::with_cache(test_config(500), TranslationCache::disabled()).unwrap();
    let pdf = translator.export_pdf("Bonjour le monde", None).unwrap();
    assert!(pdf.starts_with(b"%PDF"));

    let titled = translator
        .export_pdf("Bonjour le monde", Some("Memoire et sommeil"))
        .unwrap();
    let doc = PdfDocument::from_bytes(titled).unwrap();
    assert_eq!(doc.metadata().title.as_deref(), Some("Memoire et sommeil"));
}
