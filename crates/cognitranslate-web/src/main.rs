//! CogniTranslate Web - single-page translator for papers and articles.

mod helpers;
mod routes;
mod state;
mod templates;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, header};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use clap::Parser;
use cognitranslate_core::{AppConfig, TranslatorBackend};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir,
    set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use state::{AppState, JOB_MAX_AGE};

/// Upload limit for PDF files.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// How often expired jobs are swept.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Resolve the static files directory.
///
/// Priority:
/// 1. Explicit path if provided
/// 2. ./static if it exists
/// 3. Crate's built-in static directory
fn resolve_static_dir(explicit_path: Option<&str>) -> PathBuf {
    if let Some(path) = explicit_path {
        return PathBuf::from(path);
    }

    let local_static = PathBuf::from("static");
    if local_static.is_dir() {
        return local_static;
    }

    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}

#[derive(Parser, Debug)]
#[command(name = "cognitranslate-web")]
#[command(author, version, about = "CogniTranslate web server", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Translation backend (marian or openai)
    #[arg(long, env = "COGNITRANSLATE_BACKEND")]
    backend: Option<TranslatorBackendArg>,

    /// Inference API base URL
    #[arg(long, env = "COGNITRANSLATE_API_BASE")]
    api_base: Option<String>,

    /// Inference API token
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    api_key: Option<String>,

    /// Model name; `{source}` and `{target}` are replaced by language codes
    #[arg(long, env = "COGNITRANSLATE_MODEL")]
    model: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Static files directory (defaults to ./static or crate's static dir)
    #[arg(long, env = "STATIC_DIR")]
    static_dir: Option<String>,

    /// Clear translation cache on startup
    #[arg(long)]
    clear_cache: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum TranslatorBackendArg {
    Marian,
    Openai,
}

impl Args {
    fn load_config(&self) -> Result<AppConfig> {
        let mut config = if let Some(path) = &self.config {
            AppConfig::from_file(path).context("Failed to load config file")?
        } else {
            AppConfig::load()
        };

        if let Some(backend) = self.backend {
            config.translator.backend = match backend {
                TranslatorBackendArg::Marian => TranslatorBackend::Marian,
                TranslatorBackendArg::Openai => TranslatorBackend::OpenAi,
            };
        }
        if let Some(ref api_base) = self.api_base {
            config.translator.api_base.clone_from(api_base);
        }
        if let Some(ref api_key) = self.api_key {
            config.translator.api_key = Some(api_key.clone());
        }
        if let Some(ref model) = self.model {
            config.translator.model_template.clone_from(model);
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn build_router(state: Arc<AppState>, static_dir: PathBuf) -> Router {
    Router::new()
        // Pages
        .route("/", get(routes::index))
        // API endpoints - HTML fragments (HTMX) and SSE
        .route("/api/translate", post(routes::start_translation))
        .route("/api/jobs/{job_id}/stream", get(routes::job_stream))
        // API endpoints - text and binary responses
        .route("/api/jobs/{job_id}/text", get(routes::job_text))
        .route("/api/jobs/{job_id}/download", get(routes::download_pdf))
        // Static files with Cache-Control: no-cache (cache but always revalidate via ETag)
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-cache"),
                ))
                .service(ServeDir::new(static_dir)),
        )
        // Cache-Control for HTML fragments - prevents bfcache issues with HTMX
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        ))
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // html5ever logs every recoverable parse error at debug level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},html5ever=warn,selectors=warn")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    if args.clear_cache {
        match cognitranslate_core::clear_translation_cache() {
            Ok(count) => info!("Cleared {} cached translations", count),
            Err(e) => warn!("Failed to clear cache: {}", e),
        }
    }

    let config = args.load_config()?;
    info!(
        "Translating with {} backend at {}",
        config.translator.backend, config.translator.api_base
    );

    // Opens the disk cache - fails fast if another instance holds the lock
    let state = Arc::new(AppState::new(config).context("Failed to initialize application state")?);
    let info = state.translator.translator_info();
    if info.requires_api_key && !state.translator.is_available() {
        warn!("No API token set (HF_API_TOKEN); {} may reject requests", info.name);
    }

    let cleanup_state = Arc::clone(&state);
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(CLEANUP_INTERVAL).await;
            let removed = cleanup_state.cleanup_old_jobs(JOB_MAX_AGE).await;
            info!(
                "Completed job cleanup: {} removed, {} active",
                removed,
                cleanup_state.job_count().await
            );
        }
    });

    let app = build_router(state, resolve_static_dir(args.static_dir.as_deref()));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use cognitranslate_core::config::CacheConfig;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let config = AppConfig {
            cache: CacheConfig {
                memory_enabled: false,
                disk_enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let state = Arc::new(AppState::new(config).unwrap());
        build_router(state, resolve_static_dir(None))
    }

    #[tokio::test]
    async fn test_index_renders() {
        let response = test_router()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let response = test_router()
            .oneshot(
                Request::get("/api/jobs/00000000-0000-0000-0000-000000000000/text")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_translate_without_file_is_rejected() {
        let boundary = "X-BOUNDARY";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"source\"\r\n\r\npdf\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"target\"\r\n\r\nfr\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::post("/api/translate")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    const ARTICLE: &str = "<html><head><title>Sleep</title></head><body>\
        <p>Sleep consolidates memory.</p></body></html>";

    /// Article page plus a Marian-style inference endpoint on one local port.
    async fn spawn_upstream() -> String {
        let upstream = Router::new()
            .route("/article", get(|| async { axum::response::Html(ARTICLE) }))
            .route(
                "/models/{*model}",
                post(|| async {
                    (
                        [(header::CONTENT_TYPE, "application/json")],
                        r#"[{"translation_text":"Le sommeil consolide la memoire."}]"#,
                    )
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, upstream).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_website_job_streams_result_then_serves_text_and_pdf() {
        let base = spawn_upstream().await;
        let mut config = AppConfig {
            cache: CacheConfig {
                memory_enabled: false,
                disk_enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        config.translator.api_base = format!("{base}/models");
        config.translator.retry_delay_ms = 10;
        let state = Arc::new(AppState::new(config).unwrap());
        let app = build_router(state, resolve_static_dir(None));

        let boundary = "X-BOUNDARY";
        let form = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"source\"\r\n\r\nwebsite\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"target\"\r\n\r\nfr\r\n\
             --{boundary}\r\nContent-Disposition: form-data; name=\"url\"\r\n\r\n{base}/article\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::post("/api/translate")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(form))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let html = String::from_utf8(body_bytes(response).await).unwrap();
        let start = html.find("/api/jobs/").unwrap() + "/api/jobs/".len();
        let job_id = &html[start..start + 36];

        // The stream ends right after the result event
        let response = app
            .clone()
            .oneshot(
                Request::get(format!("/api/jobs/{job_id}/stream"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let events = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(events.contains("event: progress"));
        let result = &events[events.find("event: result").unwrap()..];
        assert!(result.contains("Le sommeil consolide la memoire."));
        assert!(result.contains("Copy Full Text"));
        assert!(result.contains("Download Translated PDF"));

        let response = app
            .clone()
            .oneshot(
                Request::get(format!("/api/jobs/{job_id}/text"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
        assert_eq!(body_bytes(response).await, b"Le sommeil consolide la memoire.");

        let response = app
            .oneshot(
                Request::get(format!("/api/jobs/{job_id}/download"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"translated_article.pdf\""
        );
        assert!(body_bytes(response).await.starts_with(b"%PDF"));
    }
}
