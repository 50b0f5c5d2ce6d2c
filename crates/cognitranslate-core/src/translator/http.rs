//! JSON-over-HTTP request loop shared by the inference backends.

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::error::{Error, Result};

/// Wait applied to a 429 without a usable `Retry-After` header.
const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(5);

/// Upper bound on how long we honour a server-suggested wait.
const MAX_SERVER_WAIT: Duration = Duration::from_secs(60);

/// How often and how patiently to retry a request.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(attempts: u32, delay_ms: u64) -> Self {
        Self {
            attempts,
            delay: Duration::from_millis(delay_ms),
        }
    }
}

/// Build the HTTP client used by inference backends.
///
/// # Panics
/// Panics if the HTTP client cannot be created (TLS backend unavailable).
#[allow(clippy::expect_used)]
pub fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .expect("Failed to create HTTP client")
}

/// POST `body` as JSON and decode the JSON response, retrying per `policy`.
///
/// 429 honours `Retry-After`; 503 (model still loading) honours the
/// `estimated_time` field of the error body. Other 4xx responses are not
/// retried.
pub async fn post_json_with_retry<Req, Resp>(
    client: &Client,
    url: &str,
    api_key: Option<&str>,
    body: &Req,
    policy: RetryPolicy,
) -> Result<Resp>
where
    Req: Serialize + ?Sized + Sync,
    Resp: DeserializeOwned,
{
    let attempts = policy.attempts.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        let is_last = attempt + 1 == attempts;
        debug!("Inference request attempt {}/{} to {}", attempt + 1, attempts, url);

        let mut request = client.post(url).json(body);
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }

        let mut wait = policy.delay;

        match request.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    match response.json::<Resp>().await {
                        Ok(parsed) => return Ok(parsed),
                        Err(e) => {
                            warn!("Failed to parse response: {}", e);
                            last_error = Some(Error::TranslationInvalidResponse(e.to_string()));
                        }
                    }
                } else if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.trim().parse::<u64>().ok());

                    warn!("Rate limited, retry after {:?}s", retry_after);
                    last_error = Some(Error::TranslationRateLimited { retry_after });
                    wait = retry_after
                        .map_or(DEFAULT_RATE_LIMIT_WAIT, Duration::from_secs)
                        .min(MAX_SERVER_WAIT);
                } else if status == StatusCode::SERVICE_UNAVAILABLE {
                    let body = response.text().await.unwrap_or_default();
                    if let Some(estimate) = estimated_wait(&body) {
                        wait = estimate;
                    }
                    warn!("Model unavailable (HTTP 503), waiting {:?}", wait);
                    last_error = Some(Error::TranslationRequest(format!("HTTP {status}: {body}")));
                } else {
                    let body = response.text().await.unwrap_or_default();
                    warn!("API error: {} - {}", status, body);
                    last_error = Some(Error::TranslationRequest(format!("HTTP {status}: {body}")));

                    if status.is_client_error() && status != StatusCode::REQUEST_TIMEOUT {
                        break;
                    }
                }
            }
            Err(e) => {
                warn!("Request failed: {}", e);
                last_error = Some(if e.is_timeout() {
                    Error::TranslationTimeout
                } else {
                    Error::TranslationRequest(e.to_string())
                });
            }
        }

        if !is_last {
            tokio::time::sleep(wait).await;
        }
    }

    error!("Inference request to {} failed after {} attempt(s)", url, attempts);
    Err(last_error.unwrap_or(Error::TranslationMaxRetriesExceeded))
}

/// `estimated_time` (seconds) from a Hugging Face style "model loading" body.
fn estimated_wait(body: &str) -> Option<Duration> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let seconds = value.get("estimated_time")?.as_f64()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(seconds).min(MAX_SERVER_WAIT))
}
