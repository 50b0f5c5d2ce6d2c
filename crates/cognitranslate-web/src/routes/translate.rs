//! Translation route - accepts the form and starts a background job.

use askama::Template;
use axum::{extract::State, http::StatusCode, response::Response};
use axum_extra::extract::Multipart;
use bytes::Bytes;
use cognitranslate_core::{DEFAULT_TARGET_LANG, Lang, ProgressCallback, Source};
use std::sync::Arc;
use tracing::{error, info};

use crate::helpers::{OptionExt, ResultExt, RouteResult, html_response, parse_target};
use crate::state::{AppState, TranslateJob};
use crate::templates::ProgressTemplate;

/// Fields collected from the multipart form.
#[derive(Default)]
struct TranslateForm {
    source: Option<String>,
    target: Option<String>,
    filename: Option<String>,
    file: Option<Bytes>,
    url: Option<String>,
}

impl TranslateForm {
    async fn read(mut multipart: Multipart) -> RouteResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.or_bad_request()? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "source" => form.source = Some(field.text().await.or_bad_request()?),
                "target" => form.target = Some(field.text().await.or_bad_request()?),
                "url" => form.url = Some(field.text().await.or_bad_request()?),
                "file" => {
                    form.filename = field.file_name().map(ToString::to_string);
                    form.file = Some(field.bytes().await.or_bad_request()?);
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// Validate the form into a source and target language.
    fn into_request(self) -> RouteResult<(Source, Lang)> {
        let target = parse_target(self.target.as_deref().unwrap_or(DEFAULT_TARGET_LANG))?;

        let source = match self.source.as_deref().map(str::trim) {
            Some("pdf") | None => {
                let bytes = self
                    .file
                    .filter(|b| !b.is_empty())
                    .or_bad_request("Please upload a PDF file")?;
                Source::Pdf {
                    filename: self
                        .filename
                        .filter(|f| !f.is_empty())
                        .unwrap_or_else(|| "document.pdf".to_string()),
                    bytes,
                }
            }
            Some("website") => {
                let url = self
                    .url
                    .map(|u| u.trim().to_string())
                    .filter(|u| !u.is_empty())
                    .or_bad_request("Please enter a URL")?;
                Source::Web { url }
            }
            Some(other) => {
                return Err((StatusCode::BAD_REQUEST, format!("Unknown source: {other}")));
            }
        };

        Ok((source, target))
    }
}

/// Start a translation job - returns progress HTML with SSE connection.
///
/// Returns 202 Accepted (async operation started, not completed).
/// HTMX: Replaces `#job-area`, connects to the job's SSE stream.
pub async fn start_translation(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> RouteResult<Response> {
    let (source, target) = TranslateForm::read(multipart).await?.into_request()?;

    let job = Arc::new(TranslateJob::new(source.stage()));
    let job_id = state
        .create_job(source.label().to_string(), Arc::clone(&job))
        .await;

    info!("Created job {} for {} -> {}", job_id, source.label(), target);

    let translator = Arc::clone(&state.translator);
    let job_clone = Arc::clone(&job);

    // Spawn background translation task
    tokio::spawn(async move {
        let progress_job = Arc::clone(&job_clone);
        let progress: ProgressCallback =
            Box::new(move |done, total| progress_job.set_progress(done, total));

        match translator.run(&source, &target, Some(progress)).await {
            Ok(outcome) => job_clone.finish(outcome).await,
            Err(e) => {
                error!("Job {} failed: {}", job_id, e);
                job_clone.fail(e.user_message()).await;
            }
        }
    });

    let template = ProgressTemplate::new(job_id, 0, 0, job.message(), true);
    let html = template.render().or_internal_error()?;

    // 202 Accepted: async operation started but not completed
    html_response(StatusCode::ACCEPTED, html)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_form_requires_file() {
        let form = TranslateForm {
            source: Some("pdf".to_string()),
            target: Some("fr".to_string()),
            ..Default::default()
        };
        let (status, message) = form.into_request().unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, "Please upload a PDF file");
    }

    #[test]
    fn test_website_form() {
        let form = TranslateForm {
            source: Some("website".to_string()),
            target: Some("pt".to_string()),
            url: Some(" https://neurosciencenews.com/ ".to_string()),
            ..Default::default()
        };
        let (source, target) = form.into_request().unwrap();
        assert_eq!(target.as_str(), "pt");
        assert!(matches!(source, Source::Web { ref url } if url == "https://neurosciencenews.com/"));
    }

    #[test]
    fn test_website_form_requires_url() {
        let form = TranslateForm {
            source: Some("website".to_string()),
            url: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(form.into_request().unwrap_err().1, "Please enter a URL");
    }

    #[test]
    fn test_pdf_form_defaults_filename() {
        let form = TranslateForm {
            source: Some("pdf".to_string()),
            target: Some("es".to_string()),
            file: Some(Bytes::from_static(b"%PDF-1.4")),
            ..Default::default()
        };
        let (source, _) = form.into_request().unwrap();
        assert_eq!(source.label(), "document.pdf");
    }

    #[test]
    fn test_unsupported_target_rejected() {
        let form = TranslateForm {
            source: Some("website".to_string()),
            target: Some("de".to_string()),
            url: Some("https://example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(form.into_request().unwrap_err().0, StatusCode::BAD_REQUEST);
    }
}
