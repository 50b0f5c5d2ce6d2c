//! Job routes - progress stream, plain text and PDF download.

use askama::Template;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{
        Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use cognitranslate_core::TranslationOutcome;
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use crate::helpers::{OptionExt, ResultExt, RouteResult};
use crate::state::{AppState, TranslateJob};
use crate::templates::{ErrorTemplate, ProgressTemplate, ResultTemplate, download_filename};

/// Look up a job's progress tracker and source label.
async fn find_job(state: &AppState, job_id: &str) -> RouteResult<(Arc<TranslateJob>, String)> {
    let job_ref = state.get_job(job_id).await.or_not_found("Job not found")?;
    job_ref
        .with_job(|j| (Arc::clone(&j.progress), j.source_label.clone()))
        .await
        .or_not_found("Job not found")
}

/// Finished outcome of a job, or 409 while it is still running or failed.
async fn finished_outcome(job: &TranslateJob) -> RouteResult<Arc<TranslationOutcome>> {
    if let Some(outcome) = job.get_outcome().await {
        return Ok(outcome);
    }

    let message = job
        .get_error()
        .await
        .unwrap_or_else(|| "Translation still in progress".to_string());
    Err((StatusCode::CONFLICT, message))
}

/// SSE stream for job progress.
///
/// Emits a `progress` event whenever the chunk count changes and a single
/// `result` event (result or error fragment) once the job is done.
#[allow(tail_expr_drop_order)] // Drop order change in async_stream macro is harmless here
pub async fn job_stream(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let job_ref = state.get_job(&job_id).await.or_not_found("Job not found")?;
    let id = job_ref.id();
    let job = job_ref
        .with_job(|j| Arc::clone(&j.progress))
        .await
        .or_not_found("Job not found")?;

    debug!("SSE stream opened for job {}", id);

    let stream = async_stream::stream! {
        let mut last_progress = None;

        loop {
            let progress = job.progress();
            let done = job.is_done();

            if last_progress != Some(progress) {
                last_progress = Some(progress);
                let (current, total) = progress;
                let template = ProgressTemplate::new(id, current, total, job.message(), false);
                if let Ok(html) = template.render() {
                    yield Ok(Event::default().event("progress").data(html));
                }
            }

            if done {
                let html = match job.get_outcome().await {
                    Some(outcome) => ResultTemplate::new(id, &outcome).render(),
                    None => ErrorTemplate {
                        message: job
                            .get_error()
                            .await
                            .unwrap_or_else(|| "Translation failed".to_string()),
                    }
                    .render(),
                };

                match html {
                    Ok(html) => {
                        yield Ok(Event::default().event("result").data(html));
                    }
                    Err(e) => {
                        error!("Failed to render result for job {}: {}", id, e);
                    }
                }
                break;
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// Full translated text as `text/plain` (used by the copy button).
pub async fn job_text(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> RouteResult<Response> {
    let (job, _) = find_job(&state, &job_id).await?;
    let outcome = finished_outcome(&job).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from(outcome.translated_text.clone()))
        .or_internal_error()
}

/// Download the translated text rendered as a PDF.
pub async fn download_pdf(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> RouteResult<Response> {
    let (job, source_label) = find_job(&state, &job_id).await?;
    let outcome = finished_outcome(&job).await?;

    // Build the PDF in a blocking task to avoid blocking the async runtime
    let translator = Arc::clone(&state.translator);
    let pdf = tokio::task::spawn_blocking(move || {
        translator.export_pdf(&outcome.translated_text, outcome.title.as_deref())
    })
    .await
    .or_internal_error()?
    .map_err(|e| {
        error!("Failed to export PDF for job {}: {}", job_id, e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.user_message())
    })?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download_filename(&source_label)),
        )
        .body(Body::from(pdf))
        .or_internal_error()
}
