//! HTTP route handlers for the translator web application.
//!
//! HTML routes return Askama fragments for HTMX; job routes also serve the
//! SSE progress stream, plain text and the generated PDF.

mod jobs;
mod pages;
mod translate;

pub use jobs::{download_pdf, job_stream, job_text};
pub use pages::index;
pub use translate::start_translation;
