//! Helper types and traits for cleaner route handlers.
//!
//! Provides extension traits for converting `Option` and `Result` types
//! into HTTP-appropriate error responses.

use axum::body::Body;
use axum::http::{StatusCode, header};
use axum::response::Response;
use cognitranslate_core::{Lang, is_supported_target};

/// Standard result type for route handlers.
pub type RouteResult<T> = Result<T, (StatusCode, String)>;

/// Extension trait for converting `Option<T>` to `RouteResult<T>`.
pub trait OptionExt<T> {
    /// Returns the contained value or a 404 Not Found error.
    fn or_not_found(self, msg: &str) -> RouteResult<T>;

    /// Returns the contained value or a 400 Bad Request error.
    fn or_bad_request(self, msg: &str) -> RouteResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, msg: &str) -> RouteResult<T> {
        self.ok_or_else(|| (StatusCode::NOT_FOUND, msg.to_string()))
    }

    fn or_bad_request(self, msg: &str) -> RouteResult<T> {
        self.ok_or_else(|| (StatusCode::BAD_REQUEST, msg.to_string()))
    }
}

/// Extension trait for converting `Result<T, E>` to `RouteResult<T>`.
pub trait ResultExt<T, E: std::fmt::Display> {
    /// Converts the error to 500 Internal Server Error.
    fn or_internal_error(self) -> RouteResult<T>;

    /// Converts the error to 400 Bad Request.
    fn or_bad_request(self) -> RouteResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T, E> for Result<T, E> {
    fn or_internal_error(self) -> RouteResult<T> {
        self.map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    }

    fn or_bad_request(self) -> RouteResult<T> {
        self.map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
    }
}

/// Validate a target language code from a form.
///
/// Returns 400 Bad Request for anything outside the supported targets.
pub fn parse_target(code: &str) -> RouteResult<Lang> {
    let code = code.trim();
    if is_supported_target(code) {
        Ok(Lang::new(code))
    } else {
        Err((
            StatusCode::BAD_REQUEST,
            format!("Unsupported target language: {code}"),
        ))
    }
}

/// Build an HTML response with the given status.
pub fn html_response(status: StatusCode, html: String) -> RouteResult<Response> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Body::from(html))
        .or_internal_error()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target(" pt ").unwrap().as_str(), "pt");
        let (status, message) = parse_target("de").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("de"));
    }

    #[test]
    fn test_option_ext() {
        let missing: Option<u8> = None;
        assert_eq!(missing.or_not_found("Job not found").unwrap_err().0, StatusCode::NOT_FOUND);
        assert_eq!(Some(1).or_bad_request("x").unwrap(), 1);
    }
}
