//! Error types for the web service.
//!
//! Errors are rendered as simple HTML error pages. Server-side failures are
//! logged in full with a backtrace; the client only ever sees the status text.

use std::backtrace::Backtrace;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use maud::{DOCTYPE, Markup, html};
use snippetbox_core::StoreError;

use crate::render::TemplateError;
use crate::session::SessionError;

/// Web service error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The request could not be understood (malformed form body, etc.).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No route, or no visible snippet, matched the request.
    #[error("not found")]
    NotFound,

    /// A page could not be rendered.
    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    /// The snippet store failed.
    #[error("store error: {0}")]
    Store(StoreError),

    /// The session backend failed.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Any other internal failure.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NoRecord => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

impl AppError {
    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Template(_) | Self::Store(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let backtrace = Backtrace::force_capture();
            tracing::error!(error = %self, backtrace = %backtrace, "server error");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "client error");
        }

        (status, error_page(status)).into_response()
    }
}

/// Render the generic error page for `status`.
///
/// Only the canonical status text is shown.
pub fn error_page(status: StatusCode) -> Markup {
    let title = status.canonical_reason().unwrap_or("Error");

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " - Snippetbox" }
                meta name="robots" content="noindex";
                link rel="stylesheet" href="/static/css/main.css";
            }
            body {
                main class="error-page" {
                    h1 { (status.as_u16()) " " (title) }
                    a href="/" { "Back to Snippetbox" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_bad_request() {
        let err = AppError::BadRequest("bad form".to_string());
        assert_eq!(err.to_string(), "bad request: bad form");
    }

    #[test]
    fn error_display_internal() {
        let err = AppError::Internal(anyhow::anyhow!("something broke"));
        assert_eq!(err.to_string(), "internal error: something broke");
    }

    #[test]
    fn no_record_maps_to_not_found() {
        let err: AppError = StoreError::NoRecord.into();
        assert!(matches!(err, AppError::NotFound));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn other_store_errors_map_to_server_error() {
        let err: AppError = StoreError::InvalidTimestamp {
            column: "created",
            value: i64::MAX,
        }
        .into();
        assert!(matches!(err, AppError::Store(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_into_response_bad_request() {
        let response = AppError::BadRequest("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn error_into_response_not_found() {
        let response = AppError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn error_into_response_internal() {
        let response = AppError::Internal(anyhow::anyhow!("boom")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_page_hides_detail() {
        let page = error_page(StatusCode::INTERNAL_SERVER_ERROR).into_string();
        assert!(page.contains("500 Internal Server Error"));
        assert!(!page.contains("boom"));
    }
}
