//! Request pipeline stages.
//!
//! The router is wrapped in two chains. [`STANDARD`] wraps every route,
//! including static files and the fallback; [`DYNAMIC`] wraps only the
//! application pages. Stages listed first run first on the way in, i.e. the
//! first stage is the outermost wrapper.

use std::any::Any;
use std::backtrace::Backtrace;
use std::net::SocketAddr;

use axum::Router;
use axum::body::Body;
use axum::extract::{ConnectInfo, Request};
use axum::http::header::{
    CONNECTION, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
    X_FRAME_OPTIONS, X_XSS_PROTECTION,
};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::middleware::{Next, from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, Span};

use crate::error::error_page;
use crate::session;
use crate::state::AppState;

/// A single pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Turn panics into a 500 page and close the connection.
    RecoverPanic,
    /// Log every request with its remote address, protocol and method.
    LogRequest,
    /// Add browser security headers to every response.
    SecureHeaders,
    /// Load the session before the handler and commit it afterwards.
    Session,
}

/// Stages wrapped around the whole router.
pub const STANDARD: &[Stage] = &[Stage::RecoverPanic, Stage::LogRequest, Stage::SecureHeaders];

/// Stages wrapped around the application pages only.
pub const DYNAMIC: &[Stage] = &[Stage::Session];

/// Wrap `router` in `stages`, first stage outermost.
pub fn apply<S>(router: Router<S>, stages: &[Stage], state: &AppState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // `Router::layer` wraps what is already there, so go innermost first.
    stages.iter().rev().fold(router, |router, stage| match stage {
        Stage::RecoverPanic => router.layer(CatchPanicLayer::custom(handle_panic)),
        Stage::LogRequest => router.layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        ),
        Stage::SecureHeaders => router.layer(from_fn(secure_headers)),
        Stage::Session => router.layer(from_fn_with_state(
            state.sessions.clone(),
            session::load_and_save,
        )),
    })
}

/// Span covering one request.
fn request_span(request: &Request<Body>) -> Span {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    tracing::info_span!(
        "http_request",
        remote_addr = %remote_addr,
        version = ?request.version(),
        method = %request.method(),
        uri = %request.uri(),
    )
}

/// Headers set on every response.
pub fn secure_header_values() -> [(HeaderName, HeaderValue); 5] {
    [
        (
            CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(
                "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com",
            ),
        ),
        (
            REFERRER_POLICY,
            HeaderValue::from_static("origin-when-cross-origin"),
        ),
        (X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (X_FRAME_OPTIONS, HeaderValue::from_static("deny")),
        (X_XSS_PROTECTION, HeaderValue::from_static("0")),
    ]
}

/// Insert the security headers into `headers`, replacing existing values.
pub fn apply_secure_headers(headers: &mut HeaderMap) {
    for (name, value) in secure_header_values() {
        headers.insert(name, value);
    }
}

async fn secure_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    apply_secure_headers(response.headers_mut());
    response
}

/// Build the response for a request whose handling panicked.
///
/// Stages inside the recovery boundary never finished, so the security
/// headers are added here as well.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(panic.as_ref());
    let backtrace = Backtrace::force_capture();
    tracing::error!(panic = %message, backtrace = %backtrace, "request handler panicked");
    metrics::counter!("http_panics_total").increment(1);

    let status = StatusCode::INTERNAL_SERVER_ERROR;
    let mut response = (status, error_page(status)).into_response();
    let headers = response.headers_mut();
    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    apply_secure_headers(headers);
    response
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_message_from_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(format!("boom {}", 1));
        assert_eq!(panic_message(owned.as_ref()), "boom 1");

        let literal: Box<dyn Any + Send> = Box::new("static boom");
        assert_eq!(panic_message(literal.as_ref()), "static boom");

        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }

    #[test]
    fn panic_response_closes_connection() {
        let response = handle_panic(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONNECTION], "close");
        assert_eq!(response.headers()[X_FRAME_OPTIONS], "deny");
    }

    #[test]
    fn secure_headers_overwrite_existing() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("sameorigin"));
        apply_secure_headers(&mut headers);

        assert_eq!(headers.len(), 5);
        assert_eq!(headers[X_FRAME_OPTIONS], "deny");
        assert_eq!(headers[REFERRER_POLICY], "origin-when-cross-origin");
        assert_eq!(headers[X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[X_XSS_PROTECTION], "0");
        assert!(
            headers[CONTENT_SECURITY_POLICY]
                .to_str()
                .unwrap()
                .starts_with("default-src 'self'")
        );
    }

    #[test]
    fn recovery_is_outermost() {
        assert_eq!(STANDARD.first(), Some(&Stage::RecoverPanic));
        assert_eq!(DYNAMIC, &[Stage::Session]);
    }
}
