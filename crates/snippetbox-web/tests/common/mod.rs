//! Shared helpers for the HTTP-level tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, Response};
use chrono::DateTime;
use http_body_util::BodyExt;
use snippetbox_core::{ManualClock, SqliteSnippetStore};
use snippetbox_web::render::TemplateCache;
use snippetbox_web::session::SessionManager;
use snippetbox_web::{AppState, Config};

/// A fully assembled application over an in-memory database.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub store: Arc<SqliteSnippetStore>,
    pub clock: Arc<ManualClock>,
}

/// Static assets shipped with the repository.
pub fn static_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../ui/static")
}

pub fn test_state() -> (AppState, Arc<SqliteSnippetStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
        DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
    ));
    let store = Arc::new(
        SqliteSnippetStore::open_in_memory()
            .unwrap()
            .with_clock(clock.clone()),
    );

    let config = Config {
        static_dir: static_dir(),
        ..Config::default()
    };
    let state = AppState::from_parts(
        config,
        store.clone(),
        TemplateCache::new().unwrap(),
        SessionManager::in_memory(Duration::from_secs(60)),
    );

    (state, store, clock)
}

pub fn test_app() -> TestApp {
    let (state, store, clock) = test_state();
    let router = snippetbox_web::router(state.clone());
    TestApp {
        state,
        router,
        store,
        clock,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// The `name=value` part of the response's session cookie, if one was set.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}
