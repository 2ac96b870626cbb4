//! Cookie-keyed sessions and flash messages.
//!
//! [`load_and_save`] is the middleware wrapped around dynamic routes. It loads
//! the session named by the request cookie, exposes it to handlers through the
//! [`Session`] extractor, and commits it once the handler has finished. The
//! commit also happens when the handler panics; the panic is then resumed so
//! the recovery stage still sees it.

mod store;

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use parking_lot::Mutex;

pub use self::store::{MemoryStore, SessionError, SessionStore, SessionValues};
use crate::error::AppError;

/// Name of the session cookie.
pub const COOKIE_NAME: &str = "session";

/// Session key holding the one-shot flash message.
pub const FLASH_KEY: &str = "flash";

/// Whether a session changed during the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Unmodified,
    Modified,
}

#[derive(Debug)]
struct SessionState {
    token: String,
    values: SessionValues,
    status: Status,
}

/// Handle to the current request's session.
///
/// Cloning is cheap; all clones share the same state.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    fn new(token: String, values: SessionValues) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                token,
                values,
                status: Status::Unmodified,
            })),
        }
    }

    /// The opaque token identifying this session.
    pub fn token(&self) -> String {
        self.inner.lock().token.clone()
    }

    /// Whether the session has been changed.
    pub fn status(&self) -> Status {
        self.inner.lock().status
    }

    /// Store a value.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut state = self.inner.lock();
        state.values.insert(key.into(), value.into());
        state.status = Status::Modified;
    }

    /// Read and remove a value.
    pub fn pop(&self, key: &str) -> Option<String> {
        let mut state = self.inner.lock();
        let value = state.values.remove(key);
        if value.is_some() {
            state.status = Status::Modified;
        }
        value
    }

    fn snapshot(&self) -> (String, SessionValues, Status) {
        let state = self.inner.lock();
        (state.token.clone(), state.values.clone(), state.status)
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("session layer is not installed")))
    }
}

/// Loads and commits sessions against a [`SessionStore`].
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    lifetime: Duration,
}

impl SessionManager {
    /// Create a manager over `store`; cookies live for `lifetime`.
    pub fn new(store: Arc<dyn SessionStore>, lifetime: Duration) -> Self {
        Self { store, lifetime }
    }

    /// Create a manager over a fresh [`MemoryStore`].
    pub fn in_memory(lifetime: Duration) -> Self {
        Self::new(Arc::new(MemoryStore::new(lifetime)), lifetime)
    }

    /// Load the session named by `token`, or start a new one.
    ///
    /// Unknown or expired tokens start a new session under a new token so a
    /// client cannot choose its own session id.
    pub fn load(&self, token: Option<&str>) -> Result<Session, SessionError> {
        if let Some(token) = token {
            if let Some(values) = self.store.find(token)? {
                return Ok(Session::new(token.to_string(), values));
            }
        }

        Ok(Session::new(uuid::Uuid::new_v4().to_string(), HashMap::new()))
    }

    /// Persist a modified session and return the cookie to send, if any.
    pub fn commit(&self, session: &Session) -> Result<Option<HeaderValue>, SessionError> {
        let (token, values, status) = session.snapshot();
        if status == Status::Unmodified {
            return Ok(None);
        }

        self.store.commit(&token, values)?;

        let cookie = format!(
            "{COOKIE_NAME}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            self.lifetime.as_secs()
        );
        HeaderValue::from_str(&cookie)
            .map(Some)
            .map_err(|e| SessionError(format!("invalid session cookie: {e}")))
    }
}

/// Extract the session token from the request's `Cookie` headers.
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

/// Middleware: load the session before the handler and commit it afterwards
/// on every exit path.
pub async fn load_and_save(
    State(manager): State<SessionManager>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = token_from_headers(request.headers());

    let session = match manager.load(token.as_deref()) {
        Ok(session) => session,
        Err(e) => return AppError::Session(e).into_response(),
    };
    request.extensions_mut().insert(session.clone());

    let outcome = AssertUnwindSafe(next.run(request)).catch_unwind().await;
    let committed = manager.commit(&session);

    let mut response = match outcome {
        Ok(response) => response,
        Err(panic) => {
            if let Err(e) = committed {
                tracing::error!(error = %e, "failed to commit session after panic");
            }
            std::panic::resume_unwind(panic);
        }
    };

    match committed {
        Ok(Some(cookie)) => {
            response.headers_mut().append(SET_COOKIE, cookie);
            response
        }
        Ok(None) => response,
        Err(e) => AppError::Session(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SessionManager {
        SessionManager::in_memory(Duration::from_secs(60))
    }

    #[test]
    fn test_new_session_without_cookie() {
        let manager = manager();
        let session = manager.load(None).unwrap();
        assert_eq!(session.status(), Status::Unmodified);
        assert!(session.pop(FLASH_KEY).is_none());
        assert_eq!(session.status(), Status::Unmodified);
        assert!(!session.token().is_empty());
    }

    #[test]
    fn test_unmodified_session_is_not_committed() {
        let manager = manager();
        let session = manager.load(None).unwrap();
        assert!(manager.commit(&session).unwrap().is_none());
        // Nothing was stored, so the token is not recognised.
        assert_ne!(manager.load(Some(&session.token())).unwrap().token(), session.token());
    }

    #[test]
    fn test_put_commit_load_round_trip() {
        let manager = manager();
        let session = manager.load(None).unwrap();
        session.put(FLASH_KEY, "Saved!");

        let cookie = manager.commit(&session).unwrap().unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with(&format!("{COOKIE_NAME}={}", session.token())));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=60"));

        let reloaded = manager.load(Some(&session.token())).unwrap();
        assert_eq!(reloaded.token(), session.token());
        assert_eq!(reloaded.pop(FLASH_KEY).as_deref(), Some("Saved!"));
    }

    #[test]
    fn test_pop_consumes_value_once() {
        let manager = manager();
        let session = manager.load(None).unwrap();
        session.put(FLASH_KEY, "once");
        manager.commit(&session).unwrap();

        let next = manager.load(Some(&session.token())).unwrap();
        assert_eq!(next.pop(FLASH_KEY).as_deref(), Some("once"));
        assert_eq!(next.status(), Status::Modified);
        manager.commit(&next).unwrap();

        let after = manager.load(Some(&session.token())).unwrap();
        assert!(after.pop(FLASH_KEY).is_none());
        assert_eq!(after.status(), Status::Unmodified);
    }

    #[test]
    fn test_unknown_token_gets_fresh_session() {
        let manager = manager();
        let session = manager.load(Some("made-up-token")).unwrap();
        assert_ne!(session.token(), "made-up-token");
    }

    #[test]
    fn test_token_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; session=abc123; x=y"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc123"));

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("sessionx=nope; session="));
        assert!(token_from_headers(&headers).is_none());

        assert!(token_from_headers(&HeaderMap::new()).is_none());
    }
}
