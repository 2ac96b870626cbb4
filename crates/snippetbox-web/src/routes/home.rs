//! Home page handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use crate::error::AppError;
use crate::session::Session;
use crate::state::AppState;

/// `GET /`: the latest unexpired snippets, newest first.
pub async fn home(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    let snippets = state.snippets.latest()?;

    let mut data = state.template_data(&session);
    data.snippets = snippets;

    state.templates.render(StatusCode::OK, "home", &data)
}
