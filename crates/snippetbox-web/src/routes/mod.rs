//! Route definitions.

mod assets;
mod home;
mod snippets;

use axum::Router;
use axum::routing::get;

use crate::error::AppError;
use crate::middleware::{self, DYNAMIC, STANDARD};
use crate::state::AppState;

/// Build the complete application router.
///
/// # Route Structure
///
/// ## Dynamic (session loaded and saved)
/// - `GET /` - Latest snippets
/// - `GET /snippet/view/{id}` - One snippet
/// - `GET /snippet/create` - Submission form
/// - `POST /snippet/create` - Create a snippet
///
/// ## Static
/// - `GET /static/{*path}` - Files under the configured static directory
///
/// Anything else falls through to the not-found page. A known path requested
/// with the wrong method gets `405 Method Not Allowed` with an `Allow` header.
pub fn router(state: AppState) -> Router {
    let dynamic = Router::new()
        .route("/", get(home::home))
        .route("/snippet/view/{id}", get(snippets::view))
        .route(
            "/snippet/create",
            get(snippets::create_form).post(snippets::create),
        );
    let dynamic = middleware::apply(dynamic, DYNAMIC, &state);

    let app = Router::new()
        .merge(dynamic)
        .route("/static/{*path}", get(assets::serve))
        .fallback(not_found)
        .with_state(state.clone());

    middleware::apply(app, STANDARD, &state)
}

async fn not_found() -> AppError {
    AppError::NotFound
}
