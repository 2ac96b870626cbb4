//! Static file serving.

use std::path::{Component, Path as FsPath};

use axum::extract::{Path, Request, State};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::AppError;
use crate::state::AppState;

/// `GET /static/{*path}`: a file under the static directory.
///
/// Directories, missing files, and paths that try to leave the static root
/// all get the not-found page. Directory listings are never served.
pub async fn serve(
    State(state): State<AppState>,
    Path(path): Path<String>,
    request: Request,
) -> Result<Response, AppError> {
    let relative = FsPath::new(&path);
    if path.is_empty()
        || !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    {
        return Err(AppError::NotFound);
    }

    let full = state.config.static_dir.join(relative);
    match tokio::fs::metadata(&full).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(AppError::NotFound),
    }

    match ServeFile::new(&full).oneshot(request).await {
        Ok(response) => Ok(response.into_response()),
        Err(never) => match never {},
    }
}
