//! Snippet view and creation handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use snippetbox_core::form::{self, FormFields};

use crate::error::AppError;
use crate::forms::SnippetCreateForm;
use crate::session::{FLASH_KEY, Session};
use crate::state::AppState;

/// Flash shown after a successful create.
pub const FLASH_CREATED: &str = "Snippet successfully created!";

/// `GET /snippet/view/{id}`.
///
/// Ids that are not positive integers are treated as missing snippets.
pub async fn view(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = match id.parse::<i64>() {
        Ok(id) if id >= 1 => id,
        _ => return Err(AppError::NotFound),
    };

    let snippet = state.snippets.get(id)?;

    let mut data = state.template_data(&session);
    data.snippet = Some(snippet);

    state.templates.render(StatusCode::OK, "view", &data)
}

/// `GET /snippet/create`: the blank form.
pub async fn create_form(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let mut data = state.template_data(&session);
    data.form = Some(SnippetCreateForm::new());

    state.templates.render(StatusCode::OK, "create", &data)
}

/// `POST /snippet/create`.
///
/// Invalid input re-renders the form with 422 and leaves the store alone.
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    body: Bytes,
) -> Result<Response, AppError> {
    let mut form: SnippetCreateForm = decode_post_form(&body)?;

    if !form.validate() {
        tracing::debug!(errors = ?form.validator.field_errors(), "snippet form rejected");
        let mut data = state.template_data(&session);
        data.form = Some(form);
        return state
            .templates
            .render(StatusCode::UNPROCESSABLE_ENTITY, "create", &data);
    }

    let id = state
        .snippets
        .insert(&form.title, &form.content, form.expires)?;

    session.put(FLASH_KEY, FLASH_CREATED);
    metrics::counter!("snippets_created_total").increment(1);
    tracing::info!(id, expires_days = form.expires, "snippet created");

    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}

/// Decode a urlencoded body into `T`.
///
/// Bad client input is a 400. A broken field table is a bug and panics, which
/// the recovery stage turns into a 500.
fn decode_post_form<T: FormFields>(body: &[u8]) -> Result<T, AppError> {
    match form::decode_urlencoded(body) {
        Ok(form) => Ok(form),
        Err(e) if e.is_fatal() => panic!("{e}"),
        Err(e) => Err(AppError::BadRequest(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snippetbox_core::Field;
    use snippetbox_core::form::FieldParseError;

    #[derive(Default)]
    struct Broken;

    fn ignore(_: &mut Broken, _: &str) -> Result<(), FieldParseError> {
        Ok(())
    }

    impl FormFields for Broken {
        const FIELDS: &'static [Field<Self>] = &[
            Field {
                key: "a",
                parse: ignore,
            },
            Field {
                key: "a",
                parse: ignore,
            },
        ];
    }

    #[test]
    fn malformed_body_is_bad_request() {
        let err = decode_post_form::<SnippetCreateForm>(b"expires=x").err().unwrap();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = decode_post_form::<SnippetCreateForm>(&[0xff, 0xfe]).err().unwrap();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    #[should_panic(expected = "duplicate field key")]
    fn broken_table_panics() {
        let _ = decode_post_form::<Broken>(b"a=1");
    }
}
