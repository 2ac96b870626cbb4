//! Snippet submission form.

use maud::{Markup, html};

use super::{Page, TemplateData, TemplateError};
use crate::forms::{EXPIRY_CHOICES, SnippetCreateForm};

/// Render the create form in `data.form`, including any field errors.
pub fn render(data: &TemplateData) -> Result<Page, TemplateError> {
    let form = data.form.as_ref().ok_or_else(|| TemplateError::Execute {
        page: "create",
        reason: "no form in template data".to_string(),
    })?;

    let body = html! {
        form action="/snippet/create" method="POST" {
            div {
                label { "Title:" }
                (field_error(form, "title"))
                input type="text" name="title" value=(form.title);
            }
            div {
                label { "Content:" }
                (field_error(form, "content"))
                textarea name="content" { (form.content) }
            }
            div {
                label { "Delete in:" }
                (field_error(form, "expires"))
                @for (days, caption) in EXPIRY_CHOICES {
                    input type="radio" name="expires" value=(days) checked[form.expires == *days];
                    " " (caption) " "
                }
            }
            div {
                input type="submit" value="Publish snippet";
            }
        }
    };

    Ok(Page {
        title: "Create a New Snippet".to_string(),
        body,
    })
}

fn field_error(form: &SnippetCreateForm, key: &str) -> Markup {
    html! {
        @if let Some(message) = form.validator.field_error(key) {
            label class="error" { (message) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_form_checks_one_year() {
        let data = TemplateData {
            form: Some(SnippetCreateForm::new()),
            ..Default::default()
        };
        let body = render(&data).unwrap().body.into_string();
        assert!(body.contains(r#"value="365" checked"#));
        assert!(!body.contains(r#"value="7" checked"#));
    }

    #[test]
    fn echoes_values_and_errors() {
        let mut form = SnippetCreateForm {
            title: "My title".to_string(),
            content: "Body & soul".to_string(),
            expires: 7,
            ..Default::default()
        };
        form.validator.add_field_error("content", "This field cannot be blank");

        let data = TemplateData {
            form: Some(form),
            ..Default::default()
        };
        let body = render(&data).unwrap().body.into_string();

        assert!(body.contains(r#"value="My title""#));
        assert!(body.contains("Body &amp; soul"));
        assert!(body.contains(r#"<label class="error">This field cannot be blank</label>"#));
        assert!(body.contains(r#"value="7" checked"#));
    }

    #[test]
    fn missing_form_is_an_execution_error() {
        let err = render(&TemplateData::default()).unwrap_err();
        assert!(matches!(err, TemplateError::Execute { page: "create", .. }));
    }
}
