//! Single snippet page.

use maud::html;

use super::components::human_date;
use super::{Page, TemplateData, TemplateError};

/// Render the snippet in `data.snippet`.
///
/// Fails if the handler did not supply a snippet.
pub fn render(data: &TemplateData) -> Result<Page, TemplateError> {
    let snippet = data.snippet.as_ref().ok_or_else(|| TemplateError::Execute {
        page: "view",
        reason: "no snippet in template data".to_string(),
    })?;

    let body = html! {
        div class="snippet" {
            div class="metadata" {
                strong { (snippet.title) }
                span { "#" (snippet.id) }
            }
            pre { code { (snippet.content) } }
            div class="metadata" {
                time { "Created: " (human_date(&snippet.created)) }
                time { "Expires: " (human_date(&snippet.expires)) }
            }
        }
    };

    Ok(Page {
        title: format!("Snippet #{}", snippet.id),
        body,
    })
}
