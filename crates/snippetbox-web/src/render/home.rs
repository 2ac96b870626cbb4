//! Home page: the latest unexpired snippets.

use maud::html;

use super::components::human_date;
use super::{Page, TemplateData, TemplateError};

/// Render the home page listing.
pub fn render(data: &TemplateData) -> Result<Page, TemplateError> {
    let body = html! {
        h2 { "Latest Snippets" }
        @if data.snippets.is_empty() {
            p { "There's nothing to see here... yet!" }
        } @else {
            table {
                tr {
                    th { "Title" }
                    th { "Created" }
                    th { "ID" }
                }
                @for snippet in &data.snippets {
                    tr {
                        td { a href={ "/snippet/view/" (snippet.id) } { (snippet.title) } }
                        td { (human_date(&snippet.created)) }
                        td { "#" (snippet.id) }
                    }
                }
            }
        }
    };

    Ok(Page {
        title: "Home".to_string(),
        body,
    })
}
