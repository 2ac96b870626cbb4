//! Base layout and shared partials used by every page.

use chrono::{DateTime, Utc};
use maud::{DOCTYPE, Markup, html};

use super::TemplateData;

/// Stylesheet linked from every page, served from the static root.
pub const STYLESHEET: &str = "/static/css/main.css";

/// Render the full document shell around a page body.
///
/// Partials are emitted between the header and `<main>`, in link order.
pub fn base(title: &str, partials: &[Markup], body: Markup, current_year: i32) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " - Snippetbox" }
                link rel="stylesheet" href=(STYLESHEET);
            }
            body {
                header {
                    h1 { a href="/" { "Snippetbox" } }
                }
                @for partial in partials {
                    (partial)
                }
                main {
                    (body)
                }
                footer {
                    "Powered by Rust in " (current_year)
                }
            }
        }
    }
}

/// Site navigation.
pub fn nav(_data: &TemplateData) -> Markup {
    html! {
        nav {
            a href="/" { "Home" }
            a href="/snippet/create" { "Create snippet" }
        }
    }
}

/// One-shot flash banner; empty when there is no flash.
pub fn flash(data: &TemplateData) -> Markup {
    html! {
        @if let Some(message) = &data.flash {
            div class="flash" { (message) }
        }
    }
}

/// Format a timestamp for display, e.g. "17 Oct 2026 at 09:30".
pub fn human_date(t: &DateTime<Utc>) -> String {
    t.format("%d %b %Y at %H:%M").to_string()
}
