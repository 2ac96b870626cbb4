//! Page templates and the buffered renderer.
//!
//! Every page is assembled from three kinds of pieces:
//! - the base layout (document shell, header, footer) in [`components`]
//! - shared partials such as the nav bar and the flash banner
//! - the page-specific fragment (`home`, `view`, `create`)
//!
//! Markup is written with [maud](https://maud.lambda.xyz/), so every fragment
//! is checked at compile time and all dynamic values are HTML-escaped. The
//! [`TemplateCache`] links each page with the partials it names once at
//! startup; a page that names an unknown partial, a duplicate page, or a
//! missing required page fails the build and the server never starts.
//!
//! Rendering executes a page into an in-memory buffer first. The status line
//! and body are only produced once execution succeeded, so a failing page can
//! never leave a committed 200 with half a body behind.

pub mod components;
pub mod create;
pub mod home;
pub mod view;

use std::collections::HashMap;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{Datelike, Utc};
use maud::Markup;
use snippetbox_core::Snippet;

use crate::error::AppError;
use crate::forms::SnippetCreateForm;

/// Page names the router renders. The cache refuses to build without them.
pub const REQUIRED_PAGES: &[&str] = &["home", "view", "create"];

/// Per-render payload. Built fresh for every request.
#[derive(Debug, Default)]
pub struct TemplateData {
    /// Year shown in the footer.
    pub current_year: i32,
    /// One-shot flash message taken from the session.
    pub flash: Option<String>,
    /// Form echoed back to the user, with any field errors.
    pub form: Option<SnippetCreateForm>,
    /// Snippet shown on the view page.
    pub snippet: Option<Snippet>,
    /// Snippets listed on the home page.
    pub snippets: Vec<Snippet>,
}

impl TemplateData {
    /// Create template data for the current year carrying `flash`.
    pub fn new(flash: Option<String>) -> Self {
        Self {
            current_year: Utc::now().year(),
            flash,
            ..Default::default()
        }
    }
}

/// Template build, lookup, or execution failure.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The template set could not be assembled at startup.
    #[error("failed to build template cache: {0}")]
    Build(String),

    /// No page with this name is registered.
    #[error("the template {0} does not exist")]
    NotFound(String),

    /// A page failed while executing against its data.
    #[error("failed to execute template {page}: {reason}")]
    Execute {
        /// Page being rendered.
        page: &'static str,
        /// What went wrong.
        reason: String,
    },
}

/// Output of a page fragment.
#[derive(Debug)]
pub struct Page {
    /// Document title, without the site suffix.
    pub title: String,
    /// Body placed inside `<main>`.
    pub body: Markup,
}

/// Renders a page fragment.
pub type PageFn = fn(&TemplateData) -> Result<Page, TemplateError>;

/// Renders a shared partial.
pub type PartialFn = fn(&TemplateData) -> Markup;

/// A named shared partial.
pub struct PartialDef {
    pub name: &'static str,
    pub render: PartialFn,
}

/// A named page and the partials it is linked with, in order.
pub struct PageDef {
    pub name: &'static str,
    pub partials: &'static [&'static str],
    pub render: PageFn,
}

/// Partials available to pages.
pub const PARTIALS: &[PartialDef] = &[
    PartialDef {
        name: "nav",
        render: components::nav,
    },
    PartialDef {
        name: "flash",
        render: components::flash,
    },
];

/// Pages served by the application.
pub const PAGES: &[PageDef] = &[
    PageDef {
        name: "home",
        partials: &["nav", "flash"],
        render: home::render,
    },
    PageDef {
        name: "view",
        partials: &["nav", "flash"],
        render: view::render,
    },
    PageDef {
        name: "create",
        partials: &["nav", "flash"],
        render: create::render,
    },
];

/// A page linked with its layout and partials, ready to execute.
pub struct TemplateSet {
    name: &'static str,
    partials: Vec<PartialFn>,
    page: PageFn,
}

impl TemplateSet {
    /// The page name this set was built for.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the base entry point into a buffer.
    pub fn execute(&self, data: &TemplateData) -> Result<String, TemplateError> {
        let page = (self.page)(data)?;
        let partials: Vec<Markup> = self.partials.iter().map(|partial| partial(data)).collect();

        Ok(components::base(&page.title, &partials, page.body, data.current_year).into_string())
    }
}

/// Immutable mapping from page name to its linked template set.
pub struct TemplateCache {
    sets: HashMap<&'static str, TemplateSet>,
}

impl TemplateCache {
    /// Build the cache for the application's pages.
    pub fn new() -> Result<Self, TemplateError> {
        Self::build(PARTIALS, PAGES, REQUIRED_PAGES)
    }

    /// Link `pages` against `partials`, checking that every name in
    /// `required` ends up in the cache.
    pub fn build(
        partials: &[PartialDef],
        pages: &[PageDef],
        required: &[&str],
    ) -> Result<Self, TemplateError> {
        let mut partial_index: HashMap<&str, PartialFn> = HashMap::new();
        for partial in partials {
            if partial_index.insert(partial.name, partial.render).is_some() {
                return Err(TemplateError::Build(format!(
                    "partial {:?} is defined twice",
                    partial.name
                )));
            }
        }

        let mut sets = HashMap::new();
        for page in pages {
            let linked = page
                .partials
                .iter()
                .map(|name| {
                    partial_index.get(name).copied().ok_or_else(|| {
                        TemplateError::Build(format!(
                            "page {:?} uses unknown partial {:?}",
                            page.name, name
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let set = TemplateSet {
                name: page.name,
                partials: linked,
                page: page.render,
            };
            if sets.insert(page.name, set).is_some() {
                return Err(TemplateError::Build(format!(
                    "page {:?} is defined twice",
                    page.name
                )));
            }
        }

        if let Some(missing) = required.iter().find(|name| !sets.contains_key(*name)) {
            return Err(TemplateError::Build(format!(
                "required page {missing:?} is not defined"
            )));
        }

        tracing::info!(pages = sets.len(), "template cache built");

        Ok(Self { sets })
    }

    /// Whether a page named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.sets.contains_key(name)
    }

    /// Render `page` with `data` and respond with `status`.
    ///
    /// Nothing is written unless the page executed completely.
    pub fn render(
        &self,
        status: StatusCode,
        page: &str,
        data: &TemplateData,
    ) -> Result<Response, AppError> {
        let set = self
            .sets
            .get(page)
            .ok_or_else(|| TemplateError::NotFound(page.to_string()))?;

        let buffer = set.execute(data)?;

        Ok((
            status,
            [(
                CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            )],
            buffer,
        )
            .into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use maud::html;

    fn snippet(id: i64, title: &str, content: &str) -> Snippet {
        let created = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        Snippet {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created,
            expires: created + chrono::Duration::days(7),
        }
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn empty_page(_: &TemplateData) -> Result<Page, TemplateError> {
        Ok(Page {
            title: "Empty".to_string(),
            body: html! {},
        })
    }

    fn nothing(_: &TemplateData) -> Markup {
        html! {}
    }

    #[test]
    fn builds_required_pages() {
        let cache = TemplateCache::new().unwrap();
        for name in REQUIRED_PAGES {
            assert!(cache.contains(name), "missing {name}");
        }
        assert!(!cache.contains("missing"));
        assert_eq!(cache.sets["view"].name(), "view");
    }

    #[test]
    fn build_rejects_unknown_partial() {
        let pages = [PageDef {
            name: "home",
            partials: &["sidebar"],
            render: empty_page,
        }];
        let err = TemplateCache::build(PARTIALS, &pages, &[]).err().unwrap();
        assert!(err.to_string().contains("sidebar"));
    }

    #[test]
    fn build_rejects_duplicate_page() {
        let pages = [
            PageDef {
                name: "home",
                partials: &[],
                render: empty_page,
            },
            PageDef {
                name: "home",
                partials: &[],
                render: empty_page,
            },
        ];
        assert!(matches!(
            TemplateCache::build(PARTIALS, &pages, &[]),
            Err(TemplateError::Build(_))
        ));
    }

    #[test]
    fn build_rejects_duplicate_partial() {
        let partials = [
            PartialDef {
                name: "nav",
                render: nothing,
            },
            PartialDef {
                name: "nav",
                render: nothing,
            },
        ];
        assert!(TemplateCache::build(&partials, &[], &[]).is_err());
    }

    #[test]
    fn build_rejects_missing_required_page() {
        let pages = [PageDef {
            name: "home",
            partials: &[],
            render: empty_page,
        }];
        let err = TemplateCache::build(PARTIALS, &pages, REQUIRED_PAGES)
            .err()
            .unwrap();
        assert!(err.to_string().contains("view"));
    }

    #[tokio::test]
    async fn render_unknown_page_is_server_error() {
        let cache = TemplateCache::new().unwrap();
        let err = cache
            .render(StatusCode::OK, "nope", &TemplateData::new(None))
            .err()
            .expect("unknown page must fail");
        assert!(matches!(err, AppError::Template(TemplateError::NotFound(_))));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body_string(response).await.contains("nope"));
    }

    #[tokio::test]
    async fn execution_failure_commits_nothing() {
        let cache = TemplateCache::new().unwrap();
        // The view page needs a snippet.
        let result = cache.render(StatusCode::OK, "view", &TemplateData::new(Some("hi".into())));

        let err = result.err().expect("view without a snippet must fail");
        assert!(matches!(err, AppError::Template(TemplateError::Execute { .. })));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(response).await;
        assert!(!body.contains("class=\"flash\""));
        assert!(!body.contains("<nav>"));
    }

    #[tokio::test]
    async fn render_uses_requested_status() {
        let cache = TemplateCache::new().unwrap();
        let mut data = TemplateData::new(None);
        data.form = Some(SnippetCreateForm::default());

        let response = cache
            .render(StatusCode::UNPROCESSABLE_ENTITY, "create", &data)
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn home_lists_snippets_with_layout() {
        let cache = TemplateCache::new().unwrap();
        let mut data = TemplateData::new(Some("Snippet successfully created!".into()));
        data.snippets = vec![snippet(2, "Second", "b"), snippet(1, "First", "a")];

        let response = cache.render(StatusCode::OK, "home", &data).unwrap();
        let body = body_string(response).await;

        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("Snippet successfully created!"));
        assert!(body.contains("href=\"/snippet/view/2\""));
        assert!(body.find("Second").unwrap() < body.find("First").unwrap());
        assert!(body.contains(&data.current_year.to_string()));
    }

    #[tokio::test]
    async fn dynamic_values_are_escaped() {
        let cache = TemplateCache::new().unwrap();
        let mut data = TemplateData::new(None);
        data.snippet = Some(snippet(1, "<b>bold</b>", "<script>alert(1)</script>"));

        let response = cache.render(StatusCode::OK, "view", &data).unwrap();
        let body = body_string(response).await;

        assert!(!body.contains("<script>alert(1)</script>"));
        assert!(body.contains("&lt;script&gt;"));
        assert!(body.contains("&lt;b&gt;bold&lt;/b&gt;"));
    }
}
