//! Snippetbox web service.
//!
//! Serves short text snippets that expire after a chosen number of days:
//! - `GET /` lists the latest snippets
//! - `GET /snippet/view/{id}` shows one snippet
//! - `GET|POST /snippet/create` shows and handles the submission form
//! - `GET /static/{*path}` serves stylesheets and images
//!
//! Pages are rendered from [`render::TemplateCache`], sessions carry one-shot
//! flash messages, and every request passes through the stages in
//! [`middleware`].

pub mod config;
pub mod error;
pub mod forms;
pub mod metrics;
pub mod middleware;
pub mod render;
pub mod routes;
pub mod session;
pub mod state;

pub use config::Config;
pub use error::AppError;
pub use routes::router;
pub use state::AppState;
