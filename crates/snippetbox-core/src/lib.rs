//! Core types and storage for snippetbox.
//!
//! This crate provides:
//! - A field-error accumulating [`Validator`] and the predicates used by forms
//! - A declarative form decoder driven by per-form field tables
//! - The [`Snippet`] model and the expiry-aware [`SnippetStore`] contract
//! - A SQLite-backed store implementation
//! - An injectable [`Clock`] so expiry can be tested deterministically
//!
//! Nothing in here knows about HTTP; the web crate owns the request pipeline.

pub mod clock;
mod error;
pub mod form;
pub mod store;
pub mod validator;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use form::{DecodeError, Field, FieldParseError, FormFields};
pub use store::{DEFAULT_LATEST_LIMIT, Snippet, SnippetStore, SqliteSnippetStore, StoreError};
pub use validator::Validator;
