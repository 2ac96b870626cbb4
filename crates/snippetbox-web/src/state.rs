//! Shared application state.

use std::sync::Arc;

use snippetbox_core::{SnippetStore, SqliteSnippetStore};

use crate::config::Config;
use crate::render::{TemplateCache, TemplateData};
use crate::session::{FLASH_KEY, Session, SessionManager};

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Snippet persistence.
    pub snippets: Arc<dyn SnippetStore>,
    /// Page templates, built once at startup.
    pub templates: Arc<TemplateCache>,
    /// Session loading and commit.
    pub sessions: SessionManager,
}

impl AppState {
    /// Open the database and build the template cache.
    ///
    /// Fails if either cannot be set up; the server must not start then.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = SqliteSnippetStore::open(&config.database_path)?
            .with_latest_limit(config.latest_limit)?;
        let templates = TemplateCache::new()?;
        let sessions = SessionManager::in_memory(config.session_lifetime);

        Ok(Self::from_parts(config, Arc::new(store), templates, sessions))
    }

    /// Assemble state from already constructed parts.
    pub fn from_parts(
        config: Config,
        snippets: Arc<dyn SnippetStore>,
        templates: TemplateCache,
        sessions: SessionManager,
    ) -> Self {
        Self {
            config: Arc::new(config),
            snippets,
            templates: Arc::new(templates),
            sessions,
        }
    }

    /// Fresh template data for this request, taking any pending flash.
    pub fn template_data(&self, session: &Session) -> TemplateData {
        TemplateData::new(session.pop(FLASH_KEY))
    }
}
