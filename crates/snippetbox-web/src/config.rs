//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use snippetbox_core::DEFAULT_LATEST_LIMIT;

/// Default session lifetime: 12 hours.
pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(12 * 60 * 60);

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:4000").
    pub bind_addr: String,

    /// Directory served under `/static/`.
    pub static_dir: PathBuf,

    /// Path to the SQLite snippet database.
    pub database_path: PathBuf,

    /// Maximum number of snippets shown on the home page.
    pub latest_limit: usize,

    /// How long an idle session stays valid.
    pub session_lifetime: Duration,

    /// Port for the Prometheus `/metrics` endpoint, if enabled.
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:4000".to_string(),
            static_dir: PathBuf::from("./ui/static"),
            database_path: PathBuf::from("./data/snippetbox.db"),
            latest_limit: DEFAULT_LATEST_LIMIT,
            session_lifetime: DEFAULT_SESSION_LIFETIME,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - None (all have defaults for local development)
    ///
    /// Optional:
    /// - `SNIPPETBOX_BIND_ADDR`: Server bind address (default: "0.0.0.0:4000")
    /// - `SNIPPETBOX_STATIC_DIR`: Static asset root (default: "./ui/static")
    /// - `SNIPPETBOX_DATABASE_PATH`: SQLite file (default: "./data/snippetbox.db")
    /// - `SNIPPETBOX_LATEST_LIMIT`: Snippets on the home page (default: 10)
    /// - `SNIPPETBOX_SESSION_LIFETIME_SECS`: Session lifetime (default: 43200)
    /// - `SNIPPETBOX_METRICS_PORT`: Enables the Prometheus endpoint on this port
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = std::env::var("SNIPPETBOX_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let static_dir = std::env::var("SNIPPETBOX_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        let database_path = std::env::var("SNIPPETBOX_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let latest_limit = match std::env::var("SNIPPETBOX_LATEST_LIMIT") {
            Ok(raw) => {
                let limit: usize = raw.trim().parse().map_err(|e| {
                    anyhow::anyhow!("SNIPPETBOX_LATEST_LIMIT must be a positive integer: {e}")
                })?;
                if limit == 0 {
                    anyhow::bail!("SNIPPETBOX_LATEST_LIMIT must be at least 1");
                }
                limit
            }
            Err(_) => defaults.latest_limit,
        };

        let session_lifetime = match std::env::var("SNIPPETBOX_SESSION_LIFETIME_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|e| {
                    anyhow::anyhow!("SNIPPETBOX_SESSION_LIFETIME_SECS must be an integer: {e}")
                })?;
                if secs == 0 {
                    anyhow::bail!("SNIPPETBOX_SESSION_LIFETIME_SECS must be at least 1");
                }
                Duration::from_secs(secs)
            }
            Err(_) => defaults.session_lifetime,
        };

        let metrics_port = std::env::var("SNIPPETBOX_METRICS_PORT")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.trim().parse::<u16>())
            .transpose()
            .map_err(|e| anyhow::anyhow!("SNIPPETBOX_METRICS_PORT must be a port number: {e}"))?;

        tracing::info!(
            bind_addr = %bind_addr,
            static_dir = %static_dir.display(),
            database_path = %database_path.display(),
            latest_limit,
            session_lifetime_secs = session_lifetime.as_secs(),
            metrics_port = ?metrics_port,
            "configuration loaded"
        );

        Ok(Self {
            bind_addr,
            static_dir,
            database_path,
            latest_limit,
            session_lifetime,
            metrics_port,
        })
    }
}
