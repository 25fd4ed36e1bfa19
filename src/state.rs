use crate::config::Config;
use crate::content::Catalog;
use crate::metrics::ProxyMetrics;
use crate::session::{InMemorySessionStore, SessionStore};
use crate::translation::Translator;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Shared handles for every request handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: reqwest::Client,
    pub catalog: Arc<Catalog>,
    pub translator: Arc<Translator>,
    pub sessions: Arc<dyn SessionStore>,
    pub metrics: Arc<ProxyMetrics>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config, catalog: Catalog) -> Self {
        let sessions = InMemorySessionStore::new(config.session_ttl, config.max_sessions);
        Self::with_sessions(config, catalog, Arc::new(sessions))
    }

    pub fn with_sessions(config: Config, catalog: Catalog, sessions: Arc<dyn SessionStore>) -> Self {
        let translator = Translator::from_config(&config);
        Self {
            translator: Arc::new(translator),
            config: Arc::new(config),
            client: reqwest::Client::new(),
            catalog: Arc::new(catalog),
            sessions,
            metrics: Arc::new(ProxyMetrics::new()),
            started_at: Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
