//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::store::PdfStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    http: reqwest::Client,
    store: PdfStore,
}

impl AppState {
    /// Create a new application state with a shared outbound HTTP client.
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let store = PdfStore::new(config.library.database_file.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                http,
                store,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the outbound HTTP client
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Get the metadata store
    pub fn store(&self) -> &PdfStore {
        &self.inner.store
    }
}
