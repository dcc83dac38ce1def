//! Database configuration.

use serde::Deserialize;

fn default_url() -> String {
    "sqlite://data/kb_scribe.db".to_string()
}

/// Configuration for the SQLite metadata store.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_url")]
    url: String,
}

impl DatabaseConfig {
    /// Returns the connection URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}
