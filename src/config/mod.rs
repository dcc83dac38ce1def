//! Application configuration.
//!
//! Loaded from environment variables with the `SCRIBE` prefix and `__` as
//! the nesting separator, e.g. `SCRIBE__AI__API_KEY` or
//! `SCRIBE__SERVER__PORT`. Every field except the API key has a default
//! suitable for local development.

mod ai;
mod database;
mod error;
mod retrieval;
mod server;

pub use ai::AiConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use retrieval::RetrievalConfig;
pub use server::ServerConfig;

use serde::Deserialize;

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub ai: AiConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

impl AppConfig {
    /// Loads configuration from the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let source = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("SCRIBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = source.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ai.validate()?;
        self.retrieval.validate()?;
        self.server.validate()?;
        Ok(())
    }
}
