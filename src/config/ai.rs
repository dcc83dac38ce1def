//! Model provider configuration.

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::ConfigError;

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

/// Configuration for the OpenAI-compatible model endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    api_key: Secret<String>,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    max_retries: u32,
}

impl AiConfig {
    /// Creates a config programmatically (tests).
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: model.into(),
            base_url: base_url.into(),
            request_timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }

    /// Returns the API key.
    pub fn api_key(&self) -> &Secret<String> {
        &self.api_key
    }

    /// Returns the model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the endpoint base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the per-request timeout in seconds.
    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
    }

    /// Returns the retry budget for transient failures.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::invalid("ai.api_key", "must not be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::invalid("ai.model", "must not be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "ai.request_timeout_secs",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = AiConfig::new("sk-test", default_model(), default_base_url());
        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout_secs(), 60);
        assert_eq!(config.max_retries(), 2);
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let config = AiConfig::new("  ", "gpt-4o-mini", "https://api.openai.com/v1");
        assert!(config.validate().is_err());
    }

    #[test]
    fn api_key_does_not_leak_through_debug() {
        let config = AiConfig::new("sk-secret-value", "gpt-4o-mini", "https://api.openai.com/v1");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret-value"));
    }
}
