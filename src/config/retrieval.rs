//! Retrieval and orchestration tuning.

use serde::Deserialize;

use super::ConfigError;

fn default_top_k() -> usize {
    3
}

fn default_max_research_iterations() -> usize {
    8
}

fn default_history_limit() -> u32 {
    20
}

/// Tuning knobs for retrieval depth and the research loop.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    top_k: usize,
    #[serde(default = "default_max_research_iterations")]
    max_research_iterations: usize,
    #[serde(default = "default_history_limit")]
    history_limit: u32,
}

impl RetrievalConfig {
    /// Returns how many passages each semantic lookup fetches.
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Returns the cap on Researcher invocations per turn.
    pub fn max_research_iterations(&self) -> usize {
        self.max_research_iterations
    }

    /// Returns the history window loaded per turn.
    pub fn history_limit(&self) -> u32 {
        self.history_limit
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::invalid(
                "retrieval.top_k",
                "must be greater than zero",
            ));
        }
        if self.max_research_iterations == 0 {
            return Err(ConfigError::invalid(
                "retrieval.max_research_iterations",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_research_iterations: default_max_research_iterations(),
            history_limit: default_history_limit(),
        }
    }
}
