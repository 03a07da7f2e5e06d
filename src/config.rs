use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

use crate::dedup::models::{DeduplicationOptions, ResolutionStrategy, SimilarityMode};

/// Process-level defaults for the deduplication engine.
///
/// Loaded once at startup; per-request options derived from it can still
/// be overridden by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum aggregate similarity score for clustering.
    pub default_threshold: f64,

    /// Similarity mode used when the caller does not pick one.
    pub default_mode: SimilarityMode,

    /// Resolution strategy used when the caller does not pick one.
    pub default_strategy: ResolutionStrategy,

    /// Upper bound on the number of records per analysis batch.
    pub max_documents: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_threshold: 85.0,
            default_mode: SimilarityMode::Fuzzy,
            default_strategy: ResolutionStrategy::KeepFirst,
            max_documents: 500,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let mut config = Self::default();

        if let Ok(threshold) = env::var("DEDUP_THRESHOLD") {
            if let Ok(value) = threshold.parse() {
                config.default_threshold = value;
            }
        }
        if let Ok(mode) = env::var("DEDUP_SIMILARITY_MODE") {
            if let Ok(value) = mode.parse() {
                config.default_mode = value;
            }
        }
        if let Ok(strategy) = env::var("DEDUP_STRATEGY") {
            if let Ok(value) = strategy.parse() {
                config.default_strategy = value;
            }
        }
        if let Ok(max) = env::var("DEDUP_MAX_DOCUMENTS") {
            if let Ok(value) = max.parse() {
                config.max_documents = value;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.default_threshold) {
            anyhow::bail!(
                "default_threshold must be within [0,100], got {}",
                self.default_threshold
            );
        }
        if self.max_documents == 0 {
            anyhow::bail!("max_documents must be greater than zero");
        }
        Ok(())
    }

    /// Analysis options seeded from these defaults.
    pub fn options(&self) -> DeduplicationOptions {
        DeduplicationOptions {
            similarity_mode: self.default_mode,
            threshold: self.default_threshold,
            strategy: self.default_strategy,
            max_documents: self.max_documents,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_threshold, 85.0);
    }

    #[test]
    fn validate_rejects_out_of_range_threshold() {
        let config = EngineConfig {
            default_threshold: 120.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_batch_cap() {
        let config = EngineConfig {
            max_documents: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn options_carry_the_configured_defaults() {
        let config = EngineConfig {
            default_threshold: 92.5,
            default_strategy: ResolutionStrategy::KeepNewest,
            ..Default::default()
        };
        let options = config.options();
        assert_eq!(options.threshold, 92.5);
        assert_eq!(options.strategy, ResolutionStrategy::KeepNewest);
        assert!(options.include_keys.is_none());
    }
}
