use crate::error::{EngineError, Result};
use autolink_matcher::ScanSettings;
use serde::{Deserialize, Serialize};

/// Operator-facing engine settings, injected into every render
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Document-wide cap for rules that set no `max_per_page` of
    /// their own; `None` disables the global cap
    pub default_page_cap: Option<u32>,

    /// Require keyword matches to sit on word boundaries
    pub word_boundaries: bool,

    /// Strip diacritics from corpus and patterns before matching
    pub fold_diacritics: bool,

    /// Process long documents in bounded-size block chunks
    pub chunking: bool,

    /// Blocks per chunk when chunking is enabled
    pub chunk_block_limit: usize,

    /// Cache rendered output keyed by (content id, snapshot version)
    pub cache_enabled: bool,

    /// Maximum cached renderings
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_page_cap: None,
            word_boundaries: true,
            fold_diacritics: false,
            chunking: false,
            chunk_block_limit: 64,
            cache_enabled: true,
            cache_capacity: 128,
        }
    }
}

impl EngineConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunking && self.chunk_block_limit == 0 {
            return Err(EngineError::invalid_config(
                "chunk_block_limit must be > 0 when chunking is enabled",
            ));
        }
        if self.cache_enabled && self.cache_capacity == 0 {
            return Err(EngineError::invalid_config(
                "cache_capacity must be > 0 when the cache is enabled",
            ));
        }
        if self.default_page_cap == Some(0) {
            return Err(EngineError::invalid_config(
                "default_page_cap of 0 would disable the engine; unset it instead",
            ));
        }
        Ok(())
    }

    /// Parse a configuration from TOML and validate it
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// The matcher settings slice of this configuration
    #[must_use]
    pub const fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            word_boundaries: self.word_boundaries,
            fold_diacritics: self.fold_diacritics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_chunk_limit_rejected() {
        let config = EngineConfig {
            chunking: true,
            chunk_block_limit: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_cache_capacity_rejected() {
        let config = EngineConfig {
            cache_enabled: true,
            cache_capacity: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            default_page_cap = 5
            word_boundaries = true
            fold_diacritics = true
            chunking = true
            chunk_block_limit = 32
            "#,
        )
        .unwrap();

        assert_eq!(config.default_page_cap, Some(5));
        assert!(config.fold_diacritics);
        assert_eq!(config.chunk_block_limit, 32);
        // Unspecified fields take defaults
        assert!(config.cache_enabled);
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        let err = EngineConfig::from_toml_str("default_page_cap = 0").unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }
}
