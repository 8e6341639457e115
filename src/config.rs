//! Batching configuration for cursor-producing constructors.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Batch size used when none is configured.
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// Controls how many elements a constructor packs into one batch variant.
///
/// ```rust
/// use pullstream::BatchConfig;
///
/// let config = BatchConfig::new(16).unwrap();
/// assert_eq!(config.batch_size(), 16);
/// assert!(BatchConfig::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    batch_size: usize,
}

impl BatchConfig {
    /// Creates a configuration, rejecting a zero batch size.
    pub fn new(batch_size: usize) -> Result<Self, ConfigError> {
        let config = Self { batch_size };
        config.validate()?;
        Ok(config)
    }

    /// Checks a configuration obtained through deserialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }
        Ok(())
    }

    /// Effective batch size, never zero.
    pub fn batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_batch_size() {
        assert_eq!(BatchConfig::default().batch_size(), DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        assert_eq!(BatchConfig::new(0), Err(ConfigError::InvalidBatchSize(0)));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: BatchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, BatchConfig::default());

        let config: BatchConfig = serde_json::from_str(r#"{"batch_size": 7}"#).unwrap();
        assert_eq!(config.batch_size(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialized_zero_is_caught_by_validate() {
        let config: BatchConfig = serde_json::from_str(r#"{"batch_size": 0}"#).unwrap();
        assert!(config.validate().is_err());
        assert_eq!(config.batch_size(), 1);
    }
}
