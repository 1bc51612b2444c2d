//! Configuration types for stock-harvest

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for a harvest run
///
/// All fields have sensible defaults; `HarvestConfig::default()` produces a
/// configuration suitable for a full production run against a well-behaved
/// provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Baseline delay between requests in seconds (default: 1.0)
    ///
    /// The pacing controller decays back toward this value after a stable
    /// run of successes.
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: f64,

    /// Hard lower bound on any computed pacing delay in seconds (default: 0.1)
    #[serde(default = "default_floor_delay")]
    pub floor_delay_secs: f64,

    /// Hard upper bound on any computed pacing delay in seconds (default: 10.0)
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: f64,

    /// Maximum fetch attempts per entity before recording a terminal failure
    /// (default: 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Flush checkpoint and dataset after this many newly processed entities
    /// (default: 10)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Checkpoint file path (default: "./stock_checkpoint.json")
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,

    /// Consolidated dataset path (default: "./stock_base_info.json")
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Smoke-test truncation: process only the first N plus last N entities
    /// of the universe (default: None = full universe)
    #[serde(default)]
    pub test_subset: Option<usize>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: default_base_delay(),
            floor_delay_secs: default_floor_delay(),
            max_delay_secs: default_max_delay(),
            max_retries: default_max_retries(),
            batch_size: default_batch_size(),
            checkpoint_path: default_checkpoint_path(),
            output_path: default_output_path(),
            test_subset: None,
        }
    }
}

impl HarvestConfig {
    /// Validate the configuration
    ///
    /// Returns `Error::Config` naming the offending key when a value is
    /// nonsensical (zero retries, inverted delay bounds, zero batch size).
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(Error::config("max_retries must be at least 1", "max_retries"));
        }
        if self.batch_size == 0 {
            return Err(Error::config("batch_size must be at least 1", "batch_size"));
        }
        if self.floor_delay_secs <= 0.0 {
            return Err(Error::config(
                "floor_delay_secs must be positive",
                "floor_delay_secs",
            ));
        }
        if self.floor_delay_secs > self.max_delay_secs {
            return Err(Error::config(
                format!(
                    "floor_delay_secs ({}) exceeds max_delay_secs ({})",
                    self.floor_delay_secs, self.max_delay_secs
                ),
                "floor_delay_secs",
            ));
        }
        if self.base_delay_secs < self.floor_delay_secs
            || self.base_delay_secs > self.max_delay_secs
        {
            return Err(Error::config(
                "base_delay_secs must lie within [floor_delay_secs, max_delay_secs]",
                "base_delay_secs",
            ));
        }
        Ok(())
    }

    /// Baseline pacing delay as a `Duration`
    pub fn base_delay(&self) -> Duration {
        Duration::from_secs_f64(self.base_delay_secs)
    }
}

fn default_base_delay() -> f64 {
    1.0
}

fn default_floor_delay() -> f64 {
    0.1
}

fn default_max_delay() -> f64 {
    10.0
}

fn default_max_retries() -> u32 {
    3
}

fn default_batch_size() -> usize {
    10
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("./stock_checkpoint.json")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("./stock_base_info.json")
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        HarvestConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_retries() {
        let config = HarvestConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_delay_bounds() {
        let config = HarvestConfig {
            floor_delay_secs: 5.0,
            max_delay_secs: 1.0,
            base_delay_secs: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_base_delay_outside_bounds() {
        let config = HarvestConfig {
            base_delay_secs: 20.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_with_partial_fields() {
        let config: HarvestConfig =
            serde_json::from_str(r#"{"max_retries": 5, "batch_size": 50}"#).unwrap();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.base_delay_secs, 1.0);
        assert_eq!(config.output_path, PathBuf::from("./stock_base_info.json"));
    }
}
