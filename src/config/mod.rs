//! Training configuration and builder.
//!
//! This module provides the configuration structure consumed by the
//! training loop, a builder with validation, and JSON round-tripping for
//! driver processes that persist their settings.

use crate::core::constants::*;
use crate::core::error::{Result, SpdtError};

use serde::{Deserialize, Serialize};

/// Configuration for streaming decision tree training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Cap on concurrently-growing leaves per round and on the global
    /// labeled-leaf count.
    pub max_num_leaves: usize,
    /// Maximum node depth (`None` = unlimited).
    pub max_depth: Option<usize>,
    /// Leaves with at most this many samples terminate without a split.
    pub min_node_size: usize,
    /// Per-histogram bin capacity.
    pub max_bin_size: usize,
    /// Minimum information gain required to split a node.
    pub min_gain: f64,
    /// Number of features in the dataset.
    pub num_features: usize,
    /// Number of classes. The training contract is binary; any other
    /// value is rejected by validation.
    pub num_classes: usize,
    /// Worker threads for histogram compression and split evaluation
    /// (0 = all available cores, 1 = fully sequential).
    pub num_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_num_leaves: DEFAULT_MAX_NUM_LEAVES,
            max_depth: None,
            min_node_size: DEFAULT_MIN_NODE_SIZE,
            max_bin_size: DEFAULT_MAX_BIN_SIZE,
            min_gain: DEFAULT_MIN_GAIN,
            num_features: 0,
            num_classes: NUM_CLASSES,
            num_threads: DEFAULT_NUM_THREADS,
        }
    }
}

impl Config {
    /// Validates the configuration, returning a typed error for the first
    /// violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.max_num_leaves < 2 {
            return Err(SpdtError::invalid_parameter(
                "max_num_leaves",
                self.max_num_leaves.to_string(),
                "must be at least 2",
            ));
        }
        if let Some(depth) = self.max_depth {
            if depth == 0 {
                return Err(SpdtError::invalid_parameter(
                    "max_depth",
                    "0",
                    "must be at least 1 when set",
                ));
            }
        }
        if self.max_bin_size < 2 {
            return Err(SpdtError::invalid_parameter(
                "max_bin_size",
                self.max_bin_size.to_string(),
                "must be at least 2",
            ));
        }
        if !(self.min_gain >= 0.0) {
            return Err(SpdtError::invalid_parameter(
                "min_gain",
                self.min_gain.to_string(),
                "must be non-negative and finite",
            ));
        }
        if self.num_features == 0 {
            return Err(SpdtError::invalid_parameter(
                "num_features",
                "0",
                "must be at least 1",
            ));
        }
        if self.num_classes != NUM_CLASSES {
            return Err(SpdtError::invalid_parameter(
                "num_classes",
                self.num_classes.to_string(),
                "binary classification requires exactly 2 classes",
            ));
        }
        Ok(())
    }

    /// Effective worker count, resolving 0 to the number of cores.
    pub fn effective_num_threads(&self) -> usize {
        if self.num_threads == 0 {
            num_cpus::get()
        } else {
            self.num_threads
        }
    }

    /// Serializes the configuration as a JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SpdtError::config(format!("failed to serialize config: {}", e)))
    }

    /// Deserializes a configuration from a JSON string and validates it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| SpdtError::config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

/// Builder for [`Config`] with validation at build time.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a builder seeded with the default configuration.
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Sets the per-round and global leaf cap.
    pub fn max_num_leaves(mut self, max_num_leaves: usize) -> Self {
        self.config.max_num_leaves = max_num_leaves;
        self
    }

    /// Sets the maximum node depth (`None` disables the cap).
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Sets the minimum node size.
    pub fn min_node_size(mut self, min_node_size: usize) -> Self {
        self.config.min_node_size = min_node_size;
        self
    }

    /// Sets the per-histogram bin capacity.
    pub fn max_bin_size(mut self, max_bin_size: usize) -> Self {
        self.config.max_bin_size = max_bin_size;
        self
    }

    /// Sets the minimum split gain.
    pub fn min_gain(mut self, min_gain: f64) -> Self {
        self.config.min_gain = min_gain;
        self
    }

    /// Sets the number of features.
    pub fn num_features(mut self, num_features: usize) -> Self {
        self.config.num_features = num_features;
        self
    }

    /// Sets the worker thread count (0 = all cores).
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.config.num_threads = num_threads;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
