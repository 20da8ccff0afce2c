//! Configuration options for the CFR trainer.
//!
//! This module provides the trainer configuration and the statistics a
//! training run reports back.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cfr::definition::DefinitionError;

/// Default action-node depth down to which branches fan out in parallel.
pub const DEFAULT_PARALLEL_DEPTH: usize = 2;

/// Configuration for the CFR trainer.
///
/// # Example
/// ```
/// use limit_cfr::cfr::TrainerConfig;
///
/// let config = TrainerConfig::default().with_seed(7).with_parallel_depth(0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Random seed for the deck shuffles.
    ///
    /// If set, every run with the same seed deals the same cards and
    /// produces the same strategy. If `None`, the RNG is seeded from entropy.
    pub seed: Option<u64>,

    /// Number of worker threads.
    ///
    /// `None` runs on rayon's global pool; `Some(n)` builds a dedicated pool.
    pub num_threads: Option<usize>,

    /// Action-node depth down to which legal actions are explored in
    /// parallel. Deeper nodes run sequentially; 0 disables parallelism.
    pub parallel_depth: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            num_threads: None,
            parallel_depth: DEFAULT_PARALLEL_DEPTH,
        }
    }
}

impl TrainerConfig {
    /// Create a new TrainerConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fully sequential, seeded configuration for reproducible runs.
    pub fn deterministic(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            parallel_depth: 0,
            ..Default::default()
        }
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder method: set number of threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Builder method: set the parallel fan-out depth.
    pub fn with_parallel_depth(mut self, depth: usize) -> Self {
        self.parallel_depth = depth;
        self
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_threads == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "num_threads",
                message: "thread count must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration file could not be read.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file is not valid JSON for its type.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A loaded game definition failed validation.
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// A setting is out of range.
    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Statistics tracked during CFR training.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Total number of iterations completed, across all `train` calls.
    pub iterations: u64,

    /// Number of action nodes (information sets) in the tree.
    pub action_nodes: usize,

    /// Time spent in the most recent `train` call (in seconds).
    pub elapsed_seconds: f64,

    /// Iterations per second of the most recent `train` call.
    pub iterations_per_second: f64,
}

impl TrainingStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update iterations per second from `batch` iterations over the elapsed time.
    pub fn update_rate(&mut self, batch: u64) {
        if self.elapsed_seconds > 0.0 {
            self.iterations_per_second = batch as f64 / self.elapsed_seconds;
        }
    }
}
