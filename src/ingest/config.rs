//! Configuration for ingest runs.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SluiceError};
use crate::input::Tokenization;
use crate::partition::RemainderPolicy;

/// Default number of concurrent workers.
pub const DEFAULT_WORKER_COUNT: usize = 16;

/// Default number of records per transaction.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default bucket that receives the records.
pub const DEFAULT_BUCKET: &str = "messages";

/// Configuration for an ingest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Number of workers, one per partition.
    pub worker_count: usize,

    /// Maximum number of records committed per transaction.
    pub batch_size: usize,

    /// Bucket the records are written to.
    pub bucket: String,

    /// Whether records carry a SHA-256 fingerprint of their body.
    pub fingerprint: bool,

    /// How the corpus is split into units.
    pub tokenization: Tokenization,

    /// Which partitions take the leftover units.
    pub remainder: RemainderPolicy,

    /// Fixed base seed for identity assignment. `None` seeds from the clock.
    pub seed: Option<u64>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            batch_size: DEFAULT_BATCH_SIZE,
            bucket: DEFAULT_BUCKET.to_string(),
            fingerprint: true,
            tokenization: Tokenization::default(),
            remainder: RemainderPolicy::default(),
            seed: None,
        }
    }
}

impl IngestConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Reject configurations no run can start with.
    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(SluiceError::invalid_config("worker_count must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(SluiceError::invalid_config("batch_size must be at least 1"));
        }
        if self.bucket.is_empty() {
            return Err(SluiceError::invalid_config("bucket name must not be empty"));
        }
        Ok(())
    }

    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_bucket<S: Into<String>>(mut self, bucket: S) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: bool) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    pub fn with_tokenization(mut self, tokenization: Tokenization) -> Self {
        self.tokenization = tokenization;
        self
    }

    pub fn with_remainder(mut self, remainder: RemainderPolicy) -> Self {
        self.remainder = remainder;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
