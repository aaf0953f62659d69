//! Per-worker and per-run ingest statistics.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::partition::Partition;

/// What one worker did with its partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub worker_id: usize,

    /// Range of the filtered input this worker owned.
    pub partition: Partition,

    /// Units read from the partition, blank ones included.
    pub units_seen: u64,

    /// Blank units skipped without consuming a key.
    pub units_skipped: u64,

    /// Records inside successfully committed batches.
    pub records_written: u64,

    /// Records lost to encoding failures or failed commits.
    pub records_dropped: u64,

    pub batches_committed: u64,
    pub batches_failed: u64,

    /// Wall time from the worker's first unit to its final flush.
    pub elapsed: Duration,
}

impl WorkerReport {
    pub fn new(worker_id: usize, partition: Partition) -> Self {
        Self {
            worker_id,
            partition,
            units_seen: 0,
            units_skipped: 0,
            records_written: 0,
            records_dropped: 0,
            batches_committed: 0,
            batches_failed: 0,
            elapsed: Duration::ZERO,
        }
    }
}

/// Aggregate result of one ingest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,

    /// Non-blank units handed to the workers.
    pub total_units: usize,

    pub worker_count: usize,
    pub batch_size: usize,
    pub records_written: u64,
    pub records_dropped: u64,
    pub batches_committed: u64,
    pub batches_failed: u64,
    pub elapsed: Duration,

    /// One report per worker, ordered by worker id.
    pub workers: Vec<WorkerReport>,
}

impl IngestReport {
    /// Sum the worker reports into a run report.
    pub fn aggregate(
        started_at: DateTime<Utc>,
        total_units: usize,
        batch_size: usize,
        elapsed: Duration,
        mut workers: Vec<WorkerReport>,
    ) -> Self {
        workers.sort_by_key(|w| w.worker_id);

        Self {
            run_id: Uuid::new_v4(),
            started_at,
            total_units,
            worker_count: workers.len(),
            batch_size,
            records_written: workers.iter().map(|w| w.records_written).sum(),
            records_dropped: workers.iter().map(|w| w.records_dropped).sum(),
            batches_committed: workers.iter().map(|w| w.batches_committed).sum(),
            batches_failed: workers.iter().map(|w| w.batches_failed).sum(),
            elapsed,
            workers,
        }
    }

    /// Committed records per second of wall time.
    pub fn records_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.records_written as f64 / secs
        } else {
            0.0
        }
    }

    /// Whether every unit made it into the store.
    pub fn is_complete(&self) -> bool {
        self.records_dropped == 0 && self.records_written == self.total_units as u64
    }
}
