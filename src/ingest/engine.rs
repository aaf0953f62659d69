//! Orchestration of a parallel ingest run.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{Result, SluiceError};
use crate::identity::{IdentityPool, UserAssigner};
use crate::ingest::committer::BatchCommitter;
use crate::ingest::config::IngestConfig;
use crate::ingest::report::{IngestReport, WorkerReport};
use crate::partition::partition;
use crate::record::is_blank;
use crate::storage::{KvStore, StoreConfig, StoreFactory};

/// Runs one worker per partition against a shared store.
pub struct IngestEngine {
    config: IngestConfig,
    store: Arc<dyn KvStore>,
    thread_pool: ThreadPool,
}

impl IngestEngine {
    /// Create an engine over an open store.
    ///
    /// Validates the configuration and creates the target bucket; either
    /// failure aborts before any worker exists.
    pub fn new(config: IngestConfig, store: Arc<dyn KvStore>) -> Result<Self> {
        config.validate()?;

        store.create_bucket(&config.bucket).map_err(|e| {
            SluiceError::storage(format!("failed to create bucket {}: {e}", config.bucket))
        })?;

        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(config.worker_count)
            .thread_name(|i| format!("ingest-worker-{i}"))
            .build()
            .map_err(|e| SluiceError::ThreadPool(format!("Failed to create thread pool: {e}")))?;

        Ok(Self {
            config,
            store,
            thread_pool,
        })
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Ingest `units`, one worker per partition, and wait for all of them.
    ///
    /// Blank units are filtered before partitioning. Fails only if no
    /// non-blank unit remains; failed batches are reported, not returned.
    pub fn run<S: AsRef<str> + Sync>(
        &self,
        identities: &IdentityPool,
        units: &[S],
    ) -> Result<IngestReport> {
        let units: Vec<&str> = units
            .iter()
            .map(|unit| unit.as_ref())
            .filter(|unit: &&str| !is_blank(unit))
            .collect();
        if units.is_empty() {
            return Err(SluiceError::input("input contains no non-blank units"));
        }

        let started_at = Utc::now();
        let timer = Instant::now();

        let partitions = partition(
            units.len(),
            self.config.worker_count,
            self.config.remainder,
        );
        log::info!(
            "Processing {} units with {} workers",
            units.len(),
            partitions.len()
        );

        let (tx, rx) = crossbeam_channel::unbounded::<WorkerReport>();
        let store: &dyn KvStore = self.store.as_ref();
        let bucket = self.config.bucket.as_str();
        let units = &units;

        self.thread_pool.scope(|scope| {
            for part in partitions {
                let tx = tx.clone();
                let users = UserAssigner::for_worker(
                    identities.clone(),
                    part.worker_id,
                    self.config.seed,
                );
                let batch_size = self.config.batch_size;
                let fingerprint = self.config.fingerprint;

                scope.spawn(move |_| {
                    let committer =
                        BatchCommitter::new(part, store, bucket, users, batch_size, fingerprint);
                    let report = committer.run(&units[part.range()]);
                    let _ = tx.send(report);
                });
            }
        });

        // Drop the original sender so the receiver knows when all workers are done
        drop(tx);
        let workers: Vec<WorkerReport> = rx.iter().collect();

        let report = IngestReport::aggregate(
            started_at,
            units.len(),
            self.config.batch_size,
            timer.elapsed(),
            workers,
        );

        log::info!("All workers completed");
        log::info!(
            "Total processing time: {:?} ({} records, {} dropped, {:.0} records/s)",
            report.elapsed,
            report.records_written,
            report.records_dropped,
            report.records_per_second()
        );

        Ok(report)
    }

    /// Flush and close the store.
    pub fn close(self) -> Result<()> {
        self.store.close()
    }
}

/// Open the store, ingest, and close the store again.
///
/// Inputs are checked before the store is touched. Every precondition failure
/// is returned as an error; per-batch failures only show up in the report.
pub fn run_ingest<S: AsRef<str> + Sync>(
    config: IngestConfig,
    store_config: StoreConfig,
    identities: &IdentityPool,
    units: &[S],
) -> Result<IngestReport> {
    config.validate()?;
    if units.iter().all(|unit| is_blank(unit.as_ref())) {
        return Err(SluiceError::input("input contains no non-blank units"));
    }

    let store = StoreFactory::open(store_config)?;
    let engine = IngestEngine::new(config, store)?;
    let report = engine.run(identities, units)?;
    engine.close()?;

    Ok(report)
}
