//! Per-worker batching of records into store transactions.
//!
//! A [`BatchCommitter`] turns the units of one partition into stored records.
//! Every unit that is not blank becomes a [`Record`], is encoded, gets the
//! next key from the worker's [`KeyGenerator`] and joins the in-flight
//! [`Batch`]. A full batch is committed as one transaction. A batch whose
//! commit fails is logged and dropped; the worker carries on with the next
//! one. Nothing is retried.
//!
//! ```text
//! Idle -> Accumulating -> Committing -> Accumulating ... -> FinalFlush -> Done
//! ```

use std::time::Instant;

use crate::error::{Result, SluiceError};
use crate::identity::UserAssigner;
use crate::ingest::batch::Batch;
use crate::ingest::report::WorkerReport;
use crate::key::KeyGenerator;
use crate::partition::Partition;
use crate::record::{Record, is_blank};
use crate::storage::KvStore;

/// Lifecycle of one worker's committer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitterState {
    /// No unit seen yet.
    Idle,
    /// Filling the in-flight batch.
    Accumulating,
    /// Writing a full batch.
    Committing,
    /// Writing the last, possibly partial, batch.
    FinalFlush,
    /// Finished; no more units are accepted.
    Done,
}

/// Batches one partition's records into store transactions.
///
/// Owns the worker's key generator, identity assigner and batch; only the
/// store is shared with other workers.
pub struct BatchCommitter<'a> {
    store: &'a dyn KvStore,
    bucket: &'a str,
    keys: KeyGenerator,
    users: UserAssigner,
    fingerprint: bool,
    batch: Batch,
    state: CommitterState,
    report: WorkerReport,
    started: Option<Instant>,
}

impl<'a> BatchCommitter<'a> {
    pub fn new(
        partition: Partition,
        store: &'a dyn KvStore,
        bucket: &'a str,
        users: UserAssigner,
        batch_size: usize,
        fingerprint: bool,
    ) -> Self {
        Self {
            store,
            bucket,
            keys: KeyGenerator::new(partition.worker_id),
            users,
            fingerprint,
            batch: Batch::new(batch_size),
            state: CommitterState::Idle,
            report: WorkerReport::new(partition.worker_id, partition),
            started: None,
        }
    }

    pub fn state(&self) -> CommitterState {
        self.state
    }

    pub fn worker_id(&self) -> usize {
        self.report.worker_id
    }

    /// Statistics gathered so far.
    pub fn report(&self) -> &WorkerReport {
        &self.report
    }

    /// Feed one unit of input.
    ///
    /// Blank units are skipped and do not consume a key. Fails only when the
    /// committer has already finished.
    pub fn push_unit(&mut self, unit: &str) -> Result<()> {
        if self.state == CommitterState::Done {
            return Err(SluiceError::other(format!(
                "worker {} already finished",
                self.worker_id()
            )));
        }
        if self.state == CommitterState::Idle {
            self.started = Some(Instant::now());
            self.state = CommitterState::Accumulating;
        }

        self.report.units_seen += 1;
        if is_blank(unit) {
            self.report.units_skipped += 1;
            return Ok(());
        }

        let identity = self.users.next_identity().to_string();
        let mut record = Record::new(identity, unit)?;
        if self.fingerprint {
            record = record.with_fingerprint();
        }

        let value = match record.encode() {
            Ok(value) => value,
            Err(e) => {
                log::error!(
                    "Worker {}: Failed to encode record: {e}",
                    self.worker_id()
                );
                self.report.records_dropped += 1;
                return Ok(());
            }
        };

        let key = self.keys.next_key();
        self.batch.push(key, value);

        if self.batch.is_full() {
            self.state = CommitterState::Committing;
            self.flush();
            self.state = CommitterState::Accumulating;
        }

        Ok(())
    }

    /// Flush the remaining records and stop accepting units.
    ///
    /// Calling this again returns the same report.
    pub fn finish(&mut self) -> WorkerReport {
        if self.state != CommitterState::Done {
            self.state = CommitterState::FinalFlush;
            self.flush();
            self.state = CommitterState::Done;

            if let Some(started) = self.started {
                self.report.elapsed = started.elapsed();
            }
            log::debug!(
                "Worker {} done: {} records written, {} dropped, {} batches",
                self.worker_id(),
                self.report.records_written,
                self.report.records_dropped,
                self.report.batches_committed
            );
        }

        self.report.clone()
    }

    /// Push every unit, then finish.
    pub fn run<I, S>(mut self, units: I) -> WorkerReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for unit in units {
            // Cannot fail before finish().
            let _ = self.push_unit(unit.as_ref());
        }
        self.finish()
    }

    /// Commit the in-flight batch as one transaction. An empty batch is a
    /// no-op; a failed commit drops the batch.
    fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }

        let size = self.batch.len() as u64;
        match self.store.commit(self.bucket, self.batch.entries()) {
            Ok(()) => {
                self.report.batches_committed += 1;
                self.report.records_written += size;
            }
            Err(e) => {
                log::error!(
                    "Worker {}: Failed to store batch of {size} records: {e}",
                    self.worker_id()
                );
                self.report.batches_failed += 1;
                self.report.records_dropped += size;
            }
        }

        self.batch.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;
    use crate::identity::IdentityPool;
    use crate::storage::Entry;
    use crate::storage::memory::MemoryStore;

    /// Memory store whose n-th commit (1-based) fails.
    #[derive(Debug)]
    struct FailingStore {
        inner: MemoryStore,
        fail_on: u64,
        attempts: AtomicU64,
    }

    impl KvStore for FailingStore {
        fn create_bucket(&self, bucket: &str) -> Result<()> {
            self.inner.create_bucket(bucket)
        }
        fn has_bucket(&self, bucket: &str) -> bool {
            self.inner.has_bucket(bucket)
        }
        fn commit(&self, bucket: &str, entries: &[Entry]) -> Result<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt == self.fail_on {
                return Err(SluiceError::storage("simulated commit failure"));
            }
            self.inner.commit(bucket, entries)
        }
        fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
            self.inner.get(bucket, key)
        }
        fn count(&self, bucket: &str) -> Result<usize> {
            self.inner.count(bucket)
        }
        fn scan(&self, bucket: &str, limit: Option<usize>) -> Result<Vec<Entry>> {
            self.inner.scan(bucket, limit)
        }
        fn sync(&self) -> Result<()> {
            self.inner.sync()
        }
        fn close(&self) -> Result<()> {
            self.inner.close()
        }
    }

    fn users() -> UserAssigner {
        let pool = IdentityPool::new(vec!["alice".to_string(), "bob".to_string()]).unwrap();
        UserAssigner::new(pool, 1)
    }

    fn partition(worker_id: usize, len: usize) -> Partition {
        Partition {
            worker_id,
            start: 0,
            end: len,
        }
    }

    fn memory_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.create_bucket("messages").unwrap();
        store
    }

    #[test]
    fn test_blank_units_do_not_consume_keys() {
        let store = memory_store();
        let lines = ["hello world", "", "  ", "second line"];
        let committer =
            BatchCommitter::new(partition(0, 4), &store, "messages", users(), 100, true);

        let report = committer.run(lines);

        assert_eq!(report.units_seen, 4);
        assert_eq!(report.units_skipped, 2);
        assert_eq!(report.records_written, 2);
        assert_eq!(
            store
                .scan("messages", None)
                .unwrap()
                .into_iter()
                .map(|(k, _)| k)
                .collect::<Vec<_>>(),
            vec!["worker_0_msg_0", "worker_0_msg_1"]
        );

        let first = Record::decode(&store.get("messages", "worker_0_msg_0").unwrap().unwrap())
            .unwrap();
        assert_eq!(first.body, "hello world");
        assert!(first.identity == "alice" || first.identity == "bob");
        assert!(first.fingerprint.is_some());
        assert!(first.verify_fingerprint());
    }

    #[test]
    fn test_batch_boundaries() {
        let store = memory_store();
        let units: Vec<String> = (0..250).map(|i| format!("unit{i}")).collect();
        let committer =
            BatchCommitter::new(partition(2, 250), &store, "messages", users(), 100, false);

        let report = committer.run(&units);

        assert_eq!(store.commit_count(), 3);
        assert_eq!(report.batches_committed, 3);
        assert_eq!(report.records_written, 250);
        assert_eq!(store.count("messages").unwrap(), 250);
        assert!(store.get("messages", "worker_2_msg_249").unwrap().is_some());
    }

    #[test]
    fn test_failed_batch_is_dropped_and_run_continues() {
        let store = FailingStore {
            inner: memory_store(),
            fail_on: 2,
            attempts: AtomicU64::new(0),
        };
        let units: Vec<String> = (0..250).map(|i| format!("unit{i}")).collect();
        let committer =
            BatchCommitter::new(partition(0, 250), &store, "messages", users(), 100, false);

        let report = committer.run(&units);

        assert_eq!(report.batches_committed, 2);
        assert_eq!(report.batches_failed, 1);
        assert_eq!(report.records_written, 150);
        assert_eq!(report.records_dropped, 100);
        assert!(store.get("messages", "worker_0_msg_99").unwrap().is_some());
        assert!(store.get("messages", "worker_0_msg_100").unwrap().is_none());
        assert!(store.get("messages", "worker_0_msg_249").unwrap().is_some());
    }

    #[test]
    fn test_state_machine() {
        let store = memory_store();
        let mut committer =
            BatchCommitter::new(partition(0, 3), &store, "messages", users(), 2, false);
        assert_eq!(committer.state(), CommitterState::Idle);

        committer.push_unit("a").unwrap();
        assert_eq!(committer.state(), CommitterState::Accumulating);
        committer.push_unit("b").unwrap();
        assert_eq!(committer.state(), CommitterState::Accumulating);
        assert_eq!(store.commit_count(), 1);

        committer.push_unit("c").unwrap();
        let report = committer.finish();
        assert_eq!(committer.state(), CommitterState::Done);
        assert_eq!(report.batches_committed, 2);

        assert!(committer.push_unit("d").is_err());
        assert_eq!(committer.finish(), report);
        assert_eq!(store.commit_count(), 2);
    }

    #[test]
    fn test_empty_partition_is_noop() {
        let store = memory_store();
        let committer =
            BatchCommitter::new(partition(5, 0), &store, "messages", users(), 100, true);

        let report = committer.run(Vec::<String>::new());

        assert_eq!(report.batches_committed, 0);
        assert_eq!(store.commit_count(), 0);
    }
}
