//! In-memory store for testing and dry runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::{Result, SluiceError};
use crate::storage::{Entry, KvStore};

/// A store backed by one ordered map per bucket.
///
/// A commit holds the write lock for the whole batch, which makes it atomic
/// and serializes concurrent writers the same way a single-writer database
/// would.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>,
    commits: AtomicU64,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Acquire)
    }

    /// Number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.read().len()
    }

    fn check_closed(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(SluiceError::storage("store is closed"))
        } else {
            Ok(())
        }
    }
}

impl KvStore for MemoryStore {
    fn create_bucket(&self, bucket: &str) -> Result<()> {
        self.check_closed()?;
        self.buckets.write().entry(bucket.to_string()).or_default();
        Ok(())
    }

    fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets.read().contains_key(bucket)
    }

    fn commit(&self, bucket: &str, entries: &[Entry]) -> Result<()> {
        self.check_closed()?;

        let mut buckets = self.buckets.write();
        let map = buckets
            .get_mut(bucket)
            .ok_or_else(|| SluiceError::storage(format!("bucket {bucket} not found")))?;

        for (key, value) in entries {
            map.insert(key.clone(), value.clone());
        }
        self.commits.fetch_add(1, Ordering::AcqRel);

        Ok(())
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        self.check_closed()?;

        let buckets = self.buckets.read();
        let map = buckets
            .get(bucket)
            .ok_or_else(|| SluiceError::storage(format!("bucket {bucket} not found")))?;
        Ok(map.get(key).cloned())
    }

    fn count(&self, bucket: &str) -> Result<usize> {
        self.check_closed()?;

        let buckets = self.buckets.read();
        buckets
            .get(bucket)
            .map(BTreeMap::len)
            .ok_or_else(|| SluiceError::storage(format!("bucket {bucket} not found")))
    }

    fn scan(&self, bucket: &str, limit: Option<usize>) -> Result<Vec<Entry>> {
        self.check_closed()?;

        let buckets = self.buckets.read();
        let map = buckets
            .get(bucket)
            .ok_or_else(|| SluiceError::storage(format!("bucket {bucket} not found")))?;

        Ok(map
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn sync(&self) -> Result<()> {
        self.check_closed()
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
