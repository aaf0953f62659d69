//! Transactional key-value storage for ingested records.
//!
//! Entries live in named buckets. A [`KvStore::commit`] writes a whole batch
//! atomically: either every pair in the batch becomes visible or none does.
//! Concurrent writers are serialized by the backend itself, so callers share a
//! store through `Arc<dyn KvStore>` and never lock around it.
//!
//! # Backends
//!
//! - [`rocks::RocksStore`]: RocksDB on disk, one column family per bucket,
//!   one `WriteBatch` per commit.
//! - [`memory::MemoryStore`]: in-process maps for tests and dry runs.
//!
//! # Example
//!
//! ```
//! use sluice::storage::{KvStore, StoreConfig, StoreFactory};
//!
//! # fn main() -> sluice::error::Result<()> {
//! let store = StoreFactory::open(StoreConfig::Memory)?;
//! store.create_bucket("messages")?;
//! store.commit("messages", &[("worker_0_msg_0".to_string(), b"{}".to_vec())])?;
//! assert_eq!(store.count("messages")?, 1);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod memory;
pub mod rocks;

/// One pending `(key, encoded record)` pair.
pub type Entry = (String, Vec<u8>);

/// A store that commits batches of entries atomically.
pub trait KvStore: Send + Sync + std::fmt::Debug {
    /// Create a bucket if it does not exist yet. Calling this for an existing
    /// bucket is a no-op.
    fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// Check if a bucket exists.
    fn has_bucket(&self, bucket: &str) -> bool;

    /// Write every entry into `bucket` as one transaction.
    ///
    /// Fails without writing anything if the bucket is missing, the store is
    /// closed, or the backend rejects the transaction.
    fn commit(&self, bucket: &str, entries: &[Entry]) -> Result<()>;

    /// Read one value.
    fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Number of entries in a bucket.
    fn count(&self, bucket: &str) -> Result<usize>;

    /// Entries of a bucket in key order, up to `limit` if given.
    fn scan(&self, bucket: &str, limit: Option<usize>) -> Result<Vec<Entry>>;

    /// Persist all buffered writes.
    fn sync(&self) -> Result<()>;

    /// Close the store. Every later operation fails.
    fn close(&self) -> Result<()>;
}

/// Backend selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum StoreConfig {
    /// RocksDB at a path on disk
    Rocks(rocks::RocksStoreConfig),

    /// In-memory maps
    #[default]
    Memory,
}

/// Opens the backend described by a [`StoreConfig`].
pub struct StoreFactory;

impl StoreFactory {
    pub fn open(config: StoreConfig) -> Result<Arc<dyn KvStore>> {
        match config {
            StoreConfig::Memory => Ok(Arc::new(memory::MemoryStore::new())),
            StoreConfig::Rocks(rocks_config) => {
                Ok(Arc::new(rocks::RocksStore::open(rocks_config)?))
            }
        }
    }
}
