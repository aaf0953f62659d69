//! RocksDB-backed store.
//!
//! Buckets are column families. A commit builds one `WriteBatch` and writes it
//! with a single `write_opt` call, so RocksDB applies it atomically and orders
//! it against every other writer.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use rocksdb::{DBWithThreadMode, IteratorMode, MultiThreaded, Options, WriteBatch, WriteOptions};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SluiceError};
use crate::storage::{Entry, KvStore};

type Db = DBWithThreadMode<MultiThreaded>;

/// Column family RocksDB always creates; never used as a bucket listing entry.
const DEFAULT_CF: &str = "default";

/// Configuration for [`RocksStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksStoreConfig {
    /// Database directory.
    pub path: PathBuf,

    /// Create the database if it does not exist.
    pub create_if_missing: bool,

    /// Destroy any existing database at `path` before opening.
    pub reset_existing: bool,

    /// fsync the write-ahead log on every commit.
    pub sync_writes: bool,

    /// Skip the write-ahead log entirely. Commits stay atomic but a crash can
    /// lose everything not yet flushed.
    pub disable_wal: bool,

    /// Maximum number of open files (-1 = unlimited).
    pub max_open_files: i32,
}

impl RocksStoreConfig {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            create_if_missing: true,
            reset_existing: false,
            sync_writes: false,
            disable_wal: false,
            max_open_files: 1000,
        }
    }

    pub fn with_reset_existing(mut self, reset: bool) -> Self {
        self.reset_existing = reset;
        self
    }

    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    pub fn with_disable_wal(mut self, disable: bool) -> Self {
        self.disable_wal = disable;
        self
    }
}

/// RocksDB store shared by all workers.
///
/// The handle sits behind a lock only so that [`KvStore::close`] can drop it;
/// commits take the read side and run concurrently inside RocksDB.
pub struct RocksStore {
    db: RwLock<Option<Db>>,
    buckets: RwLock<BTreeSet<String>>,
    config: RocksStoreConfig,
}

impl std::fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksStore")
            .field("path", &self.config.path)
            .field("open", &self.db.read().is_some())
            .finish()
    }
}

impl RocksStore {
    /// Open the database, reopening every bucket it already has.
    pub fn open(config: RocksStoreConfig) -> Result<Self> {
        let path = config.path.clone();

        if config.reset_existing && path.exists() {
            Db::destroy(&Options::default(), &path).map_err(|e| {
                SluiceError::storage(format!(
                    "failed to remove old database at {}: {e}",
                    path.display()
                ))
            })?;
            log::info!("Removed existing database at {}", path.display());
        }

        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(config.max_open_files);
        opts.increase_parallelism(num_cpus::get() as i32);

        let buckets: BTreeSet<String> = Self::existing_buckets(&opts, &path);
        let db = Db::open_cf(&opts, &path, buckets.iter()).map_err(|e| {
            SluiceError::storage(format!(
                "failed to open database at {}: {e}",
                path.display()
            ))
        })?;

        Ok(Self {
            db: RwLock::new(Some(db)),
            buckets: RwLock::new(buckets),
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Bucket names stored at `path`, or none if there is no database yet.
    fn existing_buckets(opts: &Options, path: &Path) -> BTreeSet<String> {
        Db::list_cf(opts, path)
            .unwrap_or_default()
            .into_iter()
            .filter(|name| name != DEFAULT_CF)
            .collect()
    }

    fn write_options(&self) -> WriteOptions {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        write_opts.disable_wal(self.config.disable_wal);
        write_opts
    }

    fn with_db<T>(&self, f: impl FnOnce(&Db) -> Result<T>) -> Result<T> {
        let guard = self.db.read();
        let db = guard
            .as_ref()
            .ok_or_else(|| SluiceError::storage("store is closed"))?;
        f(db)
    }
}

fn missing_bucket(bucket: &str) -> SluiceError {
    SluiceError::storage(format!("bucket {bucket} not found"))
}

impl KvStore for RocksStore {
    fn create_bucket(&self, bucket: &str) -> Result<()> {
        self.with_db(|db| {
            if db.cf_handle(bucket).is_some() {
                return Ok(());
            }

            match db.create_cf(bucket, &Options::default()) {
                // Err with an existing handle means another creator won the race.
                Err(e) if db.cf_handle(bucket).is_none() => {
                    return Err(SluiceError::storage(format!(
                        "failed to create bucket {bucket}: {e}"
                    )));
                }
                _ => {}
            }
            self.buckets.write().insert(bucket.to_string());
            Ok(())
        })
    }

    fn has_bucket(&self, bucket: &str) -> bool {
        self.with_db(|db| Ok(db.cf_handle(bucket).is_some()))
            .unwrap_or(false)
    }

    fn commit(&self, bucket: &str, entries: &[Entry]) -> Result<()> {
        self.with_db(|db| {
            let cf = db.cf_handle(bucket).ok_or_else(|| missing_bucket(bucket))?;

            let mut batch = WriteBatch::default();
            for (key, value) in entries {
                batch.put_cf(&cf, key.as_bytes(), value);
            }

            db.write_opt(batch, &self.write_options())?;
            Ok(())
        })
    }

    fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>> {
        self.with_db(|db| {
            let cf = db.cf_handle(bucket).ok_or_else(|| missing_bucket(bucket))?;
            Ok(db.get_cf(&cf, key.as_bytes())?)
        })
    }

    fn count(&self, bucket: &str) -> Result<usize> {
        self.with_db(|db| {
            let cf = db.cf_handle(bucket).ok_or_else(|| missing_bucket(bucket))?;
            let mut count = 0;
            for item in db.iterator_cf(&cf, IteratorMode::Start) {
                item?;
                count += 1;
            }
            Ok(count)
        })
    }

    fn scan(&self, bucket: &str, limit: Option<usize>) -> Result<Vec<Entry>> {
        self.with_db(|db| {
            let cf = db.cf_handle(bucket).ok_or_else(|| missing_bucket(bucket))?;
            let mut entries = Vec::new();
            for item in db
                .iterator_cf(&cf, IteratorMode::Start)
                .take(limit.unwrap_or(usize::MAX))
            {
                let (key, value) = item?;
                entries.push((String::from_utf8_lossy(&key).into_owned(), value.into_vec()));
            }
            Ok(entries)
        })
    }

    fn sync(&self) -> Result<()> {
        self.with_db(|db| {
            for bucket in self.buckets.read().iter() {
                if let Some(cf) = db.cf_handle(bucket) {
                    db.flush_cf(&cf)?;
                }
            }
            if !self.config.disable_wal {
                db.flush_wal(true)?;
            }
            Ok(())
        })
    }

    fn close(&self) -> Result<()> {
        if self.db.read().is_none() {
            return Ok(());
        }
        self.sync()?;
        // Dropping the handle closes the database.
        self.db.write().take();
        Ok(())
    }
}
