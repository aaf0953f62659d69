//! # Sluice
//!
//! Parallel, batched ingestion of a text corpus into a transactional
//! key-value store.
//!
//! ## Features
//!
//! - Even partitioning of the corpus across a fixed worker count
//! - Per-worker identity assignment and collision-free keys
//! - Batched commits, one transaction per batch
//! - SHA-256 body fingerprints
//! - RocksDB and in-memory store backends

pub mod cli;
pub mod error;
pub mod host;
pub mod identity;
pub mod ingest;
pub mod input;
pub mod key;
pub mod partition;
pub mod record;
pub mod storage;

pub mod prelude {
    pub use crate::error::{Result, SluiceError};
    pub use crate::identity::IdentityPool;
    pub use crate::ingest::{IngestConfig, IngestEngine, IngestReport, run_ingest};
    pub use crate::storage::{KvStore, StoreConfig, StoreFactory};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
