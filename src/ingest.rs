//! Parallel, batched ingestion of a corpus into a [`KvStore`](crate::storage::KvStore).
//!
//! The [`IngestEngine`] splits the filtered input into one contiguous
//! partition per worker and runs a [`BatchCommitter`] for each of them on a
//! dedicated thread pool. Workers share nothing but the store handle; each
//! owns its key generator, identity assigner and in-flight batch.

pub mod batch;
pub mod committer;
pub mod config;
pub mod engine;
pub mod report;

pub use batch::Batch;
pub use committer::{BatchCommitter, CommitterState};
pub use config::IngestConfig;
pub use engine::{IngestEngine, run_ingest};
pub use report::{IngestReport, WorkerReport};
