use std::collections::HashSet;

use sluice::error::Result;
use sluice::identity::IdentityPool;
use sluice::ingest::{IngestConfig, run_ingest};
use sluice::key::parse_key;
use sluice::record::{Record, fingerprint};
use sluice::storage::rocks::{RocksStore, RocksStoreConfig};
use sluice::storage::{KvStore, StoreConfig};

fn identities() -> IdentityPool {
    IdentityPool::new(vec![
        "alice".to_string(),
        "bob".to_string(),
        "carol".to_string(),
    ])
    .unwrap()
}

fn corpus(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("unit-{i}")).collect()
}

#[test]
fn test_every_unit_lands_under_a_unique_key() -> Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let db = dir.path().join("output.db");
    let units = corpus(1000);

    let config = IngestConfig::default()
        .with_worker_count(7)
        .with_batch_size(64)
        .with_seed(42);
    let report = run_ingest(
        config,
        StoreConfig::Rocks(RocksStoreConfig::new(&db)),
        &identities(),
        &units,
    )?;

    assert!(report.is_complete());
    assert_eq!(report.records_written, 1000);
    assert_eq!(report.workers.len(), 7);

    let store = RocksStore::open(RocksStoreConfig::new(&db))?;
    let entries = store.scan("messages", None)?;
    assert_eq!(entries.len(), 1000);

    let pool = identities();
    let mut bodies = HashSet::new();
    for (key, value) in &entries {
        let (worker_id, _) = parse_key(key).expect("key format");
        assert!(worker_id < 7);

        let record = Record::decode(value)?;
        assert!(pool.contains(&record.identity));
        assert_eq!(record.fingerprint.as_deref(), Some(fingerprint(&record.body).as_str()));
        bodies.insert(record.body);
    }
    assert_eq!(bodies.len(), 1000);

    // Worker 0 takes the first slice in order
    let first = Record::decode(&store.get("messages", "worker_0_msg_0")?.unwrap())?;
    assert_eq!(first.body, "unit-0");

    store.close()
}

#[test]
fn test_batch_boundary_keys() -> Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let db = dir.path().join("output.db");

    let config = IngestConfig::default()
        .with_worker_count(1)
        .with_batch_size(100);
    let report = run_ingest(
        config,
        StoreConfig::Rocks(RocksStoreConfig::new(&db)),
        &identities(),
        &corpus(250),
    )?;

    assert_eq!(report.batches_committed, 3);
    assert_eq!(report.records_written, 250);

    let store = RocksStore::open(RocksStoreConfig::new(&db))?;
    assert!(store.get("messages", "worker_0_msg_249")?.is_some());
    assert!(store.get("messages", "worker_0_msg_250")?.is_none());
    store.close()
}

#[test]
fn test_rerun_without_reset_reuses_bucket() -> Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let db = dir.path().join("output.db");

    for _ in 0..2 {
        let config = IngestConfig::default().with_worker_count(2);
        run_ingest(
            config,
            StoreConfig::Rocks(RocksStoreConfig::new(&db)),
            &identities(),
            &corpus(10),
        )?;
    }

    // Same keys both times, so the second run overwrites the first
    let store = RocksStore::open(RocksStoreConfig::new(&db))?;
    assert_eq!(store.count("messages")?, 10);
    store.close()
}

#[test]
fn test_reset_existing_drops_old_buckets() -> Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let db = dir.path().join("output.db");

    run_ingest(
        IngestConfig::default().with_bucket("old"),
        StoreConfig::Rocks(RocksStoreConfig::new(&db)),
        &identities(),
        &corpus(5),
    )?;
    run_ingest(
        IngestConfig::default(),
        StoreConfig::Rocks(RocksStoreConfig::new(&db).with_reset_existing(true)),
        &identities(),
        &corpus(5),
    )?;

    let store = RocksStore::open(RocksStoreConfig::new(&db))?;
    assert!(!store.has_bucket("old"));
    assert_eq!(store.count("messages")?, 5);
    store.close()
}

#[test]
fn test_records_without_fingerprint() -> Result<()> {
    let dir = tempfile::TempDir::new().unwrap();
    let db = dir.path().join("output.db");

    run_ingest(
        IngestConfig::default()
            .with_worker_count(3)
            .with_fingerprint(false),
        StoreConfig::Rocks(RocksStoreConfig::new(&db).with_disable_wal(true)),
        &identities(),
        &corpus(30),
    )?;

    let store = RocksStore::open(RocksStoreConfig::new(&db))?;
    for (_, value) in store.scan("messages", None)? {
        let record = Record::decode(&value)?;
        assert!(record.fingerprint.is_none());
    }
    store.close()
}
