//! Command implementations for the Sluice CLI.

use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::{Result, SluiceError};
use crate::host::HostInfo;
use crate::ingest::{IngestConfig, run_ingest};
use crate::input::{load_corpus, load_identities};
use crate::record::Record;
use crate::storage::KvStore;
use crate::storage::StoreConfig;
use crate::storage::rocks::{RocksStore, RocksStoreConfig};

/// Execute a CLI command.
pub fn execute_command(args: SluiceArgs) -> Result<()> {
    match &args.command {
        Command::Ingest(ingest_args) => ingest_corpus(ingest_args.clone(), &args),
        Command::Inspect(inspect_args) => inspect_store(inspect_args.clone(), &args),
    }
}

/// Build the run configuration: config file (or defaults), then flags.
pub fn resolve_config(args: &IngestArgs) -> Result<IngestConfig> {
    let mut config = match &args.config {
        Some(path) => IngestConfig::from_json_file(path)?,
        None => IngestConfig::default(),
    };

    if let Some(workers) = args.workers {
        config.worker_count = workers;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(bucket) = &args.bucket {
        config.bucket = bucket.clone();
    }
    if let Some(tokenization) = args.tokenization {
        config.tokenization = tokenization;
    }
    if let Some(remainder) = args.remainder {
        config.remainder = remainder;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if args.no_fingerprint {
        config.fingerprint = false;
    }

    config.validate()?;
    Ok(config)
}

/// Ingest a corpus into a RocksDB store.
fn ingest_corpus(args: IngestArgs, cli_args: &SluiceArgs) -> Result<()> {
    let config = resolve_config(&args)?;

    if cli_args.verbosity() > 0 {
        println!("{}", HostInfo::detect().banner("sluice"));
    }

    let identities = load_identities(&args.users)?;
    let units = load_corpus(&args.input, config.tokenization)?;
    log::info!(
        "Loaded {} identities and {} units",
        identities.len(),
        units.len()
    );

    let store_config = RocksStoreConfig::new(&args.db)
        .with_reset_existing(!args.keep_existing)
        .with_sync_writes(args.sync_writes)
        .with_disable_wal(args.no_wal);

    let bucket = config.bucket.clone();
    let report = run_ingest(
        config,
        StoreConfig::Rocks(store_config),
        &identities,
        &units,
    )?;

    output_result(
        "Ingest completed",
        &IngestSummary::from_report(&report, &args.db.to_string_lossy(), &bucket),
        cli_args,
    )
}

/// Print the first records of a bucket.
fn inspect_store(args: InspectArgs, cli_args: &SluiceArgs) -> Result<()> {
    let mut config = RocksStoreConfig::new(&args.db);
    config.create_if_missing = false;
    let store = RocksStore::open(config)?;

    if !store.has_bucket(&args.bucket) {
        return Err(SluiceError::not_found(format!(
            "bucket {} in {}",
            args.bucket,
            args.db.display()
        )));
    }

    let total_entries = store.count(&args.bucket)?;
    let mut records = Vec::new();
    for (key, value) in store.scan(&args.bucket, Some(args.limit))? {
        match Record::decode(&value) {
            Ok(record) => records.push(InspectedRecord {
                key,
                fingerprint_ok: record.verify_fingerprint(),
                identity: record.identity,
                body: record.body,
                fingerprint: record.fingerprint,
            }),
            Err(e) => log::warn!("Skipping undecodable entry {key}: {e}"),
        }
    }
    store.close()?;

    output_result(
        "Store contents",
        &InspectResult {
            db_path: args.db.to_string_lossy().to_string(),
            bucket: args.bucket,
            total_entries,
            records,
        },
        cli_args,
    )
}
