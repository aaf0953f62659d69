//! Command line argument parsing for the Sluice CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::input::Tokenization;
use crate::partition::RemainderPolicy;

/// Sluice - parallel batched corpus ingestion into RocksDB
#[derive(Parser, Debug, Clone)]
#[command(name = "sluice")]
#[command(about = "Ingest a text corpus into a transactional key-value store with parallel workers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct SluiceArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl SluiceArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Ingest a corpus into the store
    Ingest(IngestArgs),

    /// Show the contents of a bucket
    Inspect(InspectArgs),
}

/// Arguments for an ingest run
#[derive(Parser, Debug, Clone)]
pub struct IngestArgs {
    /// Newline-delimited identity list
    #[arg(long, value_name = "USERS_FILE")]
    pub users: PathBuf,

    /// Corpus to ingest
    #[arg(long, value_name = "INPUT_FILE")]
    pub input: PathBuf,

    /// Database directory
    #[arg(long, value_name = "DB_PATH", default_value = "output.db")]
    pub db: PathBuf,

    /// JSON file with an ingest configuration; flags override it
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Number of workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Records per transaction
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Target bucket
    #[arg(long)]
    pub bucket: Option<String>,

    /// How the corpus is split into units
    #[arg(short, long = "tokenize")]
    pub tokenization: Option<Tokenization>,

    /// Which partitions take the leftover units
    #[arg(long)]
    pub remainder: Option<RemainderPolicy>,

    /// Fixed base seed for identity assignment
    #[arg(long)]
    pub seed: Option<u64>,

    /// Store records without a body fingerprint
    #[arg(long)]
    pub no_fingerprint: bool,

    /// Keep an existing database instead of removing it first
    #[arg(long)]
    pub keep_existing: bool,

    /// fsync the write-ahead log on every commit
    #[arg(long)]
    pub sync_writes: bool,

    /// Write without the write-ahead log
    #[arg(long, conflicts_with = "sync_writes")]
    pub no_wal: bool,
}

/// Arguments for inspecting a store
#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    /// Database directory
    #[arg(value_name = "DB_PATH", default_value = "output.db")]
    pub db: PathBuf,

    /// Bucket to inspect
    #[arg(long, default_value = crate::ingest::config::DEFAULT_BUCKET)]
    pub bucket: String,

    /// Number of records to show
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ingest() {
        let args = SluiceArgs::parse_from([
            "sluice",
            "-vv",
            "ingest",
            "--users",
            "users.txt",
            "--input",
            "corpus.txt",
            "--workers",
            "4",
            "--tokenize",
            "line",
            "--remainder",
            "back",
            "--no-fingerprint",
        ]);

        assert_eq!(args.verbosity(), 2);
        match args.command {
            Command::Ingest(ingest) => {
                assert_eq!(ingest.workers, Some(4));
                assert_eq!(ingest.tokenization, Some(Tokenization::Line));
                assert_eq!(ingest.remainder, Some(RemainderPolicy::Back));
                assert!(ingest.no_fingerprint);
                assert_eq!(ingest.db, PathBuf::from("output.db"));
                assert!(ingest.batch_size.is_none());
            }
            _ => panic!("expected ingest command"),
        }
    }

    #[test]
    fn test_quiet_overrides_verbose() {
        let args = SluiceArgs::parse_from(["sluice", "-q", "-v", "inspect"]);
        assert_eq!(args.verbosity(), 0);
        match args.command {
            Command::Inspect(inspect) => {
                assert_eq!(inspect.bucket, "messages");
                assert_eq!(inspect.limit, 10);
            }
            _ => panic!("expected inspect command"),
        }
    }

    #[test]
    fn test_sync_and_no_wal_conflict() {
        let result = SluiceArgs::try_parse_from([
            "sluice",
            "ingest",
            "--users",
            "u",
            "--input",
            "i",
            "--sync-writes",
            "--no-wal",
        ]);
        assert!(result.is_err());
    }
}
