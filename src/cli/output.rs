//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, SluiceArgs};
use crate::error::Result;
use crate::ingest::IngestReport;

/// Result structure for an ingest run.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestSummary {
    pub run_id: String,
    pub started_at: String,
    pub db_path: String,
    pub bucket: String,
    pub total_units: usize,
    pub worker_count: usize,
    pub batch_size: usize,
    pub records_written: u64,
    pub records_dropped: u64,
    pub batches_committed: u64,
    pub batches_failed: u64,
    pub duration_ms: u64,
    pub records_per_second: f64,
    pub workers: Vec<WorkerSummary>,
}

/// Per-worker line of an ingest summary.
#[derive(Debug, Serialize, Deserialize)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub start: usize,
    pub end: usize,
    pub records_written: u64,
    pub records_dropped: u64,
    pub batches_committed: u64,
    pub batches_failed: u64,
    pub duration_ms: u64,
}

impl IngestSummary {
    pub fn from_report(report: &IngestReport, db_path: &str, bucket: &str) -> Self {
        Self {
            run_id: report.run_id.to_string(),
            started_at: report.started_at.to_rfc3339(),
            db_path: db_path.to_string(),
            bucket: bucket.to_string(),
            total_units: report.total_units,
            worker_count: report.worker_count,
            batch_size: report.batch_size,
            records_written: report.records_written,
            records_dropped: report.records_dropped,
            batches_committed: report.batches_committed,
            batches_failed: report.batches_failed,
            duration_ms: report.elapsed.as_millis() as u64,
            records_per_second: report.records_per_second(),
            workers: report
                .workers
                .iter()
                .map(|w| WorkerSummary {
                    worker_id: w.worker_id,
                    start: w.partition.start,
                    end: w.partition.end,
                    records_written: w.records_written,
                    records_dropped: w.records_dropped,
                    batches_committed: w.batches_committed,
                    batches_failed: w.batches_failed,
                    duration_ms: w.elapsed.as_millis() as u64,
                })
                .collect(),
        }
    }
}

/// Result structure for bucket inspection.
#[derive(Debug, Serialize, Deserialize)]
pub struct InspectResult {
    pub db_path: String,
    pub bucket: String,
    pub total_entries: usize,
    pub records: Vec<InspectedRecord>,
}

/// One decoded entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct InspectedRecord {
    pub key: String,
    pub identity: String,
    pub body: String,
    pub fingerprint: Option<String>,
    pub fingerprint_ok: bool,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &SluiceArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &SluiceArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;

    match result {
        _ if std::any::type_name::<T>().contains("IngestSummary") => {
            output_ingest_summary_human(&value, args)
        }
        _ if std::any::type_name::<T>().contains("InspectResult") => {
            output_inspect_human(&value, args)
        }
        _ => output_generic_human(&value, args),
    }
}

/// Output an ingest summary in human format.
fn output_ingest_summary_human(value: &serde_json::Value, args: &SluiceArgs) -> Result<()> {
    let Some(obj) = value.as_object() else {
        return output_generic_human(value, args);
    };

    println!("Ingest Results:");
    println!("═══════════════");

    for field in [
        "run_id",
        "db_path",
        "bucket",
        "total_units",
        "worker_count",
        "batch_size",
        "records_written",
        "records_dropped",
        "batches_committed",
        "batches_failed",
    ] {
        if let Some(val) = obj.get(field) {
            println!("{}: {}", field.replace('_', " "), format_value(val));
        }
    }

    if let Some(duration) = obj.get("duration_ms").and_then(|d| d.as_u64()) {
        println!("total processing time: {duration}ms");
    }
    if let Some(rate) = obj.get("records_per_second").and_then(|r| r.as_f64()) {
        println!("throughput: {rate:.0} records/s");
    }

    // Per-worker breakdown only when verbose
    if args.verbosity() > 1
        && let Some(workers) = obj.get("workers").and_then(|w| w.as_array())
    {
        println!();
        println!("Workers:");
        println!("────────");
        for worker in workers {
            let field = |name: &str| worker.get(name).and_then(|v| v.as_u64()).unwrap_or(0);
            println!(
                "  #{:<3} [{}, {})  written {}  dropped {}  batches {}/{} failed  {}ms",
                field("worker_id"),
                field("start"),
                field("end"),
                field("records_written"),
                field("records_dropped"),
                field("batches_committed"),
                field("batches_failed"),
                field("duration_ms"),
            );
        }
    }

    Ok(())
}

/// Output inspected records in human format.
fn output_inspect_human(value: &serde_json::Value, args: &SluiceArgs) -> Result<()> {
    let Some(obj) = value.as_object() else {
        return output_generic_human(value, args);
    };

    if let Some(total) = obj.get("total_entries").and_then(|t| t.as_u64()) {
        let bucket = obj.get("bucket").and_then(|b| b.as_str()).unwrap_or("?");
        println!("Bucket {bucket}: {total} entries");
    }

    if let Some(records) = obj.get("records").and_then(|r| r.as_array()) {
        for record in records {
            println!();
            println!(
                "{}",
                record.get("key").and_then(|k| k.as_str()).unwrap_or("")
            );
            println!("─────────────");
            for field in ["identity", "body", "fingerprint"] {
                if let Some(text) = record.get(field).and_then(|v| v.as_str()) {
                    println!("{field}: {text}");
                }
            }
            if record.get("fingerprint_ok").and_then(|v| v.as_bool()) == Some(false) {
                println!("fingerprint does not match body");
            }
        }
    }

    Ok(())
}

/// Output generic data in human format.
fn output_generic_human(value: &serde_json::Value, _args: &SluiceArgs) -> Result<()> {
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                let formatted_val = format_value(val);
                println!("{key}: {formatted_val}");
            }
        }
        _ => {
            let formatted_value = format_value(value);
            println!("{formatted_value}");
        }
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &SluiceArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;

    use super::*;
    use crate::ingest::WorkerReport;
    use crate::partition::Partition;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&serde_json::json!("x")), "x");
        assert_eq!(format_value(&serde_json::json!(3)), "3");
        assert_eq!(format_value(&serde_json::json!([1, "a"])), "[1, a]");
        assert_eq!(format_value(&serde_json::json!({"a": 1})), "[object]");
        assert_eq!(format_value(&serde_json::Value::Null), "null");
    }

    #[test]
    fn test_summary_from_report() {
        let mut worker = WorkerReport::new(
            0,
            Partition {
                worker_id: 0,
                start: 0,
                end: 5,
            },
        );
        worker.records_written = 5;
        worker.batches_committed = 1;
        worker.elapsed = Duration::from_millis(20);

        let report =
            IngestReport::aggregate(Utc::now(), 5, 100, Duration::from_millis(25), vec![worker]);
        let summary = IngestSummary::from_report(&report, "output.db", "messages");

        assert_eq!(summary.records_written, 5);
        assert_eq!(summary.duration_ms, 25);
        assert_eq!(summary.workers.len(), 1);
        assert_eq!(summary.workers[0].end, 5);
        assert_eq!(summary.workers[0].duration_ms, 20);
        assert_eq!(summary.run_id, report.run_id.to_string());
    }
}
