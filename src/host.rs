//! Host description printed before a run.

use serde::{Deserialize, Serialize};
use sysinfo::System;

/// CPU and memory of the machine running the ingest. Display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostInfo {
    pub cpu_brand: String,
    pub logical_cpus: usize,
    pub total_memory_bytes: u64,
}

impl HostInfo {
    pub fn detect() -> Self {
        let sys = System::new_all();
        let cpu_brand = sys
            .cpus()
            .iter()
            .map(|cpu| cpu.brand().trim())
            .find(|brand| !brand.is_empty())
            .unwrap_or("Unknown CPU")
            .to_string();

        Self {
            cpu_brand,
            logical_cpus: num_cpus::get(),
            total_memory_bytes: sys.total_memory(),
        }
    }

    /// One-line banner, e.g. `sluice - AMD EPYC 7B13 x16 (67.43 GB)`.
    pub fn banner(&self, name: &str) -> String {
        format!(
            "{name} - {} x{} ({})",
            self.cpu_brand,
            self.logical_cpus,
            format_memory(self.total_memory_bytes)
        )
    }
}

/// Decimal units, two places.
pub fn format_memory(bytes: u64) -> String {
    let bytes_f = bytes as f64;
    if bytes_f < 1e9 {
        format!("{:.2} MB", bytes_f / 1e6)
    } else if bytes_f < 1e12 {
        format!("{:.2} GB", bytes_f / 1e9)
    } else if bytes_f < 1e15 {
        format!("{:.2} TB", bytes_f / 1e12)
    } else {
        format!("{bytes}")
    }
}
