//! Contiguous, load-balanced splitting of the input across workers.

use std::ops::Range;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which partitions receive the `N mod W` leftover units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RemainderPolicy {
    /// The first `N mod W` partitions get one extra unit.
    #[default]
    Front,

    /// The last `N mod W` partitions get one extra unit.
    Back,
}

/// A half-open range `[start, end)` of the filtered input owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub worker_id: usize,
    pub start: usize,
    pub end: usize,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Split `[0, total)` into `workers` contiguous partitions.
///
/// Every partition has `total / workers` or `total / workers + 1` units and
/// the partitions are returned in index order. When `total < workers` the
/// trailing (or leading, for [`RemainderPolicy::Back`]) partitions are empty.
/// A worker count of zero yields no partitions.
pub fn partition(total: usize, workers: usize, policy: RemainderPolicy) -> Vec<Partition> {
    if workers == 0 {
        return Vec::new();
    }

    let base = total / workers;
    let extra = total % workers;

    let mut partitions = Vec::with_capacity(workers);
    let mut start = 0;
    for worker_id in 0..workers {
        let gets_extra = match policy {
            RemainderPolicy::Front => worker_id < extra,
            RemainderPolicy::Back => worker_id >= workers - extra,
        };
        let end = start + base + usize::from(gets_extra);
        partitions.push(Partition {
            worker_id,
            start,
            end,
        });
        start = end;
    }

    partitions
}
