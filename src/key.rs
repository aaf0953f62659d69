//! Per-worker storage key generation.

/// Produces `worker_{id}_msg_{seq}` keys for one worker.
///
/// The worker id partitions the key space and the sequence number only grows,
/// so keys are unique across the whole run as long as every worker has its
/// own generator with a distinct id. There is exactly one generator per
/// worker, so the type is not `Clone`.
#[derive(Debug)]
pub struct KeyGenerator {
    worker_id: usize,
    next_seq: u64,
}

impl KeyGenerator {
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            next_seq: 0,
        }
    }

    /// Return the next key and advance the sequence.
    pub fn next_key(&mut self) -> String {
        let key = format_key(self.worker_id, self.next_seq);
        self.next_seq += 1;
        key
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Number of keys handed out so far.
    pub fn issued(&self) -> u64 {
        self.next_seq
    }
}

/// Format the key for a `(worker, sequence)` pair.
pub fn format_key(worker_id: usize, seq: u64) -> String {
    format!("worker_{worker_id}_msg_{seq}")
}

/// Split a key back into its `(worker, sequence)` pair.
pub fn parse_key(key: &str) -> Option<(usize, u64)> {
    let rest = key.strip_prefix("worker_")?;
    let (worker, seq) = rest.split_once("_msg_")?;
    Some((worker.parse().ok()?, seq.parse().ok()?))
}
