//! In-flight batch of encoded records owned by one worker.

use crate::storage::Entry;

/// Up to `capacity` `(key, encoded record)` pairs awaiting one commit.
#[derive(Debug)]
pub struct Batch {
    entries: Vec<Entry>,
    capacity: usize,
}

impl Batch {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, key: String, value: Vec<u8>) {
        self.entries.push((key, value));
    }

    /// Whether the batch reached its capacity and must be flushed.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop the contents, keeping the allocation for the next batch.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
