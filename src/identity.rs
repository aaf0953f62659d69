//! Identity pool and per-worker random identity assignment.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, SluiceError};

/// Read-only pool of identities shared by every worker.
#[derive(Debug, Clone)]
pub struct IdentityPool {
    identities: Arc<[String]>,
}

impl IdentityPool {
    /// Create a pool. An empty pool is a configuration error.
    pub fn new(identities: Vec<String>) -> Result<Self> {
        if identities.is_empty() {
            return Err(SluiceError::input("identity pool is empty"));
        }

        Ok(Self {
            identities: identities.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.identities.get(index).map(String::as_str)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.identities.iter().any(|i| i == identity)
    }
}

/// Derive the seed for one worker's random source.
///
/// With no base seed the wall clock (nanoseconds since the epoch) is used.
/// The worker index is added so concurrently started workers never share a
/// sequence.
pub fn derive_seed(worker_id: usize, base_seed: Option<u64>) -> u64 {
    let base = base_seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default()
    });
    base.wrapping_add(worker_id as u64)
}

/// Draws identities uniformly at random, with replacement.
///
/// Each worker owns one assigner; the random source is never shared.
#[derive(Debug)]
pub struct UserAssigner {
    pool: IdentityPool,
    rng: StdRng,
}

impl UserAssigner {
    /// Create an assigner with an explicit seed.
    pub fn new(pool: IdentityPool, seed: u64) -> Self {
        Self {
            pool,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create the assigner for a worker, seeded via [`derive_seed`].
    pub fn for_worker(pool: IdentityPool, worker_id: usize, base_seed: Option<u64>) -> Self {
        Self::new(pool, derive_seed(worker_id, base_seed))
    }

    /// Draw the next identity.
    pub fn next_identity(&mut self) -> &str {
        let index = self.rng.random_range(0..self.pool.len());
        &self.pool.identities[index]
    }
}
