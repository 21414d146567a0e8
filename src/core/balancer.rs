//! Weighted random selection over a mutable weight map
//!
//! The weights live on the stack of one request's dispatch loop, so there is
//! no synchronization here. Pool sizes are small (typically well under 50
//! entries) and mutations are frequent, so a flat scan beats any
//! cumulative-sum structure.

use crate::utils::error::{GatewayError, Result};
use rand::Rng;
use std::collections::HashMap;

/// Reduction divisor applied on rate-limit penalties
const PENALTY_DIVISOR: i32 = 3;

/// Mutable weight table for one request's candidate pool
#[derive(Debug, Clone, Default)]
pub struct PoolWeights {
    weights: HashMap<i64, i32>,
}

impl PoolWeights {
    /// Build a table from (key, weight) pairs. Weights below 1 are clamped to 1.
    pub fn new(entries: impl IntoIterator<Item = (i64, i32)>) -> Self {
        Self {
            weights: entries
                .into_iter()
                .map(|(k, w)| (k, w.max(1)))
                .collect(),
        }
    }

    /// Draw one key with probability `weight[k] / Σweights`.
    ///
    /// Entries are snapshotted before the draw so a single pick sees a
    /// consistent table; order across picks is unconstrained.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<i64> {
        let entries: Vec<(i64, i32)> = self.weights.iter().map(|(k, w)| (*k, *w)).collect();
        if entries.is_empty() {
            return Err(GatewayError::EmptyPool);
        }

        let total: i64 = entries.iter().map(|(_, w)| *w as i64).sum();
        let draw = rng.gen_range(0..total);

        let mut acc: i64 = 0;
        for (key, weight) in &entries {
            acc += *weight as i64;
            if draw < acc {
                return Ok(*key);
            }
        }
        // Unreachable: acc == total > draw by the end of the scan.
        Err(GatewayError::EmptyPool)
    }

    /// Drop a key after a non-retryable upstream outcome
    pub fn remove(&mut self, key: i64) {
        self.weights.remove(&key);
    }

    /// Shave a third off a key's weight after a rate-limit signal,
    /// clamping at 1 so penalties alone never evict an entry
    pub fn penalize(&mut self, key: i64) {
        if let Some(weight) = self.weights.get_mut(&key) {
            *weight = (*weight - *weight / PENALTY_DIVISOR).max(1);
        }
    }

    /// Current weight of a key, if present
    pub fn get(&self, key: i64) -> Option<i32> {
        self.weights.get(&key).copied()
    }

    /// Whether the pool has no candidates left
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Number of candidates remaining
    pub fn len(&self) -> usize {
        self.weights.len()
    }
}
