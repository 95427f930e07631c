//! Rolling window of recently seen inbound messages.
//!
//! The same transaction intent or block notification can reach a node from
//! several peers. Raw messages are keyed by their Blake2b-256 hash; only the
//! most recent `capacity` hashes are remembered.

use std::collections::{HashSet, VecDeque};

pub const DEFAULT_DEDUP_CAPACITY: usize = 65_536;

pub struct MessageDedup {
    capacity: usize,
    hashes: HashSet<[u8; 32]>,
    order: VecDeque<[u8; 32]>,
}

impl MessageDedup {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            hashes: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Record `data`; returns `false` if it was already in the window.
    pub fn first_seen(&mut self, data: &[u8]) -> bool {
        self.insert(strata_crypto::blake2b_256(data))
    }

    /// Record a precomputed hash; returns `false` if it was already in the window.
    pub fn insert(&mut self, hash: [u8; 32]) -> bool {
        if self.hashes.contains(&hash) {
            return false;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.hashes.remove(&oldest);
            }
        }
        self.hashes.insert(hash);
        self.order.push_back(hash);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for MessageDedup {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_CAPACITY)
    }
}
