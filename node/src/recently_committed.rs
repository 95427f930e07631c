//! Bounded cache of recently committed transaction hashes.
//!
//! Peers keep relaying a transaction for a while after we have committed
//! it. This FIFO set answers "already committed?" without a store read for
//! the common case; the store's transaction index backs it up for older
//! hashes.

use std::collections::{HashSet, VecDeque};

use strata_types::TxHash;

pub struct RecentlyCommitted {
    set: HashSet<TxHash>,
    order: VecDeque<TxHash>,
    capacity: usize,
}

impl RecentlyCommitted {
    pub fn new(capacity: usize) -> Self {
        Self {
            set: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert a hash, evicting the oldest entry if at capacity.
    pub fn insert(&mut self, hash: TxHash) {
        if self.capacity == 0 || self.set.contains(&hash) {
            return;
        }
        if self.order.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.set.remove(&evicted);
            }
        }
        self.set.insert(hash);
        self.order.push_back(hash);
    }

    pub fn contains(&self, hash: &TxHash) -> bool {
        self.set.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(n: u8) -> TxHash {
        TxHash::new([n; 32])
    }

    #[test]
    fn evicts_oldest_first() {
        let mut cache = RecentlyCommitted::new(2);
        cache.insert(hash(1));
        cache.insert(hash(2));
        cache.insert(hash(3));
        assert!(!cache.contains(&hash(1)));
        assert!(cache.contains(&hash(2)));
        assert!(cache.contains(&hash(3)));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn reinserting_does_not_refresh_or_grow() {
        let mut cache = RecentlyCommitted::new(2);
        cache.insert(hash(1));
        cache.insert(hash(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let mut cache = RecentlyCommitted::new(0);
        cache.insert(hash(1));
        assert!(cache.is_empty());
    }
}
