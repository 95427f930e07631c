//! Main processing queue: stamped transactions waiting to be ordered.
//!
//! Entries are kept sorted by `(hlc_timestamp, input_hash)`, so the globally
//! oldest member is always the first key. Two entries with an identical
//! timestamp fall back to hash order, which every node computes the same way.

use std::collections::{BTreeMap, HashMap};

use strata_transactions::ProcessedTransaction;
use strata_types::{HlcTimestamp, TxHash};

type OrderKey = (HlcTimestamp, TxHash);

/// A queued transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueEntry {
    pub tx: ProcessedTransaction,
    /// Intake already checked the sender's signature.
    pub signature_verified: bool,
}

impl QueueEntry {
    pub fn new(tx: ProcessedTransaction, signature_verified: bool) -> Self {
        Self {
            tx,
            signature_verified,
        }
    }

    pub fn hash(&self) -> TxHash {
        self.tx.input_hash
    }

    pub fn hlc(&self) -> HlcTimestamp {
        self.tx.hlc_timestamp
    }

    fn key(&self) -> OrderKey {
        (self.tx.hlc_timestamp, self.tx.input_hash)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    Queued,
    /// Same transaction hash is already queued; nothing changed.
    Duplicate,
    /// Queue is at capacity; the entry was dropped.
    Full,
}

pub struct MainProcessingQueue {
    ordered: BTreeMap<OrderKey, QueueEntry>,
    by_hash: HashMap<TxHash, HlcTimestamp>,
    capacity: usize,
}

impl MainProcessingQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            ordered: BTreeMap::new(),
            by_hash: HashMap::new(),
            capacity,
        }
    }

    /// Insert a new entry. Duplicates (by hash) are ignored.
    pub fn append(&mut self, entry: QueueEntry) -> AppendOutcome {
        if self.by_hash.contains_key(&entry.hash()) {
            return AppendOutcome::Duplicate;
        }
        if self.ordered.len() >= self.capacity {
            return AppendOutcome::Full;
        }
        self.insert(entry);
        AppendOutcome::Queued
    }

    /// Put entries from an abandoned block back, keeping their original
    /// timestamps. Capacity is not enforced: these were already admitted.
    pub fn requeue(&mut self, entries: impl IntoIterator<Item = QueueEntry>) -> usize {
        let mut restored = 0;
        for entry in entries {
            if !self.by_hash.contains_key(&entry.hash()) {
                self.insert(entry);
                restored += 1;
            }
        }
        restored
    }

    fn insert(&mut self, entry: QueueEntry) {
        self.by_hash.insert(entry.hash(), entry.hlc());
        self.ordered.insert(entry.key(), entry);
    }

    /// The entry with the smallest `(hlc, hash)`.
    pub fn peek_oldest(&self) -> Option<&QueueEntry> {
        self.ordered.values().next()
    }

    pub fn pop_oldest(&mut self) -> Option<QueueEntry> {
        let (_, entry) = self.ordered.pop_first()?;
        self.by_hash.remove(&entry.hash());
        Some(entry)
    }

    pub fn remove(&mut self, hash: &TxHash) -> Option<QueueEntry> {
        let hlc = self.by_hash.remove(hash)?;
        self.ordered.remove(&(hlc, *hash))
    }

    pub fn contains(&self, hash: &TxHash) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// Timestamp the queued copy of `hash` was stamped with.
    pub fn hlc_of(&self, hash: &TxHash) -> Option<HlcTimestamp> {
        self.by_hash.get(hash).copied()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
