//! Block builder: accumulates executed transactions and turns them into a
//! signed, committed block.
//!
//! Phases: `Accumulating → Finalizing → Signing → Committing → Notifying`,
//! then back to `Accumulating`. A signing failure abandons the block and
//! hands its transactions back for requeueing; a commit failure does the
//! same but is also fatal to the node.
//!
//! Block boundaries are a function of the ordered stream only, so every
//! node cuts the same blocks no matter when its loop wakes up. The first
//! transaction's HLC physical time plus `max_block_interval` is the block's
//! deadline: a transaction stamped at or after it belongs to the next block.
//! Once local time passes `deadline + processing_delay`, nothing stamped
//! before the deadline can still be released and the block closes.

use std::time::Duration;

use strata_crypto::Signer;
use strata_execution::NonceGuard;
use strata_ledger::{Block, BlockNotification, ExecutionResult, LedgerError};
use strata_store::{keys, BlockCommit, Persistence, StateStore, StoreError};
use strata_types::TxHash;

use crate::queue::QueueEntry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuilderPhase {
    Accumulating,
    Finalizing,
    Signing,
    Committing,
    Notifying,
}

/// What came out of a finalize attempt that did not halt the node.
#[derive(Debug)]
pub enum FinalizeOutcome {
    Committed {
        block: Block,
        notification: BlockNotification,
    },
    /// Signing failed. State staging and pending nonces were rolled back.
    Abandoned {
        number: u64,
        reason: String,
        requeue: Vec<QueueEntry>,
    },
}

/// Commit failed. The node must halt; `requeue` holds the block's
/// transactions so nothing is silently lost before it does.
#[derive(Debug)]
pub struct CommitFailure {
    pub number: u64,
    pub error: StoreError,
    pub requeue: Vec<QueueEntry>,
}

pub struct BlockBuilder {
    phase: BuilderPhase,
    max_transactions: usize,
    max_interval_ns: u64,
    processing_delay_ns: u64,
    include_block: bool,
    entries: Vec<QueueEntry>,
    results: Vec<ExecutionResult>,
    deadline_ns: Option<u64>,
}

impl BlockBuilder {
    pub fn new(
        max_transactions: usize,
        max_interval: Duration,
        processing_delay: Duration,
        include_block: bool,
    ) -> Self {
        Self {
            phase: BuilderPhase::Accumulating,
            max_transactions: max_transactions.max(1),
            max_interval_ns: u64::try_from(max_interval.as_nanos()).unwrap_or(u64::MAX),
            processing_delay_ns: u64::try_from(processing_delay.as_nanos()).unwrap_or(u64::MAX),
            include_block,
            entries: Vec::new(),
            results: Vec::new(),
            deadline_ns: None,
        }
    }

    pub fn phase(&self) -> BuilderPhase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `hash` is executed but not yet committed.
    pub fn contains(&self, hash: &TxHash) -> bool {
        self.entries.iter().any(|e| e.hash() == *hash)
    }

    /// Record an executed transaction. Its deltas must already be staged.
    pub fn push(&mut self, entry: QueueEntry, result: ExecutionResult) {
        let first_physical = entry.hlc().physical_ns;
        let interval = self.max_interval_ns;
        self.deadline_ns
            .get_or_insert_with(|| first_physical.saturating_add(interval));
        self.entries.push(entry);
        self.results.push(result);
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.max_transactions
    }

    /// HLC physical time at which the current block stops taking transactions.
    pub fn deadline_ns(&self) -> Option<u64> {
        self.deadline_ns
    }

    /// Local time after which no transaction stamped before the deadline
    /// can still be released by the scheduler.
    pub fn close_at_ns(&self) -> Option<u64> {
        self.deadline_ns
            .map(|deadline| deadline.saturating_add(self.processing_delay_ns))
    }

    /// Whether a transaction stamped at `physical_ns` must go into a new
    /// block: the current one is full or its deadline has passed.
    pub fn closes_before(&self, physical_ns: u64) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        self.is_full() || self.deadline_ns.is_some_and(|deadline| physical_ns >= deadline)
    }

    /// Close the block without a following transaction: it is full, or
    /// local time is past [`close_at_ns`](Self::close_at_ns).
    pub fn should_finalize(&self, now_ns: u64) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        self.is_full() || self.close_at_ns().is_some_and(|close_at| now_ns >= close_at)
    }

    /// Finalize, sign, commit and build the notification for the
    /// accumulated transactions.
    ///
    /// `store` must hold exactly the deltas of the accumulated transactions
    /// in its staging area; `nonces` holds their pending nonce advances.
    pub fn finalize<P: Persistence>(
        &mut self,
        store: &mut StateStore<P>,
        nonces: &mut NonceGuard,
        signer: &dyn Signer,
    ) -> Result<FinalizeOutcome, CommitFailure> {
        let entries = std::mem::take(&mut self.entries);
        let results = std::mem::take(&mut self.results);
        self.deadline_ns = None;

        self.phase = BuilderPhase::Finalizing;
        let head = match store.chain_head() {
            Ok(head) => head,
            Err(error) => {
                return Err(self.fail_commit(store, nonces, 0, error, entries));
            }
        };
        let number = head.number + 1;
        let transactions = entries.iter().map(|e| e.tx.clone()).collect();
        let finalized =
            Block::finalize(number, head.hash, signer.public_key(), transactions, results);
        let mut block = match finalized {
            Ok(block) => block,
            Err(e) => return Ok(self.abandon(store, nonces, number, e, entries)),
        };

        self.phase = BuilderPhase::Signing;
        if let Err(e) = block.sign(signer) {
            return Ok(self.abandon(store, nonces, number, e, entries));
        }
        let include_block = self.include_block;
        let prepared = block.encode().and_then(|bytes| {
            BlockNotification::from_block(&block, include_block).map(|n| (bytes, n))
        });
        let (encoded_block, notification) = match prepared {
            Ok(pair) => pair,
            Err(e) => return Ok(self.abandon(store, nonces, number, e, entries)),
        };

        self.phase = BuilderPhase::Committing;
        for (sender, nonce) in nonces.take_pending() {
            store.stage(keys::nonce_key(&sender), keys::encode_u64(nonce));
        }
        let commit = BlockCommit {
            number,
            previous_hash: block.previous_hash,
            hash: block.hash,
            encoded_block,
            transactions: entries.iter().map(QueueEntry::hash).collect(),
        };
        if let Err(error) = store.commit(commit) {
            return Err(self.fail_commit(store, nonces, number, error, entries));
        }

        self.phase = BuilderPhase::Notifying;
        tracing::info!(
            number = block.number,
            hash = %block.hash,
            transactions = block.transactions.len(),
            "block finalized"
        );
        self.phase = BuilderPhase::Accumulating;
        Ok(FinalizeOutcome::Committed {
            block,
            notification,
        })
    }

    fn abandon<P: Persistence>(
        &mut self,
        store: &mut StateStore<P>,
        nonces: &mut NonceGuard,
        number: u64,
        error: LedgerError,
        requeue: Vec<QueueEntry>,
    ) -> FinalizeOutcome {
        store.discard();
        nonces.clear();
        self.phase = BuilderPhase::Accumulating;
        tracing::warn!(number, error = %error, requeued = requeue.len(), "block abandoned");
        FinalizeOutcome::Abandoned {
            number,
            reason: error.to_string(),
            requeue,
        }
    }

    fn fail_commit<P: Persistence>(
        &mut self,
        store: &mut StateStore<P>,
        nonces: &mut NonceGuard,
        number: u64,
        error: StoreError,
        requeue: Vec<QueueEntry>,
    ) -> CommitFailure {
        store.discard();
        nonces.clear();
        self.phase = BuilderPhase::Accumulating;
        tracing::error!(number, error = %error, "commit failed — node halting");
        CommitFailure {
            number,
            error,
            requeue,
        }
    }
}
