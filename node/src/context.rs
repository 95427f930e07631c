//! The node's serial core.
//!
//! [`NodeContext`] owns everything on the ordering → execution → commit
//! path: queue, scheduler, HLC, execution engine, block builder and state
//! store. It is driven synchronously (`accept_*`, `step`), which keeps the
//! state transition function single-threaded and lets tests step it under a
//! controlled clock. The async task model in [`crate::node`] wraps it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use strata_crypto::{Signer, Verifier};
use strata_execution::{currency, Executor, ExecutionEngine};
use strata_hlc::{HybridLogicalClock, PhysicalClock};
use strata_ledger::{Block, BlockNotification};
use strata_messages::WireMessage;
use strata_store::{ChainHead, Persistence, StateStore, StoreError};
use strata_transactions::{validate_processed, validate_signed, ProcessedTransaction, SignedTransaction};
use strata_types::{NetworkId, NodeId, ProtocolParams, PublicKey, TxHash};

use crate::block_builder::{BlockBuilder, CommitFailure, FinalizeOutcome};
use crate::config::NodeConfig;
use crate::events::{EventBus, NodeEvent};
use crate::metrics::NodeMetrics;
use crate::queue::{AppendOutcome, MainProcessingQueue, QueueEntry};
use crate::recently_committed::RecentlyCommitted;
use crate::scheduler::{OrderingScheduler, Poll};
use crate::tracing_spans::{execute_span, finalize_block_span, intake_span, peer_block_span};
use crate::NodeError;

/// Collaborators the core consumes through traits.
#[derive(Clone)]
pub struct NodeServices {
    pub executor: Arc<dyn Executor>,
    pub signer: Arc<dyn Signer>,
    pub verifier: Arc<dyn Verifier>,
    pub clock: Arc<dyn PhysicalClock>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntakeOutcome {
    Queued(TxHash),
    /// Already queued, executing or committed; nothing changed.
    Duplicate(TxHash),
}

impl IntakeOutcome {
    pub fn hash(&self) -> TxHash {
        match self {
            Self::Queued(h) | Self::Duplicate(h) => *h,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerBlockStatus {
    /// Our own notification echoed back.
    Own,
    Agreed,
    Diverged,
    /// We have not committed that height yet.
    Ahead,
}

/// What one call to [`NodeContext::step`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    pub executed: usize,
    pub committed: Vec<ChainHead>,
    pub abandoned: usize,
}

pub struct NodeContext<P> {
    network: NetworkId,
    params: ProtocolParams,
    clock: Arc<dyn PhysicalClock>,
    signer: Arc<dyn Signer>,
    verifier: Arc<dyn Verifier>,
    hlc: HybridLogicalClock,
    queue: MainProcessingQueue,
    scheduler: OrderingScheduler,
    engine: ExecutionEngine,
    builder: BlockBuilder,
    store: StateStore<P>,
    recently_committed: RecentlyCommitted,
    metrics: Arc<NodeMetrics>,
    events: EventBus,
    outbox: Vec<WireMessage>,
    halted: Option<String>,
}

impl<P: Persistence> NodeContext<P> {
    pub fn new(
        config: &NodeConfig,
        store: StateStore<P>,
        services: NodeServices,
        metrics: Arc<NodeMetrics>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let params = config.protocol_params();
        let node = NodeId::from(services.signer.public_key());
        let hlc = HybridLogicalClock::new(Arc::clone(&services.clock), node)
            .with_max_drift(params.max_hlc_drift());
        let head = store.chain_head()?;
        metrics.chain_height.set(head.number as i64);

        Ok(Self {
            network: config.network,
            clock: services.clock,
            signer: services.signer,
            verifier: Arc::clone(&services.verifier),
            hlc,
            queue: MainProcessingQueue::new(config.max_queue_size),
            scheduler: OrderingScheduler::new(params.processing_delay()),
            engine: ExecutionEngine::new(services.executor, services.verifier, params.clone()),
            builder: BlockBuilder::new(
                params.max_block_transactions,
                params.max_block_interval(),
                params.processing_delay(),
                config.include_blocks_in_notifications,
            ),
            store,
            recently_committed: RecentlyCommitted::new(config.recently_committed_capacity),
            metrics,
            events: EventBus::new(),
            outbox: Vec::new(),
            halted: None,
            params,
        })
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn network(&self) -> NetworkId {
        self.network
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    pub fn public_key(&self) -> PublicKey {
        self.signer.public_key()
    }

    pub fn queue(&self) -> &MainProcessingQueue {
        &self.queue
    }

    pub fn scheduler(&self) -> &OrderingScheduler {
        &self.scheduler
    }

    pub fn builder(&self) -> &BlockBuilder {
        &self.builder
    }

    pub fn store(&self) -> &StateStore<P> {
        &self.store
    }

    pub fn hlc(&self) -> &HybridLogicalClock {
        &self.hlc
    }

    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        &self.metrics
    }

    pub fn chain_head(&self) -> Result<ChainHead, NodeError> {
        Ok(self.store.chain_head()?)
    }

    /// Committed block at `number`, if any.
    pub fn block(&self, number: u64) -> Result<Option<Block>, NodeError> {
        match self.store.load_block(number)? {
            Some(bytes) => Ok(Some(Block::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&NodeEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    /// Messages produced since the last call, in order.
    pub fn drain_outbox(&mut self) -> Vec<WireMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn halt_reason(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    /// Credit `balances` before the first block. A store that already has
    /// genesis state is left alone.
    pub fn apply_genesis(&mut self, balances: &[(PublicKey, u64)]) -> Result<usize, NodeError> {
        let entries = currency::genesis_entries(&self.params.stamps, balances)?;
        match self.store.apply_genesis(entries) {
            Ok(count) => Ok(count),
            Err(StoreError::GenesisAlreadyApplied) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    // ── Intake ─────────────────────────────────────────────────────────

    /// Validate, stamp and queue a transaction submitted by a client of
    /// this node. The stamped copy is queued for broadcast to peers.
    pub fn accept_local(&mut self, tx: SignedTransaction) -> Result<IntakeOutcome, NodeError> {
        let _span = intake_span("submit_transaction").entered();
        self.metrics.transactions_received.inc();
        if let Err(e) = validate_signed(&tx, self.verifier.as_ref(), &self.params) {
            return Err(self.reject(tx.input_hash().ok(), e.into()));
        }
        self.admit_local(tx)
    }

    /// Like [`accept_local`](Self::accept_local) for a transaction the
    /// caller has already validated.
    pub fn admit_local(&mut self, tx: SignedTransaction) -> Result<IntakeOutcome, NodeError> {
        self.ensure_running()?;
        let hash = tx.input_hash()?;
        if self.is_known(&hash)? {
            return Ok(IntakeOutcome::Duplicate(hash));
        }
        if self.queue.len() >= self.queue.capacity() {
            let capacity = self.queue.capacity();
            return Err(self.reject(Some(hash), NodeError::QueueFull { capacity }));
        }
        let timestamp = self.hlc.new_timestamp();
        let processed = ProcessedTransaction::stamp(tx, timestamp, self.signer.as_ref())?;
        self.enqueue(QueueEntry::new(processed.clone(), true))?;
        self.outbox.push(WireMessage::TransactionIntent(processed));
        Ok(IntakeOutcome::Queued(hash))
    }

    /// Validate and queue a transaction stamped by a peer.
    pub fn accept_remote(&mut self, tx: ProcessedTransaction) -> Result<IntakeOutcome, NodeError> {
        let _span = intake_span("transaction_intent").entered();
        self.metrics.transactions_received.inc();
        if let Err(e) = validate_processed(&tx, self.verifier.as_ref(), &self.params) {
            return Err(self.reject(Some(tx.input_hash), e.into()));
        }
        self.admit_remote(tx)
    }

    /// Like [`accept_remote`](Self::accept_remote) for a transaction the
    /// caller has already validated.
    ///
    /// When two processors stamped the same transaction, the copy with the
    /// smaller timestamp wins, provided it arrives before the other copy
    /// was executed.
    pub fn admit_remote(&mut self, tx: ProcessedTransaction) -> Result<IntakeOutcome, NodeError> {
        self.ensure_running()?;
        let hash = tx.input_hash;
        let replaces_queued = match self.queue.hlc_of(&hash) {
            Some(queued) if tx.hlc_timestamp < queued => true,
            Some(_) => return Ok(IntakeOutcome::Duplicate(hash)),
            None => {
                if self.is_known(&hash)? {
                    return Ok(IntakeOutcome::Duplicate(hash));
                }
                false
            }
        };
        // The queued copy stays unless the replacement is accepted.
        if let Err(e) = self.hlc.observe(&tx.hlc_timestamp) {
            return Err(self.reject(Some(hash), e.into()));
        }
        if replaces_queued {
            self.queue.remove(&hash);
        }
        self.enqueue(QueueEntry::new(tx, true))?;
        Ok(IntakeOutcome::Queued(hash))
    }

    /// Dispatch a decoded wire message. Rejections are logged and counted
    /// here; only fatal errors are returned.
    pub fn handle_message(&mut self, message: WireMessage) -> Result<(), NodeError> {
        let outcome = match message {
            WireMessage::SubmitTransaction(tx) => self.accept_local(tx).map(|_| ()),
            WireMessage::TransactionIntent(tx) => self.accept_remote(tx).map(|_| ()),
            WireMessage::BlockNotification(note) => self.on_peer_block(note).map(|_| ()),
        };
        match outcome {
            Err(e) if e.is_fatal() => Err(e),
            _ => Ok(()),
        }
    }

    fn is_known(&self, hash: &TxHash) -> Result<bool, NodeError> {
        Ok(self.queue.contains(hash)
            || self.builder.contains(hash)
            || self.recently_committed.contains(hash)
            || self.store.contains_transaction(hash)?)
    }

    fn enqueue(&mut self, entry: QueueEntry) -> Result<IntakeOutcome, NodeError> {
        let hash = entry.hash();
        let hlc = entry.hlc();
        match self.queue.append(entry) {
            AppendOutcome::Queued => {
                self.metrics.queue_depth.set(self.queue.len() as i64);
                tracing::debug!(tx = %hash, hlc = %hlc, "transaction queued");
                self.events.emit(&NodeEvent::TransactionQueued { hash, hlc });
                Ok(IntakeOutcome::Queued(hash))
            }
            AppendOutcome::Duplicate => Ok(IntakeOutcome::Duplicate(hash)),
            AppendOutcome::Full => {
                let capacity = self.queue.capacity();
                Err(self.reject(Some(hash), NodeError::QueueFull { capacity }))
            }
        }
    }

    fn reject(&self, hash: Option<TxHash>, err: NodeError) -> NodeError {
        self.metrics.transactions_rejected.inc();
        let kind = err.kind();
        match &hash {
            Some(h) => tracing::warn!(tx = %h, kind = %kind, error = %err, "transaction rejected"),
            None => tracing::warn!(kind = %kind, error = %err, "transaction rejected"),
        }
        self.events.emit(&NodeEvent::TransactionRejected {
            hash,
            kind,
            reason: err.to_string(),
        });
        err
    }

    // ── Peer blocks ────────────────────────────────────────────────────

    /// Compare a peer's block notification with our block at that height.
    pub fn on_peer_block(&mut self, note: BlockNotification) -> Result<PeerBlockStatus, NodeError> {
        let _span = peer_block_span(note.block_number, &note.owner).entered();
        if note.owner == self.signer.public_key() {
            return Ok(PeerBlockStatus::Own);
        }
        if let Err(e) = note.verify(self.verifier.as_ref()) {
            tracing::warn!(number = note.block_number, error = %e, "block notification rejected");
            return Err(e.into());
        }

        let Some(local) = self.block(note.block_number)? else {
            tracing::debug!(number = note.block_number, "peer is ahead of local chain");
            return Ok(PeerBlockStatus::Ahead);
        };
        if local.hash == note.block_hash && local.results_hash == note.results_hash {
            tracing::debug!(number = local.number, hash = %local.hash, "peer block agrees");
            self.events.emit(&NodeEvent::PeerBlockAgreed {
                number: local.number,
                hash: local.hash,
                owner: note.owner,
            });
            Ok(PeerBlockStatus::Agreed)
        } else {
            tracing::warn!(
                number = local.number,
                local = %local.hash,
                remote = %note.block_hash,
                owner = %note.owner,
                "peer block diverges from local chain"
            );
            self.events.emit(&NodeEvent::PeerBlockDiverged {
                number: local.number,
                local: local.hash,
                remote: note.block_hash,
                owner: note.owner,
            });
            Ok(PeerBlockStatus::Diverged)
        }
    }

    // ── Ordering, execution, blocks ────────────────────────────────────

    /// Execute every transaction that has aged past the dwell time and
    /// finalize blocks at their boundaries.
    ///
    /// A block closes when the next transaction in HLC order is stamped at
    /// or after its deadline, when it is full, or once local time is far
    /// enough past the deadline that no earlier-stamped transaction can
    /// still be released. The first two depend only on the ordered stream,
    /// so nodes agree on block contents regardless of when they step.
    ///
    /// Stops early after an abandoned block so the requeued transactions
    /// are retried on a later call rather than in a tight loop.
    pub fn step(&mut self) -> Result<StepReport, NodeError> {
        self.ensure_running()?;
        let mut report = StepReport::default();
        loop {
            let now = self.clock.now_ns();
            let next_ready = self.scheduler.time_until_ready(&self.queue, now) == Some(Duration::ZERO);
            let boundary = if next_ready {
                let next_physical = self
                    .queue
                    .peek_oldest()
                    .map(|entry| entry.hlc().physical_ns)
                    .unwrap_or(u64::MAX);
                self.builder.closes_before(next_physical)
            } else {
                self.builder.should_finalize(now)
            };
            if boundary {
                if self.finalize_block(&mut report)? {
                    continue;
                }
                break;
            }
            match self.scheduler.poll(&mut self.queue, now) {
                Poll::Ready(entry) => {
                    self.execute_entry(entry, now)?;
                    report.executed += 1;
                }
                Poll::Empty | Poll::Waiting { .. } => break,
            }
        }
        Ok(report)
    }

    /// How long until [`step`](Self::step) has something to do.
    ///
    /// `None` when both the queue and the current block are empty.
    pub fn next_wake(&self) -> Option<Duration> {
        let now = self.clock.now_ns();
        let queue_wait = self.scheduler.time_until_ready(&self.queue, now);
        let block_wait = self
            .builder
            .close_at_ns()
            .map(|close_at| Duration::from_nanos(close_at.saturating_sub(now)));
        match (queue_wait, block_wait) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn execute_entry(&mut self, entry: QueueEntry, now_ns: u64) -> Result<(), NodeError> {
        let hash = entry.hash();
        let _span = execute_span(&hash).entered();
        let dwell_ns = now_ns.saturating_sub(entry.hlc().physical_ns);
        self.metrics.dwell_time_ms.observe(dwell_ns as f64 / 1e6);

        let started = Instant::now();
        let outcome = self
            .engine
            .execute(&self.store, &entry.tx, entry.signature_verified);
        self.scheduler.finish();
        let result = match outcome {
            Ok(result) => result,
            Err(fault) => {
                tracing::error!(tx = %hash, error = %fault, "executor fault, node halting");
                self.halted = Some(fault.to_string());
                self.queue.requeue([entry]);
                return Err(fault.into());
            }
        };
        self.metrics
            .execution_time_ms
            .observe(started.elapsed().as_secs_f64() * 1e3);

        for delta in &result.state_deltas {
            self.store.stage(delta.key.clone(), delta.value.clone());
        }
        match &result.error {
            None => self.metrics.transactions_executed.inc(),
            Some(error) => {
                self.metrics.transactions_failed.inc();
                tracing::debug!(tx = %hash, kind = error.kind(), error = %error, "transaction failed");
            }
        }
        self.events.emit(&NodeEvent::TransactionExecuted {
            hash,
            success: result.success,
        });
        self.builder.push(entry, result);
        self.metrics.queue_depth.set(self.queue.len() as i64);
        Ok(())
    }

    /// Returns whether the block committed.
    fn finalize_block(&mut self, report: &mut StepReport) -> Result<bool, NodeError> {
        let number = self.store.chain_head()?.number + 1;
        let _span = finalize_block_span(number, self.builder.len()).entered();

        let outcome = self.builder.finalize(
            &mut self.store,
            self.engine.nonces_mut(),
            self.signer.as_ref(),
        );
        match outcome {
            Ok(FinalizeOutcome::Committed {
                block,
                notification,
            }) => {
                for tx in &block.transactions {
                    self.recently_committed.insert(tx.input_hash);
                }
                self.metrics.blocks_finalized.inc();
                self.metrics.chain_height.set(block.number as i64);
                self.events.emit(&NodeEvent::BlockFinalized {
                    number: block.number,
                    hash: block.hash,
                    transactions: block.transactions.len(),
                });
                self.outbox.push(WireMessage::BlockNotification(notification));
                report.committed.push(ChainHead {
                    number: block.number,
                    hash: block.hash,
                });
                Ok(true)
            }
            Ok(FinalizeOutcome::Abandoned {
                number,
                reason,
                requeue,
            }) => {
                self.requeue_abandoned(number, reason, requeue);
                report.abandoned += 1;
                Ok(false)
            }
            Err(CommitFailure {
                number,
                error,
                requeue,
            }) => {
                self.requeue_abandoned(number, error.to_string(), requeue);
                self.halted = Some(format!("commit of block {number} failed: {error}"));
                Err(NodeError::CommitFailed {
                    number,
                    source: error,
                })
            }
        }
    }

    fn requeue_abandoned(&mut self, number: u64, reason: String, entries: Vec<QueueEntry>) {
        let requeued = self.queue.requeue(entries);
        self.metrics.blocks_abandoned.inc();
        self.metrics.queue_depth.set(self.queue.len() as i64);
        self.events.emit(&NodeEvent::BlockAbandoned {
            number,
            reason,
            requeued,
        });
    }

    fn ensure_running(&self) -> Result<(), NodeError> {
        match &self.halted {
            Some(reason) => Err(NodeError::Halted(reason.clone())),
            None => Ok(()),
        }
    }
}
