//! Integration tests exercising the full pipeline:
//! intake → HLC ordering → dwell → execution → block commit → readback.
//!
//! The synchronous tests drive [`NodeContext`] directly under a
//! [`NullClock`]; the async ones run [`StrataNode`] with its tasks over a
//! null or in-process transport.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use strata_crypto::{Ed25519Signer, Ed25519Verifier, Signer, Verifier};
use strata_execution::{currency, ContractCall, ContractOutput, ContractRegistry, Executor, ExecutorFault};
use strata_hlc::HlcError;
use strata_ledger::{verify_chain, ExecutionError, NonceError};
use strata_messages::{decode, encode, WireMessage};
use strata_network::{ChannelHub, Transport};
use strata_node::{
    HaltReason, IntakeOutcome, NodeConfig, NodeContext, NodeError, NodeEvent, NodeMetrics,
    NodeServices, PeerBlockStatus, StrataNode,
};
use strata_nullables::{NullClock, NullPersistence, NullSigner, NullTransport};
use strata_store::{Persistence, StateStore, StateView};
use strata_store_lmdb::LmdbPersistence;
use strata_transactions::{ProcessedTransaction, SignedTransaction, TransactionBuilder};
use strata_types::{HlcTimestamp, NodeId, PublicKey};

const MS: u64 = 1_000_000;
const START_NS: u64 = 1_000 * MS;
const GENESIS_BALANCE: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_config() -> NodeConfig {
    NodeConfig {
        processing_delay_ms: 50,
        max_block_transactions: 10,
        max_block_interval_ms: 20,
        idle_poll_ms: 5,
        ..NodeConfig::default()
    }
}

fn alice() -> Ed25519Signer {
    Ed25519Signer::from_seed(&[0xA1; 32])
}

fn bob() -> PublicKey {
    Ed25519Signer::from_seed(&[0xB0; 32]).public_key()
}

fn transfer(nonce: u64, amount: i64) -> SignedTransaction {
    TransactionBuilder::new("currency", "transfer")
        .nonce(nonce)
        .stamps(10_000)
        .arg("to", bob().to_hex())
        .arg("amount", amount)
        .sign(&alice())
        .unwrap()
}

fn executor(config: &NodeConfig) -> Arc<dyn Executor> {
    let mut registry = ContractRegistry::new(config.protocol_params().stamps);
    currency::register(&mut registry, None);
    Arc::new(registry)
}

fn build_context<P: Persistence>(
    config: &NodeConfig,
    persistence: P,
    signer: &NullSigner,
    clock: &NullClock,
) -> NodeContext<P> {
    build_context_with(config, persistence, signer, clock, executor(config))
}

fn build_context_with<P: Persistence>(
    config: &NodeConfig,
    persistence: P,
    signer: &NullSigner,
    clock: &NullClock,
    executor: Arc<dyn Executor>,
) -> NodeContext<P> {
    let services = NodeServices {
        executor,
        signer: Arc::new(signer.clone()),
        verifier: Arc::new(Ed25519Verifier),
        clock: Arc::new(clock.clone()),
    };
    let store = StateStore::new(persistence, config.blocks_per_epoch);
    let mut ctx = NodeContext::new(config, store, services, Arc::new(NodeMetrics::new()))
        .expect("context");
    ctx.apply_genesis(&[(alice().public_key(), GENESIS_BALANCE)])
        .expect("genesis");
    ctx
}

/// One node on null infrastructure, steered by the test.
struct TestNode {
    ctx: NodeContext<NullPersistence>,
    config: NodeConfig,
    clock: NullClock,
    persistence: NullPersistence,
    signer: NullSigner,
}

impl TestNode {
    fn new(seed: u8) -> Self {
        Self::with_clock(seed, NullClock::new(START_NS))
    }

    fn with_clock(seed: u8, clock: NullClock) -> Self {
        let config = test_config();
        let persistence = NullPersistence::new();
        let signer = NullSigner::from_seed_byte(seed);
        let ctx = build_context(&config, persistence.clone(), &signer, &clock);
        Self {
            ctx,
            config,
            clock,
            persistence,
            signer,
        }
    }

    /// A fresh context over the same persistence, as after a crash.
    fn restart(&mut self) {
        self.ctx = build_context(&self.config, self.persistence.clone(), &self.signer, &self.clock);
    }

    /// Age everything past the dwell time, then close the block.
    fn settle(&mut self) -> Result<Vec<u64>, NodeError> {
        self.clock.advance(Duration::from_millis(60));
        let mut committed: Vec<u64> = self.ctx.step()?.committed.iter().map(|h| h.number).collect();
        self.clock.advance(Duration::from_millis(25));
        committed.extend(self.ctx.step()?.committed.iter().map(|h| h.number));
        Ok(committed)
    }

    fn balance(&self, account: &PublicKey) -> i128 {
        currency::read_balance(self.ctx.store(), &self.ctx.params().stamps, account).unwrap()
    }
}

/// Intents produced by `from`, delivered to `to`.
fn relay_intents(from: &mut TestNode, to: &mut TestNode) -> usize {
    let mut relayed = 0;
    for message in from.ctx.drain_outbox() {
        if let WireMessage::TransactionIntent(tx) = message {
            to.ctx.accept_remote(tx).unwrap();
            relayed += 1;
        }
    }
    relayed
}

fn stamp_with(tx: SignedTransaction, processor: &Ed25519Signer, physical_ns: u64) -> ProcessedTransaction {
    let ts = HlcTimestamp::new(physical_ns, 0, NodeId::from(processor.public_key()));
    ProcessedTransaction::stamp(tx, ts, processor).unwrap()
}

fn block_hashes(node: &TestNode, number: u64) -> Vec<strata_types::TxHash> {
    node.ctx
        .block(number)
        .unwrap()
        .expect("block")
        .transactions
        .iter()
        .map(|t| t.input_hash)
        .collect()
}

/// Reads state fine but fails every contract call.
struct FaultingExecutor;

impl Executor for FaultingExecutor {
    fn execute(&self, _state: &dyn StateView, _call: &ContractCall) -> Result<ContractOutput, ExecutorFault> {
        Err(ExecutorFault::CorruptValue {
            key: "currency.balances".into(),
            reason: "truncated value".into(),
        })
    }
}

// ---------------------------------------------------------------------------
// Ordering and dwell
// ---------------------------------------------------------------------------

#[test]
fn older_transaction_blocks_younger_until_aged() {
    let mut node = TestNode::new(1);
    node.clock.set(100 * MS);
    let a = node.ctx.accept_local(transfer(1, 10)).unwrap().hash();
    node.clock.set(105 * MS);
    let b = node.ctx.accept_local(transfer(2, 20)).unwrap().hash();

    node.clock.set(140 * MS);
    assert_eq!(node.ctx.step().unwrap().executed, 0);
    assert_eq!(node.ctx.queue().len(), 2);

    node.clock.set(151 * MS);
    assert_eq!(node.ctx.step().unwrap().executed, 1);
    assert!(node.ctx.builder().contains(&a));
    assert!(node.ctx.queue().contains(&b));

    node.clock.set(156 * MS);
    assert_eq!(node.ctx.step().unwrap().executed, 1);
    assert!(node.ctx.queue().is_empty());

    node.clock.set(180 * MS);
    let report = node.ctx.step().unwrap();
    assert_eq!(report.committed.len(), 1);

    let block = node.ctx.block(1).unwrap().expect("block 1");
    let order: Vec<_> = block.transactions.iter().map(|t| t.input_hash).collect();
    assert_eq!(order, vec![a, b]);
    assert!(block.results.iter().all(|r| r.success));
}

#[test]
fn nonce_reuse_fails_and_next_nonce_succeeds() {
    let mut node = TestNode::new(1);
    node.ctx.accept_local(transfer(5, 10)).unwrap();
    assert_eq!(node.settle().unwrap(), vec![1]);

    node.ctx.accept_local(transfer(5, 11)).unwrap();
    node.clock.advance(Duration::from_millis(1));
    node.ctx.accept_local(transfer(6, 12)).unwrap();
    assert_eq!(node.settle().unwrap(), vec![2]);

    let block = node.ctx.block(2).unwrap().expect("block 2");
    assert_eq!(block.results.len(), 2);
    assert!(!block.results[0].success);
    assert!(matches!(
        block.results[0].error,
        Some(ExecutionError::Nonce(NonceError::TooLow { last: 5, got: 5 }))
    ));
    assert!(block.results[0].state_deltas.is_empty());
    assert!(block.results[1].success);
    assert_eq!(node.ctx.store().committed_nonce(&alice().public_key()).unwrap(), Some(6));
}

// ---------------------------------------------------------------------------
// Determinism across nodes
// ---------------------------------------------------------------------------

#[test]
fn peers_produce_identical_blocks_and_state() {
    let clock = NullClock::new(START_NS);
    let mut a = TestNode::with_clock(1, clock.clone());
    let mut b = TestNode::with_clock(2, clock);

    a.ctx.accept_local(transfer(1, 100)).unwrap();
    a.clock.advance(Duration::from_millis(2));
    a.ctx.accept_local(transfer(2, 250)).unwrap();
    assert_eq!(relay_intents(&mut a, &mut b), 2);

    assert_eq!(a.settle().unwrap(), vec![1]);
    assert_eq!(b.settle().unwrap(), vec![1]);

    let block_a = a.ctx.block(1).unwrap().unwrap();
    let block_b = b.ctx.block(1).unwrap().unwrap();
    assert_eq!(block_a.hash, block_b.hash);
    assert_eq!(block_a.results_hash, block_b.results_hash);
    assert_ne!(block_a.owner, block_b.owner);

    let alice = alice().public_key();
    assert_eq!(a.balance(&bob()), 350);
    assert_eq!(a.balance(&bob()), b.balance(&bob()));
    assert_eq!(a.balance(&alice), b.balance(&alice));
    assert!(a.balance(&alice) < GENESIS_BALANCE as i128 - 350);

    let notification = a
        .ctx
        .drain_outbox()
        .into_iter()
        .find_map(|m| match m {
            WireMessage::BlockNotification(n) => Some(n),
            _ => None,
        })
        .expect("block notification");
    assert_eq!(b.ctx.on_peer_block(notification.clone()).unwrap(), PeerBlockStatus::Agreed);
    assert_eq!(a.ctx.on_peer_block(notification).unwrap(), PeerBlockStatus::Own);
}

#[test]
fn block_boundaries_do_not_depend_on_step_timing() {
    // Separate clocks: the nodes wake at different moments.
    let mut a = TestNode::with_clock(1, NullClock::new(START_NS));
    let mut b = TestNode::with_clock(2, NullClock::new(START_NS));

    let tx1 = a.ctx.accept_local(transfer(1, 10)).unwrap().hash();
    a.clock.advance(Duration::from_millis(15));
    let tx2 = a.ctx.accept_local(transfer(2, 20)).unwrap().hash();
    a.clock.advance(Duration::from_millis(15));
    let tx3 = a.ctx.accept_local(transfer(3, 30)).unwrap().hash();
    assert_eq!(relay_intents(&mut a, &mut b), 3);

    // Interval 20ms: tx1 and tx2 share a block, tx3 starts the next.
    for offset_ms in [50, 75, 200] {
        a.clock.set(START_NS + offset_ms * MS);
        a.ctx.step().unwrap();
    }
    for offset_ms in [66, 200] {
        b.clock.set(START_NS + offset_ms * MS);
        b.ctx.step().unwrap();
    }

    for node in [&a, &b] {
        assert_eq!(node.ctx.chain_head().unwrap().number, 2);
        assert_eq!(block_hashes(node, 1), vec![tx1, tx2]);
        assert_eq!(block_hashes(node, 2), vec![tx3]);
    }
    for number in 1..=2 {
        let block_a = a.ctx.block(number).unwrap().unwrap();
        let block_b = b.ctx.block(number).unwrap().unwrap();
        assert_eq!(block_a.hash, block_b.hash);
        assert_eq!(block_a.results_hash, block_b.results_hash);
    }
}

#[test]
fn late_transaction_past_deadline_opens_next_block() {
    let mut node = TestNode::new(1);
    let first = node.ctx.accept_local(transfer(1, 10)).unwrap().hash();
    node.clock.advance(Duration::from_millis(25));
    let second = node.ctx.accept_local(transfer(2, 10)).unwrap().hash();

    // Both aged before the first step; the boundary still falls between them.
    node.clock.advance(Duration::from_millis(100));
    let report = node.ctx.step().unwrap();
    assert_eq!(report.executed, 2);
    assert_eq!(report.committed.len(), 2);
    assert_eq!(block_hashes(&node, 1), vec![first]);
    assert_eq!(block_hashes(&node, 2), vec![second]);
}

#[test]
fn diverging_peer_block_is_reported() {
    let clock = NullClock::new(START_NS);
    let mut a = TestNode::with_clock(1, clock.clone());
    let mut b = TestNode::with_clock(2, clock);

    let diverged = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&diverged);
    b.ctx.subscribe(Box::new(move |event| {
        if let NodeEvent::PeerBlockDiverged { number, .. } = event {
            sink.lock().unwrap().push(*number);
        }
    }));

    // Each node sees a different transaction.
    a.ctx.accept_local(transfer(1, 100)).unwrap();
    a.ctx.drain_outbox();
    b.ctx.accept_local(transfer(1, 200)).unwrap();
    a.settle().unwrap();
    b.settle().unwrap();
    assert_eq!(b.ctx.chain_head().unwrap().number, 1);

    let note = a
        .ctx
        .drain_outbox()
        .into_iter()
        .find_map(|m| match m {
            WireMessage::BlockNotification(n) => Some(n),
            _ => None,
        })
        .unwrap();
    assert_eq!(b.ctx.on_peer_block(note).unwrap(), PeerBlockStatus::Diverged);
    assert_eq!(*diverged.lock().unwrap(), vec![1]);
}

#[test]
fn peer_ahead_of_local_chain() {
    let clock = NullClock::new(START_NS);
    let mut a = TestNode::with_clock(1, clock.clone());
    let mut b = TestNode::with_clock(2, clock);

    a.ctx.accept_local(transfer(1, 1)).unwrap();
    a.ctx.drain_outbox();
    a.settle().unwrap();
    let note = match a.ctx.drain_outbox().pop() {
        Some(WireMessage::BlockNotification(n)) => n,
        other => panic!("expected notification, got {other:?}"),
    };
    assert_eq!(b.ctx.on_peer_block(note).unwrap(), PeerBlockStatus::Ahead);
}

// ---------------------------------------------------------------------------
// Failure handling
// ---------------------------------------------------------------------------

#[test]
fn failed_commit_leaves_state_untouched_and_halts() {
    let mut node = TestNode::new(1);
    let hash = node.ctx.accept_local(transfer(1, 100)).unwrap().hash();
    let before = node.persistence.snapshot();

    node.persistence.fail_next_commit();
    let err = node.settle().unwrap_err();
    assert!(matches!(err, NodeError::CommitFailed { number: 1, .. }));
    assert!(err.is_fatal());
    assert_eq!(node.persistence.snapshot(), before);
    assert!(node.ctx.halt_reason().is_some());
    assert!(matches!(node.ctx.step(), Err(NodeError::Halted(_))));
    assert!(matches!(
        node.ctx.accept_local(transfer(2, 1)),
        Err(NodeError::Halted(_))
    ));

    node.restart();
    assert_eq!(node.ctx.chain_head().unwrap().number, 0);
    assert_eq!(node.balance(&bob()), 0);
    assert_eq!(
        node.ctx.accept_local(transfer(1, 100)).unwrap(),
        IntakeOutcome::Queued(hash)
    );
    assert_eq!(node.settle().unwrap(), vec![1]);
    assert_eq!(node.balance(&bob()), 100);
}

#[test]
fn signing_failure_abandons_and_requeues_with_original_timestamps() {
    let mut node = TestNode::new(1);
    let hash = node.ctx.accept_local(transfer(1, 100)).unwrap().hash();
    let stamped_at = node.ctx.queue().hlc_of(&hash).unwrap();

    let abandoned = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&abandoned);
    node.ctx.subscribe(Box::new(move |event| {
        if let NodeEvent::BlockAbandoned { requeued, .. } = event {
            *sink.lock().unwrap() += requeued;
        }
    }));

    node.signer.set_failing(true);
    assert!(node.settle().unwrap().is_empty());
    assert_eq!(*abandoned.lock().unwrap(), 1);
    assert_eq!(node.ctx.queue().hlc_of(&hash), Some(stamped_at));
    assert_eq!(node.ctx.chain_head().unwrap().number, 0);
    assert_eq!(node.ctx.store().staged_len(), 0);
    assert!(node.ctx.halt_reason().is_none());

    node.signer.set_failing(false);
    assert_eq!(node.settle().unwrap(), vec![1]);
    assert_eq!(node.balance(&bob()), 100);
    assert_eq!(node.ctx.metrics().blocks_abandoned.get(), 1);
}

#[test]
fn timestamp_beyond_drift_is_rejected() {
    let mut node = TestNode::new(1);
    let processor = Ed25519Signer::from_seed(&[0xB2; 32]);
    let far_future = START_NS + 10_000 * MS;
    let tx = stamp_with(transfer(1, 1), &processor, far_future);

    let err = node.ctx.accept_remote(tx).unwrap_err();
    assert!(matches!(err, NodeError::Clock(HlcError::DriftExceeded { .. })));
    assert!(!err.is_fatal());
    assert!(node.ctx.queue().is_empty());
    assert_eq!(node.ctx.metrics().transactions_rejected.get(), 1);
}

#[test]
fn rejected_earlier_copy_keeps_queued_copy() {
    let mut node = TestNode::new(1);
    let p1 = Ed25519Signer::from_seed(&[0xC1; 32]);
    let p2 = Ed25519Signer::from_seed(&[0xC2; 32]);
    let tx = transfer(1, 100);
    let queued = stamp_with(tx.clone(), &p1, START_NS + 4_500 * MS);
    let hash = queued.input_hash;
    node.ctx.accept_remote(queued.clone()).unwrap();

    // Local time falls back so the earlier copy is now beyond the drift bound.
    node.clock.rewind(Duration::from_millis(1_000));
    let earlier = stamp_with(tx, &p2, START_NS + 4_200 * MS);
    let err = node.ctx.accept_remote(earlier).unwrap_err();
    assert!(matches!(err, NodeError::Clock(HlcError::DriftExceeded { .. })));

    assert_eq!(node.ctx.queue().len(), 1);
    assert_eq!(node.ctx.queue().hlc_of(&hash), Some(queued.hlc_timestamp));
}

#[test]
fn executor_fault_halts_and_keeps_transaction_queued() {
    let config = test_config();
    let clock = NullClock::new(START_NS);
    let persistence = NullPersistence::new();
    let signer = NullSigner::from_seed_byte(1);
    let mut ctx = build_context_with(&config, persistence.clone(), &signer, &clock, Arc::new(FaultingExecutor));
    let before = persistence.snapshot();

    let hash = ctx.accept_local(transfer(1, 100)).unwrap().hash();
    let stamped_at = ctx.queue().hlc_of(&hash).unwrap();
    clock.advance(Duration::from_millis(60));

    let err = ctx.step().unwrap_err();
    assert!(matches!(err, NodeError::Executor(ExecutorFault::CorruptValue { .. })));
    assert!(err.is_fatal());
    assert!(ctx.halt_reason().is_some());
    assert_eq!(ctx.queue().hlc_of(&hash), Some(stamped_at));
    assert!(ctx.builder().is_empty());
    assert_eq!(ctx.store().staged_len(), 0);
    assert_eq!(ctx.chain_head().unwrap().number, 0);
    assert_eq!(persistence.snapshot(), before);

    clock.advance(Duration::from_millis(100));
    assert!(matches!(ctx.step(), Err(NodeError::Halted(_))));
    assert!(matches!(
        ctx.accept_local(transfer(2, 1)),
        Err(NodeError::Halted(_))
    ));
}

#[test]
fn processor_must_match_timestamp_node() {
    let mut node = TestNode::new(1);
    let processor = Ed25519Signer::from_seed(&[0xB2; 32]);
    let ts = HlcTimestamp::new(START_NS, 0, NodeId::from(bob()));
    let tx = ProcessedTransaction::stamp(transfer(1, 1), ts, &processor).unwrap();

    let err = node.ctx.accept_remote(tx).unwrap_err();
    assert_eq!(err.kind(), "processor_mismatch");
    assert!(node.ctx.queue().is_empty());
}

#[test]
fn forged_processor_signature_is_rejected() {
    let mut node = TestNode::new(1);
    let processor = Ed25519Signer::from_seed(&[0xB2; 32]);
    let mut tx = stamp_with(transfer(1, 1), &processor, START_NS);
    tx.processor = bob();

    assert!(matches!(
        node.ctx.accept_remote(tx),
        Err(NodeError::Transaction(_))
    ));
    assert!(node.ctx.queue().is_empty());
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

#[test]
fn duplicate_submissions_are_ignored_everywhere() {
    let mut node = TestNode::new(1);
    let tx = transfer(1, 100);
    let hash = node.ctx.accept_local(tx.clone()).unwrap().hash();
    assert_eq!(node.ctx.accept_local(tx.clone()).unwrap(), IntakeOutcome::Duplicate(hash));
    assert_eq!(node.ctx.queue().len(), 1);

    node.settle().unwrap();
    assert_eq!(node.ctx.accept_local(tx.clone()).unwrap(), IntakeOutcome::Duplicate(hash));

    node.restart();
    assert_eq!(node.ctx.accept_local(tx).unwrap(), IntakeOutcome::Duplicate(hash));
    assert!(node.ctx.queue().is_empty());
    assert_eq!(node.balance(&bob()), 100);
}

#[test]
fn earlier_stamp_of_same_transaction_wins() {
    let mut node = TestNode::new(1);
    let p1 = Ed25519Signer::from_seed(&[0xC1; 32]);
    let p2 = Ed25519Signer::from_seed(&[0xC2; 32]);
    let tx = transfer(1, 100);
    let later = stamp_with(tx.clone(), &p1, START_NS + 3 * MS);
    let earlier = stamp_with(tx, &p2, START_NS + MS);
    let hash = later.input_hash;

    node.ctx.accept_remote(later.clone()).unwrap();
    assert_eq!(node.ctx.accept_remote(earlier.clone()).unwrap(), IntakeOutcome::Queued(hash));
    assert_eq!(node.ctx.queue().len(), 1);
    assert_eq!(node.ctx.queue().hlc_of(&hash), Some(earlier.hlc_timestamp));
    assert_eq!(node.ctx.accept_remote(later).unwrap(), IntakeOutcome::Duplicate(hash));

    node.settle().unwrap();
    let block = node.ctx.block(1).unwrap().unwrap();
    assert_eq!(block.transactions[0].processor, p2.public_key());
}

#[test]
fn genesis_is_applied_once() {
    let mut node = TestNode::new(1);
    assert_eq!(node.ctx.apply_genesis(&[(bob(), 5)]).unwrap(), 0);
    assert_eq!(node.balance(&bob()), 0);
}

// ---------------------------------------------------------------------------
// Chain integrity and persistence
// ---------------------------------------------------------------------------

#[test]
fn committed_blocks_form_a_verified_chain() {
    let mut node = TestNode::new(1);
    for nonce in 1..=3 {
        node.ctx.accept_local(transfer(nonce, 10)).unwrap();
        assert_eq!(node.settle().unwrap(), vec![nonce]);
    }

    let blocks: Vec<_> = (1..=3)
        .map(|n| node.ctx.block(n).unwrap().unwrap())
        .collect();
    verify_chain(&blocks).unwrap();
    assert_eq!(blocks[1].previous_hash, blocks[0].hash);
    assert_eq!(blocks[2].previous_hash, blocks[1].hash);
    assert_eq!(node.ctx.chain_head().unwrap().hash, blocks[2].hash);
    assert!(node.ctx.block(4).unwrap().is_none());
}

#[test]
fn lmdb_backed_node_survives_restart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = test_config();
    let clock = NullClock::new(START_NS);
    let signer = NullSigner::from_seed_byte(1);

    let head = {
        let persistence = LmdbPersistence::open(dir.path(), 64 * 1024 * 1024).unwrap();
        let mut ctx = build_context(&config, persistence, &signer, &clock);
        ctx.accept_local(transfer(1, 42)).unwrap();
        clock.advance(Duration::from_millis(60));
        ctx.step().unwrap();
        clock.advance(Duration::from_millis(25));
        let report = ctx.step().unwrap();
        assert_eq!(report.committed.len(), 1);
        report.committed[0]
    };

    let persistence = LmdbPersistence::open(dir.path(), 64 * 1024 * 1024).unwrap();
    let ctx = build_context(&config, persistence, &signer, &clock);
    assert_eq!(ctx.chain_head().unwrap(), head);
    let balance = currency::read_balance(ctx.store(), &ctx.params().stamps, &bob()).unwrap();
    assert_eq!(balance, 42);
    let block = ctx.block(1).unwrap().unwrap();
    verify_chain(&[block]).unwrap();
}

// ---------------------------------------------------------------------------
// Running node
// ---------------------------------------------------------------------------

/// Keep the null clock moving while the node's tasks run.
fn tick(clock: NullClock) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            clock.advance(Duration::from_millis(5));
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
}

fn start_node(
    seed: u8,
    clock: &NullClock,
    persistence: NullPersistence,
    transport: Arc<dyn Transport>,
) -> StrataNode {
    let config = test_config();
    let signer = NullSigner::from_seed_byte(seed);
    let ctx = build_context(&config, persistence, &signer, clock);
    let verifier: Arc<dyn Verifier> = Arc::new(Ed25519Verifier);
    StrataNode::start(ctx, &config, verifier, transport).unwrap()
}

#[tokio::test]
async fn running_node_commits_and_broadcasts() {
    let clock = NullClock::new(START_NS);
    let transport = NullTransport::new();
    let node = start_node(1, &clock, NullPersistence::new(), Arc::new(transport.clone()));
    let ticker = tick(clock);

    node.handle().submit(transfer(1, 100)).await.unwrap();
    let head = tokio::time::timeout(Duration::from_secs(5), node.handle().wait_for_height(1))
        .await
        .expect("block within timeout")
        .unwrap();
    assert_eq!(head.number, 1);

    let network = test_config().network;
    let saw_notification = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let kinds: Vec<_> = transport
                .sent()
                .iter()
                .map(|bytes| decode(network, bytes).unwrap().kind())
                .collect();
            if kinds.contains(&"block_notification") {
                return kinds;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("notification broadcast");
    assert!(saw_notification.contains(&"transaction_intent"));
    assert_eq!(node.metrics().blocks_finalized.get(), 1);

    ticker.abort();
    assert_eq!(node.stop().await.unwrap(), Some(HaltReason::Requested));
}

#[tokio::test]
async fn running_node_accepts_transport_submissions() {
    let clock = NullClock::new(START_NS);
    let transport = NullTransport::new();
    let node = start_node(1, &clock, NullPersistence::new(), Arc::new(transport.clone()));
    let ticker = tick(clock);

    let network = test_config().network;
    let bytes = encode(network, &WireMessage::SubmitTransaction(transfer(1, 7))).unwrap();
    transport.deliver(bytes.clone());
    transport.deliver(bytes);

    let head = tokio::time::timeout(Duration::from_secs(5), node.handle().wait_for_height(1))
        .await
        .expect("block within timeout")
        .unwrap();
    assert_eq!(head.number, 1);

    ticker.abort();
    node.stop().await.unwrap();
}

#[tokio::test]
async fn commit_failure_halts_running_node() {
    let clock = NullClock::new(START_NS);
    let persistence = NullPersistence::new();
    let node = start_node(1, &clock, persistence.clone(), Arc::new(NullTransport::new()));
    let ticker = tick(clock);

    persistence.fail_next_commit();
    node.handle().submit(transfer(1, 100)).await.unwrap();
    let reason = tokio::time::timeout(Duration::from_secs(5), node.halted())
        .await
        .expect("halt within timeout");
    assert!(matches!(reason, HaltReason::Fatal(_)));
    assert_eq!(node.handle().head().number, 0);

    ticker.abort();
    assert!(matches!(node.stop().await.unwrap(), Some(HaltReason::Fatal(_))));
}

#[tokio::test]
async fn two_nodes_over_channels_agree() {
    let clock = NullClock::new(START_NS);
    let hub = ChannelHub::new();
    let a = start_node(1, &clock, NullPersistence::new(), Arc::new(hub.connect(64)));
    let b = start_node(2, &clock, NullPersistence::new(), Arc::new(hub.connect(64)));
    let ticker = tick(clock);

    a.handle().submit(transfer(1, 100)).await.unwrap();

    let wait = Duration::from_secs(5);
    let head_a = tokio::time::timeout(wait, a.handle().wait_for_height(1))
        .await
        .expect("node a commits")
        .unwrap();
    let head_b = tokio::time::timeout(wait, b.handle().wait_for_height(1))
        .await
        .expect("node b commits")
        .unwrap();
    assert_eq!(head_a, head_b);

    ticker.abort();
    a.stop().await.unwrap();
    b.stop().await.unwrap();
}
