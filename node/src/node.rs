//! Task model around [`NodeContext`].
//!
//! Three tasks, connected by channels:
//!
//! - **intake**: decodes raw transport messages, drops duplicates, runs
//!   stateless validation, and forwards the survivors;
//! - **ordering**: owns the [`NodeContext`]; suspends on the intake channel
//!   or a timer, then steps the scheduler, executes and commits blocks;
//! - **fan-out**: encodes outbound messages and hands them to the transport.
//!
//! Transaction intents are never dropped: a peer that misses one cannot
//! execute the transaction and its chain diverges. The ordering task waits
//! for room on the fan-out channel and the fan-out task retries a full
//! transport. Block notifications are advisory and are dropped under
//! back-pressure.
//!
//! The transport callback cannot wait, so raw inbound messages go through an
//! unbounded channel; the intake task applies back-pressure downstream of it.
//!
//! Blocks are durable before their notification reaches the fan-out
//! channel. A fatal error in the ordering task halts the whole node.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use strata_crypto::Verifier;
use strata_ledger::BlockNotification;
use strata_messages::{decode, encode, WireMessage};
use strata_network::{MessageDedup, Transport, TransportError};
use strata_store::{ChainHead, Persistence};
use strata_transactions::{
    validate_processed, validate_signed, ProcessedTransaction, SignedTransaction,
    TransactionError,
};
use strata_types::{NetworkId, ProtocolParams, TxHash};

use crate::config::NodeConfig;
use crate::context::NodeContext;
use crate::metrics::NodeMetrics;
use crate::shutdown::{HaltReason, ShutdownController};
use crate::tracing_spans::intake_span;
use crate::NodeError;

/// Timeout for waiting on background tasks during shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A validated message on its way to the ordering task.
#[derive(Debug)]
enum Inbound {
    Local(SignedTransaction),
    Remote(ProcessedTransaction),
    PeerBlock(BlockNotification),
}

/// Client-side handle to a running node.
#[derive(Clone)]
pub struct NodeHandle {
    submit_tx: mpsc::Sender<SignedTransaction>,
    head_rx: watch::Receiver<ChainHead>,
}

impl NodeHandle {
    /// Submit a client transaction. Waits if the intake channel is full.
    pub async fn submit(&self, tx: SignedTransaction) -> Result<(), NodeError> {
        self.submit_tx
            .send(tx)
            .await
            .map_err(|_| NodeError::Halted("intake task has stopped".into()))
    }

    /// Most recently committed chain head.
    pub fn head(&self) -> ChainHead {
        *self.head_rx.borrow()
    }

    pub fn watch_head(&self) -> watch::Receiver<ChainHead> {
        self.head_rx.clone()
    }

    /// Resolve once the chain reaches `height`.
    pub async fn wait_for_height(&self, height: u64) -> Result<ChainHead, NodeError> {
        let mut rx = self.head_rx.clone();
        let head = rx
            .wait_for(|head| head.number >= height)
            .await
            .map_err(|_| NodeError::Halted("ordering task has stopped".into()))?;
        Ok(*head)
    }
}

pub struct StrataNode {
    handle: NodeHandle,
    shutdown: Arc<ShutdownController>,
    metrics: Arc<NodeMetrics>,
    task_handles: Vec<JoinHandle<()>>,
}

impl StrataNode {
    /// Spawn the node's tasks. Must be called inside a Tokio runtime.
    pub fn start<P>(
        ctx: NodeContext<P>,
        config: &NodeConfig,
        verifier: Arc<dyn Verifier>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, NodeError>
    where
        P: Persistence + 'static,
    {
        let shutdown = Arc::new(ShutdownController::new());
        let metrics = Arc::clone(ctx.metrics());
        let network = ctx.network();
        let head = ctx.chain_head()?;

        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let (submit_tx, submit_rx) = mpsc::channel(config.intake_channel_capacity);
        let (inbound_tx, inbound_rx) = mpsc::channel(config.intake_channel_capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_channel_capacity);
        let (head_tx, head_rx) = watch::channel(head);

        transport.on_receive(Box::new(move |bytes| {
            if raw_tx.send(bytes).is_err() {
                tracing::debug!("intake task stopped, ignoring inbound message");
            }
        }));

        let filter = IntakeFilter {
            network,
            params: ctx.params().clone(),
            verifier,
            metrics: Arc::clone(&metrics),
            dedup: MessageDedup::new(config.dedup_capacity),
        };

        let task_handles = vec![
            spawn_intake(filter, raw_rx, submit_rx, inbound_tx, shutdown.subscribe()),
            spawn_ordering(
                ctx,
                config.idle_poll(),
                inbound_rx,
                outbound_tx,
                head_tx,
                Arc::clone(&shutdown),
            ),
            spawn_fan_out(
                network,
                transport,
                config.idle_poll(),
                outbound_rx,
                shutdown.subscribe(),
            ),
        ];

        tracing::info!(network = %network, height = head.number, "node started");
        Ok(Self {
            handle: NodeHandle { submit_tx, head_rx },
            shutdown,
            metrics,
            task_handles,
        })
    }

    pub fn handle(&self) -> NodeHandle {
        self.handle.clone()
    }

    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        &self.metrics
    }

    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Resolve when the node stops, for whatever reason.
    pub async fn halted(&self) -> HaltReason {
        let mut rx = self.shutdown.subscribe();
        if let Some(reason) = self.shutdown.reason() {
            return reason;
        }
        let _ = rx.recv().await;
        self.shutdown.reason().unwrap_or(HaltReason::Requested)
    }

    /// Signal every task and wait for them to finish.
    pub async fn stop(mut self) -> Result<Option<HaltReason>, NodeError> {
        tracing::info!("node stopping");
        self.shutdown.shutdown();

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let wait_all = async {
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "node task panicked");
                }
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all).await.is_err() {
            tracing::warn!(timeout = ?SHUTDOWN_TIMEOUT, "shutdown timeout, some tasks may still be running");
            return Err(NodeError::ShutdownTimeout);
        }

        let reason = self.shutdown.reason();
        tracing::info!(reason = ?reason, "node stopped");
        Ok(reason)
    }
}

// ── Intake ─────────────────────────────────────────────────────────────

struct IntakeFilter {
    network: NetworkId,
    params: ProtocolParams,
    verifier: Arc<dyn Verifier>,
    metrics: Arc<NodeMetrics>,
    dedup: MessageDedup,
}

impl IntakeFilter {
    fn check_raw(&mut self, bytes: &[u8]) -> Option<Inbound> {
        if !self.dedup.first_seen(bytes) {
            return None;
        }
        let message = match decode(self.network, bytes) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(kind = "malformed_message", error = %e, "message rejected");
                return None;
            }
        };
        let _span = intake_span(message.kind()).entered();
        match message {
            WireMessage::SubmitTransaction(tx) => self.check_local(tx),
            WireMessage::TransactionIntent(tx) => {
                self.metrics.transactions_received.inc();
                match validate_processed(&tx, self.verifier.as_ref(), &self.params) {
                    Ok(()) => Some(Inbound::Remote(tx)),
                    Err(e) => {
                        self.rejected(Some(tx.input_hash), &e);
                        None
                    }
                }
            }
            WireMessage::BlockNotification(note) => Some(Inbound::PeerBlock(note)),
        }
    }

    fn check_local(&self, tx: SignedTransaction) -> Option<Inbound> {
        self.metrics.transactions_received.inc();
        match validate_signed(&tx, self.verifier.as_ref(), &self.params) {
            Ok(()) => Some(Inbound::Local(tx)),
            Err(e) => {
                self.rejected(tx.input_hash().ok(), &e);
                None
            }
        }
    }

    fn rejected(&self, hash: Option<TxHash>, error: &TransactionError) {
        self.metrics.transactions_rejected.inc();
        match hash {
            Some(h) => tracing::warn!(tx = %h, kind = error.kind(), error = %error, "transaction rejected"),
            None => tracing::warn!(kind = error.kind(), error = %error, "transaction rejected"),
        }
    }
}

fn spawn_intake(
    mut filter: IntakeFilter,
    mut raw_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    mut submit_rx: mpsc::Receiver<SignedTransaction>,
    inbound_tx: mpsc::Sender<Inbound>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let inbound = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    tracing::info!("intake task shutting down");
                    break;
                }
                Some(tx) = submit_rx.recv() => filter.check_local(tx),
                Some(bytes) = raw_rx.recv() => filter.check_raw(&bytes),
                else => break,
            };
            if let Some(inbound) = inbound {
                if inbound_tx.send(inbound).await.is_err() {
                    break;
                }
            }
        }
    })
}

// ── Ordering ───────────────────────────────────────────────────────────

fn spawn_ordering<P>(
    mut ctx: NodeContext<P>,
    idle_poll: Duration,
    mut inbound_rx: mpsc::Receiver<Inbound>,
    outbound_tx: mpsc::Sender<WireMessage>,
    head_tx: watch::Sender<ChainHead>,
    shutdown: Arc<ShutdownController>,
) -> JoinHandle<()>
where
    P: Persistence + 'static,
{
    let mut shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        let mut pause = Duration::ZERO;
        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    tracing::info!("ordering task shutting down");
                    break;
                }
                inbound = inbound_rx.recv() => match inbound {
                    Some(inbound) => {
                        if let Err(e) = dispatch(&mut ctx, inbound) {
                            halt(&shutdown, &e);
                            break;
                        }
                    }
                    None => break,
                },
                _ = tokio::time::sleep(pause) => {}
            }

            match ctx.step() {
                Ok(report) => {
                    if let Some(head) = report.committed.last() {
                        head_tx.send_replace(*head);
                    }
                    pause = if report.abandoned > 0 {
                        idle_poll
                    } else {
                        ctx.next_wake().map_or(idle_poll, |wake| wake.min(idle_poll))
                    };
                }
                Err(e) => {
                    halt(&shutdown, &e);
                    break;
                }
            }

            let outbox = ctx.drain_outbox();
            let forwarded = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    tracing::info!("ordering task shutting down");
                    break;
                }
                forwarded = forward_outbound(outbox, &outbound_tx) => forwarded,
            };
            if forwarded.is_err() {
                tracing::info!("fan-out task stopped, ordering task exiting");
                break;
            }
        }
    })
}

/// Queue `outbox` for the fan-out task. Waits for room for intents; drops a
/// block notification if the channel is full. Fails only once the fan-out
/// task has gone.
async fn forward_outbound(
    outbox: Vec<WireMessage>,
    outbound_tx: &mpsc::Sender<WireMessage>,
) -> Result<(), mpsc::error::SendError<WireMessage>> {
    for message in outbox {
        match message {
            WireMessage::BlockNotification(note) => {
                let number = note.block_number;
                match outbound_tx.try_send(WireMessage::BlockNotification(note)) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(number, "outbound channel full, dropping block notification");
                    }
                    Err(mpsc::error::TrySendError::Closed(message)) => {
                        return Err(mpsc::error::SendError(message))
                    }
                }
            }
            message => outbound_tx.send(message).await?,
        }
    }
    Ok(())
}

fn dispatch<P: Persistence>(ctx: &mut NodeContext<P>, inbound: Inbound) -> Result<(), NodeError> {
    let outcome = match inbound {
        Inbound::Local(tx) => ctx.admit_local(tx).map(|_| ()),
        Inbound::Remote(tx) => ctx.admit_remote(tx).map(|_| ()),
        Inbound::PeerBlock(note) => ctx.on_peer_block(note).map(|_| ()),
    };
    match outcome {
        Err(e) if e.is_fatal() => Err(e),
        _ => Ok(()),
    }
}

fn halt(shutdown: &ShutdownController, error: &NodeError) {
    tracing::error!(error = %error, kind = error.kind(), "ordering task halted");
    shutdown.halt(HaltReason::Fatal(error.to_string()));
}

// ── Fan-out ────────────────────────────────────────────────────────────

fn spawn_fan_out(
    network: NetworkId,
    transport: Arc<dyn Transport>,
    retry: Duration,
    mut outbound_rx: mpsc::Receiver<WireMessage>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                message = outbound_rx.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
            };
            let kind = message.kind();
            let sent = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                sent = broadcast_message(network, transport.as_ref(), &message, retry) => sent,
            };
            if let Err(e) = sent {
                tracing::warn!(kind, error = %e, "broadcast failed");
            }
        }
        tracing::info!("fan-out task shutting down");
    })
}

/// Encode and broadcast one message. A full transport is retried every
/// `retry` for transaction intents; anything else fails immediately.
async fn broadcast_message(
    network: NetworkId,
    transport: &dyn Transport,
    message: &WireMessage,
    retry: Duration,
) -> Result<(), NodeError> {
    let bytes = encode(network, message)?;
    let must_deliver = matches!(message, WireMessage::TransactionIntent(_));
    loop {
        match transport.broadcast(bytes.clone()) {
            Ok(()) => return Ok(()),
            Err(TransportError::Full) if must_deliver => {
                tracing::debug!(kind = message.kind(), "transport full, retrying");
                tokio::time::sleep(retry).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
