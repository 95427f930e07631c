//! Events emitted by the node pipeline for subscribers.

use strata_types::{BlockHash, HlcTimestamp, PublicKey, TxHash};

/// Pipeline events that observers can subscribe to via the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeEvent {
    /// A transaction entered the processing queue.
    TransactionQueued { hash: TxHash, hlc: HlcTimestamp },
    /// A transaction was refused at intake.
    TransactionRejected {
        hash: Option<TxHash>,
        kind: &'static str,
        reason: String,
    },
    /// A transaction was executed; `success` mirrors its recorded result.
    TransactionExecuted { hash: TxHash, success: bool },
    /// A block was committed and announced.
    BlockFinalized {
        number: u64,
        hash: BlockHash,
        transactions: usize,
    },
    /// A block was discarded; its transactions went back to the queue.
    BlockAbandoned {
        number: u64,
        reason: String,
        requeued: usize,
    },
    /// A peer announced the same block we committed at that height.
    PeerBlockAgreed {
        number: u64,
        hash: BlockHash,
        owner: PublicKey,
    },
    /// A peer announced a different block (or different results) at a
    /// height we have committed.
    PeerBlockDiverged {
        number: u64,
        local: BlockHash,
        remote: BlockHash,
        owner: PublicKey,
    },
}

/// Simple synchronous event bus.
///
/// Listeners run on the ordering task, so they must be quick.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&NodeEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&NodeEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &NodeEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    #[test]
    fn every_listener_sees_every_event() {
        let mut bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let c = Arc::clone(&count);
            bus.subscribe(Box::new(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }));
        }

        bus.emit(&NodeEvent::TransactionExecuted {
            hash: TxHash::new([1; 32]),
            success: true,
        });
        bus.emit(&NodeEvent::BlockFinalized {
            number: 1,
            hash: BlockHash::new([2; 32]),
            transactions: 1,
        });

        assert_eq!(bus.listener_count(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn emit_without_listeners_is_a_no_op() {
        EventBus::default().emit(&NodeEvent::BlockAbandoned {
            number: 3,
            reason: "signing failed".into(),
            requeued: 2,
        });
    }
}
