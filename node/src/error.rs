use thiserror::Error;

use strata_store::StoreError;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] strata_ledger::LedgerError),

    #[error("executor fault: {0}")]
    Executor(#[from] strata_execution::ExecutorFault),

    #[error("transaction rejected: {0}")]
    Transaction(#[from] strata_transactions::TransactionError),

    #[error("message codec error: {0}")]
    Codec(#[from] strata_messages::CodecError),

    #[error("clock error: {0}")]
    Clock(#[from] strata_hlc::HlcError),

    #[error("transport error: {0}")]
    Transport(#[from] strata_network::TransportError),

    #[error("processing queue is full ({capacity} entries)")]
    QueueFull { capacity: usize },

    #[error("commit of block {number} failed: {source}")]
    CommitFailed { number: u64, source: StoreError },

    #[error("node halted: {0}")]
    Halted(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("shutdown timeout")]
    ShutdownTimeout,
}

impl NodeError {
    /// Local, non-deterministic faults. The node must stop rather than risk
    /// diverging from its peers.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Store(_) | Self::Executor(_) | Self::CommitFailed { .. } | Self::Halted(_)
        )
    }

    /// Short machine-readable kind for the `kind` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transaction(e) => e.kind(),
            Self::Codec(_) => "malformed_message",
            Self::Clock(_) => "clock_drift",
            Self::QueueFull { .. } => "queue_full",
            Self::Ledger(_) => "invalid_block",
            Self::Store(_) => "store",
            Self::Executor(_) => "executor_fault",
            Self::Transport(_) => "transport",
            Self::CommitFailed { .. } => "commit_failed",
            Self::Halted(_) => "halted",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::ShutdownTimeout => "shutdown_timeout",
        }
    }
}
