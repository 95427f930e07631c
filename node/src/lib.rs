//! Strata node: orders transactions by hybrid logical clock, waits out a
//! dwell time so every peer has seen them, executes them one at a time and
//! commits the results as a hash-chained block.
//!
//! The serial core is [`NodeContext`]; [`StrataNode`] runs it as a set of
//! Tokio tasks connected by bounded channels.

pub mod block_builder;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod queue;
pub mod recently_committed;
pub mod scheduler;
pub mod shutdown;
pub mod tracing_spans;

pub use block_builder::{BlockBuilder, BuilderPhase, CommitFailure, FinalizeOutcome};
pub use config::{GenesisBalance, NodeConfig};
pub use context::{IntakeOutcome, NodeContext, NodeServices, PeerBlockStatus, StepReport};
pub use error::NodeError;
pub use events::{EventBus, NodeEvent};
pub use logging::{init_logging, LogFormat};
pub use metrics::NodeMetrics;
pub use node::{NodeHandle, StrataNode};
pub use queue::{AppendOutcome, MainProcessingQueue, QueueEntry};
pub use recently_committed::RecentlyCommitted;
pub use scheduler::{OrderingScheduler, Poll, SchedulerState};
pub use shutdown::{HaltReason, ShutdownController};
