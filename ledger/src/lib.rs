//! Linear block chain for the Strata node.
//!
//! A block commits to the exact order of its transactions:
//! `hash = H(previous_hash || H(input hashes in order))`. Execution results
//! are committed separately through `results_hash`, which the block owner
//! signs together with the block hash and number. Every honest node that
//! executes the same transactions in the same order produces the same
//! `hash` and the same `results_hash`.

pub mod block;
pub mod chain;
pub mod error;
pub mod notification;
pub mod result;

pub use block::{Block, BlockSignature};
pub use chain::verify_chain;
pub use error::LedgerError;
pub use notification::BlockNotification;
pub use result::{ExecutionError, ExecutionResult, NonceError, StateDelta};
