//! Pre-built [`tracing::Span`] constructors for the node pipeline.
//!
//! Consistent span names and fields make it easy to follow one
//! transaction from intake to its block in aggregated logs.

use tracing::{info_span, Span};

use strata_types::{PublicKey, TxHash};

/// Handling of one inbound message or client submission.
pub fn intake_span(kind: &str) -> Span {
    info_span!("intake", kind = %kind)
}

/// Execution of a single transaction in final order.
pub fn execute_span(hash: &TxHash) -> Span {
    info_span!("execute", tx = %hash)
}

/// Finalize, sign, commit and announce one block.
pub fn finalize_block_span(number: u64, transactions: usize) -> Span {
    info_span!("finalize_block", number = number, transactions = transactions)
}

/// Comparison of a peer's block notification with the local chain.
pub fn peer_block_span(number: u64, owner: &PublicKey) -> Span {
    info_span!("peer_block", number = number, owner = %owner)
}
