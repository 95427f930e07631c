//! Transaction envelopes for the Strata node.
//!
//! A transaction moves through three shapes:
//!
//! - [`TransactionPayload`]: what the sender means (contract call + nonce + stamps);
//! - [`SignedTransaction`]: the payload plus the sender's signature over its
//!   canonical encoding; this is what clients submit;
//! - [`ProcessedTransaction`]: a signed transaction stamped exactly once with an
//!   HLC timestamp by the first node that accepted it, countersigned by that
//!   node. This is the unit that is queued, ordered, executed, and placed in blocks.

pub mod builder;
pub mod envelope;
pub mod error;
pub mod validation;

pub use builder::TransactionBuilder;
pub use envelope::{Kwargs, ProcessedTransaction, SignedTransaction, TransactionPayload};
pub use error::TransactionError;
pub use validation::{validate_identifier, validate_processed, validate_signed};
