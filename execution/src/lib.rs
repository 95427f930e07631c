//! Transaction execution for the Strata node.
//!
//! [`ExecutionEngine`] runs one stamped transaction at its final position:
//! nonce check, stamp affordability, signature re-check, then the opaque
//! [`Executor`]. Deterministic failures become failed
//! [`strata_ledger::ExecutionResult`]s; only [`ExecutorFault`]s (local,
//! non-reproducible problems such as storage I/O) escape as errors.
//!
//! [`ContractRegistry`] is a dispatch table from `(contract, function)` to
//! a closure, with stamp metering through [`ContractContext`].

pub mod context;
pub mod currency;
pub mod engine;
pub mod error;
pub mod executor;
pub mod nonce;
pub mod overlay;
pub mod registry;

pub use context::{decode_value, encode_value, ContractContext};
pub use engine::ExecutionEngine;
pub use error::{ContractError, ExecutorFault};
pub use executor::{ContractCall, ContractOutput, Executor};
pub use nonce::NonceGuard;
pub use overlay::Overlay;
pub use registry::{ContractFn, ContractRegistry};
