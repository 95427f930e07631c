//! The opaque executor seam.

use strata_ledger::StateDelta;
use strata_store::StateView;
use strata_transactions::Kwargs;
use strata_types::{PublicKey, Value};

use crate::error::{ContractError, ExecutorFault};

/// A contract invocation as the executor sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCall {
    pub contract: String,
    pub function: String,
    pub kwargs: Kwargs,
    pub caller: PublicKey,
    pub stamps: u64,
}

/// What a contract invocation produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractOutput {
    /// Writes to apply if `outcome` is `Ok`. Empty on failure.
    pub deltas: Vec<StateDelta>,
    pub outcome: Result<Value, ContractError>,
    pub stamps_used: u64,
}

/// Runs contract code against a read-only view of state.
///
/// Must be deterministic: the same view contents and call give the same
/// output on every node.
pub trait Executor: Send + Sync {
    fn execute(&self, state: &dyn StateView, call: &ContractCall) -> Result<ContractOutput, ExecutorFault>;
}
