//! Execution engine adapter.

use std::collections::BTreeMap;
use std::sync::Arc;

use strata_crypto::Verifier;
use strata_ledger::{ExecutionError, ExecutionResult, StateDelta};
use strata_store::StateView;
use strata_transactions::ProcessedTransaction;
use strata_types::{ProtocolParams, PublicKey, TxHash, Value};

use crate::context::encode_value;
use crate::currency::{balance_key, read_balance};
use crate::error::ExecutorFault;
use crate::executor::{ContractCall, Executor};
use crate::nonce::NonceGuard;
use crate::overlay::Overlay;

/// Runs stamped transactions, one at a time, in final order.
///
/// `execute` never writes anywhere: it returns the deltas the caller must
/// stage so the next transaction sees them. Nonce advances are kept in the
/// engine's [`NonceGuard`] until the block commits or is abandoned.
pub struct ExecutionEngine {
    executor: Arc<dyn Executor>,
    verifier: Arc<dyn Verifier>,
    params: ProtocolParams,
    nonces: NonceGuard,
}

impl ExecutionEngine {
    pub fn new(executor: Arc<dyn Executor>, verifier: Arc<dyn Verifier>, params: ProtocolParams) -> Self {
        Self {
            executor,
            verifier,
            params,
            nonces: NonceGuard::new(),
        }
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    pub fn nonces(&self) -> &NonceGuard {
        &self.nonces
    }

    pub fn nonces_mut(&mut self) -> &mut NonceGuard {
        &mut self.nonces
    }

    /// Execute `tx` against `view` (state as of just after the previous
    /// transaction in final order).
    ///
    /// Checks run in this order: nonce, stamp affordability, signature (only
    /// if intake did not already verify it), contract. A nonce that is too
    /// low does not advance the sender's nonce; a bad signature undoes the
    /// advance; every other failure keeps it, so a failed transaction still
    /// burns its nonce.
    pub fn execute(
        &mut self,
        view: &dyn StateView,
        tx: &ProcessedTransaction,
        signature_verified: bool,
    ) -> Result<ExecutionResult, ExecutorFault> {
        let hash = tx.input_hash;
        let payload = tx.payload();
        let sender = payload.sender;

        if let Err(e) = self.nonces.validate_and_advance(view, &sender, payload.nonce)? {
            return Ok(rejected(hash, e.into()));
        }

        let stamps = &self.params.stamps;
        let required = stamps.cost_in_units(payload.stamps_supplied);
        let available = read_balance(view, stamps, &sender)?;
        if available < i128::from(required) {
            return Ok(rejected(
                hash,
                ExecutionError::InsufficientStamps {
                    required,
                    available: clamp_u64(available),
                },
            ));
        }

        if !signature_verified && !tx.transaction.verify_signature(self.verifier.as_ref()) {
            self.nonces.rollback(&sender);
            return Ok(rejected(hash, ExecutionError::InvalidSignature));
        }

        let call = ContractCall {
            contract: payload.contract.clone(),
            function: payload.function.clone(),
            kwargs: payload.kwargs.clone(),
            caller: sender,
            stamps: payload.stamps_supplied,
        };
        let output = self.executor.execute(view, &call)?;

        let value = match output.outcome {
            Ok(value) => value,
            Err(e) => {
                return Ok(ExecutionResult::failed(
                    hash,
                    output.stamps_used,
                    ExecutionError::Contract(e.to_string()),
                ))
            }
        };

        let mut writes: BTreeMap<String, Vec<u8>> = output
            .deltas
            .into_iter()
            .map(|d| (d.key, d.value))
            .collect();
        if let Err(e) = self.charge_fee(view, &mut writes, &sender, output.stamps_used)? {
            return Ok(ExecutionResult::failed(hash, output.stamps_used, e));
        }

        let deltas = writes
            .into_iter()
            .map(|(key, value)| StateDelta { key, value })
            .collect();
        Ok(ExecutionResult::succeeded(hash, deltas, output.stamps_used, value))
    }

    /// Deduct the fee for `stamps_used` from the sender's balance as it
    /// stands after the contract's own writes.
    fn charge_fee(
        &self,
        view: &dyn StateView,
        writes: &mut BTreeMap<String, Vec<u8>>,
        sender: &PublicKey,
        stamps_used: u64,
    ) -> Result<Result<(), ExecutionError>, ExecutorFault> {
        let stamps = &self.params.stamps;
        let fee = stamps.cost_in_units(stamps_used);
        if fee == 0 {
            return Ok(Ok(()));
        }
        let balance = read_balance(&Overlay::new(view, writes), stamps, sender)?;
        if balance < i128::from(fee) {
            return Ok(Err(ExecutionError::InsufficientStamps {
                required: fee,
                available: clamp_u64(balance),
            }));
        }
        writes.insert(
            balance_key(stamps, sender),
            encode_value(&Value::Int(balance - i128::from(fee)))?,
        );
        Ok(Ok(()))
    }
}

/// Failed before reaching the contract: no stamps used, nothing staged.
fn rejected(hash: TxHash, error: ExecutionError) -> ExecutionResult {
    tracing::debug!(tx = %hash, kind = error.kind(), error = %error, "transaction failed validation");
    ExecutionResult::failed(hash, 0, error)
}

fn clamp_u64(v: i128) -> u64 {
    u64::try_from(v.max(0)).unwrap_or(u64::MAX)
}
