//! Metered state access for contract code.

use std::collections::BTreeMap;

use strata_ledger::StateDelta;
use strata_store::keys::state_key;
use strata_store::StateView;
use strata_types::{PublicKey, StampParams, Value};

use crate::error::{ContractError, ExecutorFault};
use crate::overlay::Overlay;

/// Encode a contract value for storage.
pub fn encode_value(value: &Value) -> Result<Vec<u8>, ExecutorFault> {
    bincode::serialize(value).map_err(|e| ExecutorFault::Encoding(e.to_string()))
}

/// Decode a stored contract value.
pub fn decode_value(key: &str, bytes: &[u8]) -> Result<Value, ExecutorFault> {
    bincode::deserialize(bytes).map_err(|e| ExecutorFault::CorruptValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// What one contract function sees: its own namespace, the caller, and a
/// stamp budget. Reads see earlier writes from the same call.
pub struct ContractContext<'a> {
    state: &'a dyn StateView,
    contract: &'a str,
    caller: PublicKey,
    costs: &'a StampParams,
    supplied: u64,
    used: u64,
    writes: BTreeMap<String, Vec<u8>>,
}

impl<'a> ContractContext<'a> {
    pub fn new(
        state: &'a dyn StateView,
        contract: &'a str,
        caller: PublicKey,
        costs: &'a StampParams,
        supplied: u64,
    ) -> Self {
        Self {
            state,
            contract,
            caller,
            costs,
            supplied,
            used: 0,
            writes: BTreeMap::new(),
        }
    }

    pub fn caller(&self) -> &PublicKey {
        &self.caller
    }

    pub fn stamps_used(&self) -> u64 {
        self.used
    }

    /// Charge `amount` stamps. Exhausting the budget pins usage at the
    /// supplied amount.
    pub fn charge(&mut self, amount: u64) -> Result<(), ContractError> {
        match self.used.checked_add(amount) {
            Some(new) if new <= self.supplied => {
                self.used = new;
                Ok(())
            }
            _ => {
                self.used = self.supplied;
                Err(ContractError::OutOfStamps {
                    supplied: self.supplied,
                })
            }
        }
    }

    /// Read `variable[:key]` in this contract's namespace.
    pub fn get(&mut self, variable: &str, key: Option<&str>) -> Result<Option<Value>, ContractError> {
        self.charge(self.costs.read_cost)?;
        let full_key = state_key(self.contract, variable, key);
        let raw = Overlay::new(self.state, &self.writes)
            .get(&full_key)
            .map_err(ExecutorFault::from)?;
        match raw {
            Some(bytes) => Ok(Some(decode_value(&full_key, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Write `variable[:key]` in this contract's namespace.
    pub fn set(&mut self, variable: &str, key: Option<&str>, value: &Value) -> Result<(), ContractError> {
        let full_key = state_key(self.contract, variable, key);
        let bytes = encode_value(value)?;
        let cost = self
            .costs
            .write_cost_per_byte
            .saturating_mul((full_key.len() + bytes.len()) as u64);
        self.charge(cost)?;
        self.writes.insert(full_key, bytes);
        Ok(())
    }

    /// Consume the context, yielding its writes in key order.
    pub fn into_deltas(self) -> Vec<StateDelta> {
        self.writes
            .into_iter()
            .map(|(key, value)| StateDelta { key, value })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn costs() -> StampParams {
        StampParams {
            read_cost: 2,
            write_cost_per_byte: 1,
            ..StampParams::default()
        }
    }

    #[test]
    fn reads_see_own_writes_and_cost_stamps() {
        let base: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        let costs = costs();
        let mut ctx = ContractContext::new(&base, "token", PublicKey([1u8; 32]), &costs, 1_000);

        assert_eq!(ctx.get("supply", None).unwrap(), None);
        assert_eq!(ctx.stamps_used(), 2);

        ctx.set("supply", None, &Value::Int(10)).unwrap();
        assert_eq!(ctx.get("supply", None).unwrap(), Some(Value::Int(10)));

        let deltas = ctx.into_deltas();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].key, "token.supply");
    }

    #[test]
    fn budget_exhaustion_pins_usage() {
        let base: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        let costs = costs();
        let mut ctx = ContractContext::new(&base, "token", PublicKey([1u8; 32]), &costs, 3);
        ctx.get("a", None).unwrap();
        assert_eq!(
            ctx.get("b", None),
            Err(ContractError::OutOfStamps { supplied: 3 })
        );
        assert_eq!(ctx.stamps_used(), 3);
    }
}
