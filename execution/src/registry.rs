//! Registered-function dispatch table.

use std::collections::HashMap;

use strata_store::StateView;
use strata_transactions::Kwargs;
use strata_types::{StampParams, Value};

use crate::context::ContractContext;
use crate::error::{ContractError, ExecutorFault};
use crate::executor::{ContractCall, ContractOutput, Executor};

/// A contract function body.
pub type ContractFn =
    Box<dyn Fn(&mut ContractContext<'_>, &Kwargs) -> Result<Value, ContractError> + Send + Sync>;

/// `(contract, function) → closure` table implementing [`Executor`].
pub struct ContractRegistry {
    functions: HashMap<(String, String), ContractFn>,
    costs: StampParams,
}

impl ContractRegistry {
    pub fn new(costs: StampParams) -> Self {
        Self {
            functions: HashMap::new(),
            costs,
        }
    }

    /// Register (or replace) `contract.function`.
    pub fn register<F>(&mut self, contract: &str, function: &str, f: F)
    where
        F: Fn(&mut ContractContext<'_>, &Kwargs) -> Result<Value, ContractError> + Send + Sync + 'static,
    {
        self.functions
            .insert((contract.to_string(), function.to_string()), Box::new(f));
    }

    pub fn contains(&self, contract: &str, function: &str) -> bool {
        self.functions
            .contains_key(&(contract.to_string(), function.to_string()))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl Executor for ContractRegistry {
    fn execute(&self, state: &dyn StateView, call: &ContractCall) -> Result<ContractOutput, ExecutorFault> {
        let mut ctx = ContractContext::new(state, &call.contract, call.caller, &self.costs, call.stamps);

        let outcome = match ctx.charge(self.costs.base_cost) {
            Err(e) => Err(e),
            Ok(()) => match self
                .functions
                .get(&(call.contract.clone(), call.function.clone()))
            {
                Some(f) => f(&mut ctx, &call.kwargs),
                None => Err(ContractError::UnknownFunction {
                    contract: call.contract.clone(),
                    function: call.function.clone(),
                }),
            },
        };

        let stamps_used = ctx.stamps_used();
        match outcome {
            Err(ContractError::Fault(fault)) => Err(fault),
            Ok(value) => Ok(ContractOutput {
                deltas: ctx.into_deltas(),
                outcome: Ok(value),
                stamps_used,
            }),
            Err(e) => Ok(ContractOutput {
                deltas: Vec::new(),
                outcome: Err(e),
                stamps_used,
            }),
        }
    }
}
