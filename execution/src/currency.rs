//! Built-in `currency` contract.
//!
//! Balances live at `currency.balances:<account hex>` as `Value::Int`. The
//! execution engine reads the same entries to check stamp affordability and
//! deducts the stamp fee from them.

use strata_store::keys::state_key;
use strata_store::StateView;
use strata_transactions::Kwargs;
use strata_types::{PublicKey, StampParams, Value};

use crate::context::{decode_value, encode_value, ContractContext};
use crate::error::{ContractError, ExecutorFault};
use crate::registry::ContractRegistry;

pub const CONTRACT: &str = "currency";
pub const BALANCES: &str = "balances";

/// Register `transfer`, `balance_of` and `mint`. Only `minter` may mint;
/// with no minter, minting is disabled.
pub fn register(registry: &mut ContractRegistry, minter: Option<PublicKey>) {
    registry.register(CONTRACT, "transfer", transfer);
    registry.register(CONTRACT, "balance_of", balance_of);
    registry.register(CONTRACT, "mint", move |ctx, kwargs| {
        if minter.as_ref() != Some(ctx.caller()) {
            return Err(ContractError::Unauthorized("mint".into()));
        }
        let to = account_arg(kwargs, "to")?;
        let amount = amount_arg(kwargs)?;
        let balance = read(ctx, &to)?;
        let new = balance
            .checked_add(amount)
            .ok_or_else(|| ContractError::Failed("balance overflow".into()))?;
        write(ctx, &to, new)?;
        Ok(Value::Int(new))
    });
}

fn transfer(ctx: &mut ContractContext<'_>, kwargs: &Kwargs) -> Result<Value, ContractError> {
    let to = account_arg(kwargs, "to")?;
    let amount = amount_arg(kwargs)?;
    let from = ctx.caller().to_hex();

    let from_balance = read(ctx, &from)?;
    if from_balance < amount {
        return Err(ContractError::InsufficientBalance {
            available: from_balance,
            required: amount,
        });
    }
    write(ctx, &from, from_balance - amount)?;
    let to_balance = read(ctx, &to)?;
    let credited = to_balance
        .checked_add(amount)
        .ok_or_else(|| ContractError::Failed("balance overflow".into()))?;
    write(ctx, &to, credited)?;
    Ok(Value::Null)
}

fn balance_of(ctx: &mut ContractContext<'_>, kwargs: &Kwargs) -> Result<Value, ContractError> {
    let account = account_arg(kwargs, "account")?;
    Ok(Value::Int(read(ctx, &account)?))
}

fn read(ctx: &mut ContractContext<'_>, account: &str) -> Result<i128, ContractError> {
    Ok(ctx
        .get(BALANCES, Some(account))?
        .and_then(|v| v.as_int())
        .unwrap_or(0))
}

fn write(ctx: &mut ContractContext<'_>, account: &str, balance: i128) -> Result<(), ContractError> {
    ctx.set(BALANCES, Some(account), &Value::Int(balance))
}

fn account_arg(kwargs: &Kwargs, name: &str) -> Result<String, ContractError> {
    let invalid = |reason: &str| ContractError::InvalidArgument {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    let s = kwargs
        .get(name)
        .ok_or_else(|| invalid("missing"))?
        .as_str()
        .ok_or_else(|| invalid("expected account hex string"))?;
    s.parse::<PublicKey>()
        .map_err(|_| invalid("not a 32-byte hex public key"))?;
    Ok(s.to_ascii_lowercase())
}

fn amount_arg(kwargs: &Kwargs) -> Result<i128, ContractError> {
    match kwargs.get("amount").and_then(Value::as_int) {
        Some(a) if a > 0 => Ok(a),
        Some(_) => Err(ContractError::InvalidArgument {
            name: "amount".into(),
            reason: "must be positive".into(),
        }),
        None => Err(ContractError::InvalidArgument {
            name: "amount".into(),
            reason: "missing or not an integer".into(),
        }),
    }
}

/// Key holding `account`'s balance of stamp-paying currency.
pub fn balance_key(params: &StampParams, account: &PublicKey) -> String {
    state_key(
        &params.balance_contract,
        &params.balance_variable,
        Some(&account.to_hex()),
    )
}

/// Balance of `account` as seen by `view`; absent means zero.
pub fn read_balance(
    view: &dyn StateView,
    params: &StampParams,
    account: &PublicKey,
) -> Result<i128, ExecutorFault> {
    let key = balance_key(params, account);
    match view.get(&key)? {
        Some(bytes) => Ok(decode_value(&key, &bytes)?.as_int().unwrap_or(0)),
        None => Ok(0),
    }
}

/// Initial state entries for the given balances.
pub fn genesis_entries(
    params: &StampParams,
    balances: &[(PublicKey, u64)],
) -> Result<Vec<(String, Vec<u8>)>, ExecutorFault> {
    balances
        .iter()
        .map(|(account, amount)| {
            Ok((
                balance_key(params, account),
                encode_value(&Value::Int(i128::from(*amount)))?,
            ))
        })
        .collect()
}
