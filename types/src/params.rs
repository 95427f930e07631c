//! Protocol parameters: the consensus-relevant tunables every validator must share.
//!
//! Two nodes with different values here will order or meter transactions
//! differently, so these are distributed with the network configuration
//! rather than chosen per node.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Stamp (execution metering) parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampParams {
    /// Contract holding sender balances used to pay for stamps.
    pub balance_contract: String,
    /// Variable inside `balance_contract` mapping sender hex → balance.
    pub balance_variable: String,
    /// Stamps bought by one unit of balance.
    pub stamps_per_unit: u64,
    /// Flat cost charged for every contract invocation.
    pub base_cost: u64,
    /// Cost of one state read.
    pub read_cost: u64,
    /// Cost per byte written to state.
    pub write_cost_per_byte: u64,
}

impl Default for StampParams {
    fn default() -> Self {
        Self {
            balance_contract: "currency".to_string(),
            balance_variable: "balances".to_string(),
            stamps_per_unit: 1,
            base_cost: 5,
            read_cost: 1,
            write_cost_per_byte: 1,
        }
    }
}

impl StampParams {
    /// Balance units needed to cover `stamps` (rounded up).
    pub fn cost_in_units(&self, stamps: u64) -> u64 {
        let rate = self.stamps_per_unit.max(1);
        stamps.div_ceil(rate)
    }
}

/// All protocol parameters stored by every node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    // ── Ordering ─────────────────────────────────────────────────────────
    /// Dwell time: minimum age (physical clock) before a queued transaction
    /// may be ordered. Must exceed the worst-case peer propagation delay.
    pub processing_delay_ns: u64,

    /// Remote HLC timestamps further than this ahead of local time are refused.
    pub max_hlc_drift_ns: u64,

    // ── Block boundaries ─────────────────────────────────────────────────
    /// Finalize once this many transactions have accumulated.
    pub max_block_transactions: usize,

    /// Finalize once this much time has passed since the block's first transaction.
    pub max_block_interval_ns: u64,

    /// Blocks per epoch; epoch boundaries are recorded in chain metadata.
    pub blocks_per_epoch: u64,

    // ── Intake limits ────────────────────────────────────────────────────
    /// Maximum approximate size of a transaction's kwargs.
    pub max_kwargs_bytes: usize,

    /// Maximum canonical encoded size of a signed transaction.
    pub max_transaction_bytes: usize,

    // ── Metering ─────────────────────────────────────────────────────────
    pub stamps: StampParams,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            processing_delay_ns: 1_000_000_000,
            max_hlc_drift_ns: 5_000_000_000,
            max_block_transactions: 100,
            max_block_interval_ns: 2_000_000_000,
            blocks_per_epoch: 1_000,
            max_kwargs_bytes: 64 * 1024,
            max_transaction_bytes: 128 * 1024,
            stamps: StampParams::default(),
        }
    }
}

impl ProtocolParams {
    pub fn processing_delay(&self) -> Duration {
        Duration::from_nanos(self.processing_delay_ns)
    }

    pub fn max_block_interval(&self) -> Duration {
        Duration::from_nanos(self.max_block_interval_ns)
    }

    pub fn max_hlc_drift(&self) -> Duration {
        Duration::from_nanos(self.max_hlc_drift_ns)
    }

    /// Epoch number a block belongs to.
    pub fn epoch_of(&self, block_number: u64) -> u64 {
        block_number / self.blocks_per_epoch.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_cost_rounds_up() {
        let stamps = StampParams {
            stamps_per_unit: 20,
            ..StampParams::default()
        };
        assert_eq!(stamps.cost_in_units(0), 0);
        assert_eq!(stamps.cost_in_units(1), 1);
        assert_eq!(stamps.cost_in_units(20), 1);
        assert_eq!(stamps.cost_in_units(21), 2);
    }

    #[test]
    fn epoch_boundaries() {
        let params = ProtocolParams {
            blocks_per_epoch: 10,
            ..ProtocolParams::default()
        };
        assert_eq!(params.epoch_of(9), 0);
        assert_eq!(params.epoch_of(10), 1);
        assert_eq!(params.epoch_of(25), 2);
    }

    #[test]
    fn zero_epoch_length_does_not_divide_by_zero() {
        let params = ProtocolParams {
            blocks_per_epoch: 0,
            ..ProtocolParams::default()
        };
        assert_eq!(params.epoch_of(7), 7);
    }
}
