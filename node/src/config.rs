//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use strata_crypto::{generate_keypair, Ed25519Signer};
use strata_types::{NetworkId, ProtocolParams, PublicKey, StampParams};

use crate::logging::LogFormat;
use crate::NodeError;

const MS: u64 = 1_000_000;

/// An account credited at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBalance {
    /// Hex-encoded public key.
    pub account: String,
    pub amount: u64,
}

/// Configuration for a Strata node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Fields that feed
/// [`ProtocolParams`] must match across every node of a network.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Which network to join.
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// Data directory for the state store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Hex-encoded 32-byte signing seed. A fresh key is generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_seed: Option<String>,

    /// Dwell time: how long a transaction sits in the queue before it may
    /// be ordered. Must exceed the worst-case propagation delay between peers.
    #[serde(default = "default_processing_delay_ms")]
    pub processing_delay_ms: u64,

    /// Finalize a block once it holds this many transactions.
    #[serde(default = "default_max_block_transactions")]
    pub max_block_transactions: usize,

    /// Finalize a block once its first transaction is this old.
    #[serde(default = "default_max_block_interval_ms")]
    pub max_block_interval_ms: u64,

    /// Sleep between scheduler polls when nothing is pending.
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,

    /// Capacity of the intake → ordering channel.
    #[serde(default = "default_channel_capacity")]
    pub intake_channel_capacity: usize,

    /// Capacity of the ordering → fan-out channel.
    #[serde(default = "default_channel_capacity")]
    pub outbound_channel_capacity: usize,

    /// Maximum number of transactions waiting in the processing queue.
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,

    /// Remote HLC timestamps further ahead of local time than this are refused.
    #[serde(default = "default_max_hlc_drift_ms")]
    pub max_hlc_drift_ms: u64,

    #[serde(default = "default_blocks_per_epoch")]
    pub blocks_per_epoch: u64,

    #[serde(default = "default_max_kwargs_bytes")]
    pub max_kwargs_bytes: usize,

    #[serde(default = "default_max_transaction_bytes")]
    pub max_transaction_bytes: usize,

    /// Stamps bought by one unit of balance.
    #[serde(default = "default_stamps_per_unit")]
    pub stamps_per_unit: u64,

    /// Flat stamp cost of every contract call.
    #[serde(default = "default_stamp_base_cost")]
    pub stamp_base_cost: u64,

    #[serde(default = "default_stamp_read_cost")]
    pub stamp_read_cost: u64,

    #[serde(default = "default_stamp_write_cost_per_byte")]
    pub stamp_write_cost_per_byte: u64,

    /// Raw inbound messages remembered for duplicate suppression.
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,

    /// Committed transaction hashes cached in memory for idempotent intake.
    #[serde(default = "default_dedup_capacity")]
    pub recently_committed_capacity: usize,

    /// Attach the full block to outgoing block notifications.
    #[serde(default)]
    pub include_blocks_in_notifications: bool,

    /// LMDB map size in bytes.
    #[serde(default = "default_lmdb_map_size")]
    pub lmdb_map_size: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to collect Prometheus metrics.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Hex public key allowed to call `currency.mint`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minter: Option<String>,

    /// Balances written to state before the first block.
    #[serde(default)]
    pub genesis_balances: Vec<GenesisBalance>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Dev
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_processing_delay_ms() -> u64 {
    1_000
}

fn default_max_block_transactions() -> usize {
    100
}

fn default_max_block_interval_ms() -> u64 {
    2_000
}

fn default_idle_poll_ms() -> u64 {
    50
}

fn default_channel_capacity() -> usize {
    1_024
}

fn default_max_queue_size() -> usize {
    100_000
}

fn default_max_hlc_drift_ms() -> u64 {
    5_000
}

fn default_blocks_per_epoch() -> u64 {
    1_000
}

fn default_max_kwargs_bytes() -> usize {
    64 * 1024
}

fn default_max_transaction_bytes() -> usize {
    128 * 1024
}

fn default_stamps_per_unit() -> u64 {
    1
}

fn default_stamp_base_cost() -> u64 {
    5
}

fn default_stamp_read_cost() -> u64 {
    1
}

fn default_stamp_write_cost_per_byte() -> u64 {
    1
}

fn default_dedup_capacity() -> usize {
    65_536
}

fn default_lmdb_map_size() -> usize {
    1 << 30
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        let positive = [
            ("processing_delay_ms", self.processing_delay_ms),
            ("max_block_interval_ms", self.max_block_interval_ms),
            ("idle_poll_ms", self.idle_poll_ms),
            ("blocks_per_epoch", self.blocks_per_epoch),
            ("stamps_per_unit", self.stamps_per_unit),
            ("max_block_transactions", self.max_block_transactions as u64),
            ("intake_channel_capacity", self.intake_channel_capacity as u64),
            ("outbound_channel_capacity", self.outbound_channel_capacity as u64),
            ("max_queue_size", self.max_queue_size as u64),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(NodeError::Config(format!("{name} must be greater than zero")));
            }
        }
        self.parsed_log_format()?;
        self.signing_seed()?;
        self.minter_key()?;
        self.genesis_accounts()?;
        Ok(())
    }

    /// The consensus-relevant subset of the configuration.
    pub fn protocol_params(&self) -> ProtocolParams {
        ProtocolParams {
            processing_delay_ns: self.processing_delay_ms.saturating_mul(MS),
            max_hlc_drift_ns: self.max_hlc_drift_ms.saturating_mul(MS),
            max_block_transactions: self.max_block_transactions,
            max_block_interval_ns: self.max_block_interval_ms.saturating_mul(MS),
            blocks_per_epoch: self.blocks_per_epoch,
            max_kwargs_bytes: self.max_kwargs_bytes,
            max_transaction_bytes: self.max_transaction_bytes,
            stamps: StampParams {
                stamps_per_unit: self.stamps_per_unit,
                base_cost: self.stamp_base_cost,
                read_cost: self.stamp_read_cost,
                write_cost_per_byte: self.stamp_write_cost_per_byte,
                ..StampParams::default()
            },
        }
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn parsed_log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    /// Signing key for this node: from `node_seed`, or freshly generated.
    pub fn node_signer(&self) -> Result<Ed25519Signer, NodeError> {
        Ok(match self.signing_seed()? {
            Some(seed) => Ed25519Signer::from_seed(&seed),
            None => Ed25519Signer::new(generate_keypair()),
        })
    }

    fn signing_seed(&self) -> Result<Option<[u8; 32]>, NodeError> {
        let Some(seed) = &self.node_seed else {
            return Ok(None);
        };
        let bytes = hex::decode(seed)
            .map_err(|e| NodeError::Config(format!("node_seed is not valid hex: {e}")))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| NodeError::Config("node_seed must be 32 bytes".into()))?;
        Ok(Some(seed))
    }

    pub fn minter_key(&self) -> Result<Option<PublicKey>, NodeError> {
        self.minter.as_deref().map(parse_account).transpose()
    }

    pub fn genesis_accounts(&self) -> Result<Vec<(PublicKey, u64)>, NodeError> {
        self.genesis_balances
            .iter()
            .map(|g| Ok((parse_account(&g.account)?, g.amount)))
            .collect()
    }
}

fn parse_account(s: &str) -> Result<PublicKey, NodeError> {
    PublicKey::from_str(s).map_err(|e| NodeError::Config(format!("invalid account {s}: {e}")))
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            data_dir: default_data_dir(),
            node_seed: None,
            processing_delay_ms: default_processing_delay_ms(),
            max_block_transactions: default_max_block_transactions(),
            max_block_interval_ms: default_max_block_interval_ms(),
            idle_poll_ms: default_idle_poll_ms(),
            intake_channel_capacity: default_channel_capacity(),
            outbound_channel_capacity: default_channel_capacity(),
            max_queue_size: default_max_queue_size(),
            max_hlc_drift_ms: default_max_hlc_drift_ms(),
            blocks_per_epoch: default_blocks_per_epoch(),
            max_kwargs_bytes: default_max_kwargs_bytes(),
            max_transaction_bytes: default_max_transaction_bytes(),
            stamps_per_unit: default_stamps_per_unit(),
            stamp_base_cost: default_stamp_base_cost(),
            stamp_read_cost: default_stamp_read_cost(),
            stamp_write_cost_per_byte: default_stamp_write_cost_per_byte(),
            dedup_capacity: default_dedup_capacity(),
            recently_committed_capacity: default_dedup_capacity(),
            include_blocks_in_notifications: false,
            lmdb_map_size: default_lmdb_map_size(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
            minter: None,
            genesis_balances: Vec::new(),
        }
    }
}
