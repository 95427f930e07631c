//! Strata daemon: entry point for running a Strata node.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use strata_crypto::{Ed25519Verifier, Signer, Verifier};
use strata_execution::{currency, ContractRegistry};
use strata_hlc::SystemClock;
use strata_network::{ChannelHub, Transport};
use strata_node::{
    init_logging, HaltReason, NodeConfig, NodeContext, NodeMetrics, NodeServices, StrataNode,
};
use strata_store::StateStore;
use strata_store_lmdb::LmdbPersistence;
use strata_types::NetworkId;

#[derive(Parser)]
#[command(name = "strata-daemon", about = "Strata transaction-ordering node daemon")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base; CLI
    /// flags and env vars override them.
    #[arg(long, env = "STRATA_CONFIG")]
    config: Option<PathBuf>,

    /// Network to join: "live", "test" or "dev".
    #[arg(long, env = "STRATA_NETWORK")]
    network: Option<NetworkId>,

    /// Data directory for the state store.
    #[arg(long, env = "STRATA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Hex-encoded 32-byte node signing seed.
    #[arg(long, env = "STRATA_NODE_SEED", hide_env_values = true)]
    node_seed: Option<String>,

    /// Dwell time in milliseconds.
    #[arg(long, env = "STRATA_PROCESSING_DELAY_MS")]
    processing_delay_ms: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "STRATA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "STRATA_LOG_FORMAT")]
    log_format: Option<String>,

    /// Dump Prometheus metrics to stdout on shutdown.
    #[arg(long, env = "STRATA_ENABLE_METRICS")]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the node until interrupted or halted.
    Run,
    /// Print the effective configuration as TOML.
    Config,
    /// Print the committed chain head of the data directory as JSON.
    Head,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path.to_string_lossy();
                NodeConfig::from_toml_file(&path)
                    .with_context(|| format!("failed to load config file {path}"))?
            }
            None => NodeConfig::default(),
        };
        if let Some(network) = self.network {
            config.network = network;
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(seed) = &self.node_seed {
            config.node_seed = Some(seed.clone());
        }
        if let Some(delay) = self.processing_delay_ms {
            config.processing_delay_ms = delay;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        config.enable_metrics |= self.metrics;
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    match cli.command {
        Command::Run => run(config).await,
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        Command::Head => print_head(&config),
    }
}

fn open_store(config: &NodeConfig) -> anyhow::Result<StateStore<LmdbPersistence>> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("failed to create {}", config.data_dir.display()))?;
    let persistence = LmdbPersistence::open(&config.data_dir, config.lmdb_map_size)
        .with_context(|| format!("failed to open store in {}", config.data_dir.display()))?;
    Ok(StateStore::new(persistence, config.blocks_per_epoch))
}

async fn run(config: NodeConfig) -> anyhow::Result<()> {
    init_logging(config.parsed_log_format()?, &config.log_level);

    let signer = config.node_signer()?;
    tracing::info!(
        network = %config.network,
        node = %signer.public_key(),
        data_dir = %config.data_dir.display(),
        "starting strata node"
    );

    let params = config.protocol_params();
    let mut registry = ContractRegistry::new(params.stamps.clone());
    currency::register(&mut registry, config.minter_key()?);

    let verifier: Arc<dyn Verifier> = Arc::new(Ed25519Verifier);
    let services = NodeServices {
        executor: Arc::new(registry),
        signer: Arc::new(signer),
        verifier: Arc::clone(&verifier),
        clock: Arc::new(SystemClock),
    };
    let metrics = Arc::new(NodeMetrics::new());
    let mut ctx = NodeContext::new(&config, open_store(&config)?, services, Arc::clone(&metrics))?;
    let credited = ctx.apply_genesis(&config.genesis_accounts()?)?;
    if credited > 0 {
        tracing::info!(accounts = credited, "genesis balances credited");
    }

    // Single-process deployment: peers, if any, share this hub.
    let hub = ChannelHub::new();
    let transport: Arc<dyn Transport> = Arc::new(hub.connect(config.outbound_channel_capacity));
    let node = StrataNode::start(ctx, &config, verifier, transport)?;

    let shutdown = node.shutdown_controller();
    tokio::select! {
        _ = shutdown.wait_for_signal() => {
            tracing::info!("shutdown signal received, stopping node");
        }
        reason = node.halted() => {
            tracing::error!(reason = ?reason, "node halted");
        }
    }

    let reason = node.stop().await?;
    if config.enable_metrics {
        print!("{}", metrics.encode_text());
    }
    match reason {
        Some(HaltReason::Fatal(reason)) => anyhow::bail!("node halted: {reason}"),
        _ => {
            tracing::info!("strata daemon exited cleanly");
            Ok(())
        }
    }
}

fn print_head(config: &NodeConfig) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let head = store.chain_head()?;
    let epoch = store.epoch()?;
    let out = serde_json::json!({
        "network": config.network.as_str(),
        "number": head.number,
        "hash": head.hash.to_string(),
        "epoch": epoch.epoch,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
