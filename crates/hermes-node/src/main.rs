//! hermes-node: the Hermes settlement node binary.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Apply genesis if the DB is fresh
//!   3. Start the JSON-RPC 2.0 server
//!   4. Run the main loop: dequeue submitted txs and apply them one at a time

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{debug, info, warn};

use hermes_core::config::HubPolicy;
use hermes_core::transaction::Transaction;
use hermes_core::types::AccountId;
use hermes_genesis::{apply_genesis, genesis_supply, GenesisParams};
use hermes_rpc::server::RpcServerState;
use hermes_rpc::RpcServer;
use hermes_state::{FixedRateExchange, SettlementEngine, StateDb};

#[derive(Parser, Debug)]
#[command(
    name = "hermes-node",
    version,
    about = "Hermes node: hub-mediated, promise-based payment channel settlement"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.hermes/data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8545")]
    rpc_addr: SocketAddr,

    /// Path to genesis allocations JSON (only read on first run).
    #[arg(long)]
    genesis: Option<PathBuf>,

    /// Path to a hub policy JSON. Missing fields keep protocol defaults.
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Ledger account receiving tokens for settle-into-currency.
    #[arg(long, requires = "exchange_rate")]
    exchange_account: Option<String>,

    /// Fixed conversion rate as `numerator:denominator`.
    #[arg(long, requires = "exchange_account")]
    exchange_rate: Option<String>,

    /// Capacity of the submitted-transaction queue.
    #[arg(long, default_value_t = 512)]
    queue_size: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hermes=debug")),
        )
        .init();

    let args = Args::parse();
    info!("Hermes node starting");

    // ── State database ────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);

    // ── Genesis if fresh ──────────────────────────────────────────────────────
    match genesis_supply(&db).context("reading genesis marker")? {
        Some(supply) => info!(supply, "existing state found, skipping genesis"),
        None => {
            info!("fresh database, applying genesis");
            let params = load_genesis_params(args.genesis.as_deref())?;
            let supply = apply_genesis(&db, &params).context("applying genesis")?;
            info!(supply, "genesis applied");
        }
    }

    // ── Engine ────────────────────────────────────────────────────────────────
    let policy = load_policy(args.policy.as_deref())?;
    info!(?policy, "hub policy loaded");

    let mut engine = SettlementEngine::new(db.clone(), policy.clone());
    if let (Some(account), Some(rate)) = (&args.exchange_account, &args.exchange_rate) {
        let exchange = parse_exchange(account, rate)?;
        info!(account = %exchange.account, rate = %rate, "settle-into-currency enabled");
        engine = engine.with_exchange(exchange);
    }

    // ── RPC server ────────────────────────────────────────────────────────────
    let (tx_sender, mut rx) = tokio::sync::mpsc::channel::<Transaction>(args.queue_size);
    let rpc_state = Arc::new(RpcServerState { db: db.clone(), policy, tx_sender: Some(tx_sender) });
    let _rpc_handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    info!(rpc = %args.rpc_addr, "node ready");

    // ── Main loop ─────────────────────────────────────────────────────────────
    // The only writer: transactions are applied strictly in arrival order.
    while let Some(tx) = rx.recv().await {
        let now = chrono::Utc::now().timestamp();
        match engine.apply(&tx, now) {
            Ok(outcome) => debug!(tx_id = %tx.tx_id, ?outcome, "transaction outcome"),
            Err(e) => warn!(tx_id = %tx.tx_id, action = tx.action.kind(), error = %e, "transaction rejected"),
        }
    }

    info!("transaction queue closed, shutting down");
    Ok(())
}

fn load_genesis_params(path: Option<&Path>) -> anyhow::Result<GenesisParams> {
    let Some(p) = path else {
        warn!("No --genesis provided. Starting with an empty ledger.");
        return Ok(GenesisParams::default());
    };
    let json = std::fs::read_to_string(p)
        .with_context(|| format!("reading genesis allocations from {}", p.display()))?;
    GenesisParams::from_json(&json).context("parsing genesis JSON")
}

fn load_policy(path: Option<&Path>) -> anyhow::Result<HubPolicy> {
    let Some(p) = path else {
        return Ok(HubPolicy::default());
    };
    let json = std::fs::read_to_string(p)
        .with_context(|| format!("reading hub policy from {}", p.display()))?;
    serde_json::from_str(&json).context("parsing hub policy JSON")
}

fn parse_exchange(account: &str, rate: &str) -> anyhow::Result<FixedRateExchange> {
    let account = AccountId::from_b58(account).context("parsing --exchange-account")?;
    let Some((num, den)) = rate.split_once(':') else {
        bail!("--exchange-rate must look like <numerator>:<denominator>, got {rate}");
    };
    let numerator: u128 = num.trim().parse().context("parsing rate numerator")?;
    let denominator: u128 = den.trim().parse().context("parsing rate denominator")?;
    if denominator == 0 {
        bail!("--exchange-rate denominator must be non-zero");
    }
    Ok(FixedRateExchange { account, numerator, denominator })
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
