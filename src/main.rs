//! Fortuva betting engine — entry point.
//!
//! Loads configuration, initialises structured logging, parses the
//! wallet (the only fatal startup error besides config), wires the live
//! chain gateway and REST client into the engine, and runs the three
//! loops until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;

use fortuva_bot::api::FortuvaApi;
use fortuva_bot::chain::rpc::SolanaGateway;
use fortuva_bot::chain::wallet;
use fortuva_bot::config::AppConfig;
use fortuva_bot::engine::events::{EngineEvent, EventBus};
use fortuva_bot::engine::{Engine, EngineSettings, ShutdownSignal};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("FORTUVA_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = AppConfig::load(&config_path)?;

    init_logging();

    let keypair = load_wallet(&cfg)?;
    info!(wallet = %keypair.pubkey(), rpc = %cfg.rpc.url, "starting up");

    let chain = Arc::new(SolanaGateway::new(&cfg.rpc.url, keypair));
    let api = Arc::new(FortuvaApi::new(
        Some(cfg.api.base_url.clone()),
        Some(Duration::from_secs(cfg.api.timeout_secs)),
    )?);

    let settings = EngineSettings {
        bet_window_secs: cfg.engine.bet_time_secs,
        poll_interval: Duration::from_secs(cfg.engine.interval_secs),
        maintenance_interval: Duration::from_secs(cfg.engine.maintenance_interval_secs),
        min_wallet_balance: cfg.engine.min_wallet_balance,
        auto_bet: cfg.engine.auto_bet,
        considering_old_bets: cfg.engine.considering_old_bets,
        strategies: cfg.strategy.to_parity_map(),
    };

    let (events, mut event_rx) = EventBus::channel();
    // No interactive front end is attached here; drain telemetry into
    // the log so the channel stays healthy.
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if let EngineEvent::RoundUpdate(snapshot) = event {
                debug!(
                    round = snapshot.round_number,
                    remaining = snapshot.remaining_secs,
                    pool = snapshot.prize_pool,
                    balance = snapshot.balance,
                    "round snapshot"
                );
            }
        }
    });

    let engine = Engine::new(chain, api, events, settings).await;

    let (shutdown_tx, shutdown) = ShutdownSignal::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    engine.run(shutdown).await;
    info!("shut down cleanly");
    Ok(())
}

/// Load the signing wallet from the configured file or env var.
fn load_wallet(cfg: &AppConfig) -> Result<Keypair> {
    if let Some(path) = &cfg.wallet.keypair_path {
        return wallet::load_keypair_file(path);
    }
    let raw = AppConfig::resolve_env(&cfg.wallet.private_key_env)?;
    wallet::parse_keypair(&raw)
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fortuva_bot=info"));

    let json_logging = std::env::var("FORTUVA_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
