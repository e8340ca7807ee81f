//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! The wallet secret is referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`; it never lives in the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::api::DEFAULT_BASE_URL;
use crate::types::{BettingStrategy, ParityMap};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub rpc: RpcConfig,
    #[serde(default)]
    pub api: ApiConfig,
    pub wallet: WalletConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    pub strategy: StrategyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RpcConfig {
    /// Solana JSON-RPC endpoint.
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WalletConfig {
    /// Path to a JSON keypair file. Takes precedence over the env var.
    #[serde(default)]
    pub keypair_path: Option<String>,
    /// Env var holding the private key (base58, JSON array, or
    /// comma-separated bytes).
    #[serde(default = "default_private_key_env")]
    pub private_key_env: String,
}

fn default_private_key_env() -> String {
    "FORTUVA_PRIVATE_KEY".to_string()
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds before round lock at which betting starts.
    pub bet_time_secs: i64,
    /// Monitor and executor cycle cadence.
    pub interval_secs: u64,
    /// Claim/refund/close sweep cadence.
    pub maintenance_interval_secs: u64,
    /// SOL kept in the wallet on top of any stake.
    pub min_wallet_balance: f64,
    /// Start with automatic betting enabled.
    pub auto_bet: bool,
    /// Count failed bets from round zero instead of from startup.
    pub considering_old_bets: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bet_time_secs: 10,
            interval_secs: 1,
            maintenance_interval_secs: 60,
            min_wallet_balance: 0.05,
            auto_bet: false,
            considering_old_bets: false,
        }
    }
}

/// Per-parity strategy tables: `[strategy.even]` and `[strategy.odd]`.
#[derive(Debug, Deserialize, Clone)]
pub struct StrategyConfig {
    pub even: BettingStrategy,
    pub odd: BettingStrategy,
}

impl StrategyConfig {
    pub fn to_parity_map(&self) -> ParityMap<BettingStrategy> {
        ParityMap::new(self.even.clone(), self.odd.clone())
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
