//! Fortuva REST API client.
//!
//! Read-only JSON collaborator for data the chain doesn't serve directly:
//! failed-bet counts for martingale sizing, round payout summaries, and
//! the claimable/cancelable/closeable bet lists the maintenance sweeper
//! works through.
//!
//! Every call is failure-tolerant by design: network errors, non-2xx
//! statuses, and malformed bodies all degrade to an empty or zero default
//! and are retried naturally on the next loop cycle.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Default API endpoint, overridable in config.
pub const DEFAULT_BASE_URL: &str = "https://botapi.fortuva.xyz";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

/// Round summary as served by `/round/{number}`.
///
/// Amounts are lamports; payouts are multiples. Only the fields the
/// engine consumes are deserialized.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoundInfo {
    pub lock_time: i64,
    pub total_bull_amount: u64,
    pub total_bear_amount: u64,
    pub up_payout: f64,
    pub down_payout: f64,
    pub lock_price: u64,
    pub status: u8,
}

/// An entry in the claimable/cancelable/closeable lists.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettledBet {
    /// Round number the bet belongs to.
    pub epoch: u64,
    /// Staked lamports, where the endpoint reports it.
    pub amount: Option<u64>,
    /// Payout lamports, for claimable bets.
    pub payout: Option<f64>,
}

/// A historical bet record from `/user/bets/{wallet}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BetHistoryEntry {
    pub epoch: u64,
    pub amount: u64,
    pub is_bull: bool,
    pub claimed: bool,
}

/// Wrapper shape `{"total": N, "data": [...]}` used by the list endpoints.
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// The REST collaborator surface the engine loops depend on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketApi: Send + Sync {
    /// Consecutive failed-bet count for a wallet since `start_round`.
    async fn failed_bet_count(&self, wallet: &str, round_number: u64, start_round: u64) -> u32;

    async fn claimable_bets(&self, wallet: &str) -> Vec<SettledBet>;

    async fn cancelable_bets(&self, wallet: &str) -> Vec<SettledBet>;

    async fn closeable_bets(&self, wallet: &str) -> Vec<SettledBet>;

    async fn round_info(&self, round_number: u64) -> Option<RoundInfo>;

    async fn user_bets(&self, wallet: &str) -> Vec<BetHistoryEntry>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct FortuvaApi {
    http: Client,
    base_url: String,
}

impl FortuvaApi {
    pub fn new(base_url: Option<String>, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(anyhow::Error::from)?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        Ok(Self { http, base_url })
    }

    /// GET a path and deserialize, degrading any failure to `None`.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Option<T> {
        let url = format!("{}{path}", self.base_url);
        let resp = match self.http.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                debug!(url = %url, error = %e, "API request failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            debug!(url = %url, status = %resp.status(), "API returned error status");
            return None;
        }
        match resp.json::<T>().await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(url = %url, error = %e, "API response parse failed");
                None
            }
        }
    }

    async fn get_list<T: serde::de::DeserializeOwned>(&self, path: &str) -> Vec<T> {
        self.get_json::<ListResponse<T>>(path)
            .await
            .map(|r| r.data)
            .unwrap_or_default()
    }
}

#[async_trait]
impl MarketApi for FortuvaApi {
    async fn failed_bet_count(&self, wallet: &str, round_number: u64, start_round: u64) -> u32 {
        self.get_json(&format!(
            "/user/failed-bet-count/{wallet}?roundNumber={round_number}&startRound={start_round}"
        ))
        .await
        .unwrap_or(0)
    }

    async fn claimable_bets(&self, wallet: &str) -> Vec<SettledBet> {
        self.get_list(&format!("/user/claimable-bet/{wallet}")).await
    }

    async fn cancelable_bets(&self, wallet: &str) -> Vec<SettledBet> {
        self.get_list(&format!("/user/cancelable-bets/{wallet}"))
            .await
    }

    async fn closeable_bets(&self, wallet: &str) -> Vec<SettledBet> {
        self.get_list(&format!("/user/closeable-bets/{wallet}"))
            .await
    }

    async fn round_info(&self, round_number: u64) -> Option<RoundInfo> {
        self.get_json(&format!("/round/{round_number}")).await
    }

    async fn user_bets(&self, wallet: &str) -> Vec<BetHistoryEntry> {
        self.get_list(&format!("/user/bets/{wallet}")).await
    }
}
