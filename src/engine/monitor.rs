//! Round monitor loop.
//!
//! Refreshes the shared market view once per cycle: market config from
//! the chain, round summary from the REST API, wallet balance, and the
//! bet memo when a bet from a previous session is found on-chain. Every
//! read degrades to "skip this cycle" — the loop itself never fails.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::api::MarketApi;
use crate::chain::ChainGateway;
use crate::types::{lamports_to_sol, RoundSnapshot};

use super::events::{EngineEvent, EventBus};
use super::{lock, SharedMemo, SharedView, ShutdownSignal};

/// Divisor turning the wire lock price into display units.
const PRICE_SCALE: f64 = 1e8;

pub struct RoundMonitor {
    pub(crate) chain: Arc<dyn ChainGateway>,
    pub(crate) api: Arc<dyn MarketApi>,
    pub(crate) view: SharedView,
    pub(crate) memo: SharedMemo,
    pub(crate) events: EventBus,
    pub(crate) interval: Duration,
}

impl RoundMonitor {
    pub async fn run(&self, shutdown: ShutdownSignal) {
        info!("round monitor started");
        loop {
            if shutdown.sleep(self.interval).await {
                break;
            }
            self.tick().await;
        }
        info!("round monitor stopped");
    }

    /// One refresh cycle.
    pub(crate) async fn tick(&self) {
        let config = self.chain.market_config().await;
        {
            let mut view = self.view.write().await;
            view.market_config = config;
            view.current_round = config.map(|c| c.current_round);
        }
        let Some(config) = config else {
            debug!("market config unavailable, skipping cycle");
            return;
        };
        if config.is_paused {
            self.events.status("Market is paused");
            return;
        }

        let round_number = config.current_round;
        let Some(info) = self.api.round_info(round_number).await else {
            debug!(round = round_number, "round info unavailable, skipping cycle");
            self.view.write().await.round_info = None;
            return;
        };
        self.view.write().await.round_info = Some(info.clone());

        let remaining = info.lock_time - Utc::now().timestamp();
        if remaining < 0 {
            debug!(round = round_number, "round already locked");
            return;
        }

        let balance = self.chain.balance_sol().await;

        // A bet may exist from a previous session; pick it up so the
        // executor and the snapshot see it.
        let attempted = lock(&self.memo).attempted_round;
        if attempted != Some(round_number) {
            if let Some(bet) = self.chain.user_bet(round_number).await {
                lock(&self.memo).record(
                    round_number,
                    bet.direction,
                    lamports_to_sol(bet.amount),
                );
            }
        }
        let memo = *lock(&self.memo);
        let has_bet = memo.attempted_round == Some(round_number) && memo.direction.is_some();

        let prize_pool = lamports_to_sol(info.total_bull_amount + info.total_bear_amount);
        let snapshot = RoundSnapshot {
            round_number,
            remaining_secs: remaining,
            up_payout: info.up_payout,
            down_payout: info.down_payout,
            prize_pool,
            lock_price: info.lock_price as f64 / PRICE_SCALE,
            balance,
            wallet_address: self.chain.wallet_address().to_string(),
            has_bet,
            bet_direction: memo.direction.filter(|_| has_bet),
            bet_amount: memo.amount.filter(|_| has_bet),
        };
        self.events.publish(EngineEvent::RoundUpdate(snapshot));
        self.events.status(format!(
            "Round {round_number} | {remaining}s to lock | pool {prize_pool:.4} SOL | balance {balance:.4} SOL"
        ));
    }
}
