//! Maintenance sweeper loop.
//!
//! Background settlement: claims payouts from won rounds, refunds stakes
//! from cancelled rounds, and closes finished bet accounts to reclaim
//! rent. The REST API supplies the work lists; each item is settled with
//! its own transaction and a short pause between submissions. Individual
//! failures are logged and retried on the next sweep.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::api::{MarketApi, SettledBet};
use crate::chain::ChainGateway;
use crate::types::LAMPORTS_PER_SOL;

use super::events::{EngineEvent, EventBus};
use super::ShutdownSignal;

/// Tally of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub claimed: u32,
    pub refunded: u32,
    pub closed: u32,
    pub failures: u32,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub struct MaintenanceSweeper {
    pub(crate) chain: Arc<dyn ChainGateway>,
    pub(crate) api: Arc<dyn MarketApi>,
    pub(crate) events: EventBus,
    pub(crate) interval: Duration,
    pub(crate) pause_between: Duration,
}

impl MaintenanceSweeper {
    pub async fn run(&self, shutdown: ShutdownSignal) {
        info!("maintenance sweeper started");
        loop {
            if shutdown.sleep(self.interval).await {
                break;
            }
            let report = self.sweep().await;
            if !report.is_empty() {
                self.events.status(format!(
                    "Maintenance: {} claimed, {} refunded, {} closed, {} failed",
                    report.claimed, report.refunded, report.closed, report.failures
                ));
            }
        }
        info!("maintenance sweeper stopped");
    }

    /// One full sweep over the three work lists.
    pub async fn sweep(&self) -> SweepReport {
        let wallet = self.chain.wallet_address().to_string();
        let mut report = SweepReport::default();

        let claimable = self.api.claimable_bets(&wallet).await;
        if !claimable.is_empty() {
            self.events
                .status(format!("{} claimable bet(s) found", claimable.len()));
        }
        for bet in claimable {
            self.claim(&bet, &mut report).await;
            tokio::time::sleep(self.pause_between).await;
        }

        for bet in self.api.cancelable_bets(&wallet).await {
            match self.chain.cancel_bet(bet.epoch).await {
                Ok(_) => {
                    report.refunded += 1;
                    self.events.status(format!(
                        "Refunded cancelled round {}",
                        bet.epoch
                    ));
                }
                Err(e) => {
                    report.failures += 1;
                    warn!(round = bet.epoch, error = %e, "refund failed");
                }
            }
            tokio::time::sleep(self.pause_between).await;
        }

        for bet in self.api.closeable_bets(&wallet).await {
            match self.chain.close_bet(bet.epoch).await {
                Ok(_) => report.closed += 1,
                Err(e) => {
                    report.failures += 1;
                    warn!(round = bet.epoch, error = %e, "close failed");
                }
            }
            tokio::time::sleep(self.pause_between).await;
        }

        report
    }

    async fn claim(&self, bet: &SettledBet, report: &mut SweepReport) {
        match self.chain.claim_payout(bet.epoch).await {
            Ok(signature) => {
                let payout = bet.payout.unwrap_or(0.0) / LAMPORTS_PER_SOL as f64;
                report.claimed += 1;
                self.events.status(format!(
                    "Claimed {payout:.4} SOL from round {}",
                    bet.epoch
                ));
                self.events.publish(EngineEvent::ClaimSettled {
                    round_number: bet.epoch,
                    payout,
                    signature,
                });
            }
            Err(e) => {
                report.failures += 1;
                warn!(round = bet.epoch, error = %e, "claim failed");
            }
        }
    }
}
