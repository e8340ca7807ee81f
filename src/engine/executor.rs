//! Bet executor loop.
//!
//! Turns the monitor's shared view into stake submissions. Each cycle
//! handles at most one pending manual bet, then decides whether the
//! current round should get an automatic bet: inside the pre-lock
//! window, auto-bet enabled, no bet attempted yet, previous round not
//! cancelled. The attempted-round marker is set before anything touches
//! the network and never cleared on failure, so a round gets at most one
//! automatic attempt no matter how the submission ends.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::api::MarketApi;
use crate::chain::{ChainGateway, PlaceBetOutcome};
use crate::strategy::{self, BoundsVerdict, RuntimeState};
use crate::types::{
    lamports_to_sol, BettingStrategy, Direction, ManualBetRequest, Parity, ParityMap, RoundStatus,
};

use super::events::{EngineEvent, EventBus};
use super::mailbox::ManualBetSlot;
use super::{lock, SharedMemo, SharedView, ShutdownSignal};

/// Minimum cooldown after a successful bet, seconds.
const MIN_COOLDOWN_SECS: i64 = 5;

/// What a single executor cycle did. Exists so the gating order is
/// observable in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    ManualHandled,
    NoData,
    Paused,
    RoundClosed,
    AutoBetOff,
    OutsideWindow,
    AlreadyAttempted,
    ExistingBet,
    PreviousCancelled,
    BoundsRejected,
    Placed,
    SubmitFailed,
}

pub struct BetExecutor {
    pub(crate) chain: Arc<dyn ChainGateway>,
    pub(crate) api: Arc<dyn MarketApi>,
    pub(crate) view: SharedView,
    pub(crate) memo: SharedMemo,
    pub(crate) mailbox: Arc<ManualBetSlot>,
    pub(crate) runtime: Arc<Mutex<RuntimeState>>,
    pub(crate) strategies: ParityMap<BettingStrategy>,
    pub(crate) auto_bet: Arc<std::sync::atomic::AtomicBool>,
    pub(crate) bet_window_secs: i64,
    pub(crate) min_reserve: f64,
    pub(crate) interval: Duration,
    pub(crate) events: EventBus,
}

impl BetExecutor {
    pub async fn run(&self, shutdown: ShutdownSignal) {
        info!("bet executor started");
        loop {
            if shutdown.sleep(self.interval).await {
                break;
            }
            let outcome = self.step(Utc::now().timestamp()).await;
            if outcome == StepOutcome::Placed {
                // Sit out the rest of the window so the freshly placed
                // round is not reconsidered before it locks.
                let cooldown = self.bet_window_secs.max(MIN_COOLDOWN_SECS) as u64;
                if shutdown.sleep(Duration::from_secs(cooldown)).await {
                    break;
                }
            }
        }
        info!("bet executor stopped");
    }

    /// One executor cycle at wall-clock time `now` (unix seconds).
    pub async fn step(&self, now: i64) -> StepOutcome {
        if let Some(request) = self.mailbox.take() {
            self.place_manual(request).await;
            return StepOutcome::ManualHandled;
        }

        let (config, round_number, round) = {
            let view = self.view.read().await;
            match (view.market_config, view.current_round, view.round_info.clone()) {
                (Some(c), Some(n), Some(r)) => (c, n, r),
                _ => return StepOutcome::NoData,
            }
        };
        if config.is_paused {
            return StepOutcome::Paused;
        }

        let remaining = round.lock_time - now;
        if remaining < 0 {
            // Round is locked; drop the memo so the next round starts
            // with a clean guard.
            lock(&self.memo).clear();
            return StepOutcome::RoundClosed;
        }
        if !self.auto_bet.load(Ordering::Relaxed) {
            return StepOutcome::AutoBetOff;
        }
        if remaining > self.bet_window_secs {
            return StepOutcome::OutsideWindow;
        }
        if lock(&self.memo).attempted_round == Some(round_number) {
            return StepOutcome::AlreadyAttempted;
        }
        if let Some(bet) = self.chain.user_bet(round_number).await {
            debug!(round = round_number, "bet already on-chain, adopting it");
            lock(&self.memo).record(round_number, bet.direction, lamports_to_sol(bet.amount));
            return StepOutcome::ExistingBet;
        }
        if round_number > 1 {
            if let Some(previous) = self.api.round_info(round_number - 1).await {
                if RoundStatus::from_u8(previous.status).is_cancelled() {
                    self.events.status(format!(
                        "Round {} was cancelled, sitting out round {round_number}",
                        round_number - 1
                    ));
                    return StepOutcome::PreviousCancelled;
                }
            }
        }

        // Guard first: nothing past this line runs twice for one round,
        // even if the submission outcome is lost.
        lock(&self.memo).attempted_round = Some(round_number);

        let strategy = strategy::select_strategy(round_number, &self.strategies).clone();
        let parity = Parity::of_round(round_number);
        let (override_direction, start_round) = {
            let runtime = lock(&self.runtime);
            (runtime.direction_override, *runtime.start_rounds.get(parity))
        };
        let direction = strategy::determine_direction(
            round.total_bull_amount,
            round.total_bear_amount,
            &strategy,
            override_direction,
        );
        let wallet = self.chain.wallet_address().to_string();
        let failed = self
            .api
            .failed_bet_count(&wallet, round_number, start_round)
            .await;
        let stake = {
            let runtime = lock(&self.runtime);
            strategy::calculate_stake(round_number, &strategy, failed, &runtime)
        };
        let balance = self.chain.balance_sol().await;

        match strategy::check_bounds(stake, &strategy, balance, self.min_reserve) {
            BoundsVerdict::Ok => {}
            BoundsVerdict::ExceedsMax { stake, max } => {
                self.events.status(format!(
                    "Stake {stake:.4} SOL exceeds cap {max:.4} SOL, restarting sequence"
                ));
                lock(&self.runtime).reset_checkpoint(parity, round_number);
                return StepOutcome::BoundsRejected;
            }
            BoundsVerdict::InsufficientBalance {
                stake,
                balance,
                required,
            } => {
                self.events.status(format!(
                    "Balance {balance:.4} SOL below {required:.4} SOL needed for a {stake:.4} SOL stake, restarting sequence"
                ));
                lock(&self.runtime).reset_checkpoint(parity, round_number);
                return StepOutcome::BoundsRejected;
            }
        }

        self.events.status(format!(
            "Placing {stake:.4} SOL on {direction} for round {round_number} (failed streak: {failed})"
        ));
        self.submit(round_number, direction, stake).await
    }

    /// Submit a stake, record the outcome, and clear the one-shot
    /// override on success.
    async fn submit(&self, round_number: u64, direction: Direction, stake: f64) -> StepOutcome {
        self.events.publish(EngineEvent::BetPlacing(true));
        let result = self.chain.place_bet(round_number, direction, stake).await;
        self.events.publish(EngineEvent::BetPlacing(false));

        match result {
            Ok(PlaceBetOutcome::Submitted(signature)) => {
                lock(&self.memo).record(round_number, direction, stake);
                lock(&self.runtime).take_override();
                self.events.status(format!(
                    "Bet placed: https://solscan.io/tx/{signature}"
                ));
                self.events.publish(EngineEvent::BetPlaced {
                    round_number,
                    direction,
                    amount: stake,
                    signature,
                });
                StepOutcome::Placed
            }
            Ok(PlaceBetOutcome::AlreadyPlaced) => {
                self.events
                    .status(format!("Round {round_number} already has a bet on-chain"));
                lock(&self.memo).attempted_round = Some(round_number);
                StepOutcome::Placed
            }
            Err(e) => {
                warn!(round = round_number, error = %e, "bet submission failed");
                self.events
                    .status(format!("Bet failed for round {round_number}: {e}"));
                // Marker stays set: one automatic attempt per round.
                StepOutcome::SubmitFailed
            }
        }
    }

    /// A manual bet skips the window and strategy gating but keeps the
    /// duplicate and balance checks.
    async fn place_manual(&self, request: ManualBetRequest) {
        let ManualBetRequest {
            round_number,
            direction,
            amount,
        } = request;
        self.events.status(format!(
            "Manual bet: {amount:.4} SOL on {direction} for round {round_number}"
        ));

        if let Some(bet) = self.chain.user_bet(round_number).await {
            lock(&self.memo).record(round_number, bet.direction, lamports_to_sol(bet.amount));
            self.events
                .status(format!("Round {round_number} already has a bet, skipping"));
            return;
        }
        let balance = self.chain.balance_sol().await;
        if balance < amount + self.min_reserve {
            self.events.status(format!(
                "Balance {balance:.4} SOL too low for a {amount:.4} SOL manual bet"
            ));
            return;
        }

        lock(&self.memo).attempted_round = Some(round_number);
        self.submit(round_number, direction, amount).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockMarketApi, RoundInfo};
    use crate::chain::MockChainGateway;
    use crate::types::{Direction, MarketConfig, StrategyMode, UserBet};
    use anyhow::anyhow;
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::signature::Signature;
    use std::sync::atomic::AtomicBool;
    use tokio::sync::RwLock;

    use super::super::{BetMemo, MarketView};

    const NOW: i64 = 1_700_000_000;

    fn strategy(direction: Direction) -> BettingStrategy {
        BettingStrategy {
            min_bet: 0.01,
            max_bet: 0.5,
            multiplier: 2.0,
            mode: StrategyMode::General,
            direction,
        }
    }

    fn view_for_round(round: u64, lock_in_secs: i64) -> MarketView {
        MarketView {
            market_config: Some(MarketConfig {
                min_bet_amount: 10_000_000,
                lock_duration: 300,
                current_round: round,
                is_paused: false,
                buffer_seconds: 30,
            }),
            current_round: Some(round),
            round_info: Some(RoundInfo {
                lock_time: NOW + lock_in_secs,
                total_bull_amount: 3_000_000_000,
                total_bear_amount: 1_000_000_000,
                up_payout: 1.3,
                down_payout: 3.9,
                lock_price: 0,
                status: 1,
            }),
        }
    }

    fn executor(chain: MockChainGateway, api: MockMarketApi, view: MarketView) -> BetExecutor {
        let (events, _rx) = EventBus::channel();
        BetExecutor {
            chain: Arc::new(chain),
            api: Arc::new(api),
            view: Arc::new(RwLock::new(view)),
            memo: Arc::new(Mutex::new(BetMemo::default())),
            mailbox: Arc::new(ManualBetSlot::new()),
            runtime: Arc::new(Mutex::new(RuntimeState::new(0, false))),
            strategies: ParityMap::uniform(strategy(Direction::Up)),
            auto_bet: Arc::new(AtomicBool::new(true)),
            bet_window_secs: 30,
            min_reserve: 0.05,
            interval: Duration::from_secs(1),
            events,
        }
    }

    fn expect_happy_reads(chain: &mut MockChainGateway, api: &mut MockMarketApi) {
        chain.expect_user_bet().returning(|_| None);
        chain.expect_wallet_address().returning(Pubkey::new_unique);
        chain.expect_balance_sol().returning(|| 2.0);
        api.expect_round_info()
            .returning(|_| Some(RoundInfo { status: 3, ..RoundInfo::default() }));
        api.expect_failed_bet_count().returning(|_, _, _| 0);
    }

    #[tokio::test]
    async fn empty_view_is_a_noop() {
        let exec = executor(
            MockChainGateway::new(),
            MockMarketApi::new(),
            MarketView::default(),
        );
        assert_eq!(exec.step(NOW).await, StepOutcome::NoData);
    }

    #[tokio::test]
    async fn waits_outside_the_bet_window() {
        let exec = executor(
            MockChainGateway::new(),
            MockMarketApi::new(),
            view_for_round(42, 120),
        );
        assert_eq!(exec.step(NOW).await, StepOutcome::OutsideWindow);
    }

    #[tokio::test]
    async fn auto_bet_off_suspends_betting() {
        let exec = executor(
            MockChainGateway::new(),
            MockMarketApi::new(),
            view_for_round(42, 10),
        );
        exec.auto_bet.store(false, Ordering::Relaxed);
        assert_eq!(exec.step(NOW).await, StepOutcome::AutoBetOff);
    }

    #[tokio::test]
    async fn locked_round_clears_memo() {
        let exec = executor(
            MockChainGateway::new(),
            MockMarketApi::new(),
            view_for_round(42, -5),
        );
        lock(&exec.memo).record(41, Direction::Up, 0.01);
        assert_eq!(exec.step(NOW).await, StepOutcome::RoundClosed);
        assert_eq!(*lock(&exec.memo), BetMemo::default());
    }

    #[tokio::test]
    async fn places_exactly_one_bet_per_round() {
        let mut chain = MockChainGateway::new();
        let mut api = MockMarketApi::new();
        expect_happy_reads(&mut chain, &mut api);
        chain
            .expect_place_bet()
            .times(1)
            .returning(|_, _, _| Ok(PlaceBetOutcome::Submitted(Signature::default())));

        let exec = executor(chain, api, view_for_round(42, 10));
        assert_eq!(exec.step(NOW).await, StepOutcome::Placed);
        // Second cycle in the same window: guard holds, no second submit.
        assert_eq!(exec.step(NOW).await, StepOutcome::AlreadyAttempted);

        let memo = *lock(&exec.memo);
        assert_eq!(memo.attempted_round, Some(42));
        assert_eq!(memo.direction, Some(Direction::Up));
    }

    #[tokio::test]
    async fn failed_submission_still_forfeits_the_round() {
        let mut chain = MockChainGateway::new();
        let mut api = MockMarketApi::new();
        expect_happy_reads(&mut chain, &mut api);
        chain
            .expect_place_bet()
            .times(1)
            .returning(|_, _, _| Err(anyhow!("rpc unavailable")));

        let exec = executor(chain, api, view_for_round(42, 10));
        assert_eq!(exec.step(NOW).await, StepOutcome::SubmitFailed);
        // The marker was set before the network call and stays set.
        assert_eq!(lock(&exec.memo).attempted_round, Some(42));
        assert_eq!(exec.step(NOW).await, StepOutcome::AlreadyAttempted);
    }

    #[tokio::test]
    async fn adopts_bet_already_on_chain() {
        let mut chain = MockChainGateway::new();
        chain.expect_user_bet().returning(|round| {
            Some(UserBet {
                round_number: round,
                amount: 20_000_000,
                direction: Direction::Down,
                claimed: false,
            })
        });

        let exec = executor(chain, MockMarketApi::new(), view_for_round(42, 10));
        assert_eq!(exec.step(NOW).await, StepOutcome::ExistingBet);
        let memo = *lock(&exec.memo);
        assert_eq!(memo.attempted_round, Some(42));
        assert_eq!(memo.direction, Some(Direction::Down));
    }

    #[tokio::test]
    async fn sits_out_after_a_cancelled_round() {
        let mut chain = MockChainGateway::new();
        chain.expect_user_bet().returning(|_| None);
        let mut api = MockMarketApi::new();
        api.expect_round_info()
            .returning(|_| Some(RoundInfo { status: 4, ..RoundInfo::default() }));

        let exec = executor(chain, api, view_for_round(42, 10));
        assert_eq!(exec.step(NOW).await, StepOutcome::PreviousCancelled);
        // Not a forfeit: the guard is untouched and the cycle can retry.
        assert_eq!(lock(&exec.memo).attempted_round, None);
    }

    #[tokio::test]
    async fn bound_violation_resets_checkpoint_and_forfeits() {
        let mut chain = MockChainGateway::new();
        let mut api = MockMarketApi::new();
        chain.expect_user_bet().returning(|_| None);
        chain.expect_wallet_address().returning(Pubkey::new_unique);
        chain.expect_balance_sol().returning(|| 2.0);
        api.expect_round_info()
            .returning(|_| Some(RoundInfo { status: 3, ..RoundInfo::default() }));
        // 0.01 × 2^8 = 2.56 SOL, past the 0.5 cap.
        api.expect_failed_bet_count().returning(|_, _, _| 8);

        let exec = executor(chain, api, view_for_round(42, 10));
        assert_eq!(exec.step(NOW).await, StepOutcome::BoundsRejected);
        assert_eq!(*lock(&exec.runtime).start_rounds.get(Parity::Even), 42);
        // Round stays forfeited.
        assert_eq!(lock(&exec.memo).attempted_round, Some(42));
        assert_eq!(exec.step(NOW).await, StepOutcome::AlreadyAttempted);
    }

    #[tokio::test]
    async fn override_is_used_once_and_cleared() {
        let mut chain = MockChainGateway::new();
        let mut api = MockMarketApi::new();
        expect_happy_reads(&mut chain, &mut api);
        chain
            .expect_place_bet()
            .times(1)
            .withf(|_, direction, _| *direction == Direction::Down)
            .returning(|_, _, _| Ok(PlaceBetOutcome::Submitted(Signature::default())));

        let exec = executor(chain, api, view_for_round(42, 10));
        lock(&exec.runtime).direction_override = Some(Direction::Down);
        assert_eq!(exec.step(NOW).await, StepOutcome::Placed);
        assert_eq!(lock(&exec.runtime).direction_override, None);
    }

    #[tokio::test]
    async fn already_placed_counts_as_success() {
        let mut chain = MockChainGateway::new();
        let mut api = MockMarketApi::new();
        expect_happy_reads(&mut chain, &mut api);
        chain
            .expect_place_bet()
            .times(1)
            .returning(|_, _, _| Ok(PlaceBetOutcome::AlreadyPlaced));

        let exec = executor(chain, api, view_for_round(42, 10));
        assert_eq!(exec.step(NOW).await, StepOutcome::Placed);
    }

    #[tokio::test]
    async fn manual_bet_bypasses_window_but_not_duplicate_check() {
        let mut chain = MockChainGateway::new();
        chain.expect_user_bet().returning(|_| None);
        chain.expect_balance_sol().returning(|| 2.0);
        chain
            .expect_place_bet()
            .times(1)
            .withf(|round, direction, amount| {
                *round == 45 && *direction == Direction::Down && (*amount - 0.1).abs() < 1e-12
            })
            .returning(|_, _, _| Ok(PlaceBetOutcome::Submitted(Signature::default())));

        // View is far outside the window; the manual path ignores it.
        let exec = executor(chain, MockMarketApi::new(), view_for_round(42, 500));
        exec.mailbox.post(ManualBetRequest {
            round_number: 45,
            direction: Direction::Down,
            amount: 0.1,
        });
        assert_eq!(exec.step(NOW).await, StepOutcome::ManualHandled);
        assert_eq!(lock(&exec.memo).attempted_round, Some(45));
    }

    #[tokio::test]
    async fn manual_bet_rejected_on_low_balance() {
        let mut chain = MockChainGateway::new();
        chain.expect_user_bet().returning(|_| None);
        chain.expect_balance_sol().returning(|| 0.1);
        // No place_bet expectation: the mock panics if it is reached.

        let exec = executor(chain, MockMarketApi::new(), view_for_round(42, 500));
        exec.mailbox.post(ManualBetRequest {
            round_number: 45,
            direction: Direction::Up,
            amount: 0.1,
        });
        assert_eq!(exec.step(NOW).await, StepOutcome::ManualHandled);
        assert_eq!(lock(&exec.memo).attempted_round, None);
    }
}
