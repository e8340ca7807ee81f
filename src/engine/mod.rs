//! The betting engine: three cooperating loops over shared state.
//!
//! The round monitor refreshes a shared view of the market, the bet
//! executor turns that view into stake submissions, and the maintenance
//! sweeper settles finished bets in the background. The loops never call
//! each other; they communicate through the shared view, the bet memo,
//! and the manual-bet mailbox, and all of them poll the same shutdown
//! signal at one-second granularity.

pub mod events;
pub mod executor;
pub mod mailbox;
pub mod monitor;
pub mod sweeper;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tracing::info;

use crate::api::{MarketApi, RoundInfo};
use crate::chain::ChainGateway;
use crate::strategy::RuntimeState;
use crate::types::{BettingStrategy, Direction, MarketConfig, Parity, ParityMap};

use events::EventBus;
use executor::BetExecutor;
use mailbox::ManualBetSlot;
use monitor::RoundMonitor;
use sweeper::MaintenanceSweeper;

/// Lock a mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Market data the round monitor refreshes and the bet executor reads.
/// Entirely absent data means the executor sits the cycle out.
#[derive(Debug, Clone, Default)]
pub struct MarketView {
    pub market_config: Option<MarketConfig>,
    pub current_round: Option<u64>,
    pub round_info: Option<RoundInfo>,
}

pub type SharedView = Arc<RwLock<MarketView>>;

/// What the engine remembers about its own bet for a round.
///
/// `attempted_round` is the duplicate-bet guard: it is set before any
/// submission reaches the network and is never cleared on failure, so a
/// round gets at most one automatic attempt. `direction`/`amount` are
/// only filled in once a bet is known to exist.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BetMemo {
    pub attempted_round: Option<u64>,
    pub direction: Option<Direction>,
    pub amount: Option<f64>,
}

impl BetMemo {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Record a bet known to exist on-chain for `round_number`.
    pub fn record(&mut self, round_number: u64, direction: Direction, amount: f64) {
        self.attempted_round = Some(round_number);
        self.direction = Some(direction);
        self.amount = Some(amount);
    }
}

pub type SharedMemo = Arc<Mutex<BetMemo>>;

// ---------------------------------------------------------------------------
// Shutdown
// ---------------------------------------------------------------------------

/// Cooperative shutdown signal shared by every loop.
///
/// Loops sleep through this handle instead of `tokio::time::sleep` so
/// that even a long maintenance interval reacts to shutdown within about
/// a second.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn new() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Sleep for `duration` in slices of at most one second. Returns
    /// `true` if shutdown was triggered before the sleep completed.
    pub async fn sleep(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        while remaining > Duration::ZERO {
            if self.is_triggered() {
                return true;
            }
            let slice = remaining.min(Duration::from_secs(1));
            tokio::time::sleep(slice).await;
            remaining = remaining.saturating_sub(slice);
        }
        self.is_triggered()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Tunables for the engine loops, mapped from the config file.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Seconds before lock at which the executor starts betting.
    pub bet_window_secs: i64,
    /// Monitor and executor cycle cadence.
    pub poll_interval: Duration,
    /// Maintenance sweep cadence.
    pub maintenance_interval: Duration,
    /// SOL to keep in the wallet on top of any stake.
    pub min_wallet_balance: f64,
    /// Whether automatic betting starts enabled.
    pub auto_bet: bool,
    /// Count failed bets from round zero instead of from startup.
    pub considering_old_bets: bool,
    pub strategies: ParityMap<BettingStrategy>,
}

pub struct Engine {
    chain: Arc<dyn ChainGateway>,
    api: Arc<dyn MarketApi>,
    events: EventBus,
    settings: EngineSettings,
    view: SharedView,
    memo: SharedMemo,
    runtime: Arc<Mutex<RuntimeState>>,
    mailbox: Arc<ManualBetSlot>,
    auto_bet: Arc<AtomicBool>,
}

impl Engine {
    /// Wire up the engine. Reads the market config once to anchor the
    /// failed-bet checkpoints at the current round.
    pub async fn new(
        chain: Arc<dyn ChainGateway>,
        api: Arc<dyn MarketApi>,
        events: EventBus,
        settings: EngineSettings,
    ) -> Self {
        let current_round = chain
            .market_config()
            .await
            .map(|c| c.current_round)
            .unwrap_or(0);
        let runtime = RuntimeState::new(current_round, settings.considering_old_bets);
        let auto_bet = Arc::new(AtomicBool::new(settings.auto_bet));
        Self {
            chain,
            api,
            events,
            settings,
            view: Arc::new(RwLock::new(MarketView::default())),
            memo: Arc::new(Mutex::new(BetMemo::default())),
            runtime: Arc::new(Mutex::new(runtime)),
            mailbox: Arc::new(ManualBetSlot::new()),
            auto_bet,
        }
    }

    /// Handle for posting manual bets.
    pub fn mailbox(&self) -> Arc<ManualBetSlot> {
        Arc::clone(&self.mailbox)
    }

    /// Handle for toggling automatic betting at runtime.
    pub fn auto_bet_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.auto_bet)
    }

    /// Set or clear the one-shot direction override for the next bet.
    pub fn set_direction_override(&self, direction: Option<Direction>) {
        lock(&self.runtime).direction_override = direction;
    }

    /// Override the base stake for one parity; `<= 0` restores the
    /// strategy minimum.
    pub fn set_base_amount(&self, parity: Parity, amount_sol: f64) {
        *lock(&self.runtime).base_amounts.get_mut(parity) = amount_sol;
    }

    /// Run all three loops until the shutdown signal fires.
    pub async fn run(self, shutdown: ShutdownSignal) {
        info!("engine starting");

        let monitor = RoundMonitor {
            chain: Arc::clone(&self.chain),
            api: Arc::clone(&self.api),
            view: Arc::clone(&self.view),
            memo: Arc::clone(&self.memo),
            events: self.events.clone(),
            interval: self.settings.poll_interval,
        };

        let executor = BetExecutor {
            chain: Arc::clone(&self.chain),
            api: Arc::clone(&self.api),
            view: Arc::clone(&self.view),
            memo: Arc::clone(&self.memo),
            mailbox: Arc::clone(&self.mailbox),
            runtime: Arc::clone(&self.runtime),
            strategies: self.settings.strategies.clone(),
            auto_bet: Arc::clone(&self.auto_bet),
            bet_window_secs: self.settings.bet_window_secs,
            min_reserve: self.settings.min_wallet_balance,
            interval: self.settings.poll_interval,
            events: self.events.clone(),
        };

        let sweeper = MaintenanceSweeper {
            chain: Arc::clone(&self.chain),
            api: Arc::clone(&self.api),
            events: self.events.clone(),
            interval: self.settings.maintenance_interval,
            pause_between: Duration::from_millis(500),
        };

        futures::join!(
            monitor.run(shutdown.clone()),
            executor.run(shutdown.clone()),
            sweeper.run(shutdown),
        );

        info!("engine stopped");
    }

    /// Whether automatic betting is currently enabled.
    pub fn auto_bet_enabled(&self) -> bool {
        self.auto_bet.load(Ordering::Relaxed)
    }
}
