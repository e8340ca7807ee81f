//! End-to-end engine runs over in-memory collaborators.
//!
//! Each test wires a real `Engine` to the doubles from `mock_gateway`,
//! lets the loops run for a moment of wall-clock time, then triggers
//! shutdown and inspects what reached the "chain".

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::Utc;

use fortuva_bot::api::{RoundInfo, SettledBet};
use fortuva_bot::engine::events::EventBus;
use fortuva_bot::engine::{Engine, EngineSettings, ShutdownSignal};
use fortuva_bot::types::{
    BettingStrategy, Direction, ManualBetRequest, MarketConfig, ParityMap, StrategyMode,
};

use crate::mock_gateway::{InMemoryChain, ScriptedApi};

const ROUND: u64 = 42;

fn market_config() -> MarketConfig {
    MarketConfig {
        min_bet_amount: 10_000_000,
        lock_duration: 300,
        current_round: ROUND,
        is_paused: false,
        buffer_seconds: 30,
    }
}

fn open_round(lock_in_secs: i64) -> RoundInfo {
    RoundInfo {
        lock_time: Utc::now().timestamp() + lock_in_secs,
        total_bull_amount: 3_000_000_000,
        total_bear_amount: 1_000_000_000,
        up_payout: 1.3,
        down_payout: 3.9,
        lock_price: 9_500_000_000,
        status: 1,
    }
}

fn settings(auto_bet: bool) -> EngineSettings {
    EngineSettings {
        bet_window_secs: 60,
        poll_interval: Duration::from_millis(50),
        maintenance_interval: Duration::from_millis(200),
        min_wallet_balance: 0.05,
        auto_bet,
        considering_old_bets: false,
        strategies: ParityMap::uniform(BettingStrategy {
            min_bet: 0.01,
            max_bet: 0.5,
            multiplier: 2.0,
            mode: StrategyMode::General,
            direction: Direction::Up,
        }),
    }
}

/// Spin the engine for `run_for`, then shut it down cleanly.
async fn run_engine(chain: Arc<InMemoryChain>, api: Arc<ScriptedApi>, settings: EngineSettings) {
    let (events, _rx) = EventBus::channel();
    let engine = Engine::new(chain, api, events, settings).await;
    run_engine_with(engine, Duration::from_millis(1200)).await;
}

async fn run_engine_with(engine: Engine, run_for: Duration) {
    let (shutdown_tx, shutdown) = ShutdownSignal::new();
    let handle = tokio::spawn(engine.run(shutdown));
    tokio::time::sleep(run_for).await;
    shutdown_tx.send(true).ok();
    handle.await.expect("engine task panicked");
}

#[tokio::test]
async fn places_exactly_one_bet_inside_the_window() {
    let chain = Arc::new(InMemoryChain::new(market_config(), 2.0));
    let api = Arc::new(ScriptedApi::default());
    api.rounds.lock().unwrap().insert(ROUND, open_round(30));
    api.rounds
        .lock()
        .unwrap()
        .insert(ROUND - 1, RoundInfo { status: 3, ..RoundInfo::default() });

    run_engine(Arc::clone(&chain), api, settings(true)).await;

    let placed = chain.placed.lock().unwrap().clone();
    assert_eq!(placed, vec![(ROUND, Direction::Up, 0.01)]);
}

#[tokio::test]
async fn does_not_bet_when_auto_bet_is_off() {
    let chain = Arc::new(InMemoryChain::new(market_config(), 2.0));
    let api = Arc::new(ScriptedApi::default());
    api.rounds.lock().unwrap().insert(ROUND, open_round(30));

    run_engine(Arc::clone(&chain), api, settings(false)).await;

    assert!(chain.placed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn sits_out_when_previous_round_was_cancelled() {
    let chain = Arc::new(InMemoryChain::new(market_config(), 2.0));
    let api = Arc::new(ScriptedApi::default());
    api.rounds.lock().unwrap().insert(ROUND, open_round(30));
    api.rounds
        .lock()
        .unwrap()
        .insert(ROUND - 1, RoundInfo { status: 4, ..RoundInfo::default() });

    run_engine(Arc::clone(&chain), api, settings(true)).await;

    assert!(chain.placed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_submission_gets_no_second_attempt() {
    let chain = Arc::new(InMemoryChain::new(market_config(), 2.0));
    chain.fail_submissions.store(true, Ordering::Relaxed);
    let api = Arc::new(ScriptedApi::default());
    api.rounds.lock().unwrap().insert(ROUND, open_round(30));
    api.rounds
        .lock()
        .unwrap()
        .insert(ROUND - 1, RoundInfo { status: 3, ..RoundInfo::default() });

    run_engine(Arc::clone(&chain), api, settings(true)).await;

    // The submission errored out and the round stays forfeited: even
    // after many cycles nothing lands on-chain.
    assert!(chain.placed.lock().unwrap().is_empty());
    assert!(chain.bets.lock().unwrap().is_empty());
}

#[tokio::test]
async fn manual_bet_runs_even_with_auto_bet_off() {
    let chain = Arc::new(InMemoryChain::new(market_config(), 2.0));
    let api = Arc::new(ScriptedApi::default());
    api.rounds.lock().unwrap().insert(ROUND, open_round(30));

    let (events, _rx) = EventBus::channel();
    let engine = Engine::new(chain.clone(), api, events, settings(false)).await;
    engine.mailbox().post(ManualBetRequest {
        round_number: ROUND + 8,
        direction: Direction::Down,
        amount: 0.2,
    });
    run_engine_with(engine, Duration::from_millis(600)).await;

    let placed = chain.placed.lock().unwrap().clone();
    assert_eq!(placed, vec![(ROUND + 8, Direction::Down, 0.2)]);
}

#[tokio::test]
async fn auto_bet_toggle_takes_effect_at_runtime() {
    let chain = Arc::new(InMemoryChain::new(market_config(), 2.0));
    let api = Arc::new(ScriptedApi::default());
    api.rounds.lock().unwrap().insert(ROUND, open_round(60));
    api.rounds
        .lock()
        .unwrap()
        .insert(ROUND - 1, RoundInfo { status: 3, ..RoundInfo::default() });

    let (events, _rx) = EventBus::channel();
    let engine = Engine::new(chain.clone(), api, events, settings(false)).await;
    let toggle = engine.auto_bet_flag();

    let (shutdown_tx, shutdown) = ShutdownSignal::new();
    let handle = tokio::spawn(engine.run(shutdown));
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(chain.placed.lock().unwrap().is_empty());

    toggle.store(true, Ordering::Relaxed);
    tokio::time::sleep(Duration::from_millis(600)).await;
    shutdown_tx.send(true).ok();
    handle.await.expect("engine task panicked");

    assert_eq!(chain.placed.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn sweeper_settles_listed_work() {
    let chain = Arc::new(InMemoryChain::new(market_config(), 2.0));
    let api = Arc::new(ScriptedApi::default());
    // No open round: the executor idles while the sweeper works.
    api.claimable.lock().unwrap().push(SettledBet {
        epoch: 30,
        amount: Some(10_000_000),
        payout: Some(27_000_000.0),
    });
    api.cancelable.lock().unwrap().push(SettledBet {
        epoch: 31,
        amount: Some(10_000_000),
        payout: None,
    });
    api.closeable.lock().unwrap().push(SettledBet {
        epoch: 29,
        amount: None,
        payout: None,
    });

    run_engine(Arc::clone(&chain), api, settings(true)).await;

    assert_eq!(*chain.claims.lock().unwrap(), vec![30]);
    assert_eq!(*chain.refunds.lock().unwrap(), vec![31]);
    assert_eq!(*chain.closes.lock().unwrap(), vec![29]);
}
