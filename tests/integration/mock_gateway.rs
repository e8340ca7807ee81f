//! In-memory chain and API doubles for integration testing.
//!
//! Deterministic implementations of `ChainGateway` and `MarketApi` with
//! fully controllable state: rounds, bets, balances, and settlement
//! work lists all live behind mutexes the test code can reach into.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use fortuva_bot::api::{BetHistoryEntry, MarketApi, RoundInfo, SettledBet};
use fortuva_bot::chain::{ChainGateway, PlaceBetOutcome};
use fortuva_bot::types::{sol_to_lamports, Direction, MarketConfig, Round, UserBet};

/// A chain gateway whose whole cluster fits in a few mutexes.
pub struct InMemoryChain {
    wallet: Pubkey,
    pub config: Mutex<Option<MarketConfig>>,
    pub bets: Mutex<HashMap<u64, UserBet>>,
    pub balance: Mutex<f64>,
    /// Every successful placement, in submission order.
    pub placed: Mutex<Vec<(u64, Direction, f64)>>,
    pub claims: Mutex<Vec<u64>>,
    pub refunds: Mutex<Vec<u64>>,
    pub closes: Mutex<Vec<u64>>,
    /// When set, submissions fail with an RPC-flavoured error.
    pub fail_submissions: AtomicBool,
}

impl InMemoryChain {
    pub fn new(config: MarketConfig, balance: f64) -> Self {
        Self {
            wallet: Pubkey::new_unique(),
            config: Mutex::new(Some(config)),
            bets: Mutex::new(HashMap::new()),
            balance: Mutex::new(balance),
            placed: Mutex::new(Vec::new()),
            claims: Mutex::new(Vec::new()),
            refunds: Mutex::new(Vec::new()),
            closes: Mutex::new(Vec::new()),
            fail_submissions: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ChainGateway for InMemoryChain {
    async fn market_config(&self) -> Option<MarketConfig> {
        *self.config.lock().unwrap()
    }

    async fn round(&self, _round_number: u64) -> Option<Round> {
        None
    }

    async fn user_bet(&self, round_number: u64) -> Option<UserBet> {
        self.bets.lock().unwrap().get(&round_number).copied()
    }

    async fn balance_sol(&self) -> f64 {
        *self.balance.lock().unwrap()
    }

    async fn place_bet(
        &self,
        round_number: u64,
        direction: Direction,
        amount_sol: f64,
    ) -> Result<PlaceBetOutcome> {
        if self.bets.lock().unwrap().contains_key(&round_number) {
            return Ok(PlaceBetOutcome::AlreadyPlaced);
        }
        if self.fail_submissions.load(Ordering::Relaxed) {
            return Err(anyhow!("rpc unavailable"));
        }
        self.bets.lock().unwrap().insert(
            round_number,
            UserBet {
                round_number,
                amount: sol_to_lamports(amount_sol),
                direction,
                claimed: false,
            },
        );
        self.placed
            .lock()
            .unwrap()
            .push((round_number, direction, amount_sol));
        *self.balance.lock().unwrap() -= amount_sol;
        Ok(PlaceBetOutcome::Submitted(Signature::default()))
    }

    async fn claim_payout(&self, round_number: u64) -> Result<Signature> {
        self.claims.lock().unwrap().push(round_number);
        Ok(Signature::default())
    }

    async fn cancel_bet(&self, round_number: u64) -> Result<Signature> {
        self.refunds.lock().unwrap().push(round_number);
        Ok(Signature::default())
    }

    async fn close_bet(&self, round_number: u64) -> Result<Signature> {
        self.closes.lock().unwrap().push(round_number);
        Ok(Signature::default())
    }

    fn wallet_address(&self) -> Pubkey {
        self.wallet
    }
}

/// A REST API double serving scripted responses.
#[derive(Default)]
pub struct ScriptedApi {
    pub rounds: Mutex<HashMap<u64, RoundInfo>>,
    /// Work lists are drained on first fetch so settlement runs once.
    pub claimable: Mutex<Vec<SettledBet>>,
    pub cancelable: Mutex<Vec<SettledBet>>,
    pub closeable: Mutex<Vec<SettledBet>>,
    pub failed_count: Mutex<u32>,
}

#[async_trait]
impl MarketApi for ScriptedApi {
    async fn failed_bet_count(&self, _wallet: &str, _round: u64, _start: u64) -> u32 {
        *self.failed_count.lock().unwrap()
    }

    async fn claimable_bets(&self, _wallet: &str) -> Vec<SettledBet> {
        std::mem::take(&mut *self.claimable.lock().unwrap())
    }

    async fn cancelable_bets(&self, _wallet: &str) -> Vec<SettledBet> {
        std::mem::take(&mut *self.cancelable.lock().unwrap())
    }

    async fn closeable_bets(&self, _wallet: &str) -> Vec<SettledBet> {
        std::mem::take(&mut *self.closeable.lock().unwrap())
    }

    async fn round_info(&self, round_number: u64) -> Option<RoundInfo> {
        self.rounds.lock().unwrap().get(&round_number).cloned()
    }

    async fn user_bets(&self, _wallet: &str) -> Vec<BetHistoryEntry> {
        Vec::new()
    }
}
