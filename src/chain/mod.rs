//! Chain gateway — the network boundary to the Solana cluster.
//!
//! Defines the `ChainGateway` trait the engine loops program against, and
//! provides the live `SolanaGateway` implementation. Reads degrade to
//! absent/zero on any failure (a not-yet-initialised account and a flaky
//! RPC look the same to callers); writes surface their cause.

pub mod rpc;
pub mod wallet;

use anyhow::Result;
use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use crate::types::{Direction, MarketConfig, Round, UserBet};

/// Outcome of a stake-placing submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceBetOutcome {
    /// Transaction submitted; confirmation may or may not have landed.
    Submitted(Signature),
    /// A bet record already exists for this round — treated as success,
    /// no transaction was built.
    AlreadyPlaced,
}

/// Read and write operations against the prediction program.
///
/// The engine loops hold this behind a trait object so that tests can run
/// against a mock gateway.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Fetch the global market configuration, or `None` if unavailable.
    async fn market_config(&self) -> Option<MarketConfig>;

    /// Fetch a round account, or `None` if unavailable.
    async fn round(&self, round_number: u64) -> Option<Round>;

    /// Fetch the caller's bet record for a round, or `None` if absent.
    async fn user_bet(&self, round_number: u64) -> Option<UserBet>;

    /// Wallet balance in SOL; `0.0` on any fetch failure.
    async fn balance_sol(&self) -> f64;

    /// Place a bet. Checks for an existing bet record first and returns
    /// `AlreadyPlaced` without submitting if one is found.
    async fn place_bet(
        &self,
        round_number: u64,
        direction: Direction,
        amount_sol: f64,
    ) -> Result<PlaceBetOutcome>;

    /// Claim the payout for a settled winning bet.
    async fn claim_payout(&self, round_number: u64) -> Result<Signature>;

    /// Refund a bet from a cancelled round.
    async fn cancel_bet(&self, round_number: u64) -> Result<Signature>;

    /// Close a finished bet account to reclaim rent.
    async fn close_bet(&self, round_number: u64) -> Result<Signature>;

    /// The signing wallet's address.
    fn wallet_address(&self) -> Pubkey;
}
