//! Live gateway over a Solana JSON-RPC endpoint.
//!
//! Wraps the nonblocking RPC client at confirmed commitment. Account reads
//! decode through the codec; decode failures are logged and reported as
//! absent accounts. Submissions sign with the engine wallet, then wait for
//! confirmation under a bounded timeout — a confirmation timeout is not a
//! submission failure, the signature is still the result of record.

use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;
use std::time::Duration;
use tracing::{debug, warn};

use crate::codec::instructions::{self, Discriminators};
use crate::codec::{accounts, pda};
use crate::types::{lamports_to_sol, sol_to_lamports, Direction, MarketConfig, Round, UserBet};

use super::{ChainGateway, PlaceBetOutcome};

/// How long to wait for transaction confirmation before giving up
/// (the transaction itself usually still lands).
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(30);

/// Polling cadence while waiting for confirmation.
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct SolanaGateway {
    rpc: RpcClient,
    wallet: Keypair,
    discriminators: Discriminators,
}

impl SolanaGateway {
    /// Connect to an RPC endpoint at confirmed commitment.
    pub fn new(rpc_url: &str, wallet: Keypair) -> Self {
        let rpc =
            RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed());
        Self {
            rpc,
            wallet,
            discriminators: Discriminators::new(),
        }
    }

    /// Fetch and decode an account, treating every failure as absence.
    async fn fetch_account<T>(
        &self,
        address: Pubkey,
        decode: fn(&[u8]) -> Result<T, crate::codec::CodecError>,
        what: &str,
    ) -> Option<T> {
        let data = match self.rpc.get_account_data(&address).await {
            Ok(data) => data,
            Err(e) => {
                debug!(account = %address, error = %e, "{what} fetch failed");
                return None;
            }
        };
        match decode(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(account = %address, error = %e, "{what} decode failed");
                None
            }
        }
    }

    /// Sign, submit, and confirm (best effort) a single-instruction
    /// transaction.
    async fn submit(&self, instruction: Instruction, what: &str) -> Result<Signature> {
        let blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .context("failed to fetch recent blockhash")?;

        let tx = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&self.wallet.pubkey()),
            &[&self.wallet],
            blockhash,
        );

        let signature = self
            .rpc
            .send_transaction(&tx)
            .await
            .with_context(|| format!("{what} submission failed"))?;
        debug!(%signature, "{what} transaction sent");

        if let Err(e) = self.await_confirmation(&signature).await {
            warn!(%signature, error = %e, "{what} confirmation timed out; transaction likely still processing");
        }

        Ok(signature)
    }

    async fn await_confirmation(&self, signature: &Signature) -> Result<()> {
        tokio::time::timeout(CONFIRM_TIMEOUT, async {
            loop {
                match self.rpc.confirm_transaction(signature).await {
                    Ok(true) => return Ok(()),
                    Ok(false) => {}
                    Err(e) => debug!(%signature, error = %e, "confirmation poll failed"),
                }
                tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
            }
        })
        .await
        .context("confirmation wait timed out")?
    }
}

#[async_trait]
impl ChainGateway for SolanaGateway {
    async fn market_config(&self) -> Option<MarketConfig> {
        let address = pda::config_address().ok()?;
        self.fetch_account(address, accounts::decode_market_config, "market config")
            .await
    }

    async fn round(&self, round_number: u64) -> Option<Round> {
        let address = pda::round_address(round_number).ok()?;
        self.fetch_account(address, accounts::decode_round, "round")
            .await
    }

    async fn user_bet(&self, round_number: u64) -> Option<UserBet> {
        let address = pda::user_bet_address(&self.wallet.pubkey(), round_number).ok()?;
        self.fetch_account(address, accounts::decode_user_bet, "user bet")
            .await
    }

    async fn balance_sol(&self) -> f64 {
        match self.rpc.get_balance(&self.wallet.pubkey()).await {
            Ok(lamports) => lamports_to_sol(lamports),
            Err(e) => {
                debug!(error = %e, "balance fetch failed");
                0.0
            }
        }
    }

    async fn place_bet(
        &self,
        round_number: u64,
        direction: Direction,
        amount_sol: f64,
    ) -> Result<PlaceBetOutcome> {
        // Idempotence guard: a bet record on-chain means we (or another
        // session) already staked this round.
        if self.user_bet(round_number).await.is_some() {
            return Ok(PlaceBetOutcome::AlreadyPlaced);
        }

        let instruction = instructions::place_bet(
            &self.discriminators,
            &self.wallet.pubkey(),
            round_number,
            direction,
            sol_to_lamports(amount_sol),
        )
        .context("failed to build place_bet instruction")?;

        let signature = self.submit(instruction, "place_bet").await?;
        Ok(PlaceBetOutcome::Submitted(signature))
    }

    async fn claim_payout(&self, round_number: u64) -> Result<Signature> {
        let instruction =
            instructions::claim_payout(&self.discriminators, &self.wallet.pubkey(), round_number)
                .context("failed to build claim_payout instruction")?;
        self.submit(instruction, "claim_payout").await
    }

    async fn cancel_bet(&self, round_number: u64) -> Result<Signature> {
        let instruction =
            instructions::cancel_bet(&self.discriminators, &self.wallet.pubkey(), round_number)
                .context("failed to build cancel_bet instruction")?;
        self.submit(instruction, "cancel_bet").await
    }

    async fn close_bet(&self, round_number: u64) -> Result<Signature> {
        let instruction =
            instructions::close_bet(&self.discriminators, &self.wallet.pubkey(), round_number)
                .context("failed to build close_bet instruction")?;
        self.submit(instruction, "close_bet").await
    }

    fn wallet_address(&self) -> Pubkey {
        self.wallet.pubkey()
    }
}
