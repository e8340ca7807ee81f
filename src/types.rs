//! Shared types for the Fortuva betting engine.
//!
//! These types form the data model used across all modules: on-chain
//! account snapshots, strategy configuration, and the small keyed
//! structures the loops share. They carry no behaviour beyond simple
//! accessors so that codec, strategy, and engine modules can depend on
//! them without circular references.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lamports per SOL — the minor unit used in all wire encodings.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Convert an on-chain lamport amount to a display SOL amount.
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Convert a SOL amount to lamports, truncating to the minor unit.
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64) as u64
}

// ---------------------------------------------------------------------------
// Direction & parity
// ---------------------------------------------------------------------------

/// Bet direction: price goes up (bull) or down (bear).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// The opposite direction.
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Wire encoding: `1` for Up/bull, `0` for Down/bear.
    pub fn as_byte(&self) -> u8 {
        match self {
            Direction::Up => 1,
            Direction::Down => 0,
        }
    }

    pub fn from_bull_flag(is_bull: bool) -> Self {
        if is_bull {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
        }
    }
}

/// Round-number parity. Strategies are configured per parity, so
/// consecutive rounds alternate between two independent strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of_round(round_number: u64) -> Self {
        if round_number % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parity::Even => write!(f, "even"),
            Parity::Odd => write!(f, "odd"),
        }
    }
}

/// A fixed two-slot map keyed by round parity.
///
/// Replaces ad hoc `[even, odd]` arrays indexed by `round % 2`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParityMap<T> {
    pub even: T,
    pub odd: T,
}

impl<T> ParityMap<T> {
    pub fn new(even: T, odd: T) -> Self {
        Self { even, odd }
    }

    /// Build a map with the same value in both slots.
    pub fn uniform(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            even: value.clone(),
            odd: value,
        }
    }

    pub fn get(&self, parity: Parity) -> &T {
        match parity {
            Parity::Even => &self.even,
            Parity::Odd => &self.odd,
        }
    }

    pub fn get_mut(&mut self, parity: Parity) -> &mut T {
        match parity {
            Parity::Even => &mut self.even,
            Parity::Odd => &mut self.odd,
        }
    }

    /// Shorthand for `get(Parity::of_round(n))`.
    pub fn for_round(&self, round_number: u64) -> &T {
        self.get(Parity::of_round(round_number))
    }
}

// ---------------------------------------------------------------------------
// Strategy configuration
// ---------------------------------------------------------------------------

/// How the engine picks a direction when no override is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyMode {
    /// Always bet the configured direction.
    General,
    /// Bet toward the side offering the better payout multiple, using the
    /// configured direction as tie-break polarity.
    PayoutWeighted,
}

/// Per-parity betting strategy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BettingStrategy {
    /// Base stake in SOL when no runtime override is set.
    pub min_bet: f64,
    /// Hard cap in SOL; a martingale stake above this resets the sequence.
    pub max_bet: f64,
    /// Martingale multiplier applied per consecutive failed bet.
    pub multiplier: f64,
    pub mode: StrategyMode,
    pub direction: Direction,
}

// ---------------------------------------------------------------------------
// On-chain account snapshots
// ---------------------------------------------------------------------------

/// Global market configuration account. Read-only snapshot, refreshed on
/// every monitor tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketConfig {
    /// Minimum bet the program accepts, in lamports.
    pub min_bet_amount: u64,
    /// Seconds between round start and lock.
    pub lock_duration: u64,
    pub current_round: u64,
    pub is_paused: bool,
    pub buffer_seconds: u64,
}

/// Round lifecycle status as encoded on-chain.
///
/// Only `Cancelled` (wire value 4) is load-bearing for the engine; the
/// remaining variants follow the program's declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundStatus {
    Scheduled,
    Active,
    Locked,
    Settled,
    Cancelled,
    Unknown(u8),
}

impl RoundStatus {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => RoundStatus::Scheduled,
            1 => RoundStatus::Active,
            2 => RoundStatus::Locked,
            3 => RoundStatus::Settled,
            4 => RoundStatus::Cancelled,
            other => RoundStatus::Unknown(other),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RoundStatus::Cancelled)
    }
}

/// One betting round. Never mutated locally — only re-fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Round {
    pub number: u64,
    pub start_time: i64,
    pub lock_time: i64,
    pub close_time: i64,
    pub lock_price: u64,
    pub end_price: u64,
    pub is_active: bool,
    /// Pooled lamports staked on Up.
    pub total_up: u64,
    /// Pooled lamports staked on Down.
    pub total_down: u64,
    pub total_amount: u64,
    pub reward_base: u64,
    pub reward_amount: u64,
    pub status: RoundStatus,
}

/// A user's bet record for one round, as stored on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserBet {
    pub round_number: u64,
    /// Staked amount in lamports.
    pub amount: u64,
    pub direction: Direction,
    pub claimed: bool,
}

// ---------------------------------------------------------------------------
// Engine-side state
// ---------------------------------------------------------------------------

/// A manually requested bet, queued through the single-slot mailbox.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualBetRequest {
    pub round_number: u64,
    pub direction: Direction,
    /// Stake in SOL.
    pub amount: f64,
}

/// Telemetry published on every monitor tick for whichever presentation
/// consumer is attached (none is required).
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSnapshot {
    pub round_number: u64,
    pub remaining_secs: i64,
    pub up_payout: f64,
    pub down_payout: f64,
    /// Total pooled stake in SOL.
    pub prize_pool: f64,
    /// Lock price in display units (wire value / 1e8).
    pub lock_price: f64,
    pub balance: f64,
    pub wallet_address: String,
    pub has_bet: bool,
    pub bet_direction: Option<Direction>,
    pub bet_amount: Option<f64>,
}
