//! Betting strategy engine.
//!
//! Pure decision logic: per-parity strategy selection, direction choice,
//! martingale stake sizing, and bound checks. Nothing here touches the
//! network — the bet executor feeds in pool totals, balances, and the
//! failed-bet count and acts on the verdicts.

use tracing::debug;

use crate::types::{BettingStrategy, Direction, Parity, ParityMap, StrategyMode};

// ---------------------------------------------------------------------------
// Runtime state
// ---------------------------------------------------------------------------

/// Mutable engine state the strategy layer reads and the executor updates
/// as bets succeed, fail, or exceed bounds. Lives for the engine's
/// lifetime; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeState {
    /// One-shot direction override. Returned verbatim by
    /// `determine_direction`; cleared by the executor after a successful
    /// bet.
    pub direction_override: Option<Direction>,
    /// Per-parity base stake override in SOL. Values `<= 0` mean "use the
    /// strategy's configured minimum".
    pub base_amounts: ParityMap<f64>,
    /// Per-parity round number from which failed-bet counting restarts.
    pub start_rounds: ParityMap<u64>,
}

impl RuntimeState {
    /// Fresh state. When `considering_old_bets` is off, failed-bet
    /// counting starts at the current round so historical losses don't
    /// inflate the first stake.
    pub fn new(current_round: u64, considering_old_bets: bool) -> Self {
        let start = if considering_old_bets { 0 } else { current_round };
        Self {
            direction_override: None,
            base_amounts: ParityMap::uniform(-1.0),
            start_rounds: ParityMap::uniform(start),
        }
    }

    /// Restart the martingale sequence for a parity at `round_number`.
    /// Called on every bound violation so growth cannot compound past the
    /// cap.
    pub fn reset_checkpoint(&mut self, parity: Parity, round_number: u64) {
        debug!(%parity, round = round_number, "martingale checkpoint reset");
        *self.start_rounds.get_mut(parity) = round_number;
    }

    /// Take the one-shot direction override, leaving the slot empty.
    pub fn take_override(&mut self) -> Option<Direction> {
        self.direction_override.take()
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Pick the strategy for a round by its parity.
pub fn select_strategy(
    round_number: u64,
    strategies: &ParityMap<BettingStrategy>,
) -> &BettingStrategy {
    strategies.for_round(round_number)
}

/// Decide which side to bet.
///
/// An override wins outright. In General mode the configured direction is
/// used unconditionally. In PayoutWeighted mode the bet goes toward the
/// side with the better payout multiple: when the up pool holds at least
/// as much as the down pool, the down side pays more, so the configured
/// direction is inverted; otherwise it is kept. The `>=` boundary (equal
/// pools favour the opposite side) is intentional and must be preserved.
pub fn determine_direction(
    total_up: u64,
    total_down: u64,
    strategy: &BettingStrategy,
    override_direction: Option<Direction>,
) -> Direction {
    if let Some(direction) = override_direction {
        return direction;
    }

    match strategy.mode {
        StrategyMode::General => strategy.direction,
        StrategyMode::PayoutWeighted => {
            if total_up >= total_down {
                strategy.direction.opposite()
            } else {
                strategy.direction
            }
        }
    }
}

/// Martingale stake in SOL: `base * multiplier ^ failed_count`.
///
/// `failed_count` is the number of failed bets since the parity's
/// checkpoint, as reported by the REST collaborator. The base is the
/// runtime override when positive, else the strategy minimum.
pub fn calculate_stake(
    round_number: u64,
    strategy: &BettingStrategy,
    failed_count: u32,
    runtime: &RuntimeState,
) -> f64 {
    let configured = *runtime.base_amounts.for_round(round_number);
    let base = if configured > 0.0 {
        configured
    } else {
        strategy.min_bet
    };
    base * strategy.multiplier.powi(failed_count as i32)
}

/// Verdict from [`check_bounds`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundsVerdict {
    Ok,
    /// Stake grew past the strategy's cap.
    ExceedsMax { stake: f64, max: f64 },
    /// Balance cannot cover stake plus the configured wallet reserve.
    InsufficientBalance {
        stake: f64,
        balance: f64,
        required: f64,
    },
}

impl BoundsVerdict {
    pub fn is_ok(&self) -> bool {
        matches!(self, BoundsVerdict::Ok)
    }
}

/// Check a computed stake against the strategy cap and the wallet balance.
///
/// Either failure verdict obliges the caller to reset the parity's
/// martingale checkpoint to the current round before continuing.
pub fn check_bounds(
    stake: f64,
    strategy: &BettingStrategy,
    balance: f64,
    min_reserve: f64,
) -> BoundsVerdict {
    if stake > strategy.max_bet {
        return BoundsVerdict::ExceedsMax {
            stake,
            max: strategy.max_bet,
        };
    }
    let required = stake + min_reserve;
    if balance < required {
        return BoundsVerdict::InsufficientBalance {
            stake,
            balance,
            required,
        };
    }
    BoundsVerdict::Ok
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
