//! Program-derived address derivation.
//!
//! All engine-facing accounts live at deterministic addresses derived from
//! domain-separated seeds under the prediction program. Round and bet
//! seeds embed the round number as 8 little-endian bytes, matching the
//! program's own derivation.

use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

use super::CodecError;

/// The deployed prediction program.
pub const PROGRAM_ID: Pubkey = pubkey!("FTV1kbDLaeVM4LG4vHrVu2qdt2cXazYTXWWUi1xFAJdK");

fn derive(seeds: &[&[u8]], context: &'static str) -> Result<Pubkey, CodecError> {
    Pubkey::try_find_program_address(seeds, &PROGRAM_ID)
        .map(|(address, _bump)| address)
        .ok_or(CodecError::Derivation { context })
}

/// Address of the global market configuration account.
pub fn config_address() -> Result<Pubkey, CodecError> {
    derive(&[b"config"], "config")
}

/// Address of the treasury vault account.
pub fn treasury_address() -> Result<Pubkey, CodecError> {
    derive(&[b"treasury"], "treasury")
}

/// Address of the account for a specific round.
pub fn round_address(round_number: u64) -> Result<Pubkey, CodecError> {
    derive(&[b"round", &round_number.to_le_bytes()], "round")
}

/// Address of a user's bet record for a specific round.
pub fn user_bet_address(owner: &Pubkey, round_number: u64) -> Result<Pubkey, CodecError> {
    derive(
        &[b"user_bet", owner.as_ref(), &round_number.to_le_bytes()],
        "user_bet",
    )
}
