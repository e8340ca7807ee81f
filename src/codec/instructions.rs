//! Instruction encoding for the prediction program.
//!
//! The program dispatches on an 8-byte discriminator: the first 8 bytes of
//! `sha256("global:<instruction_name>")`. Arguments follow as little-endian
//! integers and single-byte bools. Account lists are fixed, ordered tuples
//! of (address, signer, writable) per instruction.

use solana_sdk::hash::hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;

use crate::types::Direction;

use super::pda;
use super::CodecError;

/// Compute the 8-byte discriminator for a named instruction.
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    let digest = hash(format!("global:{name}").as_bytes());
    let mut disc = [0u8; 8];
    disc.copy_from_slice(&digest.to_bytes()[..8]);
    disc
}

/// Discriminators for every instruction the engine issues, computed once
/// at gateway construction.
#[derive(Debug, Clone, Copy)]
pub struct Discriminators {
    pub place_bet: [u8; 8],
    pub claim_payout: [u8; 8],
    pub cancel_bet: [u8; 8],
    pub close_bet: [u8; 8],
}

impl Discriminators {
    pub fn new() -> Self {
        Self {
            place_bet: instruction_discriminator("place_bet"),
            claim_payout: instruction_discriminator("claim_payout"),
            cancel_bet: instruction_discriminator("cancel_bet"),
            close_bet: instruction_discriminator("close_bet"),
        }
    }
}

impl Default for Discriminators {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Instruction builders
// ---------------------------------------------------------------------------

/// Build a `place_bet` instruction.
///
/// Args: `[amount u64][direction u8][round u64]`.
pub fn place_bet(
    disc: &Discriminators,
    payer: &Pubkey,
    round_number: u64,
    direction: Direction,
    amount_lamports: u64,
) -> Result<Instruction, CodecError> {
    let mut data = Vec::with_capacity(8 + 8 + 1 + 8);
    data.extend_from_slice(&disc.place_bet);
    data.extend_from_slice(&amount_lamports.to_le_bytes());
    data.push(direction.as_byte());
    data.extend_from_slice(&round_number.to_le_bytes());

    let accounts = vec![
        AccountMeta::new_readonly(pda::config_address()?, false),
        AccountMeta::new(pda::round_address(round_number)?, false),
        AccountMeta::new(pda::user_bet_address(payer, round_number)?, false),
        AccountMeta::new(*payer, true),
        AccountMeta::new(pda::treasury_address()?, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction::new_with_bytes(pda::PROGRAM_ID, &data, accounts))
}

/// Build a `claim_payout` instruction. Args: `[round u64]`.
pub fn claim_payout(
    disc: &Discriminators,
    payer: &Pubkey,
    round_number: u64,
) -> Result<Instruction, CodecError> {
    let data = round_arg_data(&disc.claim_payout, round_number);
    let accounts = vec![
        AccountMeta::new(pda::config_address()?, false),
        AccountMeta::new(pda::round_address(round_number)?, false),
        AccountMeta::new(pda::user_bet_address(payer, round_number)?, false),
        AccountMeta::new(*payer, true),
        AccountMeta::new(pda::treasury_address()?, false),
    ];
    Ok(Instruction::new_with_bytes(pda::PROGRAM_ID, &data, accounts))
}

/// Build a `cancel_bet` instruction. Args: `[round u64]`.
pub fn cancel_bet(
    disc: &Discriminators,
    payer: &Pubkey,
    round_number: u64,
) -> Result<Instruction, CodecError> {
    let data = round_arg_data(&disc.cancel_bet, round_number);
    let accounts = vec![
        AccountMeta::new_readonly(pda::config_address()?, false),
        AccountMeta::new(pda::round_address(round_number)?, false),
        AccountMeta::new(pda::user_bet_address(payer, round_number)?, false),
        AccountMeta::new(*payer, true),
        AccountMeta::new(pda::treasury_address()?, false),
    ];
    Ok(Instruction::new_with_bytes(pda::PROGRAM_ID, &data, accounts))
}

/// Build a `close_bet` instruction (reclaims the bet account's rent).
/// Args: `[round u64]`. Closing is idempotent on-chain, so no existence
/// pre-check is performed for it anywhere in the engine.
pub fn close_bet(
    disc: &Discriminators,
    payer: &Pubkey,
    round_number: u64,
) -> Result<Instruction, CodecError> {
    let data = round_arg_data(&disc.close_bet, round_number);
    let accounts = vec![
        AccountMeta::new(pda::user_bet_address(payer, round_number)?, false),
        AccountMeta::new_readonly(pda::round_address(round_number)?, false),
        AccountMeta::new(*payer, true),
        AccountMeta::new_readonly(system_program::id(), false),
    ];
    Ok(Instruction::new_with_bytes(pda::PROGRAM_ID, &data, accounts))
}

fn round_arg_data(disc: &[u8; 8], round_number: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(8 + 8);
    data.extend_from_slice(disc);
    data.extend_from_slice(&round_number.to_le_bytes());
    data
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
