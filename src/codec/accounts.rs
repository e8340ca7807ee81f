//! Fixed-layout account decoding.
//!
//! Every program account starts with an 8-byte type tag which is skipped;
//! the remaining fields are little-endian integers and single-byte bools
//! at fixed offsets. Inputs shorter than the full layout are rejected —
//! callers treat that the same as an account that does not exist yet.

use crate::types::{Direction, MarketConfig, Round, RoundStatus, UserBet};

use super::CodecError;

/// Size of the leading account type tag.
const ACCOUNT_TAG_LEN: usize = 8;

/// MarketConfig layout: tag + 3×32 identity keys + min_bet u64 +
/// lock_duration u64 + current_round u64 + paused u8 + buffer_seconds u64.
const MARKET_CONFIG_LEN: usize = ACCOUNT_TAG_LEN + 96 + 8 + 8 + 8 + 1 + 8;

/// Round layout: tag + number u64 + 3 signed timestamps + lock/end prices +
/// active u8 + 3 pool totals + reward base/amount + 24 bytes of counts +
/// status u8.
const ROUND_LEN: usize = ACCOUNT_TAG_LEN + 8 * 6 + 1 + 8 * 5 + 24 + 1;

/// UserBet layout: tag + owner 32 + round u64 + amount u64 + direction u8 +
/// claimed u8.
const USER_BET_LEN: usize = ACCOUNT_TAG_LEN + 32 + 8 + 8 + 1 + 1;

// ---------------------------------------------------------------------------
// Byte reader
// ---------------------------------------------------------------------------

/// Sequential little-endian reader over a pre-validated byte slice.
///
/// Length is checked once up front, so reads never slice out of bounds.
struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader, rejecting slices shorter than `need`.
    fn new(data: &'a [u8], need: usize) -> Result<Self, CodecError> {
        if data.len() < need {
            return Err(CodecError::TooShort {
                need,
                got: data.len(),
            });
        }
        Ok(Self { data, offset: 0 })
    }

    fn skip(&mut self, len: usize) {
        self.offset += len;
    }

    fn read_u64(&mut self) -> u64 {
        let bytes: [u8; 8] = self.data[self.offset..self.offset + 8]
            .try_into()
            .unwrap_or([0; 8]);
        self.offset += 8;
        u64::from_le_bytes(bytes)
    }

    fn read_i64(&mut self) -> i64 {
        let bytes: [u8; 8] = self.data[self.offset..self.offset + 8]
            .try_into()
            .unwrap_or([0; 8]);
        self.offset += 8;
        i64::from_le_bytes(bytes)
    }

    fn read_u8(&mut self) -> u8 {
        let byte = self.data[self.offset];
        self.offset += 1;
        byte
    }

    fn read_bool(&mut self) -> bool {
        self.read_u8() != 0
    }
}

// ---------------------------------------------------------------------------
// Decoders
// ---------------------------------------------------------------------------

/// Decode the global market configuration account.
pub fn decode_market_config(data: &[u8]) -> Result<MarketConfig, CodecError> {
    let mut reader = ByteReader::new(data, MARKET_CONFIG_LEN)?;
    reader.skip(ACCOUNT_TAG_LEN);
    // operator multisig, admin multisig, executor
    reader.skip(96);

    Ok(MarketConfig {
        min_bet_amount: reader.read_u64(),
        lock_duration: reader.read_u64(),
        current_round: reader.read_u64(),
        is_paused: reader.read_bool(),
        buffer_seconds: reader.read_u64(),
    })
}

/// Decode a round account. Timestamps are signed seconds.
pub fn decode_round(data: &[u8]) -> Result<Round, CodecError> {
    let mut reader = ByteReader::new(data, ROUND_LEN)?;
    reader.skip(ACCOUNT_TAG_LEN);

    let number = reader.read_u64();
    let start_time = reader.read_i64();
    let lock_time = reader.read_i64();
    let close_time = reader.read_i64();
    let lock_price = reader.read_u64();
    let end_price = reader.read_u64();
    let is_active = reader.read_bool();
    let total_up = reader.read_u64();
    let total_down = reader.read_u64();
    let total_amount = reader.read_u64();
    let reward_base = reader.read_u64();
    let reward_amount = reader.read_u64();
    // bull count, bear count, claimed count
    reader.skip(24);
    let status = RoundStatus::from_u8(reader.read_u8());

    Ok(Round {
        number,
        start_time,
        lock_time,
        close_time,
        lock_price,
        end_price,
        is_active,
        total_up,
        total_down,
        total_amount,
        reward_base,
        reward_amount,
        status,
    })
}

/// Decode a user bet account.
pub fn decode_user_bet(data: &[u8]) -> Result<UserBet, CodecError> {
    let mut reader = ByteReader::new(data, USER_BET_LEN)?;
    reader.skip(ACCOUNT_TAG_LEN);
    // owner pubkey
    reader.skip(32);

    Ok(UserBet {
        round_number: reader.read_u64(),
        amount: reader.read_u64(),
        direction: Direction::from_bull_flag(reader.read_bool()),
        claimed: reader.read_bool(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
