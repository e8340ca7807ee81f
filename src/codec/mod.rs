//! Binary codec for the on-chain prediction program.
//!
//! Pure functions over bytes: fixed-layout account decoding, deterministic
//! program-derived addresses, and Anchor-style instruction encoding. No
//! network access lives here — the `chain` module owns that.

pub mod accounts;
pub mod instructions;
pub mod pda;

use thiserror::Error;

/// Codec-level failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Account data shorter than the fixed layout requires.
    #[error("account data too short: need {need} bytes, got {got}")]
    TooShort { need: usize, got: usize },

    /// No valid program-derived address exists within the bump search.
    #[error("no program address found for seeds {context}")]
    Derivation { context: &'static str },
}
