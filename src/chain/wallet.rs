//! Signing-key loading.
//!
//! Accepts the three private-key formats users paste into wallets:
//! base58 string, JSON 64-byte array, and comma-separated bytes. A
//! keypair file (JSON array on disk) is read into the same path.
//! Malformed key material is the engine's only fatal startup error.

use anyhow::{bail, Context, Result};
use solana_sdk::signature::Keypair;

const SECRET_KEY_LEN: usize = 64;

/// Parse a private key from any supported textual format.
pub fn parse_keypair(private_key: &str) -> Result<Keypair> {
    let trimmed = private_key.trim();
    if trimmed.is_empty() {
        bail!("private key is empty");
    }

    if trimmed.starts_with('[') && trimmed.ends_with(']') {
        let bytes: Vec<u8> = serde_json::from_str(trimmed)
            .context("private key is not a valid JSON byte array")?;
        return keypair_from_bytes(&bytes);
    }

    if trimmed.contains(',') {
        let bytes = trimmed
            .split(',')
            .map(|part| part.trim().parse::<u8>())
            .collect::<Result<Vec<u8>, _>>()
            .context("private key is not a valid comma-separated byte list")?;
        return keypair_from_bytes(&bytes);
    }

    let bytes = bs58::decode(trimmed)
        .into_vec()
        .context("private key is not valid base58")?;
    keypair_from_bytes(&bytes)
}

/// Load a keypair from a JSON keypair file on disk.
pub fn load_keypair_file(path: &str) -> Result<Keypair> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read keypair file: {path}"))?;
    parse_keypair(&contents)
}

fn keypair_from_bytes(bytes: &[u8]) -> Result<Keypair> {
    if bytes.len() != SECRET_KEY_LEN {
        bail!(
            "private key must be {SECRET_KEY_LEN} bytes, got {}",
            bytes.len()
        );
    }
    Keypair::from_bytes(bytes).context("private key bytes do not form a valid keypair")
}
