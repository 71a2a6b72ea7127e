use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Token amount in the ledger's base unit.
pub type Balance = u128;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Per-account transaction sequence number, and per-channel request nonce.
pub type Nonce = u64;

/// Fee rate in basis points (1/100 of a percent).
pub type BasisPoints = u16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseIdError {
    #[error("invalid base-58: {0}")]
    Base58(String),
    #[error("invalid hex: {0}")]
    Hex(String),
    #[error("expected 32 bytes, got {0}")]
    Length(usize),
}

fn to_array(bytes: &[u8]) -> Result<[u8; 32], ParseIdError> {
    <[u8; 32]>::try_from(bytes).map_err(|_| ParseIdError::Length(bytes.len()))
}

// ── AccountId ────────────────────────────────────────────────────────────────

/// 32-byte ledger account identifier derived as BLAKE3(dilithium_public_key).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Base-58 encoded string representation.
    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_b58(s: &str) -> Result<Self, ParseIdError> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| ParseIdError::Base58(e.to_string()))?;
        Ok(Self(to_array(&bytes)?))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b58 = self.to_b58();
        write!(f, "AccountId({})", &b58[..b58.len().min(8)])
    }
}

/// A hub is addressed by the ledger account that holds its funds.
pub type HubId = AccountId;

// ── ChannelId ────────────────────────────────────────────────────────────────

/// Opaque channel key for one (identity, hub) pair, produced by the
/// channel address resolver.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub [u8; 32]);

impl ChannelId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, ParseIdError> {
        let bytes = hex::decode(s).map_err(|e| ParseIdError::Hex(e.to_string()))?;
        Ok(Self(to_array(&bytes)?))
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({}…)", &self.to_hex()[..16])
    }
}

// ── TxId ─────────────────────────────────────────────────────────────────────

/// 32-byte transaction identifier: BLAKE3 of the canonical serialized tx body.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, ParseIdError> {
        let bytes = hex::decode(s).map_err(|e| ParseIdError::Hex(e.to_string()))?;
        Ok(Self(to_array(&bytes)?))
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({}…)", &self.to_hex()[..16])
    }
}

// ── Hashlock ─────────────────────────────────────────────────────────────────

/// HTLC commitment carried by a promise: BLAKE3 of the secret `R` that the
/// settling party reveals.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hashlock(pub [u8; 32]);

impl Hashlock {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Hashlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hashlock({}…)", &self.to_hex()[..16])
    }
}

// ── DilithiumPublicKey ────────────────────────────────────────────────────────

/// Dilithium2 public key (1312 bytes per NIST FIPS 204).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DilithiumPublicKey(pub Vec<u8>);

impl fmt::Debug for DilithiumPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DilithiumPublicKey({}b)", self.0.len())
    }
}

/// Dilithium2 signature (2420 bytes per NIST FIPS 204).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DilithiumSignature(pub Vec<u8>);

impl fmt::Debug for DilithiumSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DilithiumSignature({}b)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_b58_parses_back() {
        let id = AccountId::from_bytes([7u8; 32]);
        assert_eq!(AccountId::from_b58(&id.to_b58()).unwrap(), id);
    }

    #[test]
    fn short_ids_are_rejected() {
        assert_eq!(ChannelId::from_hex("abcd"), Err(ParseIdError::Length(2)));
        let short = bs58::encode([1u8; 4]).into_string();
        assert_eq!(AccountId::from_b58(&short), Err(ParseIdError::Length(4)));
    }
}
