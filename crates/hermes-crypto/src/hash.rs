use hermes_core::constants::{
    CHANNEL_ADDRESS_DOMAIN, HUB_ADDRESS_DOMAIN, WITHDRAWAL_CHANNEL_DOMAIN,
};
use hermes_core::types::{AccountId, ChannelId, Hashlock, HubId, TxId};
use rand::RngCore;

/// Compute BLAKE3 hash of arbitrary bytes → 32-byte array.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Derive an AccountId from raw public key bytes using BLAKE3.
pub fn account_id_from_pubkey(pubkey_bytes: &[u8]) -> AccountId {
    AccountId::from_bytes(blake3_hash(pubkey_bytes))
}

/// Derive a TxId from the canonical transaction body bytes using BLAKE3.
pub fn tx_id_from_body(body_bytes: &[u8]) -> TxId {
    TxId::from_bytes(blake3_hash(body_bytes))
}

/// Deterministic channel key for an (identity, hub) pair.
pub fn channel_address(identity: &AccountId, hub: &HubId) -> ChannelId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(CHANNEL_ADDRESS_DOMAIN);
    hasher.update(identity.as_bytes());
    hasher.update(hub.as_bytes());
    ChannelId::from_bytes(*hasher.finalize().as_bytes())
}

/// Key of the identity's withdrawal channel on `hub`. Distinct from its
/// consumer channel so promises cannot be redeemed on the wrong one.
pub fn withdrawal_channel_address(identity: &AccountId, hub: &HubId) -> ChannelId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(WITHDRAWAL_CHANNEL_DOMAIN);
    hasher.update(identity.as_bytes());
    hasher.update(hub.as_bytes());
    ChannelId::from_bytes(*hasher.finalize().as_bytes())
}

/// Deterministic hub address for an operator account.
pub fn hub_address(operator: &AccountId) -> HubId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(HUB_ADDRESS_DOMAIN);
    hasher.update(operator.as_bytes());
    AccountId::from_bytes(*hasher.finalize().as_bytes())
}

pub fn hashlock_of(preimage: &[u8]) -> Hashlock {
    Hashlock(blake3_hash(preimage))
}

/// Fresh random secret `R` and its hashlock.
pub fn new_lock() -> (Vec<u8>, Hashlock) {
    let mut secret = vec![0u8; 32];
    rand::thread_rng().fill_bytes(&mut secret);
    let lock = hashlock_of(&secret);
    (secret, lock)
}
