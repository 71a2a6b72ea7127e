//! Canonical signing bytes for every signed message, and helpers to build
//! and check signed messages and transactions.
//!
//! Layout: `len(domain) as u16 BE || domain || fields`, with every field
//! fixed-width big-endian. Each message binds its channel id; requests that
//! can be replayed also bind the channel's next nonce.

use hermes_core::constants::{
    BENEFICIARY_DOMAIN, FAST_WITHDRAWAL_DOMAIN, PAY_AND_SETTLE_DOMAIN, PROMISE_DOMAIN,
    STAKE_CHANGE_DOMAIN, STAKE_GOAL_DOMAIN,
};
use hermes_core::error::HermesError;
use hermes_core::message::{
    BeneficiaryChange, FastWithdrawal, PayAndSettleBeneficiary, Promise, StakeChange,
    StakeGoalChange,
};
use hermes_core::transaction::{Action, Transaction};
use hermes_core::types::{
    AccountId, Balance, ChannelId, DilithiumPublicKey, DilithiumSignature, Hashlock, Nonce,
    Timestamp, TxId,
};

use crate::dilithium::{verify_signature, SignatureError};
use crate::hash::{account_id_from_pubkey, tx_id_from_body};
use crate::keypair::KeyPair;

struct Canonical(Vec<u8>);

impl Canonical {
    fn new(domain: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(128);
        buf.extend_from_slice(&(domain.len() as u16).to_be_bytes());
        buf.extend_from_slice(domain);
        Self(buf)
    }

    fn bytes32(mut self, b: &[u8; 32]) -> Self {
        self.0.extend_from_slice(b);
        self
    }

    fn u128(mut self, v: u128) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn u64(mut self, v: u64) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn i64(mut self, v: i64) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn finish(self) -> Vec<u8> {
        self.0
    }
}

// ── Message bytes ─────────────────────────────────────────────────────────────

pub fn promise_bytes(
    channel_id: &ChannelId,
    amount: Balance,
    fee: Balance,
    hashlock: &Hashlock,
) -> Vec<u8> {
    Canonical::new(PROMISE_DOMAIN)
        .bytes32(channel_id.as_bytes())
        .u128(amount)
        .u128(fee)
        .bytes32(&hashlock.0)
        .finish()
}

pub fn stake_change_bytes(
    channel_id: &ChannelId,
    amount: Balance,
    fee: Balance,
    nonce: Nonce,
) -> Vec<u8> {
    Canonical::new(STAKE_CHANGE_DOMAIN)
        .bytes32(channel_id.as_bytes())
        .u128(amount)
        .u128(fee)
        .u64(nonce)
        .finish()
}

pub fn beneficiary_bytes(channel_id: &ChannelId, beneficiary: &AccountId, nonce: Nonce) -> Vec<u8> {
    Canonical::new(BENEFICIARY_DOMAIN)
        .bytes32(channel_id.as_bytes())
        .bytes32(beneficiary.as_bytes())
        .u64(nonce)
        .finish()
}

pub fn stake_goal_bytes(channel_id: &ChannelId, stake_goal: Balance, nonce: Nonce) -> Vec<u8> {
    Canonical::new(STAKE_GOAL_DOMAIN)
        .bytes32(channel_id.as_bytes())
        .u128(stake_goal)
        .u64(nonce)
        .finish()
}

pub fn fast_withdrawal_bytes(
    channel_id: &ChannelId,
    amount: Balance,
    fee: Balance,
    beneficiary: &AccountId,
    valid_until: Timestamp,
    nonce: Nonce,
) -> Vec<u8> {
    Canonical::new(FAST_WITHDRAWAL_DOMAIN)
        .bytes32(channel_id.as_bytes())
        .u128(amount)
        .u128(fee)
        .bytes32(beneficiary.as_bytes())
        .i64(valid_until)
        .u64(nonce)
        .finish()
}

pub fn pay_and_settle_bytes(
    channel_id: &ChannelId,
    amount: Balance,
    hashlock: &Hashlock,
    beneficiary: &AccountId,
) -> Vec<u8> {
    Canonical::new(PAY_AND_SETTLE_DOMAIN)
        .bytes32(channel_id.as_bytes())
        .u128(amount)
        .bytes32(&hashlock.0)
        .bytes32(beneficiary.as_bytes())
        .finish()
}

/// Messages carrying a signature over their canonical bytes.
pub trait Signed {
    fn signing_bytes(&self) -> Vec<u8>;
}

impl Signed for Promise {
    fn signing_bytes(&self) -> Vec<u8> {
        promise_bytes(&self.channel_id, self.amount, self.fee, &self.hashlock)
    }
}

impl Signed for StakeChange {
    fn signing_bytes(&self) -> Vec<u8> {
        stake_change_bytes(&self.channel_id, self.amount, self.fee, self.nonce)
    }
}

impl Signed for BeneficiaryChange {
    fn signing_bytes(&self) -> Vec<u8> {
        beneficiary_bytes(&self.channel_id, &self.beneficiary, self.nonce)
    }
}

impl Signed for StakeGoalChange {
    fn signing_bytes(&self) -> Vec<u8> {
        stake_goal_bytes(&self.channel_id, self.stake_goal, self.nonce)
    }
}

impl Signed for FastWithdrawal {
    fn signing_bytes(&self) -> Vec<u8> {
        fast_withdrawal_bytes(
            &self.channel_id,
            self.amount,
            self.fee,
            &self.beneficiary,
            self.valid_until,
            self.nonce,
        )
    }
}

impl Signed for PayAndSettleBeneficiary {
    fn signing_bytes(&self) -> Vec<u8> {
        pay_and_settle_bytes(&self.channel_id, self.amount, &self.hashlock, &self.beneficiary)
    }
}

/// Check `signature` over `message`'s canonical bytes against `signer`.
pub fn verify_message<M: Signed>(
    message: &M,
    signature: &DilithiumSignature,
    signer: &DilithiumPublicKey,
) -> Result<(), SignatureError> {
    verify_signature(signer, &message.signing_bytes(), signature)
}

// ── Signing helpers ───────────────────────────────────────────────────────────

pub fn sign_promise(
    operator: &KeyPair,
    channel_id: &ChannelId,
    amount: Balance,
    fee: Balance,
    hashlock: Hashlock,
) -> Result<Promise, SignatureError> {
    let signature = operator.sign(&promise_bytes(channel_id, amount, fee, &hashlock))?;
    Ok(Promise { channel_id: channel_id.clone(), amount, fee, hashlock, signature })
}

pub fn sign_stake_change(
    identity: &KeyPair,
    channel_id: &ChannelId,
    amount: Balance,
    fee: Balance,
    nonce: Nonce,
) -> Result<StakeChange, SignatureError> {
    let signature = identity.sign(&stake_change_bytes(channel_id, amount, fee, nonce))?;
    Ok(StakeChange { channel_id: channel_id.clone(), amount, fee, nonce, signature })
}

pub fn sign_beneficiary_change(
    identity: &KeyPair,
    channel_id: &ChannelId,
    beneficiary: &AccountId,
    nonce: Nonce,
) -> Result<BeneficiaryChange, SignatureError> {
    let signature = identity.sign(&beneficiary_bytes(channel_id, beneficiary, nonce))?;
    Ok(BeneficiaryChange {
        channel_id: channel_id.clone(),
        beneficiary: beneficiary.clone(),
        nonce,
        signature,
    })
}

pub fn sign_stake_goal_change(
    identity: &KeyPair,
    channel_id: &ChannelId,
    stake_goal: Balance,
    nonce: Nonce,
) -> Result<StakeGoalChange, SignatureError> {
    let signature = identity.sign(&stake_goal_bytes(channel_id, stake_goal, nonce))?;
    Ok(StakeGoalChange { channel_id: channel_id.clone(), stake_goal, nonce, signature })
}

pub fn sign_pay_and_settle_beneficiary(
    identity: &KeyPair,
    channel_id: &ChannelId,
    amount: Balance,
    hashlock: Hashlock,
    beneficiary: &AccountId,
) -> Result<PayAndSettleBeneficiary, SignatureError> {
    let signature = identity.sign(&pay_and_settle_bytes(channel_id, amount, &hashlock, beneficiary))?;
    Ok(PayAndSettleBeneficiary {
        channel_id: channel_id.clone(),
        amount,
        hashlock,
        beneficiary: beneficiary.clone(),
        signature,
    })
}

#[allow(clippy::too_many_arguments)]
pub fn sign_fast_withdrawal(
    identity: &KeyPair,
    operator: &KeyPair,
    channel_id: &ChannelId,
    amount: Balance,
    fee: Balance,
    beneficiary: &AccountId,
    valid_until: Timestamp,
    nonce: Nonce,
) -> Result<FastWithdrawal, SignatureError> {
    let bytes = fast_withdrawal_bytes(channel_id, amount, fee, beneficiary, valid_until, nonce);
    Ok(FastWithdrawal {
        channel_id: channel_id.clone(),
        amount,
        fee,
        beneficiary: beneficiary.clone(),
        valid_until,
        nonce,
        client_signature: identity.sign(&bytes)?,
        operator_signature: operator.sign(&bytes)?,
    })
}

// ── Transactions ──────────────────────────────────────────────────────────────

/// Build and sign a transaction from `kp` carrying `action`.
pub fn sign_transaction(
    kp: &KeyPair,
    nonce: Nonce,
    timestamp: Timestamp,
    action: Action,
) -> Result<Transaction, HermesError> {
    let mut tx = Transaction {
        tx_id: TxId::from_bytes([0u8; 32]),
        from: kp.account_id.clone(),
        public_key: kp.public_key.clone(),
        nonce,
        timestamp,
        action,
        signature: DilithiumSignature(vec![]),
    };
    let body = tx.body_bytes()?;
    tx.tx_id = tx_id_from_body(&body);
    tx.signature = kp.sign(&body).map_err(|_| HermesError::InvalidSignature)?;
    Ok(tx)
}

/// Check that `tx` is intact and signed by the key behind `tx.from`.
pub fn verify_transaction(tx: &Transaction) -> Result<(), HermesError> {
    if account_id_from_pubkey(&tx.public_key.0) != tx.from {
        return Err(HermesError::InvalidSignature);
    }
    let body = tx.body_bytes()?;
    if tx_id_from_body(&body) != tx.tx_id {
        return Err(HermesError::InvalidSignature);
    }
    verify_signature(&tx.public_key, &body, &tx.signature)
        .map_err(|_| HermesError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::new_lock;

    fn channel() -> ChannelId {
        ChannelId::from_bytes([9u8; 32])
    }

    #[test]
    fn promise_verifies_only_for_operator() {
        let operator = KeyPair::generate();
        let stranger = KeyPair::generate();
        let (_, lock) = new_lock();
        let promise = sign_promise(&operator, &channel(), 275, 5, lock).unwrap();

        assert!(verify_message(&promise, &promise.signature, &operator.public_key).is_ok());
        assert!(verify_message(&promise, &promise.signature, &stranger.public_key).is_err());

        let mut inflated = promise.clone();
        inflated.amount = 276;
        assert!(verify_message(&inflated, &inflated.signature, &operator.public_key).is_err());
    }

    #[test]
    fn message_types_never_share_bytes() {
        let id = channel();
        let who = AccountId::from_bytes([1u8; 32]);
        let encodings = [
            stake_change_bytes(&id, 10, 0, 1),
            stake_goal_bytes(&id, 10, 1),
            beneficiary_bytes(&id, &who, 1),
            fast_withdrawal_bytes(&id, 10, 0, &who, 0, 1),
            pay_and_settle_bytes(&id, 10, &Hashlock([0u8; 32]), &who),
        ];
        for (i, a) in encodings.iter().enumerate() {
            for b in encodings.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn pay_and_settle_binds_beneficiary_and_lock() {
        let identity = KeyPair::generate();
        let payee = AccountId::from_bytes([5u8; 32]);
        let (_, lock) = new_lock();
        let auth = sign_pay_and_settle_beneficiary(&identity, &channel(), 500, lock, &payee).unwrap();
        assert!(verify_message(&auth, &auth.signature, &identity.public_key).is_ok());

        let mut redirected = auth.clone();
        redirected.beneficiary = AccountId::from_bytes([6u8; 32]);
        assert!(verify_message(&redirected, &redirected.signature, &identity.public_key).is_err());

        let mut relocked = auth.clone();
        relocked.hashlock = new_lock().1;
        assert!(verify_message(&relocked, &relocked.signature, &identity.public_key).is_err());
    }

    #[test]
    fn nonce_is_bound_into_signature() {
        let identity = KeyPair::generate();
        let change = sign_stake_change(&identity, &channel(), 10, 1, 1).unwrap();
        let mut replayed = change.clone();
        replayed.nonce = 2;
        assert!(verify_message(&change, &change.signature, &identity.public_key).is_ok());
        assert!(verify_message(&replayed, &replayed.signature, &identity.public_key).is_err());
    }

    #[test]
    fn fast_withdrawal_carries_both_signatures() {
        let identity = KeyPair::generate();
        let operator = KeyPair::generate();
        let to = AccountId::from_bytes([4u8; 32]);
        let req =
            sign_fast_withdrawal(&identity, &operator, &channel(), 50, 1, &to, 1_000, 3).unwrap();
        assert!(verify_message(&req, &req.client_signature, &identity.public_key).is_ok());
        assert!(verify_message(&req, &req.operator_signature, &operator.public_key).is_ok());
        assert!(verify_message(&req, &req.client_signature, &operator.public_key).is_err());
    }

    #[test]
    fn tampered_transaction_rejected() {
        let kp = KeyPair::generate();
        let tx = sign_transaction(
            &kp,
            0,
            1_000,
            Action::Transfer { to: AccountId::from_bytes([2u8; 32]), amount: 5 },
        )
        .unwrap();
        assert!(verify_transaction(&tx).is_ok());

        let mut tampered = tx.clone();
        tampered.action = Action::Transfer { to: AccountId::from_bytes([2u8; 32]), amount: 500 };
        assert!(matches!(verify_transaction(&tampered), Err(HermesError::InvalidSignature)));

        let mut spoofed = tx;
        spoofed.from = AccountId::from_bytes([3u8; 32]);
        assert!(matches!(verify_transaction(&spoofed), Err(HermesError::InvalidSignature)));
    }
}
