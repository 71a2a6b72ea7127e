//! Off-ledger signed messages redeemed or applied through transactions.
//!
//! Canonical signing bytes for each type are produced by `hermes-crypto`.

use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Balance, ChannelId, DilithiumSignature, Hashlock, Nonce, Timestamp};

/// Operator-signed claim that `amount` (cumulative) is owed on a channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promise {
    pub channel_id: ChannelId,
    pub amount: Balance,
    /// Transactor fee paid to whoever submits the settlement.
    pub fee: Balance,
    pub hashlock: Hashlock,
    pub signature: DilithiumSignature,
}

/// Client-signed request to take stake back out of a channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeChange {
    pub channel_id: ChannelId,
    pub amount: Balance,
    pub fee: Balance,
    pub nonce: Nonce,
    pub signature: DilithiumSignature,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryChange {
    pub channel_id: ChannelId,
    pub beneficiary: AccountId,
    pub nonce: Nonce,
    pub signature: DilithiumSignature,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeGoalChange {
    pub channel_id: ChannelId,
    pub stake_goal: Balance,
    pub nonce: Nonce,
    pub signature: DilithiumSignature,
}

/// Identity-signed instruction naming who receives a pay-and-settle
/// redemption of `amount` under `hashlock` on its withdrawal channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayAndSettleBeneficiary {
    pub channel_id: ChannelId,
    pub amount: Balance,
    pub hashlock: Hashlock,
    pub beneficiary: AccountId,
    pub signature: DilithiumSignature,
}

/// Stake withdrawal co-signed by the client and the hub operator. Bypasses
/// the minimum-stake floor and pays an arbitrary beneficiary until
/// `valid_until`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastWithdrawal {
    pub channel_id: ChannelId,
    pub amount: Balance,
    pub fee: Balance,
    pub beneficiary: AccountId,
    pub valid_until: Timestamp,
    pub nonce: Nonce,
    pub client_signature: DilithiumSignature,
    pub operator_signature: DilithiumSignature,
}
