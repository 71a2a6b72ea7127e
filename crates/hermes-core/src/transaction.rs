use serde::{Deserialize, Serialize};

use crate::error::HermesError;
use crate::message::{
    BeneficiaryChange, FastWithdrawal, PayAndSettleBeneficiary, Promise, StakeChange,
    StakeGoalChange,
};
use crate::types::{
    AccountId, Balance, BasisPoints, ChannelId, DilithiumPublicKey, DilithiumSignature, HubId,
    Nonce, Timestamp, TxId,
};

// ── Action ────────────────────────────────────────────────────────────────────

/// Every state-changing operation submitted to the settlement engine.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Action {
    // ── Ledger ───────────────────────────────────────────────────────────────

    /// Move tokens between ledger accounts.
    Transfer {
        to: AccountId,
        amount: Balance,
    },

    // ── Registration ─────────────────────────────────────────────────────────

    /// Register a hub run by `operator_key`, paying its stake from the
    /// submitter's balance.
    RegisterHub {
        operator_key: DilithiumPublicKey,
        owner: AccountId,
        stake: Balance,
        fee: BasisPoints,
        min_stake: Balance,
        max_stake: Balance,
    },

    /// Create the channel for `identity_key` against `hub_id`, seeding it with
    /// `stake` paid by the submitter. Zero stake registers the channel
    /// without opening it.
    OpenChannel {
        hub_id: HubId,
        identity_key: DilithiumPublicKey,
        beneficiary: AccountId,
        stake: Balance,
    },

    // ── Settlement ───────────────────────────────────────────────────────────

    /// Redeem a promise, paying the channel's beneficiary.
    SettlePromise {
        promise: Promise,
        preimage: Vec<u8>,
    },

    /// Change the beneficiary, then redeem to it.
    SettleWithBeneficiary {
        promise: Promise,
        preimage: Vec<u8>,
        change: BeneficiaryChange,
    },

    /// Raise the stake goal, then redeem.
    SettleWithGoalIncrease {
        promise: Promise,
        preimage: Vec<u8>,
        change: StakeGoalChange,
    },

    /// Redeem a promise entirely into channel stake.
    SettleIntoStake {
        promise: Promise,
        preimage: Vec<u8>,
    },

    /// Redeem a promise with the payout converted by the exchange adapter.
    SettleIntoCurrency {
        promise: Promise,
        preimage: Vec<u8>,
    },

    /// Redeem a promise issued on the identity's withdrawal channel, fee
    /// free, to the beneficiary the identity signed for.
    PayAndSettle {
        hub_id: HubId,
        identity_key: DilithiumPublicKey,
        promise: Promise,
        preimage: Vec<u8>,
        beneficiary: PayAndSettleBeneficiary,
    },

    // ── Stake ────────────────────────────────────────────────────────────────

    /// Top up a channel's stake from the submitter's balance.
    IncreaseStake {
        channel_id: ChannelId,
        amount: Balance,
    },

    DecreaseStake {
        request: StakeChange,
    },

    FastWithdraw {
        request: FastWithdrawal,
    },

    SetBeneficiary {
        change: BeneficiaryChange,
    },

    SetStakeGoal {
        change: StakeGoalChange,
    },

    // ── Hub parameters ───────────────────────────────────────────────────────

    SetFee {
        hub_id: HubId,
        fee: BasisPoints,
    },

    SetStakeThresholds {
        hub_id: HubId,
        min_stake: Balance,
        max_stake: Balance,
    },

    // ── Hub lifecycle ────────────────────────────────────────────────────────

    RebalanceChannel {
        channel_id: ChannelId,
    },

    ResolveEmergency {
        hub_id: HubId,
    },

    PauseHub {
        hub_id: HubId,
    },

    ResumeHub {
        hub_id: HubId,
    },

    CloseHub {
        hub_id: HubId,
    },

    GetStakeBack {
        hub_id: HubId,
        beneficiary: AccountId,
    },

    /// Owner withdrawal of the hub's available balance.
    Withdraw {
        hub_id: HubId,
        beneficiary: AccountId,
        amount: Balance,
    },
}

impl Action {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Transfer { .. } => "transfer",
            Action::RegisterHub { .. } => "register_hub",
            Action::OpenChannel { .. } => "open_channel",
            Action::SettlePromise { .. } => "settle_promise",
            Action::SettleWithBeneficiary { .. } => "settle_with_beneficiary",
            Action::SettleWithGoalIncrease { .. } => "settle_with_goal_increase",
            Action::SettleIntoStake { .. } => "settle_into_stake",
            Action::SettleIntoCurrency { .. } => "settle_into_currency",
            Action::PayAndSettle { .. } => "pay_and_settle",
            Action::IncreaseStake { .. } => "increase_stake",
            Action::DecreaseStake { .. } => "decrease_stake",
            Action::FastWithdraw { .. } => "fast_withdraw",
            Action::SetBeneficiary { .. } => "set_beneficiary",
            Action::SetStakeGoal { .. } => "set_stake_goal",
            Action::SetFee { .. } => "set_fee",
            Action::SetStakeThresholds { .. } => "set_stake_thresholds",
            Action::RebalanceChannel { .. } => "rebalance_channel",
            Action::ResolveEmergency { .. } => "resolve_emergency",
            Action::PauseHub { .. } => "pause_hub",
            Action::ResumeHub { .. } => "resume_hub",
            Action::CloseHub { .. } => "close_hub",
            Action::GetStakeBack { .. } => "get_stake_back",
            Action::Withdraw { .. } => "withdraw",
        }
    }
}

// ── Transaction ───────────────────────────────────────────────────────────────

/// A signed request from `from` to apply one action.
///
/// `tx_id` is BLAKE3 of the canonical bincode body, which covers every field
/// except `tx_id` and `signature`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_id: TxId,

    /// The account authorizing this transaction; the actor of its action.
    pub from: AccountId,

    /// Key whose BLAKE3 hash is `from`.
    pub public_key: DilithiumPublicKey,

    /// Must equal the sender's next account nonce.
    pub nonce: Nonce,

    /// Client creation time. Informational; the engine uses its own clock.
    pub timestamp: Timestamp,

    pub action: Action,

    pub signature: DilithiumSignature,
}

/// The body bytes that are hashed to produce tx_id and covered by the
/// signature.
#[derive(Serialize)]
pub struct TransactionBody<'a> {
    pub from: &'a AccountId,
    pub public_key: &'a DilithiumPublicKey,
    pub nonce: Nonce,
    pub timestamp: Timestamp,
    pub action: &'a Action,
}

impl Transaction {
    pub fn body(&self) -> TransactionBody<'_> {
        TransactionBody {
            from: &self.from,
            public_key: &self.public_key,
            nonce: self.nonce,
            timestamp: self.timestamp,
            action: &self.action,
        }
    }

    /// Serialize the body to canonical bytes (bincode).
    pub fn body_bytes(&self) -> Result<Vec<u8>, HermesError> {
        bincode::serialize(&self.body()).map_err(|e| HermesError::Serialization(e.to_string()))
    }
}
