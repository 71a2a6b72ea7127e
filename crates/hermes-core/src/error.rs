use thiserror::Error;

use crate::hub::HubStatus;
use crate::types::{Balance, Nonce, Timestamp};

#[derive(Debug, Error)]
pub enum HermesError {
    // ── Transaction errors ───────────────────────────────────────────────────
    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: Balance, have: Balance },

    #[error("invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: Nonce, got: Nonce },

    #[error("invalid signature")]
    InvalidSignature,

    #[error("unknown account: {0}")]
    UnknownAccount(String),

    #[error("self-transfer not allowed")]
    SelfTransfer,

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("not authorized: {0} role required")]
    NotAuthorized(&'static str),

    // ── Request nonce errors ─────────────────────────────────────────────────
    #[error("nonce {0} already used")]
    NonceReused(Nonce),

    #[error("stale nonce: last used {last}, got {got}")]
    StaleNonce { last: Nonce, got: Nonce },

    #[error("request expired at {valid_until}")]
    RequestExpired { valid_until: Timestamp },

    // ── Settlement errors ────────────────────────────────────────────────────
    #[error("invalid promise: {0}")]
    InvalidPromise(String),

    #[error("settled amount must increase: settled {settled}, requested {requested}")]
    NonIncreasingAmount { settled: Balance, requested: Balance },

    #[error("nothing to settle")]
    NothingToSettle,

    #[error("hub cannot cover {need}: only {available} free")]
    InsufficientHubFunds { need: Balance, available: Balance },

    #[error("exchange adapter failed: {0}")]
    ExchangeFailed(String),

    // ── Stake errors ─────────────────────────────────────────────────────────
    #[error("stake {resulting} below minimum {min}")]
    InsufficientStake { min: Balance, resulting: Balance },

    #[error("stake {resulting} above maximum {max}")]
    StakeAboveMaximum { max: Balance, resulting: Balance },

    #[error("amount {requested} exceeds channel stake {stake}")]
    AmountExceedsStake { stake: Balance, requested: Balance },

    #[error("invalid stake thresholds: min {min} > max {max}")]
    InvalidStakeThresholds { min: Balance, max: Balance },

    #[error("fee {fee} exceeds amount {amount}")]
    FeeExceedsAmount { fee: Balance, amount: Balance },

    // ── Fee schedule errors ──────────────────────────────────────────────────
    #[error("previous fee change not active until {valid_from}")]
    FeeChangeNotFinalized { valid_from: Timestamp },

    #[error("fee {got} bp above ceiling {max} bp")]
    FeeTooHigh { max: u16, got: u16 },

    // ── Hub lifecycle errors ─────────────────────────────────────────────────
    #[error("hub is {0}")]
    HubNotActive(HubStatus),

    #[error("hub is not in punishment")]
    HubNotInPunishment,

    #[error("hub is not closed")]
    HubNotClosed,

    #[error("timelock not elapsed (unlocks at {unlock_at})")]
    TimelockNotElapsed { unlock_at: Timestamp },

    #[error("channel balance already covers its stake")]
    NothingToRebalance,

    #[error("nothing to withdraw")]
    NothingToWithdraw,

    #[error("unknown hub: {0}")]
    UnknownHub(String),

    #[error("hub already registered: {0}")]
    HubAlreadyExists(String),

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("{0} is a withdrawal channel")]
    WithdrawalChannel(String),

    #[error("channel already exists: {0}")]
    ChannelAlreadyExists(String),

    // ── Genesis errors ───────────────────────────────────────────────────────
    #[error("genesis already applied")]
    GenesisAlreadyApplied,

    #[error("invalid genesis: {0}")]
    InvalidGenesis(String),

    // ── Storage errors ───────────────────────────────────────────────────────
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
