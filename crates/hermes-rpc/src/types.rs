use serde::{Deserialize, Serialize};

use hermes_core::account::Account;
use hermes_core::channel::{Channel, ChannelKind};
use hermes_core::config::HubPolicy;
use hermes_core::hub::Hub;
use hermes_core::types::{Balance, BasisPoints, Timestamp};

// u128 amounts travel as decimal strings; JSON numbers lose precision past 2^53.

/// Account summary returned by `hermes_getAccount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcAccount {
    pub account_id: String,
    pub balance: String,
    pub nonce: u64,
}

impl From<&Account> for RpcAccount {
    fn from(a: &Account) -> Self {
        Self { account_id: a.account_id.to_b58(), balance: a.balance.to_string(), nonce: a.nonce }
    }
}

/// Hub snapshot returned by `hermes_getHub`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcHub {
    pub hub_id: String,
    pub operator: String,
    pub owner: String,
    /// "active", "paused", "in punishment" or "closed".
    pub status: String,
    /// Raw ledger balance of the hub account.
    pub ledger_balance: String,
    pub available_balance: String,
    pub minimal_expected_balance: String,
    pub stake: String,
    pub min_stake: String,
    pub max_stake: String,
    pub total_stake: String,
    pub locked_funds: String,
    pub punishment: String,
    pub punishment_since: Option<Timestamp>,
    /// Fee in force at the node's clock.
    pub current_fee_bp: BasisPoints,
    /// Most recently scheduled fee and when it takes effect.
    pub scheduled_fee_bp: BasisPoints,
    pub scheduled_fee_from: Timestamp,
    pub stake_unlock_at: Option<Timestamp>,
    pub registered_at: Timestamp,
}

impl RpcHub {
    pub fn new(hub: &Hub, ledger_balance: Balance, now: Timestamp) -> Self {
        Self {
            hub_id: hub.hub_id.to_b58(),
            operator: hub.operator.to_b58(),
            owner: hub.owner.to_b58(),
            status: hub.status.to_string(),
            ledger_balance: ledger_balance.to_string(),
            available_balance: hub.available_balance(ledger_balance).to_string(),
            minimal_expected_balance: hub.minimal_expected_balance().to_string(),
            stake: hub.stake.to_string(),
            min_stake: hub.min_stake.to_string(),
            max_stake: hub.max_stake.to_string(),
            total_stake: hub.total_stake.to_string(),
            locked_funds: hub.locked_funds.to_string(),
            punishment: hub.punishment.amount.to_string(),
            punishment_since: hub.punishment.activated_at,
            current_fee_bp: hub.fees.resolve(now),
            scheduled_fee_bp: hub.fees.last.value,
            scheduled_fee_from: hub.fees.last.valid_from,
            stake_unlock_at: hub.stake_unlock_at,
            registered_at: hub.registered_at,
        }
    }
}

/// Channel snapshot returned by `hermes_getChannel`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcChannel {
    pub channel_id: String,
    /// `consumer` or `withdrawal`.
    pub kind: String,
    pub hub_id: String,
    pub identity: String,
    pub beneficiary: String,
    pub stake: String,
    pub balance: String,
    pub settled: String,
    pub fees_paid: String,
    pub stake_goal: String,
    pub last_used_nonce: u64,
    pub created_at: Timestamp,
}

impl From<&Channel> for RpcChannel {
    fn from(c: &Channel) -> Self {
        Self {
            channel_id: c.channel_id.to_hex(),
            kind: match c.kind {
                ChannelKind::Consumer => "consumer",
                ChannelKind::Withdrawal => "withdrawal",
            }
            .into(),
            hub_id: c.hub_id.to_b58(),
            identity: c.identity.to_b58(),
            beneficiary: c.beneficiary.to_b58(),
            stake: c.stake.to_string(),
            balance: c.balance.to_string(),
            settled: c.settled.to_string(),
            fees_paid: c.fees_paid.to_string(),
            stake_goal: c.stake_goal.to_string(),
            last_used_nonce: c.last_used_nonce,
            created_at: c.created_at,
        }
    }
}

/// `HubPolicy` with balances as strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcPolicy {
    pub stake_capture_bp: BasisPoints,
    pub fee_ceiling_bp: BasisPoints,
    pub fee_activation_delay_secs: i64,
    pub min_fee: String,
    pub punishment_rate_bp: BasisPoints,
    pub punishment_unit_secs: i64,
    pub emergency_grace_secs: i64,
    pub stake_return_timelock_secs: i64,
    pub min_hub_stake: String,
}

impl From<&HubPolicy> for RpcPolicy {
    fn from(p: &HubPolicy) -> Self {
        Self {
            stake_capture_bp: p.stake_capture_bp,
            fee_ceiling_bp: p.fee_ceiling_bp,
            fee_activation_delay_secs: p.fee_activation_delay_secs,
            min_fee: p.min_fee.to_string(),
            punishment_rate_bp: p.punishment_rate_bp,
            punishment_unit_secs: p.punishment_unit_secs,
            emergency_grace_secs: p.emergency_grace_secs,
            stake_return_timelock_secs: p.stake_return_timelock_secs,
            min_hub_stake: p.min_hub_stake.to_string(),
        }
    }
}
