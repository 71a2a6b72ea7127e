use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fee::FeeSchedule;
use crate::types::{AccountId, Balance, DilithiumPublicKey, HubId, Timestamp};

// ── HubStatus ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HubStatus {
    Active,
    Paused,
    Punishment,
    Closed,
}

impl fmt::Display for HubStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HubStatus::Active => "active",
            HubStatus::Paused => "paused",
            HubStatus::Punishment => "in punishment",
            HubStatus::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Penalty accrued by a hub for failing to keep its channels funded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Punishment {
    pub amount: Balance,
    /// When the current punishment period began; `None` outside punishment.
    pub activated_at: Option<Timestamp>,
}

// ── Hub ───────────────────────────────────────────────────────────────────────

/// A registered settlement hub.
///
/// The hub's tokens live in the ledger account `hub_id`. That balance is
/// partitioned into the hub's own `stake`, the channel balances
/// (`locked_funds`), the accrued `punishment` and whatever is left over,
/// which is the available balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hub {
    pub hub_id: HubId,
    /// Signs promises and parameter changes.
    pub operator: AccountId,
    pub operator_key: DilithiumPublicKey,
    /// Withdraws funds.
    pub owner: AccountId,
    pub status: HubStatus,
    pub stake: Balance,
    pub min_stake: Balance,
    pub max_stake: Balance,
    pub fees: FeeSchedule,
    pub punishment: Punishment,
    /// Sum of all channel stakes.
    pub total_stake: Balance,
    /// Sum of all channel balances.
    pub locked_funds: Balance,
    pub stake_unlock_at: Option<Timestamp>,
    pub registered_at: Timestamp,
}

impl Hub {
    pub fn is_operator(&self, actor: &AccountId) -> bool {
        self.operator == *actor
    }

    pub fn is_owner(&self, actor: &AccountId) -> bool {
        self.owner == *actor
    }

    /// Only an active hub accepts new channels.
    pub fn accepts_new_channels(&self) -> bool {
        self.status == HubStatus::Active
    }

    /// Funds the hub may not spend on settlements or withdrawals.
    pub fn reserved(&self) -> Balance {
        self.stake + self.locked_funds + self.punishment.amount
    }

    /// Free funds given the hub's current ledger balance.
    pub fn available_balance(&self, ledger_balance: Balance) -> Balance {
        ledger_balance.saturating_sub(self.reserved())
    }

    /// Ledger balance the hub must hold for every channel to be fully
    /// funded up to its stake.
    pub fn minimal_expected_balance(&self) -> Balance {
        self.stake + self.total_stake + self.punishment.amount
    }

    /// Move to punishment, starting the accrual clock. Returns true if the
    /// status changed.
    pub fn enter_punishment(&mut self, now: Timestamp) -> bool {
        match self.status {
            HubStatus::Active | HubStatus::Paused => {
                self.status = HubStatus::Punishment;
                self.punishment.activated_at = Some(now);
                true
            }
            HubStatus::Punishment | HubStatus::Closed => false,
        }
    }
}
