use serde::{Deserialize, Serialize};

use crate::error::HermesError;
use crate::types::{AccountId, Balance, ChannelId, DilithiumPublicKey, HubId, Nonce, Timestamp};

/// Consumer channels carry stake and are paid through the regular settle
/// paths. Each identity also has a stakeless withdrawal channel per hub,
/// redeemed only by pay-and-settle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKind {
    Consumer,
    Withdrawal,
}

/// Per-(identity, hub) settlement channel.
///
/// `settled` only ever grows. `balance` is the share of the hub's funds
/// earmarked for this channel and never exceeds `stake`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub channel_id: ChannelId,
    pub kind: ChannelKind,
    pub hub_id: HubId,
    pub identity: AccountId,
    /// Verifies stake, beneficiary and stake-goal requests.
    pub identity_key: DilithiumPublicKey,
    pub beneficiary: AccountId,
    pub stake: Balance,
    pub balance: Balance,
    pub settled: Balance,
    /// Cumulative hub fees charged on this channel's settlements.
    pub fees_paid: Balance,
    pub last_used_nonce: Nonce,
    pub stake_goal: Balance,
    pub created_at: Timestamp,
}

impl Channel {
    pub fn new(
        channel_id: ChannelId,
        hub_id: HubId,
        identity: AccountId,
        identity_key: DilithiumPublicKey,
        beneficiary: AccountId,
        stake_goal: Balance,
        now: Timestamp,
    ) -> Self {
        Self {
            channel_id,
            kind: ChannelKind::Consumer,
            hub_id,
            identity,
            identity_key,
            beneficiary,
            stake: 0,
            balance: 0,
            settled: 0,
            fees_paid: 0,
            last_used_nonce: 0,
            stake_goal,
            created_at: now,
        }
    }

    /// The withdrawal channel of `identity` on `hub_id`. It never holds stake.
    pub fn withdrawal(
        channel_id: ChannelId,
        hub_id: HubId,
        identity: AccountId,
        identity_key: DilithiumPublicKey,
        beneficiary: AccountId,
        now: Timestamp,
    ) -> Self {
        Self {
            kind: ChannelKind::Withdrawal,
            ..Self::new(channel_id, hub_id, identity, identity_key, beneficiary, 0, now)
        }
    }

    pub fn is_withdrawal(&self) -> bool {
        self.kind == ChannelKind::Withdrawal
    }

    /// A channel is open once it carries stake or has ever been settled.
    pub fn is_opened(&self) -> bool {
        self.stake > 0 || self.settled > 0
    }

    /// Stake still missing before the stake goal is met.
    pub fn stake_shortfall(&self) -> Balance {
        self.stake_goal.saturating_sub(self.stake)
    }

    /// Balance needed to bring the channel back up to its stake.
    pub fn balance_shortfall(&self) -> Balance {
        self.stake.saturating_sub(self.balance)
    }

    /// Advance `settled` to `new_total`, returning the increment.
    pub fn apply_settlement(
        &mut self,
        new_total: Balance,
        hub_fee: Balance,
    ) -> Result<Balance, HermesError> {
        if new_total <= self.settled {
            return Err(HermesError::NonIncreasingAmount {
                settled: self.settled,
                requested: new_total,
            });
        }
        let increment = new_total - self.settled;
        self.settled = new_total;
        self.fees_paid += hub_fee;
        Ok(increment)
    }

    /// Consume a request nonce. It must be strictly above the last one used.
    pub fn consume_nonce(&mut self, nonce: Nonce) -> Result<(), HermesError> {
        if nonce == self.last_used_nonce {
            return Err(HermesError::NonceReused(nonce));
        }
        if nonce < self.last_used_nonce {
            return Err(HermesError::StaleNonce { last: self.last_used_nonce, got: nonce });
        }
        self.last_used_nonce = nonce;
        Ok(())
    }

    /// Add stake backed by the same amount of channel balance.
    pub fn deposit(&mut self, amount: Balance) {
        self.stake += amount;
        self.balance += amount;
    }

    /// Take up to `amount` out of the channel balance; returns what was taken.
    pub fn draw(&mut self, amount: Balance) -> Balance {
        let drawn = amount.min(self.balance);
        self.balance -= drawn;
        drawn
    }

    /// Remove `amount` of stake. `min_stake` enforces the floor: the result
    /// must be zero or at least `min_stake`. Returns the channel balance
    /// released so that `balance <= stake` still holds.
    pub fn withdraw_stake(
        &mut self,
        amount: Balance,
        min_stake: Option<Balance>,
    ) -> Result<Balance, HermesError> {
        if amount == 0 {
            return Err(HermesError::ZeroAmount);
        }
        if amount > self.stake {
            return Err(HermesError::AmountExceedsStake { stake: self.stake, requested: amount });
        }
        let resulting = self.stake - amount;
        if let Some(min) = min_stake {
            if resulting > 0 && resulting < min {
                return Err(HermesError::InsufficientStake { min, resulting });
            }
        }
        self.stake = resulting;
        let released = self.balance.saturating_sub(resulting);
        self.balance -= released;
        Ok(released)
    }
}
