use serde::{Deserialize, Serialize};

use crate::constants::BASIS_POINTS;
use crate::error::HermesError;
use crate::types::{Balance, BasisPoints, Timestamp};

/// One entry of a hub's fee schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubFee {
    pub value: BasisPoints,
    pub valid_from: Timestamp,
}

/// Two-phase fee schedule. `last` takes over from `previous` once `now`
/// reaches `last.valid_from`; at most one change is pending at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub previous: HubFee,
    pub last: HubFee,
}

impl FeeSchedule {
    /// Schedule whose initial fee is active from `now`.
    pub fn new(value: BasisPoints, now: Timestamp) -> Self {
        let fee = HubFee { value, valid_from: now };
        Self { previous: fee, last: fee }
    }

    /// Fee rate in force at `now`.
    pub fn resolve(&self, now: Timestamp) -> BasisPoints {
        if now >= self.last.valid_from {
            self.last.value
        } else {
            self.previous.value
        }
    }

    /// True while a scheduled change has not taken effect yet.
    pub fn is_pending(&self, now: Timestamp) -> bool {
        now < self.last.valid_from
    }

    /// Schedule `value` to take effect at `now + delay`.
    pub fn schedule(
        &mut self,
        value: BasisPoints,
        now: Timestamp,
        delay: i64,
        ceiling: BasisPoints,
    ) -> Result<(), HermesError> {
        if value > ceiling {
            return Err(HermesError::FeeTooHigh { max: ceiling, got: value });
        }
        if self.is_pending(now) {
            return Err(HermesError::FeeChangeNotFinalized {
                valid_from: self.last.valid_from,
            });
        }
        self.previous = self.last;
        self.last = HubFee { value, valid_from: now + delay };
        Ok(())
    }

    /// Hub fee owed on `amount` at `now`.
    pub fn calculate(&self, amount: Balance, now: Timestamp, min_fee: Balance) -> Balance {
        fee_for(amount, self.resolve(now), min_fee)
    }
}

/// Basis-point fee rounded half up, floored at `min_fee` for any non-zero
/// rate and amount, and never more than `amount` itself.
pub fn fee_for(amount: Balance, rate: BasisPoints, min_fee: Balance) -> Balance {
    if rate == 0 || amount == 0 {
        return 0;
    }
    let rounded = (amount * rate as u128 + BASIS_POINTS / 2) / BASIS_POINTS;
    rounded.max(min_fee).min(amount)
}
