use serde::{Deserialize, Serialize};

use crate::constants::{
    EMERGENCY_GRACE_SECS, FEE_ACTIVATION_DELAY_SECS, MAX_HUB_FEE_BP, MIN_HUB_FEE, MIN_HUB_STAKE,
    PUNISHMENT_RATE_BP, PUNISHMENT_UNIT_SECS, STAKE_CAPTURE_BP, STAKE_RETURN_TIMELOCK_SECS,
};
use crate::types::{Balance, BasisPoints};

/// Economic policy applied uniformly to every hub served by an engine.
///
/// Loaded by the node from a JSON file; fields missing from the file keep
/// their protocol defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubPolicy {
    /// Share of a settlement captured into stake while a channel is below
    /// its stake goal.
    pub stake_capture_bp: BasisPoints,
    /// Highest fee a hub may schedule.
    pub fee_ceiling_bp: BasisPoints,
    pub fee_activation_delay_secs: i64,
    /// Absolute floor for a non-zero hub fee.
    pub min_fee: Balance,
    pub punishment_rate_bp: BasisPoints,
    pub punishment_unit_secs: i64,
    pub emergency_grace_secs: i64,
    pub stake_return_timelock_secs: i64,
    pub min_hub_stake: Balance,
}

impl Default for HubPolicy {
    fn default() -> Self {
        Self {
            stake_capture_bp: STAKE_CAPTURE_BP,
            fee_ceiling_bp: MAX_HUB_FEE_BP,
            fee_activation_delay_secs: FEE_ACTIVATION_DELAY_SECS,
            min_fee: MIN_HUB_FEE,
            punishment_rate_bp: PUNISHMENT_RATE_BP,
            punishment_unit_secs: PUNISHMENT_UNIT_SECS,
            emergency_grace_secs: EMERGENCY_GRACE_SECS,
            stake_return_timelock_secs: STAKE_RETURN_TIMELOCK_SECS,
            min_hub_stake: MIN_HUB_STAKE,
        }
    }
}
