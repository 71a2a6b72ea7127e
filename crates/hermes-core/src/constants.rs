// ─── Hermes Protocol Constants ───────────────────────────────────────────────
//
// Defaults for the tunable [`HubPolicy`](crate::config::HubPolicy) plus the
// fixed parameters of the fee arithmetic and the message codec.

// ── Fee arithmetic ───────────────────────────────────────────────────────────

/// Denominator for every basis-point rate (100% = 10_000 bp).
pub const BASIS_POINTS: u128 = 10_000;

/// Hard ceiling for a hub fee: 50%.
pub const MAX_HUB_FEE_BP: u16 = 5_000;

/// Delay between scheduling a new hub fee and it taking effect (2 hours).
pub const FEE_ACTIVATION_DELAY_SECS: i64 = 2 * 3_600;

/// Smallest non-zero hub fee charged on a non-zero settlement, so dust
/// settlements never travel fee-free through a fee-charging hub.
pub const MIN_HUB_FEE: u128 = 1;

// ── Stake ────────────────────────────────────────────────────────────────────

/// Share of a settlement captured into an under-collateralised channel's
/// stake until its stake goal is reached: 10%.
pub const STAKE_CAPTURE_BP: u16 = 1_000;

/// Minimum own stake a hub must lock at registration.
pub const MIN_HUB_STAKE: u128 = 1_000;

// ── Punishment ───────────────────────────────────────────────────────────────

/// Penalty accrued per elapsed punishment unit, as a share of total channel
/// stake: 4%.
pub const PUNISHMENT_RATE_BP: u16 = 400;

/// Length of one punishment accrual unit (1 hour).
pub const PUNISHMENT_UNIT_SECS: i64 = 3_600;

/// Window after entering punishment in which resolving the emergency
/// accrues no penalty.
pub const EMERGENCY_GRACE_SECS: i64 = 3_600;

// ── Closing ──────────────────────────────────────────────────────────────────

/// Time between closing a hub and its operator being able to take the stake
/// back (3 days).
pub const STAKE_RETURN_TIMELOCK_SECS: i64 = 3 * 24 * 3_600;

// ── Codec domain tags ────────────────────────────────────────────────────────

pub const PROMISE_DOMAIN: &[u8] = b"hermes.promise.v1";
pub const STAKE_CHANGE_DOMAIN: &[u8] = b"hermes.stake-change.v1";
pub const BENEFICIARY_DOMAIN: &[u8] = b"hermes.beneficiary.v1";
pub const STAKE_GOAL_DOMAIN: &[u8] = b"hermes.stake-goal.v1";
pub const FAST_WITHDRAWAL_DOMAIN: &[u8] = b"hermes.fast-withdrawal.v1";
pub const PAY_AND_SETTLE_DOMAIN: &[u8] = b"hermes.pay-and-settle.v1";

/// Address derivation domains.
pub const CHANNEL_ADDRESS_DOMAIN: &[u8] = b"hermes.channel";
pub const WITHDRAWAL_CHANNEL_DOMAIN: &[u8] = b"hermes.withdrawal-channel";
pub const HUB_ADDRESS_DOMAIN: &[u8] = b"hermes.hub";
