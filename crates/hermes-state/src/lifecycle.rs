//! Hub lifecycle: registration, rebalancing, punishment, closing and the
//! owner's withdrawals.
//!
//! ```text
//! Active ⇄ Paused
//!   │        │
//!   ├── Punishment ──(resolve_emergency)──► Active
//!   │
//!   └──(close)──► Closed ──(timelock)──► stake returned
//! ```

use hermes_core::channel::Channel;
use hermes_core::constants::BASIS_POINTS;
use hermes_core::error::HermesError;
use hermes_core::fee::FeeSchedule;
use hermes_core::hub::{Hub, HubStatus, Punishment};
use hermes_core::types::{
    AccountId, Balance, BasisPoints, ChannelId, DilithiumPublicKey, HubId, Timestamp,
};
use hermes_crypto::hash::account_id_from_pubkey;
use tracing::{info, warn};

use crate::engine::{available_of, require_operator, require_owner, Context};
use crate::ledger;
use crate::staged::Staged;
use crate::store::{ChannelAddressResolver, Store, TokenLedger};

/// Terms a hub registers with.
#[derive(Clone, Debug)]
pub struct HubTerms<'a> {
    pub operator_key: &'a DilithiumPublicKey,
    pub owner: &'a AccountId,
    pub stake: Balance,
    pub fee: BasisPoints,
    pub min_stake: Balance,
    pub max_stake: Balance,
}

pub fn register_hub<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    resolver: &dyn ChannelAddressResolver,
    terms: HubTerms<'_>,
) -> Result<Hub, HermesError> {
    if terms.stake < ctx.policy.min_hub_stake {
        return Err(HermesError::InsufficientStake {
            min: ctx.policy.min_hub_stake,
            resulting: terms.stake,
        });
    }
    if terms.fee > ctx.policy.fee_ceiling_bp {
        return Err(HermesError::FeeTooHigh { max: ctx.policy.fee_ceiling_bp, got: terms.fee });
    }
    if terms.min_stake > terms.max_stake {
        return Err(HermesError::InvalidStakeThresholds {
            min: terms.min_stake,
            max: terms.max_stake,
        });
    }

    let operator = account_id_from_pubkey(&terms.operator_key.0);
    let hub_id = resolver.hub_id(&operator);
    if view.find_hub(&hub_id)?.is_some() {
        return Err(HermesError::HubAlreadyExists(hub_id.to_string()));
    }
    view.transfer(ctx.actor, &hub_id, terms.stake)?;

    let hub = Hub {
        hub_id: hub_id.clone(),
        operator,
        operator_key: terms.operator_key.clone(),
        owner: terms.owner.clone(),
        status: HubStatus::Active,
        stake: terms.stake,
        min_stake: terms.min_stake,
        max_stake: terms.max_stake,
        fees: FeeSchedule::new(terms.fee, ctx.now),
        punishment: Punishment::default(),
        total_stake: 0,
        locked_funds: 0,
        stake_unlock_at: None,
        registered_at: ctx.now,
    };
    info!(hub = %hub_id, operator = %hub.operator, stake = terms.stake, "registered hub");
    view.put_hub(hub.clone());
    Ok(hub)
}

fn punish<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    hub_id: &HubId,
    now: Timestamp,
) -> Result<(), HermesError> {
    let mut hub = view.hub(hub_id)?;
    if hub.enter_punishment(now) {
        warn!(hub = %hub_id, "hub in punishment");
    }
    view.put_hub(hub);
    Ok(())
}

/// Refill a channel's balance toward its stake from the hub's free funds.
/// A partial refill puts the hub into punishment.
pub fn rebalance<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    channel_id: &ChannelId,
) -> Result<Channel, HermesError> {
    let channel = view.channel(channel_id)?;
    let hub = view.hub(&channel.hub_id)?;
    require_operator(&hub, ctx.actor)?;
    if hub.status == HubStatus::Closed {
        return Err(HermesError::HubNotActive(hub.status));
    }
    let shortfall = channel.balance_shortfall();
    if shortfall == 0 {
        return Err(HermesError::NothingToRebalance);
    }

    let topup = shortfall.min(available_of(view, &hub)?);
    let channel = if topup > 0 { ledger::refill(view, channel_id, topup)? } else { channel };
    if topup < shortfall {
        punish(view, &hub.hub_id, ctx.now)?;
    }
    info!(channel = %channel_id, topup, shortfall, "rebalanced channel");
    Ok(channel)
}

/// Leave punishment: accrue the late penalty if the grace window has
/// passed, then top the hub up to its minimal expected balance from the
/// actor's account.
pub fn resolve_emergency<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    hub_id: &HubId,
) -> Result<Hub, HermesError> {
    let mut hub = view.hub(hub_id)?;
    if !hub.is_operator(ctx.actor) && !hub.is_owner(ctx.actor) {
        return Err(HermesError::NotAuthorized("operator or owner"));
    }
    if hub.status != HubStatus::Punishment {
        return Err(HermesError::HubNotInPunishment);
    }

    let activated_at = hub.punishment.activated_at.unwrap_or(ctx.now);
    let elapsed = (ctx.now - activated_at).max(0);
    if elapsed >= ctx.policy.emergency_grace_secs && ctx.policy.punishment_unit_secs > 0 {
        let units = (elapsed / ctx.policy.punishment_unit_secs) as u128;
        let penalty =
            hub.total_stake * ctx.policy.punishment_rate_bp as u128 * units / BASIS_POINTS;
        hub.punishment.amount += penalty;
        warn!(hub = %hub_id, elapsed, penalty, "late emergency resolution penalised");
    }

    let ledger_balance = view.balance_of(hub_id)?;
    let topup = hub.minimal_expected_balance().saturating_sub(ledger_balance);
    view.transfer(ctx.actor, hub_id, topup)?;

    hub.status = HubStatus::Active;
    hub.punishment.activated_at = None;
    info!(hub = %hub_id, topup, punishment = hub.punishment.amount, "resolved emergency");
    view.put_hub(hub.clone());
    Ok(hub)
}

pub fn pause<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    hub_id: &HubId,
) -> Result<Hub, HermesError> {
    transition(view, ctx, hub_id, HubStatus::Active, HubStatus::Paused)
}

pub fn resume<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    hub_id: &HubId,
) -> Result<Hub, HermesError> {
    transition(view, ctx, hub_id, HubStatus::Paused, HubStatus::Active)
}

fn transition<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    hub_id: &HubId,
    from: HubStatus,
    to: HubStatus,
) -> Result<Hub, HermesError> {
    let mut hub = view.hub(hub_id)?;
    require_operator(&hub, ctx.actor)?;
    if hub.status != from {
        return Err(HermesError::HubNotActive(hub.status));
    }
    hub.status = to;
    info!(hub = %hub_id, status = %to, "hub status changed");
    view.put_hub(hub.clone());
    Ok(hub)
}

/// Close the hub and start the stake-return timelock. Not allowed while in
/// punishment.
pub fn close<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    hub_id: &HubId,
) -> Result<Hub, HermesError> {
    let mut hub = view.hub(hub_id)?;
    require_operator(&hub, ctx.actor)?;
    match hub.status {
        HubStatus::Active | HubStatus::Paused => {}
        other => return Err(HermesError::HubNotActive(other)),
    }
    let unlock_at = ctx.now + ctx.policy.stake_return_timelock_secs;
    hub.status = HubStatus::Closed;
    hub.stake_unlock_at = Some(unlock_at);
    info!(hub = %hub_id, unlock_at, "closed hub");
    view.put_hub(hub.clone());
    Ok(hub)
}

/// After the timelock, return everything except the punishment and the
/// funds still earmarked for channels.
pub fn get_stake_back<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    hub_id: &HubId,
    beneficiary: &AccountId,
) -> Result<Hub, HermesError> {
    let mut hub = view.hub(hub_id)?;
    if !hub.is_operator(ctx.actor) && !hub.is_owner(ctx.actor) {
        return Err(HermesError::NotAuthorized("operator or owner"));
    }
    if hub.status != HubStatus::Closed {
        return Err(HermesError::HubNotClosed);
    }
    let unlock_at = hub.stake_unlock_at.unwrap_or(ctx.now);
    if ctx.now < unlock_at {
        return Err(HermesError::TimelockNotElapsed { unlock_at });
    }

    let amount = view
        .balance_of(hub_id)?
        .saturating_sub(hub.punishment.amount)
        .saturating_sub(hub.locked_funds);
    if amount == 0 {
        return Err(HermesError::NothingToWithdraw);
    }
    view.transfer(hub_id, beneficiary, amount)?;
    hub.stake = 0;
    info!(hub = %hub_id, beneficiary = %beneficiary, amount, "returned hub stake");
    view.put_hub(hub.clone());
    Ok(hub)
}

/// Owner withdrawal of free funds.
pub fn withdraw<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    hub_id: &HubId,
    beneficiary: &AccountId,
    amount: Balance,
) -> Result<Hub, HermesError> {
    if amount == 0 {
        return Err(HermesError::ZeroAmount);
    }
    let hub = view.hub(hub_id)?;
    require_owner(&hub, ctx.actor)?;
    if hub.status == HubStatus::Closed {
        return Err(HermesError::HubNotActive(hub.status));
    }
    let available = available_of(view, &hub)?;
    if amount > available {
        return Err(HermesError::InsufficientHubFunds { need: amount, available });
    }
    view.transfer(hub_id, beneficiary, amount)?;
    info!(hub = %hub_id, beneficiary = %beneficiary, amount, "hub withdrawal");
    Ok(hub)
}
