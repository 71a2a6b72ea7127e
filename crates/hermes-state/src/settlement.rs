//! Promise settlement.
//!
//! A promise carries the cumulative amount owed on a channel. Each call
//! redeems the next increment over `settled`, bounded by the hub's
//! `max_stake` and by what the hub can actually pay. An underfunded hub
//! pays what it can and enters punishment; the rest stays owed against the
//! same promise.
//!
//! Withdrawal channels are redeemed only through [`pay_and_settle`], and
//! pay-and-settle only works on withdrawal channels.

use hermes_core::channel::Channel;
use hermes_core::constants::BASIS_POINTS;
use hermes_core::error::HermesError;
use hermes_core::hub::{Hub, HubStatus};
use hermes_core::message::{
    BeneficiaryChange, PayAndSettleBeneficiary, Promise, StakeGoalChange,
};
use hermes_core::types::{AccountId, Balance, DilithiumPublicKey, HubId};
use hermes_crypto::codec::verify_message;
use hermes_crypto::hash::{account_id_from_pubkey, hashlock_of};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::engine::{available_of, Context};
use crate::ledger::{self, StakeDelta};
use crate::staged::Staged;
use crate::store::{ChannelAddressResolver, ExchangeAdapter, Store, TokenLedger};

/// Where the redeemed value goes.
#[derive(Clone, Copy)]
pub enum SettleMode<'x> {
    /// Pay the channel's beneficiary.
    Beneficiary,
    /// Add everything to the channel's stake. No hub fee.
    IntoStake,
    /// Convert the payout through an exchange adapter.
    IntoCurrency(&'x dyn ExchangeAdapter),
    /// Withdrawal-channel redemption to an identity-signed beneficiary.
    /// No hub fee and no stake capture.
    PayAndSettle(&'x AccountId),
}

/// Breakdown of one settlement call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub channel: Channel,
    /// Amount by which `settled` advanced.
    pub payable: Balance,
    pub hub_fee: Balance,
    pub transactor_fee: Balance,
    pub stake_captured: Balance,
    /// Tokens sent to the beneficiary (or to the exchange).
    pub payout: Balance,
    /// Part of the promise still owed after this call.
    pub remaining: Balance,
    /// External-currency amount reported by the exchange adapter.
    pub external_amount: Option<Balance>,
}

fn verify_promise(hub: &Hub, promise: &Promise, preimage: &[u8]) -> Result<(), HermesError> {
    verify_message(promise, &promise.signature, &hub.operator_key)
        .map_err(|_| HermesError::InvalidPromise("operator signature does not verify".into()))?;
    if hashlock_of(preimage) != promise.hashlock {
        return Err(HermesError::InvalidPromise("preimage does not match hashlock".into()));
    }
    Ok(())
}

/// Redeem the next increment of `promise`.
pub fn settle<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    promise: &Promise,
    preimage: &[u8],
    mode: SettleMode<'_>,
) -> Result<SettlementReceipt, HermesError> {
    let channel = view.channel(&promise.channel_id)?;
    let hub = view.hub(&channel.hub_id)?;

    if hub.status == HubStatus::Closed {
        return Err(HermesError::HubNotActive(hub.status));
    }
    if !channel.is_opened() && !hub.accepts_new_channels() {
        return Err(HermesError::HubNotActive(hub.status));
    }
    if channel.is_withdrawal() != matches!(mode, SettleMode::PayAndSettle(_)) {
        let reason = if channel.is_withdrawal() {
            "promise is for a withdrawal channel"
        } else {
            "promise is not for a withdrawal channel"
        };
        return Err(HermesError::InvalidPromise(reason.into()));
    }
    verify_promise(&hub, promise, preimage)?;

    let increment = promise.amount.saturating_sub(channel.settled);
    if increment == 0 {
        return Err(HermesError::NothingToSettle);
    }

    // ── How much this call redeems ───────────────────────────────────────────
    let requested = match mode {
        SettleMode::IntoStake => {
            let room = hub.max_stake.saturating_sub(channel.stake);
            if room == 0 {
                return Err(HermesError::StakeAboveMaximum {
                    max: hub.max_stake,
                    resulting: channel.stake.saturating_add(increment),
                });
            }
            increment.min(room)
        }
        SettleMode::PayAndSettle(_) => increment,
        _ => increment.min(hub.max_stake),
    };
    let available = available_of(view, &hub)?;
    let payable = requested.min(channel.balance.saturating_add(available));
    if payable == 0 {
        return Err(HermesError::InsufficientHubFunds { need: requested, available });
    }

    // ── Split ────────────────────────────────────────────────────────────────
    let hub_fee = match mode {
        SettleMode::IntoStake | SettleMode::PayAndSettle(_) => 0,
        _ => hub.fees.calculate(payable, ctx.now, ctx.policy.min_fee),
    };
    let transactor_fee = promise.fee.min(payable - hub_fee);
    let net = payable - hub_fee - transactor_fee;
    let stake_captured = match mode {
        SettleMode::IntoStake => net,
        SettleMode::PayAndSettle(_) => 0,
        _ if channel.stake < channel.stake_goal => {
            let share = net * ctx.policy.stake_capture_bp as u128 / BASIS_POINTS;
            share
                .min(channel.stake_goal - channel.stake)
                .min(hub.max_stake.saturating_sub(channel.stake))
        }
        _ => 0,
    };
    let payout = net - stake_captured;

    // ── Apply ────────────────────────────────────────────────────────────────
    ledger::draw(view, &channel.channel_id, payable)?;
    if stake_captured > 0 {
        ledger::apply_stake_delta(
            view,
            &channel.channel_id,
            StakeDelta::Deposit(stake_captured),
            None,
        )?;
    }
    let mut updated = ledger::apply_settlement(
        view,
        &channel.channel_id,
        channel.settled + payable,
        hub_fee,
    )?;
    if matches!(mode, SettleMode::IntoStake) && updated.stake_goal < updated.stake {
        updated.stake_goal = updated.stake;
        view.put_channel(updated.clone());
    }

    view.transfer(&hub.hub_id, ctx.actor, transactor_fee)?;
    let external_amount = match mode {
        SettleMode::IntoCurrency(exchange) => {
            let quoted = exchange.quote(payout)?;
            view.transfer(&hub.hub_id, exchange.account(), payout)?;
            Some(quoted)
        }
        SettleMode::PayAndSettle(beneficiary) => {
            view.transfer(&hub.hub_id, beneficiary, payout)?;
            None
        }
        _ => {
            view.transfer(&hub.hub_id, &updated.beneficiary, payout)?;
            None
        }
    };

    if payable < requested {
        let mut hub = view.hub(&hub.hub_id)?;
        if hub.enter_punishment(ctx.now) {
            warn!(hub = %hub.hub_id, requested, payable, "settlement underfunded, hub in punishment");
        }
        view.put_hub(hub);
    }

    info!(
        channel = %updated.channel_id,
        payable,
        hub_fee,
        transactor_fee,
        stake_captured,
        payout,
        "settled promise"
    );
    let remaining = promise.amount.saturating_sub(updated.settled);
    Ok(SettlementReceipt {
        channel: updated,
        payable,
        hub_fee,
        transactor_fee,
        stake_captured,
        payout,
        remaining,
        external_amount,
    })
}

/// Apply a signed beneficiary change, then settle to the new beneficiary.
pub fn settle_with_beneficiary<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    promise: &Promise,
    preimage: &[u8],
    change: &BeneficiaryChange,
) -> Result<SettlementReceipt, HermesError> {
    if change.channel_id != promise.channel_id {
        return Err(HermesError::InvalidPromise("beneficiary change names another channel".into()));
    }
    ledger::set_beneficiary(view, change)?;
    settle(view, ctx, promise, preimage, SettleMode::Beneficiary)
}

/// Apply a signed stake-goal change, then settle.
pub fn settle_with_goal_increase<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    promise: &Promise,
    preimage: &[u8],
    change: &StakeGoalChange,
) -> Result<SettlementReceipt, HermesError> {
    if change.channel_id != promise.channel_id {
        return Err(HermesError::InvalidPromise("stake goal change names another channel".into()));
    }
    ledger::set_stake_goal(view, change)?;
    settle(view, ctx, promise, preimage, SettleMode::Beneficiary)
}

/// Redeem a promise on `identity_key`'s withdrawal channel on `hub_id`,
/// paying the beneficiary the identity signed for. The channel is created
/// on first use.
#[allow(clippy::too_many_arguments)]
pub fn pay_and_settle<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    resolver: &dyn ChannelAddressResolver,
    hub_id: &HubId,
    identity_key: &DilithiumPublicKey,
    promise: &Promise,
    preimage: &[u8],
    auth: &PayAndSettleBeneficiary,
) -> Result<SettlementReceipt, HermesError> {
    let identity = account_id_from_pubkey(&identity_key.0);
    let channel_id = resolver.withdrawal_channel_id(&identity, hub_id);
    if promise.channel_id != channel_id {
        return Err(HermesError::InvalidPromise("promise is not for the withdrawal channel".into()));
    }
    if auth.channel_id != channel_id
        || auth.amount != promise.amount
        || auth.hashlock != promise.hashlock
    {
        return Err(HermesError::InvalidPromise("beneficiary signature names another promise".into()));
    }
    verify_message(auth, &auth.signature, identity_key)
        .map_err(|_| HermesError::InvalidSignature)?;

    if view.find_channel(&channel_id)?.is_none() {
        view.hub(hub_id)?;
        view.put_channel(Channel::withdrawal(
            channel_id,
            hub_id.clone(),
            identity.clone(),
            identity_key.clone(),
            identity,
            ctx.now,
        ));
    }
    settle(view, ctx, promise, preimage, SettleMode::PayAndSettle(&auth.beneficiary))
}
