//! Stake & Fee Manager.

use hermes_core::channel::Channel;
use hermes_core::error::HermesError;
use hermes_core::hub::{Hub, HubStatus};
use hermes_core::message::{FastWithdrawal, StakeChange};
use hermes_core::types::{AccountId, Balance, BasisPoints, ChannelId, DilithiumPublicKey, HubId};
use hermes_crypto::codec::verify_message;
use tracing::info;

use crate::engine::{available_of, require_operator, Context};
use crate::ledger::{self, Authorization, StakeDelta};
use crate::staged::Staged;
use crate::store::{ChannelAddressResolver, Store, TokenLedger};

fn check_stake_range(hub: &Hub, resulting: Balance) -> Result<(), HermesError> {
    if resulting < hub.min_stake {
        return Err(HermesError::InsufficientStake { min: hub.min_stake, resulting });
    }
    if resulting > hub.max_stake {
        return Err(HermesError::StakeAboveMaximum { max: hub.max_stake, resulting });
    }
    Ok(())
}

// ── Deposits ──────────────────────────────────────────────────────────────────

/// Create the channel for `identity_key` on `hub_id`, seeding it with
/// `stake` paid by the actor. A channel that exists but was never opened
/// may still receive its first deposit this way.
pub fn open_channel<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    resolver: &dyn ChannelAddressResolver,
    hub_id: &HubId,
    identity_key: &DilithiumPublicKey,
    beneficiary: &AccountId,
    stake: Balance,
) -> Result<Channel, HermesError> {
    let hub = view.hub(hub_id)?;
    if !hub.accepts_new_channels() {
        return Err(HermesError::HubNotActive(hub.status));
    }
    if stake > 0 {
        check_stake_range(&hub, stake)?;
    }

    let (channel, created) =
        ledger::open_or_get(view, resolver, &hub, identity_key, beneficiary, ctx.now)?;
    if !created && (channel.is_opened() || stake == 0) {
        return Err(HermesError::ChannelAlreadyExists(channel.channel_id.to_hex()));
    }
    if stake == 0 {
        return Ok(channel);
    }

    view.transfer(ctx.actor, hub_id, stake)?;
    let (channel, _) =
        ledger::apply_stake_delta(view, &channel.channel_id, StakeDelta::Deposit(stake), None)?;
    info!(channel = %channel.channel_id, hub = %hub_id, stake, "opened channel");
    Ok(channel)
}

/// Top up a channel's stake from the actor's balance. Anyone may do this.
pub fn increase_stake<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    channel_id: &ChannelId,
    amount: Balance,
) -> Result<Channel, HermesError> {
    if amount == 0 {
        return Err(HermesError::ZeroAmount);
    }
    let channel = view.channel(channel_id)?;
    if channel.is_withdrawal() {
        return Err(HermesError::WithdrawalChannel(channel_id.to_hex()));
    }
    let hub = view.hub(&channel.hub_id)?;
    if hub.status == HubStatus::Closed
        || (!channel.is_opened() && !hub.accepts_new_channels())
    {
        return Err(HermesError::HubNotActive(hub.status));
    }
    let resulting = channel
        .stake
        .checked_add(amount)
        .ok_or(HermesError::StakeAboveMaximum { max: hub.max_stake, resulting: Balance::MAX })?;
    check_stake_range(&hub, resulting)?;

    view.transfer(ctx.actor, &hub.hub_id, amount)?;
    let (channel, _) =
        ledger::apply_stake_delta(view, channel_id, StakeDelta::Deposit(amount), None)?;
    info!(channel = %channel_id, amount, stake = channel.stake, "increased stake");
    Ok(channel)
}

// ── Withdrawals ───────────────────────────────────────────────────────────────

/// Pay out `amount` of withdrawn stake: `amount - fee` to `beneficiary`,
/// `fee` to the actor. Funded by the released channel balance first and
/// then by the hub's free funds.
fn pay_out_stake<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    hub_id: &HubId,
    amount: Balance,
    fee: Balance,
    beneficiary: &AccountId,
) -> Result<(), HermesError> {
    let hub = view.hub(hub_id)?;
    let available = available_of(view, &hub)?;
    if amount > available {
        return Err(HermesError::InsufficientHubFunds { need: amount, available });
    }
    view.transfer(hub_id, beneficiary, amount - fee)?;
    view.transfer(hub_id, ctx.actor, fee)
}

/// Client-signed stake withdrawal. Allowed in every hub state.
pub fn decrease_stake<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    request: &StakeChange,
) -> Result<Channel, HermesError> {
    if request.fee > request.amount {
        return Err(HermesError::FeeExceedsAmount { fee: request.fee, amount: request.amount });
    }
    let channel = view.channel(&request.channel_id)?;
    let hub = view.hub(&channel.hub_id)?;

    let auth = Authorization::new(request, &request.signature, request.nonce);
    let delta = StakeDelta::Withdraw { amount: request.amount, floor: Some(hub.min_stake) };
    let (channel, released) =
        ledger::apply_stake_delta(view, &request.channel_id, delta, Some(&auth))?;
    pay_out_stake(view, ctx, &hub.hub_id, request.amount, request.fee, &channel.beneficiary)?;

    info!(
        channel = %channel.channel_id,
        amount = request.amount,
        released,
        stake = channel.stake,
        "decreased stake"
    );
    Ok(channel)
}

/// Withdrawal co-signed by the operator: no stake floor, any beneficiary,
/// valid until `valid_until`.
pub fn fast_withdraw<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    request: &FastWithdrawal,
) -> Result<Channel, HermesError> {
    if ctx.now > request.valid_until {
        return Err(HermesError::RequestExpired { valid_until: request.valid_until });
    }
    if request.fee > request.amount {
        return Err(HermesError::FeeExceedsAmount { fee: request.fee, amount: request.amount });
    }
    let channel = view.channel(&request.channel_id)?;
    let hub = view.hub(&channel.hub_id)?;
    verify_message(request, &request.operator_signature, &hub.operator_key)
        .map_err(|_| HermesError::InvalidSignature)?;

    let auth = Authorization::new(request, &request.client_signature, request.nonce);
    let delta = StakeDelta::Withdraw { amount: request.amount, floor: None };
    let (channel, _) = ledger::apply_stake_delta(view, &request.channel_id, delta, Some(&auth))?;
    pay_out_stake(view, ctx, &hub.hub_id, request.amount, request.fee, &request.beneficiary)?;

    info!(channel = %channel.channel_id, amount = request.amount, "fast withdrawal");
    Ok(channel)
}

// ── Hub parameters ────────────────────────────────────────────────────────────

/// Schedule a new hub fee after the activation delay.
pub fn set_fee<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    hub_id: &HubId,
    fee: BasisPoints,
) -> Result<Hub, HermesError> {
    let mut hub = view.hub(hub_id)?;
    require_operator(&hub, ctx.actor)?;
    if hub.status == HubStatus::Closed {
        return Err(HermesError::HubNotActive(hub.status));
    }
    hub.fees.schedule(
        fee,
        ctx.now,
        ctx.policy.fee_activation_delay_secs,
        ctx.policy.fee_ceiling_bp,
    )?;
    info!(hub = %hub_id, fee, valid_from = hub.fees.last.valid_from, "scheduled fee change");
    view.put_hub(hub.clone());
    Ok(hub)
}

/// New thresholds apply to later stake changes; existing channel goals are
/// left alone.
pub fn set_stake_thresholds<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    ctx: &Context<'_>,
    hub_id: &HubId,
    min_stake: Balance,
    max_stake: Balance,
) -> Result<Hub, HermesError> {
    let mut hub = view.hub(hub_id)?;
    require_operator(&hub, ctx.actor)?;
    if hub.status == HubStatus::Closed {
        return Err(HermesError::HubNotActive(hub.status));
    }
    if min_stake > max_stake {
        return Err(HermesError::InvalidStakeThresholds { min: min_stake, max: max_stake });
    }
    hub.min_stake = min_stake;
    hub.max_stake = max_stake;
    view.put_hub(hub.clone());
    Ok(hub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Outcome;
    use crate::fixtures::{transactor, World, NOW};
    use crate::query::HubQuery;
    use hermes_core::account::Account;
    use hermes_core::constants::FEE_ACTIVATION_DELAY_SECS;
    use hermes_core::transaction::Action;
    use hermes_crypto::{sign_fast_withdrawal, sign_stake_change, KeyPair};
    use crate::store::AccountStore;

    const ONE_TOKEN: Balance = 100_000_000;

    fn decrease(w: &World, request: StakeChange) -> Result<Outcome, HermesError> {
        w.run(&transactor(), Action::DecreaseStake { request })
    }

    #[test]
    fn increase_stake_respects_thresholds() {
        let w = World::new(0);
        let ch = w.open(&w.client, 0);
        let top_up = |amount| Action::IncreaseStake { channel_id: ch.clone(), amount };

        assert!(matches!(
            w.run(&w.owner.account_id, top_up(10)),
            Err(HermesError::InsufficientStake { min: 25, resulting: 10 })
        ));
        assert!(matches!(
            w.run(&w.owner.account_id, top_up(50_001)),
            Err(HermesError::StakeAboveMaximum { max: 50_000, .. })
        ));
        assert!(matches!(w.run(&w.owner.account_id, top_up(0)), Err(HermesError::ZeroAmount)));

        // Anyone may top up someone else's channel.
        let patron = KeyPair::generate();
        let mut acc = Account::new(patron.account_id.clone());
        acc.balance = 100;
        w.engine.store.put_account(&acc).unwrap();
        w.run(&patron.account_id, top_up(30)).unwrap();
        assert_eq!(w.channel(&ch).stake, 30);
        assert_eq!(w.balance(&patron.account_id), 70);
        assert_eq!(w.hub().total_stake, 30);
    }

    #[test]
    fn top_up_that_would_overflow_is_above_maximum() {
        let w = World::new(0);
        let ch = w.open(&w.client, 30);
        let owner_before = w.balance(&w.owner.account_id);
        let top_up = Action::IncreaseStake { channel_id: ch.clone(), amount: Balance::MAX };
        assert!(matches!(
            w.run(&w.owner.account_id, top_up),
            Err(HermesError::StakeAboveMaximum { max: 50_000, resulting: Balance::MAX })
        ));
        assert_eq!(w.channel(&ch).stake, 30);
        assert_eq!(w.balance(&w.owner.account_id), owner_before);
    }

    #[test]
    fn decrease_stake_keeps_floor_or_goes_to_zero() {
        let w = World::new(0);
        let ch = w.open(&w.client, 100);

        let too_far = sign_stake_change(&w.client, &ch, 80, 0, 1).unwrap();
        assert!(matches!(
            decrease(&w, too_far),
            Err(HermesError::InsufficientStake { min: 25, resulting: 20 })
        ));

        let partial = sign_stake_change(&w.client, &ch, 75, 5, 1).unwrap();
        decrease(&w, partial).unwrap();
        assert_eq!(w.channel(&ch).stake, 25);
        assert_eq!(w.balance(&w.client.account_id), 70);
        assert_eq!(w.balance(&transactor()), 5);

        let full = sign_stake_change(&w.client, &ch, 25, 0, 2).unwrap();
        decrease(&w, full.clone()).unwrap();
        assert_eq!(w.channel(&ch).stake, 0);
        assert_eq!(w.hub().total_stake, 0);
        assert_eq!(w.hub().locked_funds, 0);
        assert!(matches!(decrease(&w, full), Err(HermesError::NonceReused(2))));
    }

    #[test]
    fn decrease_stake_needs_client_signature() {
        let w = World::new(0);
        let ch = w.open(&w.client, 100);

        let stranger = KeyPair::generate();
        let forged = sign_stake_change(&stranger, &ch, 100, 0, 1).unwrap();
        assert!(matches!(decrease(&w, forged), Err(HermesError::InvalidSignature)));

        let greedy = sign_stake_change(&w.client, &ch, 10, 11, 1).unwrap();
        assert!(matches!(
            decrease(&w, greedy),
            Err(HermesError::FeeExceedsAmount { fee: 11, amount: 10 })
        ));
        assert_eq!(w.channel(&ch).last_used_nonce, 0);
    }

    #[test]
    fn fast_withdrawal_waives_floor_until_expiry() {
        let w = World::new(0);
        let ch = w.open(&w.client, 100);
        let payee = AccountId::from_bytes([0xCC; 32]);

        let request =
            sign_fast_withdrawal(&w.client, &w.operator, &ch, 90, 0, &payee, NOW + 60, 1).unwrap();
        w.run(&transactor(), Action::FastWithdraw { request: request.clone() }).unwrap();
        assert_eq!(w.channel(&ch).stake, 10);
        assert_eq!(w.balance(&payee), 90);

        assert!(matches!(
            w.run(&transactor(), Action::FastWithdraw { request }),
            Err(HermesError::NonceReused(1))
        ));

        let stale =
            sign_fast_withdrawal(&w.client, &w.operator, &ch, 5, 0, &payee, NOW - 1, 2).unwrap();
        assert!(matches!(
            w.run(&transactor(), Action::FastWithdraw { request: stale }),
            Err(HermesError::RequestExpired { .. })
        ));

        let stranger = KeyPair::generate();
        let unapproved =
            sign_fast_withdrawal(&w.client, &stranger, &ch, 5, 0, &payee, NOW + 60, 2).unwrap();
        assert!(matches!(
            w.run(&transactor(), Action::FastWithdraw { request: unapproved }),
            Err(HermesError::InvalidSignature)
        ));
    }

    #[test]
    fn fee_change_takes_effect_after_delay() {
        let w = World::new(250);
        let set = |fee| Action::SetFee { hub_id: w.hub_id.clone(), fee };

        assert!(matches!(
            w.run(&w.owner.account_id, set(175)),
            Err(HermesError::NotAuthorized("operator"))
        ));
        assert!(matches!(
            w.run(&w.operator.account_id, set(5_001)),
            Err(HermesError::FeeTooHigh { max: 5_000, got: 5_001 })
        ));
        w.run(&w.operator.account_id, set(175)).unwrap();
        assert!(matches!(
            w.run_at(&w.operator.account_id, set(100), NOW + 10),
            Err(HermesError::FeeChangeNotFinalized { .. })
        ));

        let query = HubQuery::new(w.engine.store.as_ref());
        let fee_at = |t| query.calculate_fee(&w.hub_id, ONE_TOKEN, t, &w.engine.policy).unwrap();
        assert_eq!(fee_at(NOW), 2_500_000);
        assert_eq!(fee_at(NOW + FEE_ACTIVATION_DELAY_SECS - 1), 2_500_000);
        assert_eq!(fee_at(NOW + FEE_ACTIVATION_DELAY_SECS), 1_750_000);
    }

    #[test]
    fn thresholds_apply_to_new_channels_only() {
        let w = World::new(0);
        let early = w.open(&w.client, 0);
        let set = |min_stake, max_stake| Action::SetStakeThresholds {
            hub_id: w.hub_id.clone(),
            min_stake,
            max_stake,
        };

        assert!(matches!(
            w.run(&w.operator.account_id, set(100, 50)),
            Err(HermesError::InvalidStakeThresholds { min: 100, max: 50 })
        ));
        assert!(matches!(
            w.run(&w.owner.account_id, set(50, 100)),
            Err(HermesError::NotAuthorized(_))
        ));
        w.run(&w.operator.account_id, set(50, 100)).unwrap();

        let late = w.open(&KeyPair::generate(), 0);
        assert_eq!(w.channel(&early).stake_goal, 25);
        assert_eq!(w.channel(&late).stake_goal, 50);
    }
}
