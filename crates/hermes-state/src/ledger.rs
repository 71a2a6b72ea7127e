//! Channel Ledger: the only code that mutates channel records.
//!
//! Every function here keeps the owning hub's `total_stake` and
//! `locked_funds` aggregates in step with the channel it touches.

use hermes_core::channel::Channel;
use hermes_core::error::HermesError;
use hermes_core::hub::Hub;
use hermes_core::message::{BeneficiaryChange, StakeGoalChange};
use hermes_core::types::{
    AccountId, Balance, ChannelId, DilithiumPublicKey, DilithiumSignature, Nonce, Timestamp,
};
use hermes_crypto::codec::Signed;
use hermes_crypto::hash::account_id_from_pubkey;
use tracing::debug;

use crate::staged::Staged;
use crate::store::{ChannelAddressResolver, Store};

/// Client authorization carried by a channel request: the signed bytes,
/// the signature and the nonce to consume.
pub struct Authorization<'m> {
    bytes: Vec<u8>,
    signature: &'m DilithiumSignature,
    nonce: Nonce,
}

impl<'m> Authorization<'m> {
    pub fn new<M: Signed>(message: &M, signature: &'m DilithiumSignature, nonce: Nonce) -> Self {
        Self { bytes: message.signing_bytes(), signature, nonce }
    }

    /// Verify against the channel's identity key, then consume the nonce.
    fn apply(&self, channel: &mut Channel) -> Result<(), HermesError> {
        hermes_crypto::verify_signature(&channel.identity_key, &self.bytes, self.signature)
            .map_err(|_| HermesError::InvalidSignature)?;
        channel.consume_nonce(self.nonce)
    }
}

/// Change applied to a channel's stake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StakeDelta {
    /// Add stake backed by the same amount of channel balance.
    Deposit(Balance),
    /// Remove stake. `floor` is the minimum a non-zero remainder must keep.
    Withdraw { amount: Balance, floor: Option<Balance> },
}

/// The channel for `identity_key` on `hub`, created with zero stake if it
/// does not exist yet. The flag is true when the channel was created.
pub fn open_or_get<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    resolver: &dyn ChannelAddressResolver,
    hub: &Hub,
    identity_key: &DilithiumPublicKey,
    beneficiary: &AccountId,
    now: Timestamp,
) -> Result<(Channel, bool), HermesError> {
    let identity = account_id_from_pubkey(&identity_key.0);
    let channel_id = resolver.channel_id(&identity, &hub.hub_id);
    if let Some(existing) = view.find_channel(&channel_id)? {
        return Ok((existing, false));
    }
    let channel = Channel::new(
        channel_id,
        hub.hub_id.clone(),
        identity,
        identity_key.clone(),
        beneficiary.clone(),
        hub.min_stake,
        now,
    );
    debug!(channel = %channel.channel_id, hub = %hub.hub_id, "created channel");
    view.put_channel(channel.clone());
    Ok((channel, true))
}

/// Advance the channel's settled total, recording `hub_fee` against it.
pub fn apply_settlement<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    channel_id: &ChannelId,
    new_total: Balance,
    hub_fee: Balance,
) -> Result<Channel, HermesError> {
    let mut channel = view.channel(channel_id)?;
    channel.apply_settlement(new_total, hub_fee)?;
    view.put_channel(channel.clone());
    Ok(channel)
}

/// Apply `delta` to the channel's stake, authorized by `signed` when given.
/// Returns the updated channel and the channel balance moved: deposited for
/// `Deposit`, released for `Withdraw`.
pub fn apply_stake_delta<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    channel_id: &ChannelId,
    delta: StakeDelta,
    signed: Option<&Authorization<'_>>,
) -> Result<(Channel, Balance), HermesError> {
    let mut channel = view.channel(channel_id)?;
    let mut hub = view.hub(&channel.hub_id)?;
    if let Some(auth) = signed {
        auth.apply(&mut channel)?;
    }

    let moved = match delta {
        StakeDelta::Deposit(amount) => {
            if amount == 0 {
                return Err(HermesError::ZeroAmount);
            }
            channel.deposit(amount);
            hub.total_stake += amount;
            hub.locked_funds += amount;
            amount
        }
        StakeDelta::Withdraw { amount, floor } => {
            let released = channel.withdraw_stake(amount, floor)?;
            hub.total_stake = hub.total_stake.saturating_sub(amount);
            hub.locked_funds = hub.locked_funds.saturating_sub(released);
            released
        }
    };

    view.put_hub(hub);
    view.put_channel(channel.clone());
    Ok((channel, moved))
}

/// Take up to `amount` out of the channel balance toward a settlement.
/// Returns what was drawn.
pub fn draw<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    channel_id: &ChannelId,
    amount: Balance,
) -> Result<Balance, HermesError> {
    let mut channel = view.channel(channel_id)?;
    let mut hub = view.hub(&channel.hub_id)?;
    let drawn = channel.draw(amount);
    hub.locked_funds = hub.locked_funds.saturating_sub(drawn);
    view.put_hub(hub);
    view.put_channel(channel);
    Ok(drawn)
}

/// Refill the channel balance by `amount` from the hub's free funds.
pub fn refill<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    channel_id: &ChannelId,
    amount: Balance,
) -> Result<Channel, HermesError> {
    let mut channel = view.channel(channel_id)?;
    let mut hub = view.hub(&channel.hub_id)?;
    let topup = amount.min(channel.balance_shortfall());
    channel.balance += topup;
    hub.locked_funds += topup;
    view.put_hub(hub);
    view.put_channel(channel.clone());
    Ok(channel)
}

pub fn set_beneficiary<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    change: &BeneficiaryChange,
) -> Result<Channel, HermesError> {
    let mut channel = view.channel(&change.channel_id)?;
    Authorization::new(change, &change.signature, change.nonce).apply(&mut channel)?;
    channel.beneficiary = change.beneficiary.clone();
    debug!(channel = %channel.channel_id, beneficiary = %channel.beneficiary, "beneficiary changed");
    view.put_channel(channel.clone());
    Ok(channel)
}

/// Set a new stake goal. It may not exceed the hub's maximum stake.
pub fn set_stake_goal<S: Store + ?Sized>(
    view: &mut Staged<'_, S>,
    change: &StakeGoalChange,
) -> Result<Channel, HermesError> {
    let mut channel = view.channel(&change.channel_id)?;
    let hub = view.hub(&channel.hub_id)?;
    if change.stake_goal > hub.max_stake {
        return Err(HermesError::StakeAboveMaximum {
            max: hub.max_stake,
            resulting: change.stake_goal,
        });
    }
    Authorization::new(change, &change.signature, change.nonce).apply(&mut channel)?;
    channel.stake_goal = change.stake_goal;
    view.put_channel(channel.clone());
    Ok(channel)
}
