use std::sync::Arc;

use hermes_core::account::Account;
use hermes_core::channel::Channel;
use hermes_core::config::HubPolicy;
use hermes_core::error::HermesError;
use hermes_core::hub::Hub;
use hermes_core::transaction::{Action, Transaction};
use hermes_core::types::{AccountId, Balance, Timestamp};
use hermes_crypto::codec::verify_transaction;
use tracing::{debug, info};

use crate::ledger;
use crate::lifecycle::{self, HubTerms};
use crate::settlement::{self, SettleMode, SettlementReceipt};
use crate::stake;
use crate::staged::Staged;
use crate::store::{ChannelAddressResolver, DerivedAddresses, ExchangeAdapter, Store, TokenLedger};

// ── Context & guards ──────────────────────────────────────────────────────────

/// Who is acting, when, and under which policy.
pub struct Context<'e> {
    pub actor: &'e AccountId,
    pub now: Timestamp,
    pub policy: &'e HubPolicy,
}

pub(crate) fn require_operator(hub: &Hub, actor: &AccountId) -> Result<(), HermesError> {
    if hub.is_operator(actor) {
        Ok(())
    } else {
        Err(HermesError::NotAuthorized("operator"))
    }
}

pub(crate) fn require_owner(hub: &Hub, actor: &AccountId) -> Result<(), HermesError> {
    if hub.is_owner(actor) {
        Ok(())
    } else {
        Err(HermesError::NotAuthorized("owner"))
    }
}

/// Free funds of `hub` as seen through `view`.
pub(crate) fn available_of<S: Store + ?Sized>(
    view: &Staged<'_, S>,
    hub: &Hub,
) -> Result<Balance, HermesError> {
    Ok(hub.available_balance(view.balance_of(&hub.hub_id)?))
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Snapshot returned by a successful operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Account(Account),
    Hub(Hub),
    Channel(Channel),
    Settled(SettlementReceipt),
}

// ── SettlementEngine ──────────────────────────────────────────────────────────

/// The state transition engine.
///
/// Validates and applies transactions against the injected store. Each
/// `apply` call is atomic: every mutation is staged and only committed once
/// the whole action has succeeded.
pub struct SettlementEngine<S: Store> {
    pub store: Arc<S>,
    pub policy: HubPolicy,
    resolver: Box<dyn ChannelAddressResolver>,
    exchange: Option<Box<dyn ExchangeAdapter>>,
}

impl<S: Store> SettlementEngine<S> {
    pub fn new(store: Arc<S>, policy: HubPolicy) -> Self {
        Self { store, policy, resolver: Box::new(DerivedAddresses), exchange: None }
    }

    pub fn with_resolver(mut self, resolver: impl ChannelAddressResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Enable `SettleIntoCurrency` through `exchange`.
    pub fn with_exchange(mut self, exchange: impl ExchangeAdapter + 'static) -> Self {
        self.exchange = Some(Box::new(exchange));
        self
    }

    pub fn resolver(&self) -> &dyn ChannelAddressResolver {
        self.resolver.as_ref()
    }

    /// Validate and apply a signed transaction.
    pub fn apply(&self, tx: &Transaction, now: Timestamp) -> Result<Outcome, HermesError> {
        // ── Envelope ──────────────────────────────────────────────────────────
        verify_transaction(tx)?;

        let mut view = Staged::new(self.store.as_ref());
        let sender = view.account(&tx.from)?;
        if tx.nonce != sender.nonce {
            return Err(HermesError::InvalidNonce { expected: sender.nonce, got: tx.nonce });
        }

        // ── Action ────────────────────────────────────────────────────────────
        let outcome = self.dispatch(&mut view, &tx.from, &tx.action, now)?;

        // Reload: the action may have moved the sender's funds.
        let mut sender = view.account(&tx.from)?;
        sender.nonce += 1;
        view.put_account(sender);

        // ── Commit ────────────────────────────────────────────────────────────
        view.commit()?;
        info!(tx_id = %tx.tx_id, from = %tx.from, action = tx.action.kind(), "applied transaction");
        Ok(outcome)
    }

    /// Apply `action` on behalf of `actor` without an envelope. The caller
    /// is responsible for having authenticated `actor`.
    pub fn execute(
        &self,
        actor: &AccountId,
        action: &Action,
        now: Timestamp,
    ) -> Result<Outcome, HermesError> {
        let mut view = Staged::new(self.store.as_ref());
        let outcome = self.dispatch(&mut view, actor, action, now)?;
        view.commit()?;
        debug!(actor = %actor, action = action.kind(), "executed action");
        Ok(outcome)
    }

    // ── Action dispatch ───────────────────────────────────────────────────────

    fn dispatch(
        &self,
        view: &mut Staged<'_, S>,
        actor: &AccountId,
        action: &Action,
        now: Timestamp,
    ) -> Result<Outcome, HermesError> {
        let ctx = Context { actor, now, policy: &self.policy };
        let resolver = self.resolver.as_ref();

        let outcome = match action {
            // ── Ledger ───────────────────────────────────────────────────────
            Action::Transfer { to, amount } => {
                if *amount == 0 {
                    return Err(HermesError::ZeroAmount);
                }
                if to == actor {
                    return Err(HermesError::SelfTransfer);
                }
                view.transfer(actor, to, *amount)?;
                Outcome::Account(view.account(actor)?)
            }

            // ── Registration ─────────────────────────────────────────────────
            Action::RegisterHub { operator_key, owner, stake, fee, min_stake, max_stake } => {
                let terms = HubTerms {
                    operator_key,
                    owner,
                    stake: *stake,
                    fee: *fee,
                    min_stake: *min_stake,
                    max_stake: *max_stake,
                };
                Outcome::Hub(lifecycle::register_hub(view, &ctx, resolver, terms)?)
            }
            Action::OpenChannel { hub_id, identity_key, beneficiary, stake } => {
                Outcome::Channel(stake::open_channel(
                    view,
                    &ctx,
                    resolver,
                    hub_id,
                    identity_key,
                    beneficiary,
                    *stake,
                )?)
            }

            // ── Settlement ───────────────────────────────────────────────────
            Action::SettlePromise { promise, preimage } => Outcome::Settled(settlement::settle(
                view,
                &ctx,
                promise,
                preimage,
                SettleMode::Beneficiary,
            )?),
            Action::SettleWithBeneficiary { promise, preimage, change } => Outcome::Settled(
                settlement::settle_with_beneficiary(view, &ctx, promise, preimage, change)?,
            ),
            Action::SettleWithGoalIncrease { promise, preimage, change } => Outcome::Settled(
                settlement::settle_with_goal_increase(view, &ctx, promise, preimage, change)?,
            ),
            Action::SettleIntoStake { promise, preimage } => Outcome::Settled(settlement::settle(
                view,
                &ctx,
                promise,
                preimage,
                SettleMode::IntoStake,
            )?),
            Action::SettleIntoCurrency { promise, preimage } => {
                let exchange = self.exchange.as_deref().ok_or_else(|| {
                    HermesError::ExchangeFailed("no exchange adapter configured".into())
                })?;
                Outcome::Settled(settlement::settle(
                    view,
                    &ctx,
                    promise,
                    preimage,
                    SettleMode::IntoCurrency(exchange),
                )?)
            }
            Action::PayAndSettle { hub_id, identity_key, promise, preimage, beneficiary } => {
                Outcome::Settled(settlement::pay_and_settle(
                    view,
                    &ctx,
                    resolver,
                    hub_id,
                    identity_key,
                    promise,
                    preimage,
                    beneficiary,
                )?)
            }

            // ── Stake ────────────────────────────────────────────────────────
            Action::IncreaseStake { channel_id, amount } => {
                Outcome::Channel(stake::increase_stake(view, &ctx, channel_id, *amount)?)
            }
            Action::DecreaseStake { request } => {
                Outcome::Channel(stake::decrease_stake(view, &ctx, request)?)
            }
            Action::FastWithdraw { request } => {
                Outcome::Channel(stake::fast_withdraw(view, &ctx, request)?)
            }
            Action::SetBeneficiary { change } => {
                Outcome::Channel(ledger::set_beneficiary(view, change)?)
            }
            Action::SetStakeGoal { change } => {
                Outcome::Channel(ledger::set_stake_goal(view, change)?)
            }

            // ── Hub parameters ───────────────────────────────────────────────
            Action::SetFee { hub_id, fee } => {
                Outcome::Hub(stake::set_fee(view, &ctx, hub_id, *fee)?)
            }
            Action::SetStakeThresholds { hub_id, min_stake, max_stake } => Outcome::Hub(
                stake::set_stake_thresholds(view, &ctx, hub_id, *min_stake, *max_stake)?,
            ),

            // ── Hub lifecycle ────────────────────────────────────────────────
            Action::RebalanceChannel { channel_id } => {
                Outcome::Channel(lifecycle::rebalance(view, &ctx, channel_id)?)
            }
            Action::ResolveEmergency { hub_id } => {
                Outcome::Hub(lifecycle::resolve_emergency(view, &ctx, hub_id)?)
            }
            Action::PauseHub { hub_id } => Outcome::Hub(lifecycle::pause(view, &ctx, hub_id)?),
            Action::ResumeHub { hub_id } => Outcome::Hub(lifecycle::resume(view, &ctx, hub_id)?),
            Action::CloseHub { hub_id } => Outcome::Hub(lifecycle::close(view, &ctx, hub_id)?),
            Action::GetStakeBack { hub_id, beneficiary } => {
                Outcome::Hub(lifecycle::get_stake_back(view, &ctx, hub_id, beneficiary)?)
            }
            Action::Withdraw { hub_id, beneficiary, amount } => {
                Outcome::Hub(lifecycle::withdraw(view, &ctx, hub_id, beneficiary, *amount)?)
            }
        };
        Ok(outcome)
    }
}
