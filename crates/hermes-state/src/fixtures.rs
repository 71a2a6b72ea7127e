//! Shared test world: one registered hub run by `operator`, owned and
//! funded by `owner`.

use std::sync::Arc;

use hermes_core::account::Account;
use hermes_core::channel::Channel;
use hermes_core::config::HubPolicy;
use hermes_core::error::HermesError;
use hermes_core::hub::Hub;
use hermes_core::message::Promise;
use hermes_core::transaction::Action;
use hermes_core::types::{AccountId, Balance, BasisPoints, ChannelId, HubId, Timestamp};
use hermes_crypto::{new_lock, sign_promise, KeyPair};

use crate::engine::{Outcome, SettlementEngine};
use crate::memory::MemoryStore;
use crate::settlement::SettlementReceipt;
use crate::store::{AccountStore, ChannelStore, FixedRateExchange, HubStore};

pub const NOW: Timestamp = 2_000_000;
pub const HUB_STAKE: Balance = 1_000;
pub const MIN_STAKE: Balance = 25;
pub const MAX_STAKE: Balance = 50_000;
pub const OWNER_FUNDS: Balance = 1_000_000;

pub fn transactor() -> AccountId {
    AccountId::from_bytes([0xAA; 32])
}

pub struct World {
    pub engine: SettlementEngine<MemoryStore>,
    pub operator: KeyPair,
    pub owner: KeyPair,
    pub client: KeyPair,
    pub hub_id: HubId,
}

impl World {
    pub fn new(fee: BasisPoints) -> Self {
        Self::build(HubPolicy::default(), fee, None)
    }

    pub fn build(
        policy: HubPolicy,
        fee: BasisPoints,
        exchange: Option<FixedRateExchange>,
    ) -> Self {
        let mut engine = SettlementEngine::new(Arc::new(MemoryStore::new()), policy);
        if let Some(exchange) = exchange {
            engine = engine.with_exchange(exchange);
        }
        let operator = KeyPair::generate();
        let owner = KeyPair::generate();
        let client = KeyPair::generate();

        let mut acc = Account::new(owner.account_id.clone());
        acc.balance = OWNER_FUNDS;
        engine.store.put_account(&acc).unwrap();

        let register = Action::RegisterHub {
            operator_key: operator.public_key.clone(),
            owner: owner.account_id.clone(),
            stake: HUB_STAKE,
            fee,
            min_stake: MIN_STAKE,
            max_stake: MAX_STAKE,
        };
        let hub_id = match engine.execute(&owner.account_id, &register, NOW).unwrap() {
            Outcome::Hub(hub) => hub.hub_id,
            other => panic!("unexpected outcome {other:?}"),
        };
        Self { engine, operator, owner, client, hub_id }
    }

    pub fn with_exchange(fee: BasisPoints, exchange: FixedRateExchange) -> Self {
        Self::build(HubPolicy::default(), fee, Some(exchange))
    }

    pub fn run(&self, actor: &AccountId, action: Action) -> Result<Outcome, HermesError> {
        self.run_at(actor, action, NOW)
    }

    pub fn run_at(
        &self,
        actor: &AccountId,
        action: Action,
        now: Timestamp,
    ) -> Result<Outcome, HermesError> {
        self.engine.execute(actor, &action, now)
    }

    pub fn balance(&self, who: &AccountId) -> Balance {
        self.engine.store.get_account(who).unwrap().map(|a| a.balance).unwrap_or(0)
    }

    pub fn hub(&self) -> Hub {
        self.engine.store.get_hub(&self.hub_id).unwrap().unwrap()
    }

    pub fn channel(&self, id: &ChannelId) -> Channel {
        self.engine.store.get_channel(id).unwrap().unwrap()
    }

    pub fn available(&self) -> Balance {
        self.hub().available_balance(self.balance(&self.hub_id))
    }

    /// Owner sends `amount` of free funds to the hub.
    pub fn fund_hub(&self, amount: Balance) {
        let to = self.hub_id.clone();
        self.run(&self.owner.account_id, Action::Transfer { to, amount }).unwrap();
    }

    /// Open `identity`'s channel with `stake` paid by the owner.
    pub fn open(&self, identity: &KeyPair, stake: Balance) -> ChannelId {
        let action = Action::OpenChannel {
            hub_id: self.hub_id.clone(),
            identity_key: identity.public_key.clone(),
            beneficiary: identity.account_id.clone(),
            stake,
        };
        match self.run(&self.owner.account_id, action).unwrap() {
            Outcome::Channel(ch) => ch.channel_id,
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    pub fn promise(&self, channel_id: &ChannelId, amount: Balance, fee: Balance) -> (Promise, Vec<u8>) {
        let (secret, lock) = new_lock();
        (sign_promise(&self.operator, channel_id, amount, fee, lock).unwrap(), secret)
    }

    pub fn settle(
        &self,
        channel_id: &ChannelId,
        amount: Balance,
        fee: Balance,
    ) -> Result<SettlementReceipt, HermesError> {
        let (promise, preimage) = self.promise(channel_id, amount, fee);
        receipt(self.run(&transactor(), Action::SettlePromise { promise, preimage }))
    }
}

pub fn receipt(outcome: Result<Outcome, HermesError>) -> Result<SettlementReceipt, HermesError> {
    outcome.map(|o| match o {
        Outcome::Settled(r) => r,
        other => panic!("unexpected outcome {other:?}"),
    })
}
