use dashmap::DashMap;

use hermes_core::account::Account;
use hermes_core::channel::Channel;
use hermes_core::error::HermesError;
use hermes_core::hub::Hub;
use hermes_core::types::{AccountId, ChannelId, HubId};

use crate::store::{AccountStore, ChannelStore, HubStore, Store};

/// Volatile store for isolated tests and tooling. Shard-locked, so
/// concurrent readers never block on one another.
#[derive(Default)]
pub struct MemoryStore {
    accounts: DashMap<AccountId, Account>,
    hubs: DashMap<HubId, Hub>,
    channels: DashMap<ChannelId, Channel>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountStore for MemoryStore {
    fn get_account(&self, id: &AccountId) -> Result<Option<Account>, HermesError> {
        Ok(self.accounts.get(id).map(|a| a.value().clone()))
    }

    fn put_account(&self, account: &Account) -> Result<(), HermesError> {
        self.accounts.insert(account.account_id.clone(), account.clone());
        Ok(())
    }
}

impl HubStore for MemoryStore {
    fn get_hub(&self, id: &HubId) -> Result<Option<Hub>, HermesError> {
        Ok(self.hubs.get(id).map(|h| h.value().clone()))
    }

    fn put_hub(&self, hub: &Hub) -> Result<(), HermesError> {
        self.hubs.insert(hub.hub_id.clone(), hub.clone());
        Ok(())
    }
}

impl ChannelStore for MemoryStore {
    fn get_channel(&self, id: &ChannelId) -> Result<Option<Channel>, HermesError> {
        Ok(self.channels.get(id).map(|c| c.value().clone()))
    }

    fn put_channel(&self, channel: &Channel) -> Result<(), HermesError> {
        self.channels.insert(channel.channel_id.clone(), channel.clone());
        Ok(())
    }
}

impl Store for MemoryStore {}
