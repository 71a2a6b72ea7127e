use std::collections::BTreeMap;

use hermes_core::account::Account;
use hermes_core::channel::Channel;
use hermes_core::error::HermesError;
use hermes_core::hub::Hub;
use hermes_core::types::{AccountId, Balance, ChannelId, HubId};

use crate::store::{Store, TokenLedger};

/// Read-through overlay holding every mutation of one operation.
///
/// Reads see staged values first and fall back to the store. Nothing
/// reaches the store until [`Staged::commit`]; dropping the overlay
/// discards the whole operation.
pub struct Staged<'a, S: Store + ?Sized> {
    store: &'a S,
    accounts: BTreeMap<AccountId, Account>,
    hubs: BTreeMap<HubId, Hub>,
    channels: BTreeMap<ChannelId, Channel>,
}

impl<'a, S: Store + ?Sized> Staged<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            accounts: BTreeMap::new(),
            hubs: BTreeMap::new(),
            channels: BTreeMap::new(),
        }
    }

    // ── Accounts ─────────────────────────────────────────────────────────────

    /// Ledger account, or an empty one if it has never been written.
    pub fn account(&self, id: &AccountId) -> Result<Account, HermesError> {
        if let Some(acc) = self.accounts.get(id) {
            return Ok(acc.clone());
        }
        Ok(self.store.get_account(id)?.unwrap_or_else(|| Account::new(id.clone())))
    }

    pub fn put_account(&mut self, account: Account) {
        self.accounts.insert(account.account_id.clone(), account);
    }

    // ── Hubs ─────────────────────────────────────────────────────────────────

    pub fn find_hub(&self, id: &HubId) -> Result<Option<Hub>, HermesError> {
        match self.hubs.get(id) {
            Some(hub) => Ok(Some(hub.clone())),
            None => self.store.get_hub(id),
        }
    }

    pub fn hub(&self, id: &HubId) -> Result<Hub, HermesError> {
        self.find_hub(id)?.ok_or_else(|| HermesError::UnknownHub(id.to_string()))
    }

    pub fn put_hub(&mut self, hub: Hub) {
        self.hubs.insert(hub.hub_id.clone(), hub);
    }

    // ── Channels ─────────────────────────────────────────────────────────────

    pub fn find_channel(&self, id: &ChannelId) -> Result<Option<Channel>, HermesError> {
        match self.channels.get(id) {
            Some(ch) => Ok(Some(ch.clone())),
            None => self.store.get_channel(id),
        }
    }

    pub fn channel(&self, id: &ChannelId) -> Result<Channel, HermesError> {
        self.find_channel(id)?.ok_or_else(|| HermesError::UnknownChannel(id.to_hex()))
    }

    pub fn put_channel(&mut self, channel: Channel) {
        self.channels.insert(channel.channel_id.clone(), channel);
    }

    // ── Commit ───────────────────────────────────────────────────────────────

    /// Write every staged record to the store and flush it.
    pub fn commit(self) -> Result<(), HermesError> {
        for acc in self.accounts.values() {
            self.store.put_account(acc)?;
        }
        for hub in self.hubs.values() {
            self.store.put_hub(hub)?;
        }
        for ch in self.channels.values() {
            self.store.put_channel(ch)?;
        }
        self.store.flush()
    }
}

impl<S: Store + ?Sized> TokenLedger for Staged<'_, S> {
    fn balance_of(&self, account: &AccountId) -> Result<Balance, HermesError> {
        Ok(self.account(account)?.balance)
    }

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Balance,
    ) -> Result<(), HermesError> {
        if amount == 0 || from == to {
            return Ok(());
        }
        let mut sender = self.account(from)?;
        if sender.balance < amount {
            return Err(HermesError::InsufficientBalance { need: amount, have: sender.balance });
        }
        sender.balance -= amount;
        self.put_account(sender);

        let mut recipient = self.account(to)?;
        recipient.balance += amount;
        self.put_account(recipient);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::store::AccountStore;

    fn id(b: u8) -> AccountId {
        AccountId::from_bytes([b; 32])
    }

    fn funded(store: &MemoryStore, who: &AccountId, balance: Balance) {
        let mut acc = Account::new(who.clone());
        acc.balance = balance;
        store.put_account(&acc).unwrap();
    }

    #[test]
    fn transfers_are_invisible_until_commit() {
        let store = MemoryStore::new();
        funded(&store, &id(1), 100);

        let mut view = Staged::new(&store);
        view.transfer(&id(1), &id(2), 40).unwrap();
        assert_eq!(view.balance_of(&id(1)).unwrap(), 60);
        assert_eq!(view.balance_of(&id(2)).unwrap(), 40);
        assert_eq!(store.get_account(&id(1)).unwrap().unwrap().balance, 100);

        view.commit().unwrap();
        assert_eq!(store.get_account(&id(1)).unwrap().unwrap().balance, 60);
        assert_eq!(store.get_account(&id(2)).unwrap().unwrap().balance, 40);
    }

    #[test]
    fn overdraft_rejected_without_side_effects() {
        let store = MemoryStore::new();
        funded(&store, &id(1), 10);

        let mut view = Staged::new(&store);
        assert!(matches!(
            view.transfer(&id(1), &id(2), 11),
            Err(HermesError::InsufficientBalance { need: 11, have: 10 })
        ));
        assert_eq!(view.balance_of(&id(1)).unwrap(), 10);
        assert_eq!(view.balance_of(&id(2)).unwrap(), 0);
    }

    #[test]
    fn dropped_overlay_discards_writes() {
        let store = MemoryStore::new();
        funded(&store, &id(1), 10);
        {
            let mut view = Staged::new(&store);
            view.transfer(&id(1), &id(2), 10).unwrap();
        }
        assert!(store.get_account(&id(2)).unwrap().is_none());
    }
}
