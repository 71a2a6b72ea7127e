use hermes_core::account::Account;
use hermes_core::channel::Channel;
use hermes_core::error::HermesError;
use hermes_core::hub::Hub;
use hermes_core::types::{AccountId, ChannelId, HubId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::store::{AccountStore, ChannelStore, HubStore, Store};

/// Persistent state database backed by sled (pure-Rust, no C dependencies).
///
/// Named trees:
///   accounts: AccountId bytes → bincode(Account)
///   hubs    : HubId bytes     → bincode(Hub)
///   channels: ChannelId bytes → bincode(Channel)
///   meta    : utf8 key bytes  → raw bytes
pub struct StateDb {
    _db: sled::Db,
    accounts: sled::Tree,
    hubs: sled::Tree,
    channels: sled::Tree,
    meta: sled::Tree,
}

fn storage(e: sled::Error) -> HermesError {
    HermesError::Storage(e.to_string())
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, HermesError> {
    bincode::deserialize(bytes).map_err(|e| HermesError::Serialization(e.to_string()))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, HermesError> {
    bincode::serialize(value).map_err(|e| HermesError::Serialization(e.to_string()))
}

impl StateDb {
    /// Open or create the state database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HermesError> {
        let db = sled::open(path).map_err(storage)?;
        let accounts = db.open_tree("accounts").map_err(storage)?;
        let hubs     = db.open_tree("hubs").map_err(storage)?;
        let channels = db.open_tree("channels").map_err(storage)?;
        let meta     = db.open_tree("meta").map_err(storage)?;
        Ok(Self { _db: db, accounts, hubs, channels, meta })
    }

    pub fn account_exists(&self, id: &AccountId) -> bool {
        self.accounts.contains_key(id.as_bytes()).unwrap_or(false)
    }

    // ── Iteration ────────────────────────────────────────────────────────────

    pub fn iter_hubs(&self) -> Result<Vec<Hub>, HermesError> {
        self.hubs
            .iter()
            .map(|item| item.map_err(storage).and_then(|(_, v)| decode(&v)))
            .collect()
    }

    /// All channels opened against `hub_id`.
    pub fn channels_of(&self, hub_id: &HubId) -> Result<Vec<Channel>, HermesError> {
        let mut out = Vec::new();
        for item in self.channels.iter() {
            let (_, bytes) = item.map_err(storage)?;
            let channel: Channel = decode(&bytes)?;
            if channel.hub_id == *hub_id {
                out.push(channel);
            }
        }
        Ok(out)
    }

    // ── Meta ──────────────────────────────────────────────────────────────────

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), HermesError> {
        self.meta.insert(key.as_bytes(), value).map_err(storage)?;
        Ok(())
    }

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, HermesError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage)
    }
}

// ── Store impls ───────────────────────────────────────────────────────────────

impl AccountStore for StateDb {
    fn get_account(&self, id: &AccountId) -> Result<Option<Account>, HermesError> {
        match self.accounts.get(id.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_account(&self, account: &Account) -> Result<(), HermesError> {
        self.accounts
            .insert(account.account_id.as_bytes(), encode(account)?)
            .map_err(storage)?;
        Ok(())
    }
}

impl HubStore for StateDb {
    fn get_hub(&self, id: &HubId) -> Result<Option<Hub>, HermesError> {
        match self.hubs.get(id.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_hub(&self, hub: &Hub) -> Result<(), HermesError> {
        self.hubs.insert(hub.hub_id.as_bytes(), encode(hub)?).map_err(storage)?;
        Ok(())
    }
}

impl ChannelStore for StateDb {
    fn get_channel(&self, id: &ChannelId) -> Result<Option<Channel>, HermesError> {
        match self.channels.get(id.as_bytes()).map_err(storage)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_channel(&self, channel: &Channel) -> Result<(), HermesError> {
        self.channels
            .insert(channel.channel_id.as_bytes(), encode(channel)?)
            .map_err(storage)?;
        Ok(())
    }
}

impl Store for StateDb {
    /// Flush all pending writes to disk.
    fn flush(&self) -> Result<(), HermesError> {
        self._db.flush().map_err(storage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hermes_core::types::DilithiumPublicKey;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("hermes_db_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).unwrap()
    }

    #[test]
    fn accounts_round_trip_through_sled() {
        let db = temp_db("accounts");
        let id = AccountId::from_bytes([5u8; 32]);
        assert!(db.get_account(&id).unwrap().is_none());
        assert!(!db.account_exists(&id));

        let mut acc = Account::new(id.clone());
        acc.balance = 42;
        db.put_account(&acc).unwrap();
        assert_eq!(db.get_account(&id).unwrap(), Some(acc));
        assert!(db.account_exists(&id));
    }

    #[test]
    fn channels_are_listed_per_hub() {
        let db = temp_db("channels_of");
        let hub_a = AccountId::from_bytes([1u8; 32]);
        let hub_b = AccountId::from_bytes([2u8; 32]);
        for (i, hub) in [&hub_a, &hub_a, &hub_b].into_iter().enumerate() {
            let ch = Channel::new(
                ChannelId::from_bytes([i as u8 + 10; 32]),
                hub.clone(),
                AccountId::from_bytes([i as u8 + 20; 32]),
                DilithiumPublicKey(vec![]),
                AccountId::from_bytes([i as u8 + 30; 32]),
                25,
                0,
            );
            db.put_channel(&ch).unwrap();
        }
        assert_eq!(db.channels_of(&hub_a).unwrap().len(), 2);
        assert_eq!(db.channels_of(&hub_b).unwrap().len(), 1);
    }

    #[test]
    fn meta_keys() {
        let db = temp_db("meta");
        assert_eq!(db.get_meta("genesis").unwrap(), None);
        db.put_meta("genesis", b"1").unwrap();
        assert_eq!(db.get_meta("genesis").unwrap(), Some(b"1".to_vec()));
        db.flush().unwrap();
    }
}
