//! Collaborator seams the settlement core is written against.
//!
//! Persistent state is reached only through the store traits below, so the
//! same engine runs on the sled-backed [`StateDb`](crate::db::StateDb) and
//! on [`MemoryStore`](crate::memory::MemoryStore) in tests.

use hermes_core::account::Account;
use hermes_core::channel::Channel;
use hermes_core::error::HermesError;
use hermes_core::hub::Hub;
use hermes_core::types::{AccountId, Balance, ChannelId, HubId};
use hermes_crypto::hash::{channel_address, hub_address, withdrawal_channel_address};

// ── Stores ────────────────────────────────────────────────────────────────────

pub trait HubStore {
    fn get_hub(&self, id: &HubId) -> Result<Option<Hub>, HermesError>;
    fn put_hub(&self, hub: &Hub) -> Result<(), HermesError>;
}

pub trait ChannelStore {
    fn get_channel(&self, id: &ChannelId) -> Result<Option<Channel>, HermesError>;
    fn put_channel(&self, channel: &Channel) -> Result<(), HermesError>;
}

pub trait AccountStore {
    fn get_account(&self, id: &AccountId) -> Result<Option<Account>, HermesError>;
    fn put_account(&self, account: &Account) -> Result<(), HermesError>;
}

/// Everything the engine persists.
pub trait Store: HubStore + ChannelStore + AccountStore + Send + Sync {
    /// Make committed writes durable.
    fn flush(&self) -> Result<(), HermesError> {
        Ok(())
    }
}

// ── Token ledger ──────────────────────────────────────────────────────────────

/// Minimal token ledger: balances and atomic transfers between accounts.
pub trait TokenLedger {
    fn balance_of(&self, account: &AccountId) -> Result<Balance, HermesError>;

    /// Move `amount` from `from` to `to`. Fails with `InsufficientBalance`
    /// without touching either account.
    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Balance,
    ) -> Result<(), HermesError>;
}

// ── Address resolution ────────────────────────────────────────────────────────

/// Maps identities and operators to the opaque keys channels and hubs are
/// stored under.
pub trait ChannelAddressResolver: Send + Sync {
    fn channel_id(&self, identity: &AccountId, hub: &HubId) -> ChannelId;
    fn withdrawal_channel_id(&self, identity: &AccountId, hub: &HubId) -> ChannelId;
    fn hub_id(&self, operator: &AccountId) -> HubId;
}

/// BLAKE3 domain-separated derivation.
#[derive(Clone, Copy, Debug, Default)]
pub struct DerivedAddresses;

impl ChannelAddressResolver for DerivedAddresses {
    fn channel_id(&self, identity: &AccountId, hub: &HubId) -> ChannelId {
        channel_address(identity, hub)
    }

    fn withdrawal_channel_id(&self, identity: &AccountId, hub: &HubId) -> ChannelId {
        withdrawal_channel_address(identity, hub)
    }

    fn hub_id(&self, operator: &AccountId) -> HubId {
        hub_address(operator)
    }
}

// ── Exchange ──────────────────────────────────────────────────────────────────

/// Converts settlement payouts into an external currency.
pub trait ExchangeAdapter: Send + Sync {
    /// Ledger account that receives the tokens being converted.
    fn account(&self) -> &AccountId;

    /// External-currency amount delivered for `amount` tokens.
    fn quote(&self, amount: Balance) -> Result<Balance, HermesError>;
}

/// Exchange at a fixed `numerator / denominator` rate, rounded down.
#[derive(Clone, Debug)]
pub struct FixedRateExchange {
    pub account: AccountId,
    pub numerator: u128,
    pub denominator: u128,
}

impl ExchangeAdapter for FixedRateExchange {
    fn account(&self) -> &AccountId {
        &self.account
    }

    fn quote(&self, amount: Balance) -> Result<Balance, HermesError> {
        if self.denominator == 0 {
            return Err(HermesError::ExchangeFailed("zero rate denominator".into()));
        }
        let scaled = amount
            .checked_mul(self.numerator)
            .ok_or_else(|| HermesError::ExchangeFailed("quote overflow".into()))?;
        let quoted = scaled / self.denominator;
        if quoted == 0 && amount > 0 {
            return Err(HermesError::ExchangeFailed(format!(
                "{amount} is below the smallest convertible amount"
            )));
        }
        Ok(quoted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(numerator: u128, denominator: u128) -> FixedRateExchange {
        FixedRateExchange { account: AccountId::from_bytes([7u8; 32]), numerator, denominator }
    }

    #[test]
    fn fixed_rate_rounds_down() {
        assert_eq!(exchange(3, 2).quote(25).unwrap(), 37);
        assert_eq!(exchange(1, 1).quote(0).unwrap(), 0);
    }

    #[test]
    fn dust_and_broken_rates_fail() {
        assert!(matches!(exchange(1, 100).quote(5), Err(HermesError::ExchangeFailed(_))));
        assert!(matches!(exchange(1, 0).quote(5), Err(HermesError::ExchangeFailed(_))));
        assert!(matches!(exchange(u128::MAX, 1).quote(2), Err(HermesError::ExchangeFailed(_))));
    }

    #[test]
    fn derived_addresses_are_per_pair() {
        let a = AccountId::from_bytes([1u8; 32]);
        let b = AccountId::from_bytes([2u8; 32]);
        let hub = DerivedAddresses.hub_id(&b);
        assert_ne!(DerivedAddresses.channel_id(&a, &hub), DerivedAddresses.channel_id(&b, &hub));
        assert_eq!(DerivedAddresses.channel_id(&a, &hub), channel_address(&a, &hub));
        assert_ne!(
            DerivedAddresses.channel_id(&a, &hub),
            DerivedAddresses.withdrawal_channel_id(&a, &hub)
        );
    }
}
