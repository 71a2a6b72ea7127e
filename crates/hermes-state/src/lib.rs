//! hermes-state
//!
//! Settlement state and the engine that mutates it. The engine is written
//! against the store traits in [`store`]; [`StateDb`] persists to sled and
//! [`MemoryStore`] keeps everything in memory.

pub mod db;
pub mod engine;
pub mod ledger;
pub mod lifecycle;
pub mod memory;
pub mod query;
pub mod settlement;
pub mod stake;
pub mod staged;
pub mod store;

#[cfg(test)]
mod fixtures;

pub use db::StateDb;
pub use engine::{Context, Outcome, SettlementEngine};
pub use memory::MemoryStore;
pub use query::HubQuery;
pub use settlement::{SettleMode, SettlementReceipt};
pub use staged::Staged;
pub use store::{
    AccountStore, ChannelAddressResolver, ChannelStore, DerivedAddresses, ExchangeAdapter,
    FixedRateExchange, HubStore, Store, TokenLedger,
};
