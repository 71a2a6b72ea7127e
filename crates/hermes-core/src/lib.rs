//! hermes-core
//!
//! Shared data model for the Hermes settlement hub: primitive types, the
//! error taxonomy, protocol constants and policy, the Channel / Hub / fee
//! schedule records with their mutation rules, signed request messages and
//! the signed transaction envelope.

pub mod account;
pub mod channel;
pub mod config;
pub mod constants;
pub mod error;
pub mod fee;
pub mod hub;
pub mod message;
pub mod transaction;
pub mod types;

pub use account::Account;
pub use channel::{Channel, ChannelKind};
pub use config::HubPolicy;
pub use constants::*;
pub use error::HermesError;
pub use fee::{FeeSchedule, HubFee};
pub use hub::{Hub, HubStatus, Punishment};
pub use message::*;
pub use transaction::*;
pub use types::*;
