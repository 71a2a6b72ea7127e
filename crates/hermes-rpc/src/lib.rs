//! hermes-rpc
//!
//! JSON-RPC 2.0 server for Hermes nodes.
//!
//! Namespace: "hermes"
//! Methods:
//!   hermes_getAccount        ledger balance and nonce
//!   hermes_getBalance        ledger balance only
//!   hermes_getHub            hub state with available balance and current fee
//!   hermes_describeHub       one-line human-readable hub summary
//!   hermes_getChannel        channel state by channel id hex
//!   hermes_getChannelId      derive the channel id of an (identity, hub) pair
//!   hermes_calculateFee      hub fee owed on a settlement amount right now
//!   hermes_getPolicy         the economic policy the node runs with
//!   hermes_sendTransaction   submit a signed transaction (hex-encoded bincode)

pub mod api;
pub mod server;
pub mod types;

pub use server::RpcServer;
pub use server::RpcServerState;
pub use types::{RpcAccount, RpcChannel, RpcHub, RpcPolicy};
