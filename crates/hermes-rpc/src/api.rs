use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcAccount, RpcChannel, RpcHub, RpcPolicy};

/// Hermes JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "hermes_" via `namespace = "hermes"`.
/// Account and hub ids are base-58, channel ids are hex.
#[rpc(server, namespace = "hermes")]
pub trait HermesApi {
    /// Get ledger state by base-58 account ID. Null for never-seen accounts.
    #[method(name = "getAccount")]
    async fn get_account(&self, account_id: String) -> RpcResult<Option<RpcAccount>>;

    /// Ledger balance (u128 as string). Zero for unknown accounts.
    #[method(name = "getBalance")]
    async fn get_balance(&self, account_id: String) -> RpcResult<String>;

    #[method(name = "getHub")]
    async fn get_hub(&self, hub_id: String) -> RpcResult<Option<RpcHub>>;

    #[method(name = "describeHub")]
    async fn describe_hub(&self, hub_id: String) -> RpcResult<String>;

    #[method(name = "getChannel")]
    async fn get_channel(&self, channel_id: String) -> RpcResult<Option<RpcChannel>>;

    /// Channel id hex for `identity` at `hub_id`, whether or not it is open yet.
    #[method(name = "getChannelId")]
    async fn get_channel_id(&self, identity: String, hub_id: String) -> RpcResult<String>;

    /// Hub fee on settling `amount` (u128 as string) at the node's clock.
    #[method(name = "calculateFee")]
    async fn calculate_fee(&self, hub_id: String, amount: String) -> RpcResult<String>;

    #[method(name = "getPolicy")]
    async fn get_policy(&self) -> RpcResult<RpcPolicy>;

    /// Submit a signed transaction. `tx_hex` is hex-encoded bincode(Transaction).
    /// Returns the TxId hex once queued; application happens asynchronously.
    #[method(name = "sendTransaction")]
    async fn send_transaction(&self, tx_hex: String) -> RpcResult<String>;
}
