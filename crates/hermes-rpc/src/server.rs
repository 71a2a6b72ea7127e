use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tracing::{info, warn};

use hermes_core::config::HubPolicy;
use hermes_core::error::HermesError;
use hermes_core::hub::Hub;
use hermes_core::transaction::Transaction;
use hermes_core::types::{AccountId, Balance, ChannelId, HubId};
use hermes_state::{
    AccountStore, ChannelAddressResolver, ChannelStore, DerivedAddresses, HubQuery, StateDb,
};

use crate::api::HermesApiServer;
use crate::types::{RpcAccount, RpcChannel, RpcHub, RpcPolicy};

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

fn internal(e: HermesError) -> ErrorObject<'static> {
    rpc_err(-32603, e.to_string())
}

fn parse_account(s: &str) -> Result<AccountId, ErrorObject<'static>> {
    AccountId::from_b58(s).map_err(|e| rpc_err(-32602, format!("invalid account id: {e}")))
}

fn parse_amount(s: &str) -> Result<Balance, ErrorObject<'static>> {
    s.parse().map_err(|e| rpc_err(-32602, format!("invalid amount: {e}")))
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub db: Arc<StateDb>,
    pub policy: HubPolicy,
    /// Optional sender to forward incoming transactions to the node pipeline.
    pub tx_sender: Option<tokio::sync::mpsc::Sender<Transaction>>,
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr`. Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let server = Server::builder().build(addr).await?;
        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "RPC server started");
        Ok(handle)
    }

    fn query(&self) -> HubQuery<'_, StateDb> {
        HubQuery::new(self.state.db.as_ref())
    }

    /// `None` for an unregistered hub; storage failures still error.
    fn find_hub(&self, hub_id: &HubId) -> RpcResult<Option<Hub>> {
        match self.query().hub(hub_id) {
            Ok(hub) => Ok(Some(hub)),
            Err(HermesError::UnknownHub(_)) => Ok(None),
            Err(e) => Err(internal(e)),
        }
    }
}

#[async_trait]
impl HermesApiServer for RpcServer {
    async fn get_account(&self, account_id: String) -> RpcResult<Option<RpcAccount>> {
        let id = parse_account(&account_id)?;
        let acc = self.state.db.get_account(&id).map_err(internal)?;
        Ok(acc.as_ref().map(RpcAccount::from))
    }

    async fn get_balance(&self, account_id: String) -> RpcResult<String> {
        let id = parse_account(&account_id)?;
        let balance = self.query().balance_of(&id).map_err(internal)?;
        Ok(balance.to_string())
    }

    async fn get_hub(&self, hub_id: String) -> RpcResult<Option<RpcHub>> {
        let id = parse_account(&hub_id)?;
        let Some(hub) = self.find_hub(&id)? else { return Ok(None); };
        let ledger = self.query().balance_of(&id).map_err(internal)?;
        let now = chrono::Utc::now().timestamp();
        Ok(Some(RpcHub::new(&hub, ledger, now)))
    }

    async fn describe_hub(&self, hub_id: String) -> RpcResult<String> {
        let id = parse_account(&hub_id)?;
        let now = chrono::Utc::now().timestamp();
        self.query().describe(&id, now).map_err(|e| match e {
            HermesError::UnknownHub(_) => rpc_err(-32602, e.to_string()),
            other => internal(other),
        })
    }

    async fn get_channel(&self, channel_id: String) -> RpcResult<Option<RpcChannel>> {
        let id = ChannelId::from_hex(&channel_id)
            .map_err(|e| rpc_err(-32602, format!("invalid channel id: {e}")))?;
        let channel = self.state.db.get_channel(&id).map_err(internal)?;
        Ok(channel.as_ref().map(RpcChannel::from))
    }

    async fn get_channel_id(&self, identity: String, hub_id: String) -> RpcResult<String> {
        let identity = parse_account(&identity)?;
        let hub = parse_account(&hub_id)?;
        Ok(DerivedAddresses.channel_id(&identity, &hub).to_hex())
    }

    async fn calculate_fee(&self, hub_id: String, amount: String) -> RpcResult<String> {
        let id = parse_account(&hub_id)?;
        let amount = parse_amount(&amount)?;
        let now = chrono::Utc::now().timestamp();
        let fee = self
            .query()
            .calculate_fee(&id, amount, now, &self.state.policy)
            .map_err(|e| match e {
                HermesError::UnknownHub(_) => rpc_err(-32602, e.to_string()),
                other => internal(other),
            })?;
        Ok(fee.to_string())
    }

    async fn get_policy(&self) -> RpcResult<RpcPolicy> {
        Ok(RpcPolicy::from(&self.state.policy))
    }

    async fn send_transaction(&self, tx_hex: String) -> RpcResult<String> {
        let tx_bytes =
            hex::decode(&tx_hex).map_err(|e| rpc_err(-32602, format!("invalid hex: {e}")))?;

        let tx: Transaction = bincode::deserialize(&tx_bytes)
            .map_err(|e| rpc_err(-32602, format!("invalid transaction encoding: {e}")))?;

        let tx_id = tx.tx_id.to_hex();

        if let Some(sender) = &self.state.tx_sender {
            sender
                .send(tx)
                .await
                .map_err(|_| rpc_err(-32603, "transaction queue closed"))?;
        } else {
            warn!("RPC: sendTransaction called but no tx pipeline configured");
            return Err(rpc_err(-32603, "node tx pipeline not connected"));
        }

        Ok(tx_id)
    }
}
