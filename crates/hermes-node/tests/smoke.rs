//! End-to-end smoke test for hermes-node.
//!
//! Starts a real node process with a fresh genesis, drives a hub through
//! registration, channel opening and one settlement over JSON-RPC, and
//! checks the resulting balances.
//!
//! Run with:
//!   cargo test -p hermes-node --test smoke

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use hermes_core::transaction::{Action, Transaction};
use hermes_crypto::{new_lock, sign_promise, sign_transaction, KeyPair};
use hermes_genesis::{GenesisAllocation, GenesisParams};

// ── Node lifecycle ────────────────────────────────────────────────────────────

struct NodeGuard {
    child: Child,
    data_dir: PathBuf,
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

/// Find a free TCP port on loopback.
fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

// ── RPC helpers ───────────────────────────────────────────────────────────────

async fn rpc_call(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    });
    let resp = client
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap_or_else(|e| panic!("RPC call {method} failed: {e}"));
    let json: serde_json::Value = resp.json().await.expect("parse RPC JSON");
    if let Some(err) = json.get("error") {
        panic!("RPC error from {method}: {err}");
    }
    json["result"].clone()
}

/// Poll until the RPC server responds or the timeout elapses.
async fn wait_for_rpc(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": "hermes_getPolicy",
        "params": [],
        "id": 1
    });
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(resp) = client.post(url).json(&body).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    false
}

async fn get_balance(client: &reqwest::Client, url: &str, account_id: &str) -> u128 {
    let result = rpc_call(client, url, "hermes_getBalance", serde_json::json!([account_id])).await;
    result.as_str().unwrap().parse().expect("parse balance")
}

async fn get_nonce(client: &reqwest::Client, url: &str, account_id: &str) -> u64 {
    let result = rpc_call(client, url, "hermes_getAccount", serde_json::json!([account_id])).await;
    if result.is_null() {
        return 0;
    }
    result["nonce"].as_u64().expect("nonce field")
}

async fn send_tx(client: &reqwest::Client, url: &str, tx: &Transaction) -> String {
    let bytes = bincode::serialize(tx).expect("serialize tx");
    let tx_hex = hex::encode(bytes);
    let result = rpc_call(client, url, "hermes_sendTransaction", serde_json::json!([tx_hex])).await;
    result.as_str().expect("tx_id string").to_string()
}

/// Sign `action` with the sender's next nonce, submit it and give the node's
/// apply loop time to process it.
async fn submit(client: &reqwest::Client, url: &str, kp: &KeyPair, action: Action) -> Transaction {
    let nonce = get_nonce(client, url, &kp.account_id.to_b58()).await;
    let tx = sign_transaction(kp, nonce, chrono::Utc::now().timestamp(), action).unwrap();
    send_tx(client, url, &tx).await;
    tokio::time::sleep(Duration::from_millis(600)).await;
    tx
}

fn amount(v: &serde_json::Value) -> u128 {
    v.as_str().expect("amount string").parse().expect("parse amount")
}

// ── Smoke test ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn smoke_hub_settlement() {
    // ── 1. Prepare temp dir, genesis and policy ───────────────────────────────
    let data_dir = std::env::temp_dir().join(format!("hermes_e2e_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    let owner = KeyPair::generate();
    let operator = KeyPair::generate();
    let client = KeyPair::generate();
    let submitter = KeyPair::generate();

    let params = GenesisParams {
        allocations: vec![GenesisAllocation { account: owner.account_id.to_b58(), balance: 10_000 }],
    };
    let genesis_path = data_dir.join("genesis.json");
    std::fs::write(&genesis_path, serde_json::to_string(&params).unwrap()).unwrap();

    let policy_path = data_dir.join("policy.json");
    std::fs::write(&policy_path, r#"{ "min_hub_stake": 500 }"#).unwrap();

    // ── 2. Start node ─────────────────────────────────────────────────────────
    let rpc_port = free_port();
    let rpc_url = format!("http://127.0.0.1:{}", rpc_port);

    let node_bin = env!("CARGO_BIN_EXE_hermes-node");
    let child = Command::new(node_bin)
        .args([
            "--data-dir", data_dir.join("state").to_str().unwrap(),
            "--rpc-addr", &format!("127.0.0.1:{}", rpc_port),
            "--genesis",  genesis_path.to_str().unwrap(),
            "--policy",   policy_path.to_str().unwrap(),
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn hermes-node");

    let _guard = NodeGuard { child, data_dir };

    // ── 3. Wait for RPC ready ─────────────────────────────────────────────────
    let http = reqwest::Client::new();
    assert!(
        wait_for_rpc(&http, &rpc_url, Duration::from_secs(20)).await,
        "hermes-node did not become ready within 20 seconds"
    );

    let policy = rpc_call(&http, &rpc_url, "hermes_getPolicy", serde_json::json!([])).await;
    assert_eq!(amount(&policy["min_hub_stake"]), 500);

    let owner_b58 = owner.account_id.to_b58();
    assert_eq!(get_balance(&http, &rpc_url, &owner_b58).await, 10_000);

    // ── 4. Register a hub staked by the owner ─────────────────────────────────
    submit(
        &http,
        &rpc_url,
        &owner,
        Action::RegisterHub {
            operator_key: operator.public_key.clone(),
            owner: owner.account_id.clone(),
            stake: 1_000,
            fee: 250,
            min_stake: 25,
            max_stake: 50_000,
        },
    )
    .await;

    let hub_id = hermes_crypto::hub_address(&operator.account_id);
    let hub_b58 = hub_id.to_b58();
    let hub = rpc_call(&http, &rpc_url, "hermes_getHub", serde_json::json!([hub_b58])).await;
    assert_eq!(hub["status"], "active");
    assert_eq!(amount(&hub["stake"]), 1_000);
    assert_eq!(hub["current_fee_bp"], 250);

    let fee = rpc_call(&http, &rpc_url, "hermes_calculateFee", serde_json::json!([hub_b58, "1000"])).await;
    assert_eq!(amount(&fee), 25);

    // ── 5. Open a channel for the client ──────────────────────────────────────
    submit(
        &http,
        &rpc_url,
        &owner,
        Action::OpenChannel {
            hub_id: hub_id.clone(),
            identity_key: client.public_key.clone(),
            beneficiary: client.account_id.clone(),
            stake: 100,
        },
    )
    .await;

    let channel_hex = rpc_call(
        &http,
        &rpc_url,
        "hermes_getChannelId",
        serde_json::json!([client.account_id.to_b58(), hub_b58]),
    )
    .await;
    let channel_hex = channel_hex.as_str().expect("channel id hex").to_string();
    let channel = rpc_call(&http, &rpc_url, "hermes_getChannel", serde_json::json!([channel_hex])).await;
    assert_eq!(amount(&channel["stake"]), 100);
    assert_eq!(amount(&channel["balance"]), 100);
    assert_eq!(get_balance(&http, &rpc_url, &owner_b58).await, 8_900);

    // ── 6. Settle a promise submitted by a third party ───────────────────────
    let channel_id = hermes_core::types::ChannelId::from_hex(&channel_hex).unwrap();
    let (secret, lock) = new_lock();
    let promise = sign_promise(&operator, &channel_id, 100, 2, lock).unwrap();
    let settle = submit(
        &http,
        &rpc_url,
        &submitter,
        Action::SettlePromise { promise, preimage: secret },
    )
    .await;

    assert_eq!(get_balance(&http, &rpc_url, &client.account_id.to_b58()).await, 95);
    assert_eq!(get_balance(&http, &rpc_url, &submitter.account_id.to_b58()).await, 2);

    let channel = rpc_call(&http, &rpc_url, "hermes_getChannel", serde_json::json!([channel_hex])).await;
    assert_eq!(amount(&channel["settled"]), 100);
    assert_eq!(amount(&channel["balance"]), 0);
    assert_eq!(amount(&channel["fees_paid"]), 3);

    let hub = rpc_call(&http, &rpc_url, "hermes_getHub", serde_json::json!([hub_b58])).await;
    assert_eq!(amount(&hub["ledger_balance"]), 1_003);
    assert_eq!(amount(&hub["available_balance"]), 3);

    // ── 7. A replayed transaction is rejected and changes nothing ─────────────
    send_tx(&http, &rpc_url, &settle).await;
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(get_balance(&http, &rpc_url, &client.account_id.to_b58()).await, 95);
    assert_eq!(get_nonce(&http, &rpc_url, &submitter.account_id.to_b58()).await, 1);
}
