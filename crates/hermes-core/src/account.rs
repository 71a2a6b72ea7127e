use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Balance, Nonce};

/// Token ledger account. Hubs hold their funds in an account keyed by the
/// hub id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: AccountId,
    pub balance: Balance,
    /// Next expected transaction nonce.
    pub nonce: Nonce,
}

impl Account {
    pub fn new(account_id: AccountId) -> Self {
        Self { account_id, balance: 0, nonce: 0 }
    }
}
