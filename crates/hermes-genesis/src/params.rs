use hermes_core::error::HermesError;
use hermes_core::types::Balance;
use serde::{Deserialize, Serialize};

/// One initial ledger balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAllocation {
    /// Base-58 account id.
    pub account: String,
    pub balance: Balance,
}

/// Initial token distribution. Read from JSON by the node on first start.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisParams {
    pub allocations: Vec<GenesisAllocation>,
}

impl GenesisParams {
    pub fn from_json(json: &str) -> Result<Self, HermesError> {
        serde_json::from_str(json).map_err(|e| HermesError::Serialization(e.to_string()))
    }
}
