//! hermes-genesis
//!
//! Seeds the initial token balances into a fresh `StateDb`, writing
//! accounts directly without going through the settlement engine. This is
//! the one and only place where tokens are created.

pub mod params;

pub use params::{GenesisAllocation, GenesisParams};

use std::collections::BTreeSet;

use hermes_core::account::Account;
use hermes_core::error::HermesError;
use hermes_core::types::{AccountId, Balance};
use hermes_state::{AccountStore, StateDb, Store};
use tracing::info;

/// Meta key recording the genesis supply once applied.
pub const GENESIS_META_KEY: &str = "genesis_supply";

/// Total supply minted at genesis, or `None` on a fresh database.
pub fn genesis_supply(db: &StateDb) -> Result<Option<Balance>, HermesError> {
    match db.get_meta(GENESIS_META_KEY)? {
        Some(bytes) => {
            let raw: [u8; 16] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| HermesError::Serialization("corrupt genesis marker".into()))?;
            Ok(Some(Balance::from_le_bytes(raw)))
        }
        None => Ok(None),
    }
}

/// Apply the genesis allocations to an empty `StateDb`. Returns the total
/// supply created.
///
/// Fails with `GenesisAlreadyApplied` on a database that already has a
/// genesis, and with `InvalidGenesis` for malformed, zero or duplicate
/// allocations.
pub fn apply_genesis(db: &StateDb, params: &GenesisParams) -> Result<Balance, HermesError> {
    if genesis_supply(db)?.is_some() {
        return Err(HermesError::GenesisAlreadyApplied);
    }
    info!(allocations = params.allocations.len(), "applying Hermes genesis state");

    let mut seen = BTreeSet::new();
    let mut accounts = Vec::with_capacity(params.allocations.len());
    for alloc in &params.allocations {
        let id = AccountId::from_b58(&alloc.account)
            .map_err(|e| HermesError::InvalidGenesis(format!("{}: {e}", alloc.account)))?;
        if alloc.balance == 0 {
            return Err(HermesError::InvalidGenesis(format!("{id}: zero balance")));
        }
        if !seen.insert(id.clone()) {
            return Err(HermesError::InvalidGenesis(format!("{id}: allocated twice")));
        }
        let mut acc = Account::new(id);
        acc.balance = alloc.balance;
        accounts.push(acc);
    }

    let mut total: Balance = 0;
    for acc in &accounts {
        db.put_account(acc)?;
        total += acc.balance;
        info!(account = %acc.account_id, balance = acc.balance, "genesis: allocation");
    }
    db.put_meta(GENESIS_META_KEY, &total.to_le_bytes())?;
    db.flush()?;
    info!(total, "genesis state committed to disk");
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("hermes_genesis_test_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).unwrap()
    }

    fn alloc(byte: u8, balance: Balance) -> GenesisAllocation {
        GenesisAllocation { account: AccountId::from_bytes([byte; 32]).to_b58(), balance }
    }

    #[test]
    fn genesis_supply_is_exact() {
        let db = temp_db("supply");
        let params = GenesisParams { allocations: vec![alloc(1, 700), alloc(2, 300)] };

        assert_eq!(genesis_supply(&db).unwrap(), None);
        assert_eq!(apply_genesis(&db, &params).unwrap(), 1_000);
        assert_eq!(genesis_supply(&db).unwrap(), Some(1_000));

        let acc = db.get_account(&AccountId::from_bytes([1u8; 32])).unwrap().unwrap();
        assert_eq!((acc.balance, acc.nonce), (700, 0));
    }

    #[test]
    fn genesis_applies_once() {
        let db = temp_db("once");
        let params = GenesisParams { allocations: vec![alloc(1, 5)] };
        apply_genesis(&db, &params).unwrap();
        assert!(matches!(apply_genesis(&db, &params), Err(HermesError::GenesisAlreadyApplied)));
    }

    #[test]
    fn malformed_allocations_rejected() {
        let db = temp_db("malformed");
        let dup = GenesisParams { allocations: vec![alloc(1, 5), alloc(1, 6)] };
        assert!(matches!(apply_genesis(&db, &dup), Err(HermesError::InvalidGenesis(_))));

        let zero = GenesisParams { allocations: vec![alloc(1, 0)] };
        assert!(matches!(apply_genesis(&db, &zero), Err(HermesError::InvalidGenesis(_))));

        let junk = GenesisParams {
            allocations: vec![GenesisAllocation { account: "not-base58!".into(), balance: 1 }],
        };
        assert!(matches!(apply_genesis(&db, &junk), Err(HermesError::InvalidGenesis(_))));
        assert_eq!(genesis_supply(&db).unwrap(), None);
    }

    #[test]
    fn params_parse_from_json() {
        let id = AccountId::from_bytes([4u8; 32]).to_b58();
        let json = format!(r#"{{ "allocations": [ {{ "account": "{id}", "balance": 250 }} ] }}"#);
        let params = GenesisParams::from_json(&json).unwrap();
        assert_eq!(params.allocations, vec![alloc(4, 250)]);
    }
}
