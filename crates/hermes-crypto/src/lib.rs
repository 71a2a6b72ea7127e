pub mod codec;
pub mod dilithium;
pub mod hash;
pub mod keypair;

pub use codec::{
    sign_beneficiary_change, sign_fast_withdrawal, sign_pay_and_settle_beneficiary, sign_promise,
    sign_stake_change, sign_stake_goal_change, sign_transaction, verify_message,
    verify_transaction, Signed,
};
pub use dilithium::{verify_signature, SignatureError};
pub use hash::{
    account_id_from_pubkey, blake3_hash, channel_address, hashlock_of, hub_address, new_lock,
    tx_id_from_body, withdrawal_channel_address,
};
pub use keypair::KeyPair;
