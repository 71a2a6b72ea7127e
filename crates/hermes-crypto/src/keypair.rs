use hermes_core::types::{AccountId, DilithiumPublicKey, DilithiumSignature};
use pqcrypto_dilithium::dilithium2;
use pqcrypto_traits::sign::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::dilithium::SignatureError;
use crate::hash::account_id_from_pubkey;

/// Dilithium2 keypair with its derived AccountId. Operators, owners and
/// channel identities all sign with one of these.
#[derive(Serialize, Deserialize)]
pub struct KeyPair {
    pub account_id: AccountId,
    pub public_key: DilithiumPublicKey,
    secret_key: Vec<u8>,
}

impl KeyPair {
    pub fn generate() -> Self {
        let (pk, sk) = dilithium2::keypair();
        Self::from_raw(pk.as_bytes().to_vec(), sk.as_bytes().to_vec())
    }

    /// Restore a keypair from raw bytes (e.g. a keyfile).
    pub fn from_raw(pk_bytes: Vec<u8>, sk_bytes: Vec<u8>) -> Self {
        Self {
            account_id: account_id_from_pubkey(&pk_bytes),
            public_key: DilithiumPublicKey(pk_bytes),
            secret_key: sk_bytes,
        }
    }

    pub fn sign(&self, message: &[u8]) -> Result<DilithiumSignature, SignatureError> {
        crate::dilithium::sign(&self.secret_key, message)
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.secret_key.zeroize();
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ account_id: {:?} }}", self.account_id)
    }
}
