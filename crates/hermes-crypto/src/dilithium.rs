use hermes_core::types::{DilithiumPublicKey, DilithiumSignature};
use pqcrypto_dilithium::dilithium2;
use pqcrypto_traits::sign::{DetachedSignature, PublicKey, SecretKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid secret key")]
    InvalidSecretKey,
    #[error("invalid public key length: expected {expected}, got {got}")]
    InvalidPublicKeyLength { expected: usize, got: usize },
}

/// Sign `message` with a Dilithium2 secret key.
/// Returns a detached signature.
pub fn sign(secret_key_bytes: &[u8], message: &[u8]) -> Result<DilithiumSignature, SignatureError> {
    let sk = dilithium2::SecretKey::from_bytes(secret_key_bytes)
        .map_err(|_| SignatureError::InvalidSecretKey)?;
    let sig = dilithium2::detached_sign(message, &sk);
    Ok(DilithiumSignature(sig.as_bytes().to_vec()))
}

/// Verify a detached Dilithium2 signature against the expected signer's key.
pub fn verify_signature(
    public_key: &DilithiumPublicKey,
    message: &[u8],
    signature: &DilithiumSignature,
) -> Result<(), SignatureError> {
    let pk = dilithium2::PublicKey::from_bytes(&public_key.0).map_err(|_| {
        SignatureError::InvalidPublicKeyLength {
            expected: dilithium2::public_key_bytes(),
            got: public_key.0.len(),
        }
    })?;
    let sig = dilithium2::DetachedSignature::from_bytes(&signature.0)
        .map_err(|_| SignatureError::InvalidSignature)?;
    dilithium2::verify_detached_signature(&sig, message, &pk)
        .map_err(|_| SignatureError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_checks_message_and_key() {
        let (pk, sk) = dilithium2::keypair();
        let (other_pk, _) = dilithium2::keypair();
        let pk = DilithiumPublicKey(pk.as_bytes().to_vec());
        let other_pk = DilithiumPublicKey(other_pk.as_bytes().to_vec());

        let sig = sign(sk.as_bytes(), b"promise").unwrap();
        assert!(verify_signature(&pk, b"promise", &sig).is_ok());
        assert!(verify_signature(&pk, b"promisf", &sig).is_err());
        assert!(verify_signature(&other_pk, b"promise", &sig).is_err());
    }

    #[test]
    fn malformed_key_reports_length() {
        let (_, sk) = dilithium2::keypair();
        let sig = sign(sk.as_bytes(), b"m").unwrap();
        let err = verify_signature(&DilithiumPublicKey(vec![0u8; 3]), b"m", &sig).unwrap_err();
        assert!(matches!(err, SignatureError::InvalidPublicKeyLength { got: 3, .. }));
    }
}
