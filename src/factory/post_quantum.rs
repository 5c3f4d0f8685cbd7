//! Lattice and hash-based signatures through liboqs
//!
//! Only compiled with the `post-quantum` feature.

use oqs::sig::{Algorithm, Sig};

use crate::error::{KeyStoreError, KeyStoreResult};
use crate::keys::KeyPair;
use crate::secure_memory::SecureBytes;
use crate::spec::{FalconLevel, KeyPairSpec, MlDsaLevel, SlhDsaVariant};

/// The liboqs algorithm for a key pair spec, if liboqs provides one
pub(crate) fn oqs_algorithm(spec: &KeyPairSpec) -> Option<Algorithm> {
    let algorithm = match spec {
        KeyPairSpec::MlDsa(MlDsaLevel::MlDsa44) => Algorithm::Dilithium2,
        KeyPairSpec::MlDsa(MlDsaLevel::MlDsa65) => Algorithm::Dilithium3,
        KeyPairSpec::MlDsa(MlDsaLevel::MlDsa87) => Algorithm::Dilithium5,
        KeyPairSpec::Falcon(FalconLevel::Falcon512) => Algorithm::Falcon512,
        KeyPairSpec::Falcon(FalconLevel::Falcon1024) => Algorithm::Falcon1024,
        KeyPairSpec::SlhDsa(SlhDsaVariant::Sha2_128f) => Algorithm::SphincsSha2128fSimple,
        KeyPairSpec::SlhDsa(SlhDsaVariant::Sha2_128s) => Algorithm::SphincsSha2128sSimple,
        KeyPairSpec::SlhDsa(SlhDsaVariant::Sha2_256f) => Algorithm::SphincsSha2256fSimple,
        KeyPairSpec::SlhDsa(SlhDsaVariant::Shake128f) => Algorithm::SphincsShake128fSimple,
        KeyPairSpec::SlhDsa(SlhDsaVariant::Shake256f) => Algorithm::SphincsShake256fSimple,
        _ => return None,
    };
    Some(algorithm)
}

fn sig_for(spec: &KeyPairSpec) -> KeyStoreResult<Sig> {
    let algorithm = oqs_algorithm(spec)
        .ok_or_else(|| KeyStoreError::unsupported_spec(spec, "not provided by liboqs"))?;
    Sig::new(algorithm).map_err(|e| KeyStoreError::provider_error("oqs_init", e))
}

pub(crate) fn generate(spec: &KeyPairSpec) -> KeyStoreResult<KeyPair> {
    let sig = sig_for(spec)?;
    let (public_key, secret_key) = sig
        .keypair()
        .map_err(|e| KeyStoreError::provider_error("oqs_keypair", e))?;
    Ok(KeyPair::new(
        spec.clone(),
        public_key.into_vec(),
        SecureBytes::from(secret_key.into_vec()),
    ))
}

pub(crate) fn sign(key_pair: &KeyPair, private_key: &[u8], message: &[u8]) -> KeyStoreResult<Vec<u8>> {
    let sig = sig_for(&key_pair.spec)?;
    let secret_key = sig
        .secret_key_from_bytes(private_key)
        .ok_or_else(|| KeyStoreError::key_error("oqs_sign", "malformed secret key"))?;
    let signature = sig
        .sign(message, secret_key)
        .map_err(|e| KeyStoreError::provider_error("oqs_sign", e))?;
    Ok(signature.into_vec())
}

pub(crate) fn verify(key_pair: &KeyPair, message: &[u8], signature: &[u8]) -> KeyStoreResult<bool> {
    let sig = sig_for(&key_pair.spec)?;
    let public_key = match sig.public_key_from_bytes(&key_pair.public_key) {
        Some(public_key) => public_key,
        None => return Ok(false),
    };
    let signature = match sig.signature_from_bytes(signature) {
        Some(signature) => signature,
        None => return Ok(false),
    };
    Ok(sig.verify(message, signature, public_key).is_ok())
}
