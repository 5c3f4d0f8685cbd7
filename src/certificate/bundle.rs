//! Certificate bundles: an ordered, lock-free list of certificates

use super::cert::Certificate;
use crate::error::{KeyStoreError, KeyStoreResult};

const BUNDLE_MAGIC: [u8; 4] = *b"QCRT";

/// Encode certificates in order, leaf first
pub fn encode_certificates(certificates: &[Certificate]) -> KeyStoreResult<Vec<u8>> {
    let mut out = BUNDLE_MAGIC.to_vec();
    out.extend(bincode::serialize(certificates)?);
    Ok(out)
}

/// Decode a bundle written by [`encode_certificates`]
pub fn decode_certificates(bytes: &[u8]) -> KeyStoreResult<Vec<Certificate>> {
    let body = bytes
        .strip_prefix(&BUNDLE_MAGIC[..])
        .ok_or_else(|| KeyStoreError::SerializationError("not a certificate bundle".to_string()))?;
    let certificates: Vec<Certificate> = bincode::deserialize(body)?;
    if certificates.is_empty() {
        return Err(KeyStoreError::SerializationError(
            "certificate bundle is empty".to_string(),
        ));
    }
    Ok(certificates)
}
