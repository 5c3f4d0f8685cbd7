//! Chain-of-trust validation

use chrono::{DateTime, Utc};
use log::{debug, warn};

use super::cert::Certificate;
use crate::error::{ChainFailure, KeyStoreError, KeyStoreResult};
use crate::factory::CapabilityFactory;

/// Validate a leaf-to-root chain as of `now`.
///
/// Each certificate must be inside its validity window, name the subject of
/// the next certificate as its issuer and verify under that certificate's
/// key. The last certificate must be a self-signed root. The first failing
/// link is reported with its index.
pub fn verify_chain(
    factory: &dyn CapabilityFactory,
    chain: &[Certificate],
    now: DateTime<Utc>,
) -> KeyStoreResult<()> {
    let result = check_links(factory, chain, now);
    if let Err(KeyStoreError::ChainValidation { index, reason }) = &result {
        warn!("Certificate chain rejected at index {}: {}", index, reason);
    }
    result
}

/// [`verify_chain`] against the current time
pub fn verify_chain_now(factory: &dyn CapabilityFactory, chain: &[Certificate]) -> KeyStoreResult<()> {
    verify_chain(factory, chain, Utc::now())
}

fn check_links(
    factory: &dyn CapabilityFactory,
    chain: &[Certificate],
    now: DateTime<Utc>,
) -> KeyStoreResult<()> {
    if chain.is_empty() {
        return Err(KeyStoreError::chain_failure(0, ChainFailure::UntrustedRoot));
    }

    for (index, certificate) in chain.iter().enumerate() {
        if now < certificate.not_before() {
            return Err(KeyStoreError::chain_failure(index, ChainFailure::NotYetValid));
        }
        if now > certificate.not_after() {
            return Err(KeyStoreError::chain_failure(index, ChainFailure::Expired));
        }

        match chain.get(index + 1) {
            Some(issuer) => {
                if certificate.issuer() != issuer.subject() {
                    return Err(KeyStoreError::chain_failure(index, ChainFailure::IssuerMismatch));
                }
                if !certificate.verify_signature(factory, issuer.key_pair())? {
                    return Err(KeyStoreError::chain_failure(index, ChainFailure::SignatureInvalid));
                }
            }
            None => {
                if certificate.subject() != certificate.issuer() {
                    return Err(KeyStoreError::chain_failure(index, ChainFailure::UntrustedRoot));
                }
                if !certificate.verify_signature(factory, certificate.key_pair())? {
                    return Err(KeyStoreError::chain_failure(index, ChainFailure::SignatureInvalid));
                }
            }
        }
    }

    debug!("Verified certificate chain of length {}", chain.len());
    Ok(())
}
