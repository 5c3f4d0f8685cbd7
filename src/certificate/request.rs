//! Certificate signing requests
//!
//! A request carries the requested identity, the public key and a signature
//! over both made with the matching private key as proof of possession.

use serde::{Deserialize, Serialize};

use super::identity::DistinguishedName;
use super::usage::KeyUsageSet;
use crate::error::{KeyStoreError, KeyStoreResult};
use crate::factory::CapabilityFactory;
use crate::keys::KeyPair;
use crate::spec::SignatureSpec;

#[derive(Serialize)]
struct RequestInfo<'a> {
    subject: &'a DistinguishedName,
    key_pair: &'a KeyPair,
    usage: KeyUsageSet,
    signature_spec: &'a SignatureSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRequest {
    subject: DistinguishedName,
    key_pair: KeyPair,
    usage: KeyUsageSet,
    signature_spec: SignatureSpec,
    signature: Vec<u8>,
}

impl CertificateRequest {
    /// Build a request signed with `key_pair`'s private key
    pub fn create(
        factory: &dyn CapabilityFactory,
        subject: DistinguishedName,
        key_pair: &KeyPair,
        usage: KeyUsageSet,
        signature_spec: SignatureSpec,
    ) -> KeyStoreResult<Self> {
        let public = key_pair.to_public();
        let info = Self::info_bytes(&subject, &public, usage, &signature_spec)?;
        let signature = factory.sign(key_pair, &signature_spec, &info)?;
        Ok(Self {
            subject,
            key_pair: public,
            usage,
            signature_spec,
            signature,
        })
    }

    fn info_bytes(
        subject: &DistinguishedName,
        key_pair: &KeyPair,
        usage: KeyUsageSet,
        signature_spec: &SignatureSpec,
    ) -> KeyStoreResult<Vec<u8>> {
        Ok(bincode::serialize(&RequestInfo {
            subject,
            key_pair,
            usage,
            signature_spec,
        })?)
    }

    /// Check the proof-of-possession signature
    pub fn verify(&self, factory: &dyn CapabilityFactory) -> KeyStoreResult<bool> {
        if !factory.supports_signature_spec(&self.signature_spec)
            || !factory.key_pair_supports(&self.key_pair.spec, &self.signature_spec)
        {
            return Ok(false);
        }
        let info = Self::info_bytes(&self.subject, &self.key_pair, self.usage, &self.signature_spec)?;
        factory.verify(&self.key_pair, &self.signature_spec, &info, &self.signature)
    }

    pub fn subject(&self) -> &DistinguishedName {
        &self.subject
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    pub fn usage(&self) -> KeyUsageSet {
        self.usage
    }

    pub fn signature_spec(&self) -> &SignatureSpec {
        &self.signature_spec
    }

    pub fn encode(&self) -> KeyStoreResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> KeyStoreResult<Self> {
        let request: Self = bincode::deserialize(bytes)?;
        if request.key_pair.has_private_key() {
            return Err(KeyStoreError::InvalidRequest(
                "request embeds private key material".to_string(),
            ));
        }
        Ok(request)
    }
}
