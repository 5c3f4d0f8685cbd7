//! Signed certificates and the builder that issues them

use chrono::{DateTime, Duration, Utc};
use log::debug;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::hash::{Hash, Hasher};

use super::identity::DistinguishedName;
use super::usage::{KeyUsage, KeyUsageSet};
use crate::error::{KeyStoreError, KeyStoreResult};
use crate::factory::CapabilityFactory;
use crate::keys::KeyPair;
use crate::spec::SignatureSpec;

/// The signed portion of a certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TbsCertificate {
    pub serial: u64,
    pub subject: DistinguishedName,
    pub issuer: DistinguishedName,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub usage: KeyUsageSet,
    /// Public half of the certified key pair
    pub key_pair: KeyPair,
}

#[derive(Serialize, Deserialize)]
struct CertificateEncoding {
    tbs: Vec<u8>,
    signature_spec: SignatureSpec,
    signature: Vec<u8>,
}

/// An immutable signed certificate.
///
/// Two certificates are equal when their encoded forms are byte-identical.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Certificate {
    tbs: TbsCertificate,
    tbs_bytes: Vec<u8>,
    signature_spec: SignatureSpec,
    signature: Vec<u8>,
    encoded: Vec<u8>,
}

impl Certificate {
    fn assemble(
        tbs: TbsCertificate,
        signature_spec: SignatureSpec,
        signature: Vec<u8>,
    ) -> KeyStoreResult<Self> {
        let tbs_bytes = bincode::serialize(&tbs)?;
        Self::from_parts(tbs, tbs_bytes, signature_spec, signature)
    }

    fn from_parts(
        tbs: TbsCertificate,
        tbs_bytes: Vec<u8>,
        signature_spec: SignatureSpec,
        signature: Vec<u8>,
    ) -> KeyStoreResult<Self> {
        let encoded = bincode::serialize(&CertificateEncoding {
            tbs: tbs_bytes.clone(),
            signature_spec: signature_spec.clone(),
            signature: signature.clone(),
        })?;
        Ok(Self {
            tbs,
            tbs_bytes,
            signature_spec,
            signature,
            encoded,
        })
    }

    /// Decode a certificate from its binary form
    pub fn decode(bytes: &[u8]) -> KeyStoreResult<Self> {
        let encoding: CertificateEncoding = bincode::deserialize(bytes)?;
        // one certificate, one encoding: trailing bytes are rejected
        if bincode::serialized_size(&encoding)? != bytes.len() as u64 {
            return Err(KeyStoreError::SerializationError(
                "trailing data after certificate".to_string(),
            ));
        }
        let tbs: TbsCertificate = bincode::deserialize(&encoding.tbs)?;
        if tbs.key_pair.has_private_key() {
            return Err(KeyStoreError::SerializationError(
                "certificate embeds private key material".to_string(),
            ));
        }
        Ok(Self {
            tbs,
            tbs_bytes: encoding.tbs,
            signature_spec: encoding.signature_spec,
            signature: encoding.signature,
            encoded: bytes.to_vec(),
        })
    }

    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn tbs(&self) -> &TbsCertificate {
        &self.tbs
    }

    pub fn serial(&self) -> u64 {
        self.tbs.serial
    }

    pub fn subject(&self) -> &DistinguishedName {
        &self.tbs.subject
    }

    pub fn issuer(&self) -> &DistinguishedName {
        &self.tbs.issuer
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.tbs.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.tbs.not_after
    }

    pub fn usage(&self) -> KeyUsageSet {
        self.tbs.usage
    }

    /// The certified public key
    pub fn key_pair(&self) -> &KeyPair {
        &self.tbs.key_pair
    }

    pub fn signature_spec(&self) -> &SignatureSpec {
        &self.signature_spec
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// `not_before <= date <= not_after`
    pub fn is_valid_on_date(&self, date: DateTime<Utc>) -> bool {
        self.tbs.not_before <= date && date <= self.tbs.not_after
    }

    /// Whether the stored signature verifies under `issuer_key`.
    ///
    /// A signature spec the issuer key cannot use is a failed verification.
    pub fn verify_signature(
        &self,
        factory: &dyn CapabilityFactory,
        issuer_key: &KeyPair,
    ) -> KeyStoreResult<bool> {
        if !factory.key_pair_supports(&issuer_key.spec, &self.signature_spec)
            || !factory.supports_signature_spec(&self.signature_spec)
        {
            return Ok(false);
        }
        factory.verify(issuer_key, &self.signature_spec, &self.tbs_bytes, &self.signature)
    }

    /// Subject equals issuer and the certificate verifies under its own key
    pub fn is_self_signed(&self, factory: &dyn CapabilityFactory) -> bool {
        self.tbs.subject == self.tbs.issuer
            && matches!(self.verify_signature(factory, &self.tbs.key_pair), Ok(true))
    }

    /// Fail with a usage error unless `usage` is permitted
    pub fn check_usage(&self, usage: KeyUsage) -> KeyStoreResult<()> {
        if self.tbs.usage.contains(usage) {
            Ok(())
        } else {
            Err(KeyStoreError::Usage {
                subject: self.tbs.subject.to_string(),
                usage: usage.to_string(),
            })
        }
    }

    /// SHA-256 of the encoded form, hex encoded
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(&self.encoded))
    }

    #[cfg(test)]
    pub(crate) fn with_tbs(&self, tbs: TbsCertificate) -> Self {
        // keeps the old signature, so the result no longer verifies
        Self::assemble(tbs, self.signature_spec.clone(), self.signature.clone())
            .expect("re-encoding a decoded certificate")
    }

    #[cfg(test)]
    pub(crate) fn with_signature_byte_flipped(&self, index: usize) -> Self {
        let mut signature = self.signature.clone();
        signature[index] ^= 0x01;
        Self::from_parts(
            self.tbs.clone(),
            self.tbs_bytes.clone(),
            self.signature_spec.clone(),
            signature,
        )
        .expect("re-encoding a decoded certificate")
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for Certificate {}

impl Hash for Certificate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.encoded.hash(state);
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("serial", &self.tbs.serial)
            .field("subject", &self.tbs.subject.to_string())
            .field("issuer", &self.tbs.issuer.to_string())
            .field("not_before", &self.tbs.not_before)
            .field("not_after", &self.tbs.not_after)
            .field("usage", &self.tbs.usage)
            .field("key_pair", &self.tbs.key_pair.spec)
            .field("signature_spec", &self.signature_spec)
            .finish()
    }
}

impl TryFrom<Vec<u8>> for Certificate {
    type Error = KeyStoreError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Certificate::decode(&bytes)
    }
}

impl From<Certificate> for Vec<u8> {
    fn from(certificate: Certificate) -> Self {
        certificate.encoded
    }
}

/// Builder for signed certificates
///
/// # Example
///
/// ```
/// use qasa_keystore::certificate::{CertificateBuilder, DistinguishedName};
/// use qasa_keystore::factory::{CapabilityFactory, StandardFactory};
/// use qasa_keystore::spec::{EcCurve, KeyPairSpec, SignatureSpec};
///
/// let factory = StandardFactory::default();
/// let spec = KeyPairSpec::ec(EcCurve::Secp256r1);
/// let key_pair = factory.generate_key_pair(&spec).unwrap();
/// let signature_spec = SignatureSpec::default_for(&spec).unwrap();
///
/// let root = CertificateBuilder::new(DistinguishedName::parse("CN=Root").unwrap(), &key_pair)
///     .validity_days(30)
///     .build(&factory, &key_pair, &signature_spec)
///     .unwrap();
/// assert!(root.is_self_signed(&factory));
/// ```
pub struct CertificateBuilder {
    subject: DistinguishedName,
    issuer: Option<DistinguishedName>,
    key_pair: KeyPair,
    usage: KeyUsageSet,
    serial: Option<u64>,
    not_before: DateTime<Utc>,
    not_after: Option<DateTime<Utc>>,
    validity_days: i64,
}

impl CertificateBuilder {
    pub fn new(subject: DistinguishedName, key_pair: &KeyPair) -> Self {
        Self {
            subject,
            issuer: None,
            key_pair: key_pair.to_public(),
            usage: KeyUsageSet::signing(),
            serial: None,
            not_before: Utc::now(),
            not_after: None,
            validity_days: 365,
        }
    }

    /// Issuer identity; defaults to the subject for a self-signed certificate
    pub fn issuer(mut self, issuer: DistinguishedName) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn usage(mut self, usage: KeyUsageSet) -> Self {
        self.usage = usage;
        self
    }

    pub fn serial(mut self, serial: u64) -> Self {
        self.serial = Some(serial);
        self
    }

    pub fn not_before(mut self, not_before: DateTime<Utc>) -> Self {
        self.not_before = not_before;
        self
    }

    /// Explicit end of validity; overrides `validity_days`
    pub fn not_after(mut self, not_after: DateTime<Utc>) -> Self {
        self.not_after = Some(not_after);
        self
    }

    pub fn validity_days(mut self, days: i64) -> Self {
        self.validity_days = days;
        self
    }

    /// Sign the certificate with `signer`, which must hold a private key
    pub fn build(
        self,
        factory: &dyn CapabilityFactory,
        signer: &KeyPair,
        signature_spec: &SignatureSpec,
    ) -> KeyStoreResult<Certificate> {
        if !factory.supports_signature_spec(signature_spec)
            || !factory.key_pair_supports(&signer.spec, signature_spec)
        {
            return Err(KeyStoreError::unsupported_spec(
                signature_spec,
                &format!("cannot sign with {}", signer.spec),
            ));
        }
        let not_after = match self.not_after {
            Some(not_after) => not_after,
            None => Duration::try_days(self.validity_days)
                .and_then(|validity| self.not_before.checked_add_signed(validity))
                .ok_or_else(|| {
                    KeyStoreError::key_error("build_certificate", "validity period is out of range")
                })?,
        };
        if not_after < self.not_before {
            return Err(KeyStoreError::key_error(
                "build_certificate",
                "validity window ends before it starts",
            ));
        }
        let issuer = self.issuer.unwrap_or_else(|| self.subject.clone());
        let tbs = TbsCertificate {
            serial: self.serial.unwrap_or_else(|| OsRng.next_u64()),
            subject: self.subject,
            issuer,
            not_before: self.not_before,
            not_after,
            usage: self.usage,
            key_pair: self.key_pair,
        };
        let tbs_bytes = bincode::serialize(&tbs)?;
        let signature = factory.sign(signer, signature_spec, &tbs_bytes)?;
        debug!(
            "Issued certificate {} for {} by {}",
            tbs.serial, tbs.subject, tbs.issuer
        );
        Certificate::from_parts(tbs, tbs_bytes, signature_spec.clone(), signature)
    }
}
