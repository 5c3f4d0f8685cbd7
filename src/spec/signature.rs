//! Signature specifications
//!
//! A [`SignatureSpec`] pairs a key pair type with a signature construction and
//! the payload that construction needs (a digest, a list of component specs
//! for composites, or nothing). Validity is purely structural; whether a spec
//! is usable with a particular key pair is decided by
//! [`matches_key_pair`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::digest::{list_all_digest_specs, DigestSpec, DigestType};
use super::keypair::{EcCurve, KeyPairSpec, KeyPairType};
use super::length::Length;

/// Signature constructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignatureType {
    /// The algorithm's own scheme
    Native,
    Dsa,
    /// Deterministic DSA (RFC 6979)
    DetDsa,
    /// Nyberg-Rueppel
    Nr,
    Sm2,
    Pss,
    X931,
    Iso9796d2,
    /// Sign a digest of the message rather than the message itself
    PreHash,
    /// Sign the message directly
    Pure,
}

impl SignatureType {
    /// Constructions available for a key pair type
    pub fn supported_for(key_pair_type: KeyPairType) -> &'static [SignatureType] {
        use SignatureType::*;
        match key_pair_type {
            KeyPairType::Rsa => &[Pss, X931, Iso9796d2, PreHash],
            KeyPairType::Dsa => &[Dsa, DetDsa],
            KeyPairType::Ec => &[Dsa, DetDsa, Nr],
            KeyPairType::Sm2 => &[Sm2],
            KeyPairType::Dstu4145 | KeyPairType::Gost2012 => &[Native],
            KeyPairType::EdDsa => &[Pure, PreHash],
            KeyPairType::MlDsa | KeyPairType::SlhDsa | KeyPairType::Picnic | KeyPairType::Xmss => {
                &[Native, PreHash]
            }
            KeyPairType::Falcon | KeyPairType::Rainbow | KeyPairType::Lms => &[Native],
            KeyPairType::Composite => &[Native],
            KeyPairType::Xdh | KeyPairType::MlKem => &[],
        }
    }
}

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignatureType::Native => "Native",
            SignatureType::Dsa => "DSA",
            SignatureType::DetDsa => "DDSA",
            SignatureType::Nr => "NR",
            SignatureType::Sm2 => "SM2",
            SignatureType::Pss => "PSS",
            SignatureType::X931 => "X9.31",
            SignatureType::Iso9796d2 => "ISO9796-2",
            SignatureType::PreHash => "PreHash",
            SignatureType::Pure => "Pure",
        };
        f.write_str(name)
    }
}

/// Construction-specific data carried by a signature spec
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignaturePayload {
    Digest(DigestSpec),
    Composite(Vec<SignatureSpec>),
    None,
}

/// A signature algorithm combination
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureSpec {
    pub key_pair_type: KeyPairType,
    pub signature_type: SignatureType,
    pub payload: SignaturePayload,
}

impl SignatureSpec {
    pub fn new(
        key_pair_type: KeyPairType,
        signature_type: SignatureType,
        payload: SignaturePayload,
    ) -> Self {
        Self {
            key_pair_type,
            signature_type,
            payload,
        }
    }

    pub fn with_digest(
        key_pair_type: KeyPairType,
        signature_type: SignatureType,
        digest: DigestSpec,
    ) -> Self {
        Self::new(key_pair_type, signature_type, SignaturePayload::Digest(digest))
    }

    /// Spec with no payload using the algorithm's own scheme
    pub fn native(key_pair_type: KeyPairType) -> Self {
        Self::new(key_pair_type, SignatureType::Native, SignaturePayload::None)
    }

    pub fn ecdsa(digest: DigestSpec) -> Self {
        Self::with_digest(KeyPairType::Ec, SignatureType::Dsa, digest)
    }

    pub fn rsa_pss(digest: DigestSpec) -> Self {
        Self::with_digest(KeyPairType::Rsa, SignatureType::Pss, digest)
    }

    pub fn eddsa() -> Self {
        Self::new(KeyPairType::EdDsa, SignatureType::Pure, SignaturePayload::None)
    }

    pub fn composite(components: Vec<SignatureSpec>) -> Self {
        Self::new(
            KeyPairType::Composite,
            SignatureType::Native,
            SignaturePayload::Composite(components),
        )
    }

    pub fn digest(&self) -> Option<&DigestSpec> {
        match &self.payload {
            SignaturePayload::Digest(digest) => Some(digest),
            _ => None,
        }
    }

    /// Component specs of a composite; empty for every other spec
    pub fn components(&self) -> &[SignatureSpec] {
        match &self.payload {
            SignaturePayload::Composite(components) => components,
            _ => &[],
        }
    }

    /// Structural validity of the combination
    pub fn is_valid(&self) -> bool {
        if !SignatureType::supported_for(self.key_pair_type).contains(&self.signature_type) {
            return false;
        }
        match self.key_pair_type {
            KeyPairType::Composite => match &self.payload {
                SignaturePayload::Composite(components) => {
                    !components.is_empty()
                        && components.iter().all(|c| {
                            c.key_pair_type != KeyPairType::Composite && c.is_valid()
                        })
                }
                _ => false,
            },
            key_pair_type if key_pair_type.needs_digest() => match self.digest() {
                Some(digest) => {
                    digest.is_valid()
                        && digest.digest_type.supports_large_data()
                        && self.digest_allowed_for_type(digest)
                }
                None => false,
            },
            KeyPairType::EdDsa => self.payload == SignaturePayload::None,
            KeyPairType::MlDsa | KeyPairType::SlhDsa | KeyPairType::Picnic => {
                self.native_or_prehash(&[
                    DigestSpec::sha2(Length::Len512),
                    DigestSpec::sha3(Length::Len512),
                    DigestSpec::shake256(),
                ])
            }
            KeyPairType::Xmss => self.native_or_prehash(&[
                DigestSpec::sha2(Length::Len256),
                DigestSpec::sha2(Length::Len512),
                DigestSpec::shake128(),
                DigestSpec::shake256(),
            ]),
            _ => self.payload == SignaturePayload::None,
        }
    }

    fn native_or_prehash(&self, prehash_digests: &[DigestSpec]) -> bool {
        match (self.signature_type, &self.payload) {
            (SignatureType::Native, SignaturePayload::None) => true,
            (SignatureType::PreHash, SignaturePayload::Digest(digest)) => {
                prehash_digests.contains(digest)
            }
            _ => false,
        }
    }

    /// X9.31 and ISO9796-2 carry a hash identifier and only define it for a
    /// fixed set of untruncated digests
    fn digest_allowed_for_type(&self, digest: &DigestSpec) -> bool {
        match self.signature_type {
            SignatureType::X931 | SignatureType::Iso9796d2 => {
                !digest.is_truncated()
                    && match digest.digest_type {
                        DigestType::Sha1 | DigestType::Sha2 | DigestType::Whirlpool => true,
                        DigestType::RipeMd => {
                            matches!(digest.output_length, Length::Len128 | Length::Len160)
                        }
                        _ => false,
                    }
            }
            _ => true,
        }
    }

    /// Preferred legal spec for a key pair, if it can sign at all
    pub fn default_for(key_pair: &KeyPairSpec) -> Option<SignatureSpec> {
        let spec = match key_pair {
            KeyPairSpec::Rsa(_) => SignatureSpec::rsa_pss(DigestSpec::sha2(Length::Len256)),
            KeyPairSpec::Dsa(_) => SignatureSpec::with_digest(
                KeyPairType::Dsa,
                SignatureType::Dsa,
                DigestSpec::sha2(Length::Len256),
            ),
            KeyPairSpec::Ec(curve) => SignatureSpec::ecdsa(DigestSpec::sha2(ec_digest_length(*curve))),
            KeyPairSpec::Sm2(_) => {
                SignatureSpec::with_digest(KeyPairType::Sm2, SignatureType::Sm2, DigestSpec::sm3())
            }
            KeyPairSpec::Dstu4145(_) => SignatureSpec::with_digest(
                KeyPairType::Dstu4145,
                SignatureType::Native,
                DigestSpec::gost(),
            ),
            KeyPairSpec::Gost2012(curve) => SignatureSpec::with_digest(
                KeyPairType::Gost2012,
                SignatureType::Native,
                DigestSpec::streebog(curve.length()),
            ),
            KeyPairSpec::EdDsa(_) => SignatureSpec::eddsa(),
            KeyPairSpec::Xdh(_) | KeyPairSpec::MlKem(_) => return None,
            KeyPairSpec::Composite(components) => {
                let defaults = components
                    .iter()
                    .map(SignatureSpec::default_for)
                    .collect::<Option<Vec<_>>>()?;
                SignatureSpec::composite(defaults)
            }
            other => SignatureSpec::native(other.key_pair_type()),
        };
        Some(spec)
    }
}

fn ec_digest_length(curve: EcCurve) -> Length {
    match curve.bits() {
        0..=256 => Length::Len256,
        257..=384 => Length::Len384,
        _ => Length::Len512,
    }
}

impl fmt::Display for SignatureSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            SignaturePayload::Digest(digest) => {
                write!(f, "{}{}({})", self.key_pair_type, self.signature_type, digest)
            }
            SignaturePayload::Composite(components) => {
                write!(f, "Composite(")?;
                for (i, component) in components.iter().enumerate() {
                    if i > 0 {
                        write!(f, " + ")?;
                    }
                    write!(f, "{}", component)?;
                }
                write!(f, ")")
            }
            SignaturePayload::None => write!(f, "{}{}", self.key_pair_type, self.signature_type),
        }
    }
}

/// Whether `signature` can be used with a key pair of the given spec.
///
/// The signature spec must be structurally valid and name the key pair's type.
/// Composites must line up component by component.
pub fn matches_key_pair(key_pair: &KeyPairSpec, signature: &SignatureSpec) -> bool {
    if !signature.is_valid() || signature.key_pair_type != key_pair.key_pair_type() {
        return false;
    }
    match key_pair {
        KeyPairSpec::Composite(key_components) => {
            let sig_components = signature.components();
            key_components.len() == sig_components.len()
                && key_components
                    .iter()
                    .zip(sig_components)
                    .all(|(k, s)| matches_key_pair(k, s))
        }
        KeyPairSpec::Gost2012(curve) => signature.digest().map_or(false, |d| {
            d.digest_type == DigestType::Streebog && d.output_length == curve.length()
        }),
        KeyPairSpec::Sm2(_) => signature.digest().map_or(false, |d| {
            *d == DigestSpec::sm3() || *d == DigestSpec::sha2(Length::Len256)
        }),
        KeyPairSpec::Dstu4145(_) => signature.digest().map_or(false, |d| {
            matches!(d.digest_type, DigestType::Gost | DigestType::Kupyna)
        }),
        KeyPairSpec::Ec(curve) if signature.signature_type == SignatureType::Nr => signature
            .digest()
            .map_or(false, |d| d.output_length.bits() <= curve.bits()),
        KeyPairSpec::Rsa(modulus) => signature.digest().map_or(false, |d| {
            let modulus_bytes = modulus.bits() / 8;
            let hash_bytes = d.output_length.bytes();
            match signature.signature_type {
                SignatureType::Pss => modulus_bytes >= 2 * hash_bytes + 2,
                _ => modulus_bytes >= hash_bytes + 2,
            }
        }),
        KeyPairSpec::Xmss(xmss) => match signature.signature_type {
            SignatureType::PreHash => signature.digest() == Some(&xmss.digest.digest_spec()),
            _ => true,
        },
        _ => true,
    }
}

/// Every structurally valid signature spec for a key pair type.
///
/// Composite specs depend on their components, so the composite type lists
/// nothing here; use [`list_possible_signatures_for_key_pair`] instead.
pub fn list_possible_signatures(key_pair_type: KeyPairType) -> Vec<SignatureSpec> {
    if key_pair_type == KeyPairType::Composite {
        return Vec::new();
    }
    let digests = list_all_digest_specs();
    let mut specs = Vec::new();
    for &signature_type in SignatureType::supported_for(key_pair_type) {
        let candidate = SignatureSpec::new(key_pair_type, signature_type, SignaturePayload::None);
        if candidate.is_valid() {
            specs.push(candidate);
        }
        for digest in &digests {
            let candidate = SignatureSpec::with_digest(key_pair_type, signature_type, *digest);
            if candidate.is_valid() {
                specs.push(candidate);
            }
        }
    }
    specs
}

/// Every signature spec usable with a specific key pair.
///
/// For a composite key pair this is the ordered cartesian product of the
/// component listings.
pub fn list_possible_signatures_for_key_pair(key_pair: &KeyPairSpec) -> Vec<SignatureSpec> {
    match key_pair {
        KeyPairSpec::Composite(components) => {
            if !key_pair.is_valid() {
                return Vec::new();
            }
            let mut combos: Vec<Vec<SignatureSpec>> = vec![Vec::new()];
            for component in components {
                let options = list_possible_signatures_for_key_pair(component);
                let mut next = Vec::with_capacity(combos.len() * options.len());
                for combo in &combos {
                    for option in &options {
                        let mut extended = combo.clone();
                        extended.push(option.clone());
                        next.push(extended);
                    }
                }
                combos = next;
            }
            combos.into_iter().map(SignatureSpec::composite).collect()
        }
        other => list_possible_signatures(other.key_pair_type())
            .into_iter()
            .filter(|spec| matches_key_pair(other, spec))
            .collect(),
    }
}
