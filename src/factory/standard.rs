//! Capability factory backed by ring, rsa and (optionally) liboqs

use log::debug;
use rand::{rngs::OsRng, RngCore};
use ring::hmac;
use ring::rand::SystemRandom;
use ring::signature::{
    self as ring_signature, EcdsaKeyPair, EcdsaSigningAlgorithm, Ed25519KeyPair,
    KeyPair as RingKeyPair, UnparsedPublicKey, VerificationAlgorithm,
};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::digest::{Digest, FixedOutputReset};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use super::password;
use super::CapabilityFactory;
use crate::config::KeyDerivationParams;
use crate::error::{KeyStoreError, KeyStoreResult};
use crate::keys::{Key, KeyPair};
use crate::secure_memory::SecureBytes;
use crate::spec::{
    matches_key_pair, DigestSpec, EcCurve, EdwardsCurve, KeyPairSpec, KeySpec, Length, MacSpec,
    MacType, MacPayload, MontgomeryCurve, RsaModulus, SignatureSpec, SignatureType, SymKeySpec,
};

/// Digests the RSA-PSS path can run
#[derive(Debug, Clone, Copy)]
enum RsaDigest {
    Sha256,
    Sha384,
    Sha512,
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

impl RsaDigest {
    fn from_spec(spec: &DigestSpec) -> Option<Self> {
        let candidates = [
            (DigestSpec::sha2(Length::Len256), RsaDigest::Sha256),
            (DigestSpec::sha2(Length::Len384), RsaDigest::Sha384),
            (DigestSpec::sha2(Length::Len512), RsaDigest::Sha512),
            (DigestSpec::sha3(Length::Len256), RsaDigest::Sha3_256),
            (DigestSpec::sha3(Length::Len384), RsaDigest::Sha3_384),
            (DigestSpec::sha3(Length::Len512), RsaDigest::Sha3_512),
        ];
        candidates
            .iter()
            .find(|(candidate, _)| candidate == spec)
            .map(|(_, digest)| *digest)
    }
}

/// Default [`CapabilityFactory`].
///
/// Supported key pairs: EC P-256/P-384, Ed25519, RSA 2048-4096, X25519 (key
/// agreement only), composites of the signing ones, and ML-DSA, Falcon and
/// SLH-DSA with the `post-quantum` feature.
pub struct StandardFactory {
    kdf: KeyDerivationParams,
    rng: SystemRandom,
}

impl StandardFactory {
    pub fn new(kdf: KeyDerivationParams) -> Self {
        Self {
            kdf,
            rng: SystemRandom::new(),
        }
    }

    fn ecdsa_signing(curve: EcCurve) -> Option<&'static EcdsaSigningAlgorithm> {
        match curve {
            EcCurve::Secp256r1 => Some(&ring_signature::ECDSA_P256_SHA256_ASN1_SIGNING),
            EcCurve::Secp384r1 => Some(&ring_signature::ECDSA_P384_SHA384_ASN1_SIGNING),
            _ => None,
        }
    }

    fn ecdsa_verification(curve: EcCurve) -> Option<&'static dyn VerificationAlgorithm> {
        let algorithm: &'static dyn VerificationAlgorithm = match curve {
            EcCurve::Secp256r1 => &ring_signature::ECDSA_P256_SHA256_ASN1,
            EcCurve::Secp384r1 => &ring_signature::ECDSA_P384_SHA384_ASN1,
            _ => return None,
        };
        Some(algorithm)
    }

    /// ring binds each curve to one digest
    fn ecdsa_digest(curve: EcCurve) -> Option<DigestSpec> {
        match curve {
            EcCurve::Secp256r1 => Some(DigestSpec::sha2(Length::Len256)),
            EcCurve::Secp384r1 => Some(DigestSpec::sha2(Length::Len384)),
            _ => None,
        }
    }

    fn hmac_algorithm(digest: &DigestSpec) -> Option<hmac::Algorithm> {
        if *digest == DigestSpec::sha2(Length::Len256) {
            Some(hmac::HMAC_SHA256)
        } else if *digest == DigestSpec::sha2(Length::Len384) {
            Some(hmac::HMAC_SHA384)
        } else if *digest == DigestSpec::sha2(Length::Len512) {
            Some(hmac::HMAC_SHA512)
        } else {
            None
        }
    }

    fn private_key<'a>(key_pair: &'a KeyPair) -> KeyStoreResult<&'a [u8]> {
        key_pair
            .private_key
            .as_ref()
            .map(SecureBytes::as_bytes)
            .ok_or_else(|| KeyStoreError::key_error("sign", "key pair has no private key"))
    }

    fn generate_rsa(&self, spec: &KeyPairSpec, modulus: RsaModulus) -> KeyStoreResult<KeyPair> {
        let private_key = RsaPrivateKey::new(&mut OsRng, modulus.bits())
            .map_err(|e| KeyStoreError::provider_error("rsa_generate", e))?;
        let public_der = private_key
            .to_public_key()
            .to_public_key_der()
            .map_err(|e| KeyStoreError::provider_error("rsa_encode", e))?;
        let private_der = private_key
            .to_pkcs8_der()
            .map_err(|e| KeyStoreError::provider_error("rsa_encode", e))?;
        Ok(KeyPair::new(
            spec.clone(),
            public_der.as_bytes().to_vec(),
            SecureBytes::new(private_der.as_bytes()),
        ))
    }

    fn sign_single(
        &self,
        key_pair: &KeyPair,
        spec: &SignatureSpec,
        message: &[u8],
    ) -> KeyStoreResult<Vec<u8>> {
        match &key_pair.spec {
            KeyPairSpec::Ec(curve) => {
                let signing = Self::ecdsa_signing(*curve)
                    .ok_or_else(|| KeyStoreError::unsupported_spec(&key_pair.spec, "curve"))?;
                let ecdsa = EcdsaKeyPair::from_pkcs8(signing, Self::private_key(key_pair)?, &self.rng)
                    .map_err(|e| KeyStoreError::key_error("ecdsa_sign", &e.to_string()))?;
                let signature = ecdsa
                    .sign(&self.rng, message)
                    .map_err(|_| KeyStoreError::provider_error("ecdsa_sign", "signing failed"))?;
                Ok(signature.as_ref().to_vec())
            }
            KeyPairSpec::EdDsa(EdwardsCurve::Ed25519) => {
                let ed25519 = Ed25519KeyPair::from_pkcs8(Self::private_key(key_pair)?)
                    .map_err(|e| KeyStoreError::key_error("ed25519_sign", &e.to_string()))?;
                Ok(ed25519.sign(message).as_ref().to_vec())
            }
            KeyPairSpec::Rsa(_) => {
                let digest = spec
                    .digest()
                    .and_then(RsaDigest::from_spec)
                    .ok_or_else(|| KeyStoreError::unsupported_spec(spec, "digest"))?;
                let private_der = Self::private_key(key_pair)?;
                match digest {
                    RsaDigest::Sha256 => rsa_pss_sign::<sha2::Sha256>(private_der, message),
                    RsaDigest::Sha384 => rsa_pss_sign::<sha2::Sha384>(private_der, message),
                    RsaDigest::Sha512 => rsa_pss_sign::<sha2::Sha512>(private_der, message),
                    RsaDigest::Sha3_256 => rsa_pss_sign::<sha3::Sha3_256>(private_der, message),
                    RsaDigest::Sha3_384 => rsa_pss_sign::<sha3::Sha3_384>(private_der, message),
                    RsaDigest::Sha3_512 => rsa_pss_sign::<sha3::Sha3_512>(private_der, message),
                }
            }
            #[cfg(feature = "post-quantum")]
            KeyPairSpec::MlDsa(_) | KeyPairSpec::Falcon(_) | KeyPairSpec::SlhDsa(_) => {
                super::post_quantum::sign(key_pair, Self::private_key(key_pair)?, message)
            }
            other => Err(KeyStoreError::unsupported_spec(other, "signing not available")),
        }
    }

    fn verify_single(
        &self,
        key_pair: &KeyPair,
        spec: &SignatureSpec,
        message: &[u8],
        signature: &[u8],
    ) -> KeyStoreResult<bool> {
        match &key_pair.spec {
            KeyPairSpec::Ec(curve) => {
                let verification = Self::ecdsa_verification(*curve)
                    .ok_or_else(|| KeyStoreError::unsupported_spec(&key_pair.spec, "curve"))?;
                let public_key = UnparsedPublicKey::new(verification, &key_pair.public_key);
                Ok(public_key.verify(message, signature).is_ok())
            }
            KeyPairSpec::EdDsa(EdwardsCurve::Ed25519) => {
                let public_key = UnparsedPublicKey::new(&ring_signature::ED25519, &key_pair.public_key);
                Ok(public_key.verify(message, signature).is_ok())
            }
            KeyPairSpec::Rsa(_) => {
                let digest = spec
                    .digest()
                    .and_then(RsaDigest::from_spec)
                    .ok_or_else(|| KeyStoreError::unsupported_spec(spec, "digest"))?;
                let public_der = &key_pair.public_key;
                Ok(match digest {
                    RsaDigest::Sha256 => rsa_pss_verify::<sha2::Sha256>(public_der, message, signature),
                    RsaDigest::Sha384 => rsa_pss_verify::<sha2::Sha384>(public_der, message, signature),
                    RsaDigest::Sha512 => rsa_pss_verify::<sha2::Sha512>(public_der, message, signature),
                    RsaDigest::Sha3_256 => rsa_pss_verify::<sha3::Sha3_256>(public_der, message, signature),
                    RsaDigest::Sha3_384 => rsa_pss_verify::<sha3::Sha3_384>(public_der, message, signature),
                    RsaDigest::Sha3_512 => rsa_pss_verify::<sha3::Sha3_512>(public_der, message, signature),
                })
            }
            #[cfg(feature = "post-quantum")]
            KeyPairSpec::MlDsa(_) | KeyPairSpec::Falcon(_) | KeyPairSpec::SlhDsa(_) => {
                super::post_quantum::verify(key_pair, message, signature)
            }
            other => Err(KeyStoreError::unsupported_spec(other, "verification not available")),
        }
    }

    fn check_signing_spec(&self, key_pair: &KeyPair, spec: &SignatureSpec) -> KeyStoreResult<()> {
        if !self.supports_signature_spec(spec) || !self.key_pair_supports(&key_pair.spec, spec) {
            return Err(KeyStoreError::unsupported_spec(
                spec,
                &format!("not usable with {}", key_pair.spec),
            ));
        }
        Ok(())
    }
}

impl Default for StandardFactory {
    fn default() -> Self {
        Self::new(KeyDerivationParams::default())
    }
}

fn rsa_pss_sign<D>(private_der: &[u8], message: &[u8]) -> KeyStoreResult<Vec<u8>>
where
    D: Digest + FixedOutputReset,
{
    let private_key = RsaPrivateKey::from_pkcs8_der(private_der)
        .map_err(|e| KeyStoreError::key_error("rsa_sign", &e.to_string()))?;
    let signing_key = rsa::pss::SigningKey::<D>::new(private_key);
    let signature = signing_key
        .try_sign_with_rng(&mut OsRng, message)
        .map_err(|e| KeyStoreError::provider_error("rsa_sign", e))?;
    Ok(signature.to_vec())
}

fn rsa_pss_verify<D>(public_der: &[u8], message: &[u8], signature: &[u8]) -> bool
where
    D: Digest + FixedOutputReset,
{
    let public_key = match RsaPublicKey::from_public_key_der(public_der) {
        Ok(public_key) => public_key,
        Err(_) => return false,
    };
    let signature = match rsa::pss::Signature::try_from(signature) {
        Ok(signature) => signature,
        Err(_) => return false,
    };
    rsa::pss::VerifyingKey::<D>::new(public_key)
        .verify(message, &signature)
        .is_ok()
}

impl CapabilityFactory for StandardFactory {
    fn supports_key_pair_spec(&self, spec: &KeyPairSpec) -> bool {
        match spec {
            KeyPairSpec::Ec(curve) => Self::ecdsa_signing(*curve).is_some(),
            KeyPairSpec::EdDsa(curve) => *curve == EdwardsCurve::Ed25519,
            KeyPairSpec::Rsa(modulus) => *modulus != RsaModulus::Mod1024,
            KeyPairSpec::Xdh(curve) => *curve == MontgomeryCurve::X25519,
            #[cfg(feature = "post-quantum")]
            KeyPairSpec::MlDsa(_) | KeyPairSpec::Falcon(_) | KeyPairSpec::SlhDsa(_) => {
                super::post_quantum::oqs_algorithm(spec).is_some()
            }
            KeyPairSpec::Composite(components) => {
                spec.is_valid() && components.iter().all(|c| self.supports_key_pair_spec(c))
            }
            _ => false,
        }
    }

    fn supports_signature_spec(&self, spec: &SignatureSpec) -> bool {
        use crate::spec::KeyPairType;
        if !spec.is_valid() {
            return false;
        }
        match spec.key_pair_type {
            KeyPairType::Ec => {
                spec.signature_type == SignatureType::Dsa
                    && spec.digest().map_or(false, |d| {
                        *d == DigestSpec::sha2(Length::Len256) || *d == DigestSpec::sha2(Length::Len384)
                    })
            }
            KeyPairType::EdDsa => spec.signature_type == SignatureType::Pure,
            KeyPairType::Rsa => {
                spec.signature_type == SignatureType::Pss
                    && spec.digest().and_then(RsaDigest::from_spec).is_some()
            }
            #[cfg(feature = "post-quantum")]
            KeyPairType::MlDsa | KeyPairType::Falcon | KeyPairType::SlhDsa => {
                spec.signature_type == SignatureType::Native
            }
            KeyPairType::Composite => spec
                .components()
                .iter()
                .all(|c| self.supports_signature_spec(c)),
            _ => false,
        }
    }

    fn supports_mac_spec(&self, spec: &MacSpec) -> bool {
        spec.is_valid()
            && match (spec.mac_type, spec.payload) {
                (MacType::Hmac, MacPayload::Digest(digest)) => Self::hmac_algorithm(&digest).is_some(),
                _ => false,
            }
    }

    fn supports_sym_key_spec(&self, spec: &SymKeySpec) -> bool {
        // symmetric keys are random bytes; any well-formed spec can be generated
        spec.is_valid()
    }

    fn key_pair_supports(&self, key_pair: &KeyPairSpec, signature: &SignatureSpec) -> bool {
        if !matches_key_pair(key_pair, signature) {
            return false;
        }
        match key_pair {
            KeyPairSpec::Ec(curve) => {
                signature.digest().copied() == Self::ecdsa_digest(*curve)
            }
            KeyPairSpec::Composite(components) => components
                .iter()
                .zip(signature.components())
                .all(|(k, s)| self.key_pair_supports(k, s)),
            _ => true,
        }
    }

    fn generate_key_pair(&self, spec: &KeyPairSpec) -> KeyStoreResult<KeyPair> {
        if !self.supports_key_pair_spec(spec) {
            return Err(KeyStoreError::unsupported_spec(spec, "key pair generation not available"));
        }
        debug!("Generating {} key pair", spec);
        match spec {
            KeyPairSpec::Ec(curve) => {
                let signing = Self::ecdsa_signing(*curve)
                    .ok_or_else(|| KeyStoreError::unsupported_spec(spec, "curve"))?;
                let pkcs8 = EcdsaKeyPair::generate_pkcs8(signing, &self.rng)
                    .map_err(|_| KeyStoreError::provider_error("ecdsa_generate", "generation failed"))?;
                let key_pair = EcdsaKeyPair::from_pkcs8(signing, pkcs8.as_ref(), &self.rng)
                    .map_err(|e| KeyStoreError::provider_error("ecdsa_generate", e))?;
                Ok(KeyPair::new(
                    spec.clone(),
                    key_pair.public_key().as_ref().to_vec(),
                    SecureBytes::new(pkcs8.as_ref()),
                ))
            }
            KeyPairSpec::EdDsa(_) => {
                let pkcs8 = Ed25519KeyPair::generate_pkcs8(&self.rng)
                    .map_err(|_| KeyStoreError::provider_error("ed25519_generate", "generation failed"))?;
                let key_pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref())
                    .map_err(|e| KeyStoreError::provider_error("ed25519_generate", e))?;
                Ok(KeyPair::new(
                    spec.clone(),
                    key_pair.public_key().as_ref().to_vec(),
                    SecureBytes::new(pkcs8.as_ref()),
                ))
            }
            KeyPairSpec::Rsa(modulus) => self.generate_rsa(spec, *modulus),
            KeyPairSpec::Xdh(_) => {
                let secret = StaticSecret::random_from_rng(OsRng);
                let public = X25519PublicKey::from(&secret);
                Ok(KeyPair::new(
                    spec.clone(),
                    public.as_bytes().to_vec(),
                    SecureBytes::new(secret.as_bytes()),
                ))
            }
            #[cfg(feature = "post-quantum")]
            KeyPairSpec::MlDsa(_) | KeyPairSpec::Falcon(_) | KeyPairSpec::SlhDsa(_) => {
                super::post_quantum::generate(spec)
            }
            KeyPairSpec::Composite(components) => {
                let generated = components
                    .iter()
                    .map(|component| self.generate_key_pair(component))
                    .collect::<KeyStoreResult<Vec<_>>>()?;
                KeyPair::composite(generated)
            }
            other => Err(KeyStoreError::unsupported_spec(other, "key pair generation not available")),
        }
    }

    fn generate_key(&self, spec: &KeySpec) -> KeyStoreResult<Key> {
        let supported = match spec {
            KeySpec::Symmetric(sym) => self.supports_sym_key_spec(sym),
            KeySpec::Mac(mac) => self.supports_mac_spec(mac),
        };
        if !supported {
            return Err(KeyStoreError::unsupported_spec(spec, "key generation not available"));
        }
        let mut material = vec![0u8; spec.key_length().bytes()];
        OsRng.fill_bytes(&mut material);
        Ok(Key::new(*spec, SecureBytes::from(material)))
    }

    fn sign(&self, key_pair: &KeyPair, spec: &SignatureSpec, message: &[u8]) -> KeyStoreResult<Vec<u8>> {
        self.check_signing_spec(key_pair, spec)?;
        if let KeyPairSpec::Composite(_) = key_pair.spec {
            let components = key_pair.components()?;
            let signatures = components
                .iter()
                .zip(spec.components())
                .map(|(component, component_spec)| self.sign_single(component, component_spec, message))
                .collect::<KeyStoreResult<Vec<_>>>()?;
            return Ok(bincode::serialize(&signatures)?);
        }
        self.sign_single(key_pair, spec, message)
    }

    fn verify(
        &self,
        key_pair: &KeyPair,
        spec: &SignatureSpec,
        message: &[u8],
        signature: &[u8],
    ) -> KeyStoreResult<bool> {
        self.check_signing_spec(key_pair, spec)?;
        if let KeyPairSpec::Composite(_) = key_pair.spec {
            let signatures: Vec<Vec<u8>> = match bincode::deserialize(signature) {
                Ok(signatures) => signatures,
                Err(_) => return Ok(false),
            };
            let components = match key_pair.components() {
                Ok(components) => components,
                Err(_) => return Ok(false),
            };
            if signatures.len() != components.len() {
                return Ok(false);
            }
            // every component must verify
            for ((component, component_spec), component_signature) in components
                .iter()
                .zip(spec.components())
                .zip(&signatures)
            {
                if !self.verify_single(component, component_spec, message, component_signature)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        self.verify_single(key_pair, spec, message, signature)
    }

    fn mac(&self, key: &Key, message: &[u8]) -> KeyStoreResult<Vec<u8>> {
        let algorithm = match key.spec {
            KeySpec::Mac(MacSpec {
                mac_type: MacType::Hmac,
                payload: MacPayload::Digest(digest),
                ..
            }) => Self::hmac_algorithm(&digest),
            _ => None,
        }
        .ok_or_else(|| KeyStoreError::unsupported_spec(key.spec, "MAC not available"))?;
        let hmac_key = hmac::Key::new(algorithm, key.material.as_bytes());
        Ok(hmac::sign(&hmac_key, message).as_ref().to_vec())
    }

    fn wrap_secret(&self, secret: &[u8], password: &[u8]) -> KeyStoreResult<Vec<u8>> {
        password::wrap(secret, password, &self.kdf)
    }

    fn unwrap_secret(&self, wrapped: &[u8], password: &[u8]) -> KeyStoreResult<SecureBytes> {
        password::unwrap(wrapped, password)
    }
}
