//! Creation of key pairs, certificates and keys in a keystore

use chrono::{Duration, Utc};
use log::info;
use std::sync::Arc;

use super::entry::{KeyEntry, KeyPairEntry, KeySetEntry, KeySetHashEntry};
use super::store::{read_lock, write_lock, KeyStore, SharedKeyStore};
use crate::certificate::{Certificate, CertificateBuilder, CertificateRequest, DistinguishedName, KeyUsageSet};
use crate::config::KeyStoreConfig;
use crate::error::{KeyStoreError, KeyStoreResult};
use crate::factory::CapabilityFactory;
use crate::keys::{KeyPair, KeySet, KeySetHash};
use crate::spec::{KeyPairSpec, KeySetSpec, KeySpec, SignatureSpec, SpecValidator};

/// Builds trust material and stores it.
///
/// Every creation path validates the requested spec against the factory
/// before generating anything, and by default refuses an alias that is
/// already in use.
#[derive(Clone)]
pub struct KeyStoreManager {
    store: SharedKeyStore,
    validator: SpecValidator,
    config: KeyStoreConfig,
}

impl KeyStoreManager {
    pub fn new(store: SharedKeyStore, config: KeyStoreConfig) -> KeyStoreResult<Self> {
        let factory = Arc::clone(read_lock(&store)?.factory());
        Ok(Self {
            store,
            validator: SpecValidator::new(factory),
            config,
        })
    }

    pub fn store(&self) -> &SharedKeyStore {
        &self.store
    }

    pub fn validator(&self) -> &SpecValidator {
        &self.validator
    }

    pub fn config(&self) -> &KeyStoreConfig {
        &self.config
    }

    fn factory(&self) -> &dyn CapabilityFactory {
        self.validator.factory().as_ref()
    }

    fn ensure_alias_free(&self, store: &KeyStore, alias: &str) -> KeyStoreResult<()> {
        if self.config.reject_duplicate_aliases && store.contains_alias(alias) {
            return Err(KeyStoreError::DuplicateAlias {
                alias: alias.to_string(),
            });
        }
        Ok(())
    }

    fn check_alias(&self, alias: &str) -> KeyStoreResult<()> {
        let store = read_lock(&self.store)?;
        self.ensure_alias_free(&store, alias)
    }

    fn generate_key_pair(&self, spec: &KeyPairSpec) -> KeyStoreResult<KeyPair> {
        if !self.validator.is_supported_key_pair_spec(spec) {
            return Err(KeyStoreError::unsupported_spec(spec, "key pair spec is not supported"));
        }
        self.factory().generate_key_pair(spec)
    }

    fn store_key_pair(
        &self,
        alias: &str,
        key_pair: KeyPair,
        password: &[u8],
        chain: Vec<Certificate>,
    ) -> KeyStoreResult<KeyPairEntry> {
        let mut store = write_lock(&self.store)?;
        self.ensure_alias_free(&store, alias)?;
        let creation_date = store.store_key_pair(alias, &key_pair, password, chain.clone())?;
        Ok(KeyPairEntry {
            key_pair,
            chain,
            creation_date,
        })
    }

    /// Generate a key pair with a self-signed certificate and store it
    pub fn create_root_key_pair(
        &self,
        spec: &KeyPairSpec,
        subject: &DistinguishedName,
        alias: &str,
        password: &[u8],
    ) -> KeyStoreResult<KeyPairEntry> {
        self.check_alias(alias)?;
        let signature_spec = self.validator.select_signature_spec(spec)?;
        let key_pair = self.generate_key_pair(spec)?;
        let certificate = CertificateBuilder::new(subject.clone(), &key_pair)
            .usage(KeyUsageSet::certificate_authority())
            .validity_days(self.config.root_validity_days)
            .build(self.factory(), &key_pair, &signature_spec)?;
        info!("Created root key pair {} for {}", alias, subject);
        self.store_key_pair(alias, key_pair, password, vec![certificate])
    }

    /// Generate a key pair certified by `signer` and store it with the
    /// extended chain
    pub fn create_key_pair(
        &self,
        spec: &KeyPairSpec,
        subject: &DistinguishedName,
        usage: KeyUsageSet,
        signer: &KeyPairEntry,
        alias: &str,
        password: &[u8],
    ) -> KeyStoreResult<KeyPairEntry> {
        self.check_alias(alias)?;
        let signature_spec = self.signer_spec(signer)?;
        let key_pair = self.generate_key_pair(spec)?;
        let chain = self.issue(subject, &key_pair, usage, signer, &signature_spec)?;
        info!("Created key pair {} for {} issued by {}", alias, subject, chain[0].issuer());
        self.store_key_pair(alias, key_pair, password, chain)
    }

    /// Signature spec the signer will certify with, once its certificate is
    /// known to permit certificate signing
    fn signer_spec(&self, signer: &KeyPairEntry) -> KeyStoreResult<SignatureSpec> {
        let signer_certificate = signer.leaf("certify")?;
        if !signer_certificate.usage().is_certificate_signer() {
            return Err(KeyStoreError::SignerUsage {
                subject: signer_certificate.subject().to_string(),
            });
        }
        self.validator.select_signature_spec(&signer.key_pair.spec)
    }

    /// Certificate for `key_pair` signed by `signer`, followed by the
    /// signer's chain
    fn issue(
        &self,
        subject: &DistinguishedName,
        key_pair: &KeyPair,
        usage: KeyUsageSet,
        signer: &KeyPairEntry,
        signature_spec: &SignatureSpec,
    ) -> KeyStoreResult<Vec<Certificate>> {
        let signer_certificate = signer.leaf("certify")?;

        // an issued certificate never outlives its issuer
        let now = Utc::now();
        let not_after = Duration::try_days(self.config.leaf_validity_days)
            .and_then(|validity| now.checked_add_signed(validity))
            .ok_or_else(|| KeyStoreError::key_error("issue_certificate", "validity period is out of range"))?
            .min(signer_certificate.not_after());
        let certificate = CertificateBuilder::new(subject.clone(), key_pair)
            .issuer(signer_certificate.subject().clone())
            .usage(usage)
            .not_before(now)
            .not_after(not_after)
            .build(self.factory(), &signer.key_pair, signature_spec)?;

        let mut chain = Vec::with_capacity(signer.chain.len() + 1);
        chain.push(certificate);
        chain.extend(signer.chain.iter().cloned());
        Ok(chain)
    }

    /// Certify the subject and key of a verified request
    pub fn certify(&self, request: &CertificateRequest, signer: &KeyPairEntry) -> KeyStoreResult<Vec<Certificate>> {
        if !request.verify(self.factory())? {
            return Err(KeyStoreError::InvalidRequest(format!(
                "proof of possession failed for {}",
                request.subject()
            )));
        }
        let signature_spec = self.signer_spec(signer)?;
        self.issue(request.subject(), request.key_pair(), request.usage(), signer, &signature_spec)
    }

    pub fn create_key(&self, spec: &KeySpec, alias: &str, password: &[u8]) -> KeyStoreResult<KeyEntry> {
        self.check_alias(alias)?;
        if !self.validator.is_supported_key_spec(spec) {
            return Err(KeyStoreError::unsupported_spec(spec, "key spec is not supported"));
        }
        let key = self.factory().generate_key(spec)?;
        let mut store = write_lock(&self.store)?;
        self.ensure_alias_free(&store, alias)?;
        let creation_date = store.store_key(alias, &key, password)?;
        info!("Created {} key {}", spec, alias);
        Ok(KeyEntry { key, creation_date })
    }

    pub fn create_key_set(&self, spec: KeySetSpec, alias: &str, password: &[u8]) -> KeyStoreResult<KeySetEntry> {
        self.check_alias(alias)?;
        let key_set = KeySet::generate(self.factory(), spec)?;
        let mut store = write_lock(&self.store)?;
        self.ensure_alias_free(&store, alias)?;
        let creation_date = store.store_key_set(alias, &key_set, password)?;
        info!("Created {} key set {}", spec, alias);
        Ok(KeySetEntry {
            key_set,
            creation_date,
        })
    }

    /// Generate a key set and store only its password-wrapped hash
    pub fn create_key_set_hash(
        &self,
        spec: KeySetSpec,
        alias: &str,
        password: &[u8],
    ) -> KeyStoreResult<KeySetHashEntry> {
        self.check_alias(alias)?;
        let key_set = KeySet::generate(self.factory(), spec)?;
        let hash = KeySetHash::new(self.factory(), &key_set, password)?;
        let mut store = write_lock(&self.store)?;
        self.ensure_alias_free(&store, alias)?;
        let creation_date = store.store_key_set_hash(alias, hash.clone());
        info!("Created {} key set hash {}", spec, alias);
        Ok(KeySetHashEntry { hash, creation_date })
    }
}
