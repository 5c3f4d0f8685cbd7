//! Export, import and certificate request workflows
//!
//! The gateway never prompts for anything itself. Passwords and lock
//! passphrases come from resolvers registered by the embedding application.
//! A resolver may block on user input or a secret store round trip, so the
//! store lock is never held while one runs.

use log::{debug, info, warn};
use std::io::{Read, Write};

use super::entry::{CertificateEntry, EntryType, KeyPairEntry, KeyStoreEntry};
use super::lock::{Lock, LockedEnvelope, ResolvableLock};
use super::manager::KeyStoreManager;
use super::store::{read_lock, SharedKeyStore};
use crate::certificate::{decode_certificates, encode_certificates, Certificate, CertificateRequest};
use crate::error::{KeyStoreError, KeyStoreResult};
use crate::secure_memory::SecureBytes;

/// Supplies the password protecting an alias
pub trait PasswordResolver: Send + Sync {
    fn resolve_password(&self, alias: &str) -> Option<SecureBytes>;
}

impl<F> PasswordResolver for F
where
    F: Fn(&str) -> Option<SecureBytes> + Send + Sync,
{
    fn resolve_password(&self, alias: &str) -> Option<SecureBytes> {
        self(alias)
    }
}

/// Opens a lock, typically by asking for its passphrase and calling
/// [`ResolvableLock::unlock`]
pub trait LockResolver: Send + Sync {
    fn resolve_lock(&self, lock: &mut ResolvableLock) -> KeyStoreResult<()>;
}

impl<F> LockResolver for F
where
    F: Fn(&mut ResolvableLock) -> KeyStoreResult<()> + Send + Sync,
{
    fn resolve_lock(&self, lock: &mut ResolvableLock) -> KeyStoreResult<()> {
        self(lock)
    }
}

pub struct KeyStoreGateway {
    manager: KeyStoreManager,
    password_resolver: Option<Box<dyn PasswordResolver>>,
    lock_resolver: Option<Box<dyn LockResolver>>,
    certifier: Option<String>,
}

impl KeyStoreGateway {
    pub fn new(manager: KeyStoreManager) -> Self {
        Self {
            manager,
            password_resolver: None,
            lock_resolver: None,
            certifier: None,
        }
    }

    fn store(&self) -> &SharedKeyStore {
        self.manager.store()
    }

    pub fn set_password_resolver<R: PasswordResolver + 'static>(&mut self, resolver: R) {
        self.password_resolver = Some(Box::new(resolver));
    }

    pub fn set_lock_resolver<R: LockResolver + 'static>(&mut self, resolver: R) {
        self.lock_resolver = Some(Box::new(resolver));
    }

    /// Use the key pair under `alias` to sign certificates for requests.
    ///
    /// The alias must hold a key pair whose certificate permits certificate
    /// signing.
    pub fn set_certifier(&mut self, alias: &str) -> KeyStoreResult<()> {
        let certificate = {
            let store = read_lock(self.store())?;
            match store.entry_type(alias) {
                None => return Err(KeyStoreError::not_found(alias)),
                Some(EntryType::KeyPair) => store.get_certificate(alias)?,
                Some(actual) => {
                    return Err(KeyStoreError::WrongType {
                        alias: alias.to_string(),
                        expected: EntryType::KeyPair,
                        actual,
                    })
                }
            }
        };
        if !certificate.usage().is_certificate_signer() {
            return Err(KeyStoreError::SignerUsage {
                subject: certificate.subject().to_string(),
            });
        }
        self.certifier = Some(alias.to_string());
        Ok(())
    }

    pub fn certifier(&self) -> Option<&str> {
        self.certifier.as_deref()
    }

    /// Write the entry under `alias`, sealed under `lock`
    pub fn export_entry<W: Write>(
        &self,
        alias: &str,
        destination: &mut W,
        password: &[u8],
        lock: &Lock,
    ) -> KeyStoreResult<()> {
        let entry = read_lock(self.store())?.get_entry(alias, password)?;
        let payload = SecureBytes::from(bincode::serialize(&entry)?);
        let envelope = lock.seal(payload.as_bytes())?;
        destination.write_all(&envelope.encode()?)?;
        destination.flush()?;
        info!("Exported {} entry {}", entry.entry_type(), alias);
        Ok(())
    }

    /// Write a signing request for the key pair under `alias`
    pub fn create_certificate_request<W: Write>(
        &self,
        alias: &str,
        destination: &mut W,
        password: &[u8],
    ) -> KeyStoreResult<CertificateRequest> {
        let entry = read_lock(self.store())?.get_key_pair(alias, password)?;
        let certificate = entry.leaf("create_certificate_request")?;
        let signature_spec = self
            .manager
            .validator()
            .select_signature_spec(&entry.key_pair.spec)?;
        let request = CertificateRequest::create(
            self.manager.validator().factory().as_ref(),
            certificate.subject().clone(),
            &entry.key_pair,
            certificate.usage(),
            signature_spec,
        )?;
        destination.write_all(&request.encode()?)?;
        destination.flush()?;
        debug!("Created certificate request for {}", request.subject());
        Ok(request)
    }

    /// Certify a request with the configured certifier and write a bundle of
    /// the issued certificate followed by the certifier's chain
    pub fn process_certificate_request<R: Read, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> KeyStoreResult<Vec<Certificate>> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes)?;
        let request = CertificateRequest::decode(&bytes)?;

        let signer = self.certifier_entry()?;
        let chain = self.manager.certify(&request, &signer)?;
        output.write_all(&encode_certificates(&chain)?)?;
        output.flush()?;
        info!(
            "Issued certificate for {} signed by {}",
            request.subject(),
            chain[0].issuer()
        );
        Ok(chain)
    }

    fn certifier_entry(&self) -> KeyStoreResult<KeyPairEntry> {
        let alias = self
            .certifier
            .as_deref()
            .ok_or_else(|| KeyStoreError::key_error("process_certificate_request", "no certifier set"))?;
        let password = self
            .password_resolver
            .as_ref()
            .and_then(|resolver| resolver.resolve_password(alias))
            .ok_or_else(|| KeyStoreError::wrong_password(alias))?;
        let entry = read_lock(self.store())?.get_key_pair(alias, password.as_bytes())?;
        Ok(entry)
    }

    /// Decode an exported entry. The entry is not inserted into the store.
    ///
    /// `password`, when given, is tried as the lock passphrase first. If it is
    /// absent or does not open the lock, the registered lock resolver runs.
    pub fn import_entry<R: Read>(
        &self,
        source: &mut R,
        password: Option<&[u8]>,
    ) -> KeyStoreResult<KeyStoreEntry> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        let envelope = LockedEnvelope::decode(&bytes)?;

        let direct = password.and_then(|password| {
            Lock::from_descriptor(envelope.descriptor(), password)
                .and_then(|lock| lock.open(&envelope))
                .ok()
        });
        let payload = match direct {
            Some(payload) => payload,
            None => self.resolve_lock(envelope)?,
        };

        let entry: KeyStoreEntry = bincode::deserialize(payload.as_bytes())?;
        if let KeyStoreEntry::KeyPair(key_pair) = &entry {
            key_pair.leaf("import_entry")?;
        }

        let overlap = self.trust_overlap(&entry)?;
        for (index, alias) in overlap.iter().enumerate() {
            if let Some(alias) = alias {
                info!("Imported chain position {} is already trusted as {}", index, alias);
            }
        }
        debug!("Imported {} entry", entry.entry_type());
        Ok(entry)
    }

    fn resolve_lock(&self, envelope: LockedEnvelope) -> KeyStoreResult<SecureBytes> {
        let resolver = self
            .lock_resolver
            .as_ref()
            .ok_or_else(|| KeyStoreError::lock_error("import_entry", "no lock resolver registered"))?;
        let mut lock = ResolvableLock::new(envelope);
        resolver.resolve_lock(&mut lock)?;
        let attempts = lock.attempts();
        lock.into_plaintext().ok_or_else(|| {
            warn!("Lock left unresolved after {} attempts", attempts);
            KeyStoreError::lock_error("import_entry", "lock was not opened")
        })
    }

    /// Decode a bundle of certificates. Certificates are public, so no lock
    /// is involved.
    pub fn import_certificates<R: Read>(&self, source: &mut R) -> KeyStoreResult<Vec<KeyStoreEntry>> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;
        let now = chrono::Utc::now();
        let entries = decode_certificates(&bytes)?
            .into_iter()
            .map(|certificate| {
                KeyStoreEntry::Certificate(CertificateEntry {
                    certificate,
                    creation_date: now,
                })
            })
            .collect::<Vec<_>>();
        debug!("Imported {} certificates", entries.len());
        Ok(entries)
    }

    /// For each certificate the entry carries, leaf first, the alias of a
    /// stored certificate equal to it
    pub fn trust_overlap(&self, entry: &KeyStoreEntry) -> KeyStoreResult<Vec<Option<String>>> {
        let store = read_lock(self.store())?;
        Ok(entry
            .certificates()
            .iter()
            .map(|certificate| store.get_certificate_alias(certificate))
            .collect())
    }
}
