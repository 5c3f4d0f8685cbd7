//! The alias to entry map

use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::entry::{
    CertificateEntry, EntryType, KeyEntry, KeyPairEntry, KeySetEntry, KeySetHashEntry,
    KeyStoreEntry, StoredEntry, StoredRecord,
};
use super::record;
use crate::certificate::Certificate;
use crate::error::{KeyStoreError, KeyStoreResult};
use crate::factory::CapabilityFactory;
use crate::keys::{Key, KeyPair, KeySet, KeySetHash};
use crate::secure_memory::SecureBytes;

/// A keystore shared between a manager, a gateway and other readers
pub type SharedKeyStore = Arc<RwLock<KeyStore>>;

pub(crate) fn read_lock(store: &SharedKeyStore) -> KeyStoreResult<RwLockReadGuard<'_, KeyStore>> {
    store
        .read()
        .map_err(|_| KeyStoreError::StoreUnavailable("keystore lock poisoned".to_string()))
}

pub(crate) fn write_lock(store: &SharedKeyStore) -> KeyStoreResult<RwLockWriteGuard<'_, KeyStore>> {
    store
        .write()
        .map_err(|_| KeyStoreError::StoreUnavailable("keystore lock poisoned".to_string()))
}

/// Owned map from case-sensitive alias to exactly one entry.
///
/// Private key material, symmetric keys and key sets are wrapped under the
/// caller's password before they reach the map. Every getter returns a
/// detached copy; the only way to change an entry is another `set_*` call
/// or [`KeyStore::delete_entry`].
///
/// Mutations must be serialized by the caller, for example by sharing the
/// store as a [`SharedKeyStore`].
pub struct KeyStore {
    factory: Arc<dyn CapabilityFactory>,
    entries: BTreeMap<String, StoredRecord>,
}

impl KeyStore {
    pub fn new(factory: Arc<dyn CapabilityFactory>) -> Self {
        Self {
            factory,
            entries: BTreeMap::new(),
        }
    }

    pub fn into_shared(self) -> SharedKeyStore {
        Arc::new(RwLock::new(self))
    }

    pub fn factory(&self) -> &Arc<dyn CapabilityFactory> {
        &self.factory
    }

    fn insert(&mut self, alias: &str, entry: StoredEntry) -> DateTime<Utc> {
        let creation_date = Utc::now();
        let entry_type = entry.entry_type();
        let replaced = self
            .entries
            .insert(
                alias.to_string(),
                StoredRecord {
                    alias: alias.to_string(),
                    creation_date,
                    entry,
                },
            )
            .is_some();
        debug!(
            "{} {} entry under alias {}",
            if replaced { "Replaced" } else { "Stored" },
            entry_type,
            alias
        );
        creation_date
    }

    fn wrap(&self, secret: &[u8], password: &[u8]) -> KeyStoreResult<Vec<u8>> {
        self.factory.wrap_secret(secret, password)
    }

    /// Unwrap and decode, reporting any failure as a wrong password for `alias`
    fn unwrap<T: serde::de::DeserializeOwned>(
        &self,
        alias: &str,
        wrapped: &[u8],
        password: &[u8],
    ) -> KeyStoreResult<T> {
        let secret = self.unwrap_secret(alias, wrapped, password)?;
        bincode::deserialize(secret.as_bytes()).map_err(|_| KeyStoreError::wrong_password(alias))
    }

    fn unwrap_secret(&self, alias: &str, wrapped: &[u8], password: &[u8]) -> KeyStoreResult<SecureBytes> {
        self.factory
            .unwrap_secret(wrapped, password)
            .map_err(|e| match e {
                KeyStoreError::WrongPassword { .. } => KeyStoreError::wrong_password(alias),
                other => other,
            })
    }

    fn record(&self, alias: &str) -> KeyStoreResult<&StoredRecord> {
        self.entries
            .get(alias)
            .ok_or_else(|| KeyStoreError::not_found(alias))
    }

    fn wrong_type(alias: &str, expected: EntryType, record: &StoredRecord) -> KeyStoreError {
        KeyStoreError::WrongType {
            alias: alias.to_string(),
            expected,
            actual: record.entry.entry_type(),
        }
    }

    /// Insert or replace a trusted certificate. The chain it belongs to is
    /// not validated.
    pub fn set_certificate(&mut self, alias: &str, certificate: Certificate) {
        self.insert(alias, StoredEntry::Certificate(certificate));
    }

    /// Insert or replace a key pair with its chain, leaf first
    pub fn set_key_pair(
        &mut self,
        alias: &str,
        key_pair: &KeyPair,
        password: &[u8],
        chain: Vec<Certificate>,
    ) -> KeyStoreResult<()> {
        self.store_key_pair(alias, key_pair, password, chain).map(|_| ())
    }

    pub(crate) fn store_key_pair(
        &mut self,
        alias: &str,
        key_pair: &KeyPair,
        password: &[u8],
        chain: Vec<Certificate>,
    ) -> KeyStoreResult<DateTime<Utc>> {
        let leaf = chain
            .first()
            .ok_or_else(|| KeyStoreError::key_error("set_key_pair", "certificate chain is empty"))?;
        if !leaf.key_pair().matches_public(key_pair) {
            return Err(KeyStoreError::key_error(
                "set_key_pair",
                "leaf certificate does not certify the key pair",
            ));
        }
        let private_key = key_pair
            .private_key
            .as_ref()
            .ok_or_else(|| KeyStoreError::key_error("set_key_pair", "key pair has no private key"))?;
        let wrapped_private_key = self.wrap(private_key.as_bytes(), password)?;
        Ok(self.insert(
            alias,
            StoredEntry::KeyPair {
                spec: key_pair.spec.clone(),
                public_key: key_pair.public_key.clone(),
                wrapped_private_key,
                chain,
            },
        ))
    }

    pub fn set_key(&mut self, alias: &str, key: &Key, password: &[u8]) -> KeyStoreResult<()> {
        self.store_key(alias, key, password).map(|_| ())
    }

    pub(crate) fn store_key(&mut self, alias: &str, key: &Key, password: &[u8]) -> KeyStoreResult<DateTime<Utc>> {
        let wrapped_material = self.wrap(key.material.as_bytes(), password)?;
        Ok(self.insert(
            alias,
            StoredEntry::Key {
                spec: key.spec,
                wrapped_material,
            },
        ))
    }

    pub fn set_key_set(&mut self, alias: &str, key_set: &KeySet, password: &[u8]) -> KeyStoreResult<()> {
        self.store_key_set(alias, key_set, password).map(|_| ())
    }

    pub(crate) fn store_key_set(
        &mut self,
        alias: &str,
        key_set: &KeySet,
        password: &[u8],
    ) -> KeyStoreResult<DateTime<Utc>> {
        let encoded = SecureBytes::from(bincode::serialize(key_set)?);
        let wrapped_keys = self.wrap(encoded.as_bytes(), password)?;
        Ok(self.insert(
            alias,
            StoredEntry::KeySet {
                spec: key_set.spec,
                wrapped_keys,
            },
        ))
    }

    /// Store a key set hash. The hash is already password protected.
    pub fn set_key_set_hash(&mut self, alias: &str, hash: KeySetHash) {
        self.store_key_set_hash(alias, hash);
    }

    pub(crate) fn store_key_set_hash(&mut self, alias: &str, hash: KeySetHash) -> DateTime<Utc> {
        self.insert(alias, StoredEntry::KeySetHash(hash))
    }

    /// Fetch any entry, unwrapping protected content with `password`
    pub fn get_entry(&self, alias: &str, password: &[u8]) -> KeyStoreResult<KeyStoreEntry> {
        let record = self.record(alias)?;
        let creation_date = record.creation_date;
        let entry = match &record.entry {
            StoredEntry::Certificate(certificate) => KeyStoreEntry::Certificate(CertificateEntry {
                certificate: certificate.clone(),
                creation_date,
            }),
            StoredEntry::KeyPair {
                spec,
                public_key,
                wrapped_private_key,
                chain,
            } => {
                let private_key = self.unwrap_secret(alias, wrapped_private_key, password)?;
                KeyStoreEntry::KeyPair(KeyPairEntry {
                    key_pair: KeyPair::new(spec.clone(), public_key.clone(), private_key),
                    chain: chain.clone(),
                    creation_date,
                })
            }
            StoredEntry::Key {
                spec,
                wrapped_material,
            } => {
                let material = self.unwrap_secret(alias, wrapped_material, password)?;
                KeyStoreEntry::Key(KeyEntry {
                    key: Key::new(*spec, material),
                    creation_date,
                })
            }
            StoredEntry::KeySet { wrapped_keys, .. } => KeyStoreEntry::KeySet(KeySetEntry {
                key_set: self.unwrap(alias, wrapped_keys, password)?,
                creation_date,
            }),
            StoredEntry::KeySetHash(hash) => KeyStoreEntry::KeySetHash(KeySetHashEntry {
                hash: hash.clone(),
                creation_date,
            }),
        };
        Ok(entry)
    }

    /// The certificate of a certificate entry, or the leaf of a key pair entry
    pub fn get_certificate(&self, alias: &str) -> KeyStoreResult<Certificate> {
        let record = self.record(alias)?;
        match &record.entry {
            StoredEntry::Certificate(certificate) => Ok(certificate.clone()),
            StoredEntry::KeyPair { chain, .. } => chain
                .first()
                .cloned()
                .ok_or_else(|| KeyStoreError::key_error("get_certificate", "certificate chain is empty")),
            _ => Err(Self::wrong_type(alias, EntryType::Certificate, record)),
        }
    }

    /// Chain of a key pair entry; a certificate entry yields itself
    pub fn get_certificate_chain(&self, alias: &str) -> KeyStoreResult<Vec<Certificate>> {
        let record = self.record(alias)?;
        match &record.entry {
            StoredEntry::Certificate(certificate) => Ok(vec![certificate.clone()]),
            StoredEntry::KeyPair { chain, .. } => Ok(chain.clone()),
            _ => Err(Self::wrong_type(alias, EntryType::KeyPair, record)),
        }
    }

    pub fn get_key_pair(&self, alias: &str, password: &[u8]) -> KeyStoreResult<KeyPairEntry> {
        let record = self.record(alias)?;
        if record.entry.entry_type() != EntryType::KeyPair {
            return Err(Self::wrong_type(alias, EntryType::KeyPair, record));
        }
        match self.get_entry(alias, password)? {
            KeyStoreEntry::KeyPair(entry) => Ok(entry),
            _ => Err(Self::wrong_type(alias, EntryType::KeyPair, record)),
        }
    }

    pub fn get_key(&self, alias: &str, password: &[u8]) -> KeyStoreResult<KeyEntry> {
        let record = self.record(alias)?;
        if record.entry.entry_type() != EntryType::Key {
            return Err(Self::wrong_type(alias, EntryType::Key, record));
        }
        match self.get_entry(alias, password)? {
            KeyStoreEntry::Key(entry) => Ok(entry),
            _ => Err(Self::wrong_type(alias, EntryType::Key, record)),
        }
    }

    pub fn get_key_set(&self, alias: &str, password: &[u8]) -> KeyStoreResult<KeySetEntry> {
        let record = self.record(alias)?;
        if record.entry.entry_type() != EntryType::KeySet {
            return Err(Self::wrong_type(alias, EntryType::KeySet, record));
        }
        match self.get_entry(alias, password)? {
            KeyStoreEntry::KeySet(entry) => Ok(entry),
            _ => Err(Self::wrong_type(alias, EntryType::KeySet, record)),
        }
    }

    pub fn get_key_set_hash(&self, alias: &str) -> KeyStoreResult<KeySetHashEntry> {
        let record = self.record(alias)?;
        match &record.entry {
            StoredEntry::KeySetHash(hash) => Ok(KeySetHashEntry {
                hash: hash.clone(),
                creation_date: record.creation_date,
            }),
            _ => Err(Self::wrong_type(alias, EntryType::KeySetHash, record)),
        }
    }

    /// Remove the entry under `alias`. Returns whether one was present;
    /// deleting a missing alias is not an error.
    pub fn delete_entry(&mut self, alias: &str) -> bool {
        let removed = self.entries.remove(alias).is_some();
        if removed {
            info!("Deleted keystore entry {}", alias);
        }
        removed
    }

    /// Alias of a stored certificate structurally equal to `certificate`.
    ///
    /// Certificate entries are searched first, then the leaf certificates of
    /// key pair entries.
    pub fn get_certificate_alias(&self, certificate: &Certificate) -> Option<String> {
        let find = |wanted: EntryType| {
            self.entries.values().find_map(|record| {
                let held = match &record.entry {
                    StoredEntry::Certificate(held) if wanted == EntryType::Certificate => held,
                    StoredEntry::KeyPair { chain, .. } if wanted == EntryType::KeyPair => chain.first()?,
                    _ => return None,
                };
                (held == certificate).then(|| record.alias.clone())
            })
        };
        find(EntryType::Certificate).or_else(|| find(EntryType::KeyPair))
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All aliases in sorted order
    pub fn aliases(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn contains_alias(&self, alias: &str) -> bool {
        self.entries.contains_key(alias)
    }

    pub fn creation_date(&self, alias: &str) -> Option<DateTime<Utc>> {
        self.entries.get(alias).map(|record| record.creation_date)
    }

    pub fn entry_type(&self, alias: &str) -> Option<EntryType> {
        self.entries.get(alias).map(|record| record.entry.entry_type())
    }

    /// Write every entry as a container
    pub fn write_to<W: Write>(&self, writer: &mut W) -> KeyStoreResult<()> {
        record::write_header(writer)?;
        for stored in self.entries.values() {
            record::write_record(writer, stored)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Load a container; later records for an alias replace earlier ones
    pub fn read_from<R: Read>(factory: Arc<dyn CapabilityFactory>, reader: &mut R) -> KeyStoreResult<Self> {
        let mut store = Self::new(factory);
        for stored in record::read_container(reader)? {
            store.entries.insert(stored.alias.clone(), stored);
        }
        Ok(store)
    }

    /// Write the whole store to `path`, replacing any existing file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> KeyStoreResult<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.write_to(&mut writer)?;
        info!(
            "Saved {} keystore entries to {}",
            self.entries.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(factory: Arc<dyn CapabilityFactory>, path: P) -> KeyStoreResult<Self> {
        let mut reader = BufReader::new(File::open(path.as_ref())?);
        let store = Self::read_from(factory, &mut reader)?;
        info!(
            "Loaded {} keystore entries from {}",
            store.entries.len(),
            path.as_ref().display()
        );
        Ok(store)
    }

    /// Append the current record for `alias` to a container file, creating
    /// the file with a header if it does not exist yet
    pub fn append_record<P: AsRef<Path>>(&self, path: P, alias: &str) -> KeyStoreResult<()> {
        let stored = self.record(alias)?;
        let mut file = OpenOptions::new().create(true).append(true).open(path.as_ref())?;
        if file.metadata()?.len() == 0 {
            record::write_header(&mut file)?;
        }
        record::write_record(&mut file, stored)?;
        file.flush()?;
        debug!("Appended record {} to {}", alias, path.as_ref().display());
        Ok(())
    }
}
