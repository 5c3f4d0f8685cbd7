//! Keystore entry model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::certificate::Certificate;
use crate::error::{KeyStoreError, KeyStoreResult};
use crate::keys::{Key, KeyPair, KeySet, KeySetHash};
use crate::spec::{KeyPairSpec, KeySetSpec, KeySpec};

/// Variant tag of a keystore entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    Certificate,
    KeyPair,
    Key,
    KeySet,
    KeySetHash,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryType::Certificate => "certificate",
            EntryType::KeyPair => "key pair",
            EntryType::Key => "key",
            EntryType::KeySet => "key set",
            EntryType::KeySetHash => "key set hash",
        };
        f.write_str(name)
    }
}

/// A trusted certificate with no private material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateEntry {
    pub certificate: Certificate,
    pub creation_date: DateTime<Utc>,
}

/// A key pair and its certificate chain, leaf first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPairEntry {
    pub key_pair: KeyPair,
    pub chain: Vec<Certificate>,
    pub creation_date: DateTime<Utc>,
}

impl KeyPairEntry {
    /// The leaf certificate
    pub fn certificate(&self) -> Option<&Certificate> {
        self.chain.first()
    }

    /// The leaf certificate, which must certify this entry's key pair
    pub(crate) fn leaf(&self, operation: &str) -> KeyStoreResult<&Certificate> {
        let leaf = self
            .chain
            .first()
            .ok_or_else(|| KeyStoreError::key_error(operation, "certificate chain is empty"))?;
        if !leaf.key_pair().matches_public(&self.key_pair) {
            return Err(KeyStoreError::key_error(
                operation,
                "leaf certificate does not certify the key pair",
            ));
        }
        Ok(leaf)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEntry {
    pub key: Key,
    pub creation_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySetEntry {
    pub key_set: KeySet,
    pub creation_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySetHashEntry {
    pub hash: KeySetHash,
    pub creation_date: DateTime<Utc>,
}

/// An unwrapped keystore entry as handed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyStoreEntry {
    Certificate(CertificateEntry),
    KeyPair(KeyPairEntry),
    Key(KeyEntry),
    KeySet(KeySetEntry),
    KeySetHash(KeySetHashEntry),
}

impl KeyStoreEntry {
    pub fn entry_type(&self) -> EntryType {
        match self {
            KeyStoreEntry::Certificate(_) => EntryType::Certificate,
            KeyStoreEntry::KeyPair(_) => EntryType::KeyPair,
            KeyStoreEntry::Key(_) => EntryType::Key,
            KeyStoreEntry::KeySet(_) => EntryType::KeySet,
            KeyStoreEntry::KeySetHash(_) => EntryType::KeySetHash,
        }
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        match self {
            KeyStoreEntry::Certificate(entry) => entry.creation_date,
            KeyStoreEntry::KeyPair(entry) => entry.creation_date,
            KeyStoreEntry::Key(entry) => entry.creation_date,
            KeyStoreEntry::KeySet(entry) => entry.creation_date,
            KeyStoreEntry::KeySetHash(entry) => entry.creation_date,
        }
    }

    /// Certificates carried by the entry, leaf first
    pub fn certificates(&self) -> &[Certificate] {
        match self {
            KeyStoreEntry::Certificate(entry) => std::slice::from_ref(&entry.certificate),
            KeyStoreEntry::KeyPair(entry) => &entry.chain,
            KeyStoreEntry::Key(_) | KeyStoreEntry::KeySet(_) | KeyStoreEntry::KeySetHash(_) => &[],
        }
    }
}

/// Entry payload as held in the store and in container records.
///
/// Private and symmetric material is kept password-wrapped; only the
/// certificate and key set hash variants are stored as is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum StoredEntry {
    Certificate(Certificate),
    KeyPair {
        spec: KeyPairSpec,
        public_key: Vec<u8>,
        wrapped_private_key: Vec<u8>,
        chain: Vec<Certificate>,
    },
    Key {
        spec: KeySpec,
        wrapped_material: Vec<u8>,
    },
    KeySet {
        spec: KeySetSpec,
        wrapped_keys: Vec<u8>,
    },
    KeySetHash(KeySetHash),
}

impl StoredEntry {
    pub(crate) fn entry_type(&self) -> EntryType {
        match self {
            StoredEntry::Certificate(_) => EntryType::Certificate,
            StoredEntry::KeyPair { .. } => EntryType::KeyPair,
            StoredEntry::Key { .. } => EntryType::Key,
            StoredEntry::KeySet { .. } => EntryType::KeySet,
            StoredEntry::KeySetHash(_) => EntryType::KeySetHash,
        }
    }
}

/// One alias binding: the unit of the container format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredRecord {
    pub alias: String,
    pub creation_date: DateTime<Utc>,
    pub entry: StoredEntry,
}
