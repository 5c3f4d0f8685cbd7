//! Locks protecting exported entries
//!
//! A lock key is derived from a password with Argon2id, expanded through
//! HKDF-SHA256 and used as an AES-256-GCM key. The derivation parameters and
//! salt travel in the clear as a [`LockDescriptor`] so the importing side can
//! rebuild the key from the password alone.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::KeyDerivationParams;
use crate::error::{KeyStoreError, KeyStoreResult};
use crate::factory::{derive_key, generate_salt, SALT_LEN};
use crate::secure_memory::SecureBytes;

const LOCK_INFO: &[u8] = b"qasa-keystore/lock/v1";
const ENVELOPE_MAGIC: [u8; 4] = *b"QLCK";
const ENVELOPE_VERSION: u8 = 1;
const NONCE_LEN: usize = 12;
const LOCK_KEY_LEN: usize = 32;

/// Public parameters needed to re-derive a lock key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockDescriptor {
    pub kdf: KeyDerivationParams,
    pub salt: Vec<u8>,
}

/// A derived lock key and its descriptor
pub struct Lock {
    descriptor: LockDescriptor,
    key: SecureBytes,
}

impl Lock {
    /// Derive a new lock from `password` with a fresh salt
    pub fn derive(password: &[u8], params: &KeyDerivationParams) -> KeyStoreResult<Self> {
        let descriptor = LockDescriptor {
            kdf: KeyDerivationParams {
                key_length: LOCK_KEY_LEN,
                ..*params
            },
            salt: generate_salt().to_vec(),
        };
        Self::from_descriptor(&descriptor, password)
    }

    /// Rebuild the lock described by `descriptor`.
    ///
    /// Descriptors usually come from an imported file, so derivation costs
    /// beyond [`KeyDerivationParams::within_limits`] are refused before any
    /// work is done. The seed length is fixed whatever the descriptor says.
    pub fn from_descriptor(descriptor: &LockDescriptor, password: &[u8]) -> KeyStoreResult<Self> {
        if descriptor.salt.len() != SALT_LEN {
            return Err(KeyStoreError::lock_error("derive_lock", "invalid salt length"));
        }
        let kdf = KeyDerivationParams {
            key_length: LOCK_KEY_LEN,
            ..descriptor.kdf
        };
        if !kdf.within_limits() {
            return Err(KeyStoreError::lock_error(
                "derive_lock",
                "key derivation cost exceeds the supported limits",
            ));
        }
        let seed = derive_key(password, &descriptor.salt, &kdf)
            .map_err(|e| KeyStoreError::lock_error("derive_lock", &e.to_string()))?;
        let hkdf = Hkdf::<Sha256>::new(Some(&descriptor.salt), seed.as_bytes());
        let mut key = vec![0u8; LOCK_KEY_LEN];
        hkdf.expand(LOCK_INFO, &mut key)
            .map_err(|e| KeyStoreError::lock_error("derive_lock", &e.to_string()))?;
        Ok(Self {
            descriptor: descriptor.clone(),
            key: SecureBytes::from(key),
        })
    }

    pub fn descriptor(&self) -> &LockDescriptor {
        &self.descriptor
    }

    fn cipher(&self) -> KeyStoreResult<Aes256Gcm> {
        Aes256Gcm::new_from_slice(self.key.as_bytes())
            .map_err(|e| KeyStoreError::lock_error("lock_cipher", &e.to_string()))
    }

    /// Encrypt `plaintext` under this lock
    pub fn seal(&self, plaintext: &[u8]) -> KeyStoreResult<LockedEnvelope> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher()?
            .encrypt(&nonce, plaintext)
            .map_err(|e| KeyStoreError::lock_error("seal", &e.to_string()))?;
        Ok(LockedEnvelope {
            descriptor: self.descriptor.clone(),
            nonce: nonce.to_vec(),
            ciphertext,
        })
    }

    /// Decrypt an envelope sealed under this lock
    pub fn open(&self, envelope: &LockedEnvelope) -> KeyStoreResult<SecureBytes> {
        if envelope.nonce.len() != NONCE_LEN {
            return Err(KeyStoreError::lock_error("open", "malformed envelope"));
        }
        self.cipher()?
            .decrypt(Nonce::from_slice(&envelope.nonce), envelope.ciphertext.as_ref())
            .map(SecureBytes::from)
            .map_err(|_| KeyStoreError::lock_error("open", "unable to open lock"))
    }
}

/// Lock-encrypted payload with the descriptor needed to open it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedEnvelope {
    descriptor: LockDescriptor,
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
}

impl LockedEnvelope {
    pub fn descriptor(&self) -> &LockDescriptor {
        &self.descriptor
    }

    pub fn encode(&self) -> KeyStoreResult<Vec<u8>> {
        let mut out = ENVELOPE_MAGIC.to_vec();
        out.push(ENVELOPE_VERSION);
        out.extend(bincode::serialize(self)?);
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> KeyStoreResult<Self> {
        let body = bytes
            .strip_prefix(&ENVELOPE_MAGIC[..])
            .and_then(|rest| rest.split_first())
            .filter(|(version, _)| **version == ENVELOPE_VERSION)
            .map(|(_, body)| body)
            .ok_or_else(|| KeyStoreError::lock_error("decode_envelope", "not a locked envelope"))?;
        Ok(bincode::deserialize(body)?)
    }
}

/// An envelope awaiting its password.
///
/// Handed to a lock resolver, which calls [`ResolvableLock::unlock`] until it
/// succeeds or gives up.
pub struct ResolvableLock {
    envelope: LockedEnvelope,
    plaintext: Option<SecureBytes>,
    attempts: u32,
}

impl ResolvableLock {
    pub fn new(envelope: LockedEnvelope) -> Self {
        Self {
            envelope,
            plaintext: None,
            attempts: 0,
        }
    }

    pub fn descriptor(&self) -> &LockDescriptor {
        self.envelope.descriptor()
    }

    /// Try `password`; returns whether the lock is now open
    pub fn unlock(&mut self, password: &[u8]) -> bool {
        if self.plaintext.is_some() {
            return true;
        }
        self.attempts += 1;
        let opened = Lock::from_descriptor(self.envelope.descriptor(), password)
            .and_then(|lock| lock.open(&self.envelope));
        match opened {
            Ok(plaintext) => {
                self.plaintext = Some(plaintext);
                true
            }
            Err(_) => false,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.plaintext.is_some()
    }

    /// Number of failed or successful `unlock` calls so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub(crate) fn into_plaintext(self) -> Option<SecureBytes> {
        self.plaintext
    }
}
