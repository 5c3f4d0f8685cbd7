/*!
 * Keystore
 *
 * The alias to entry map and the workflows layered on it:
 *
 * - [`KeyStore`] owns the entries and persists them as a record container.
 * - [`KeyStoreManager`] creates root and issued key pairs, keys and key sets.
 * - [`KeyStoreGateway`] exports and imports entries under locks and handles
 *   certificate requests.
 *
 * Mutations must be serialized. Share a store between a manager, a gateway
 * and readers as a [`SharedKeyStore`].
 */

mod entry;
mod gateway;
mod lock;
mod manager;
mod record;
mod store;

pub use entry::{
    CertificateEntry, EntryType, KeyEntry, KeyPairEntry, KeySetEntry, KeySetHashEntry, KeyStoreEntry,
};
pub use gateway::{KeyStoreGateway, LockResolver, PasswordResolver};
pub use lock::{Lock, LockDescriptor, LockedEnvelope, ResolvableLock};
pub use manager::KeyStoreManager;
pub use store::{KeyStore, SharedKeyStore};

/// Decode a container without building a store; used by the fuzz targets
#[doc(hidden)]
pub fn decode_container(bytes: &[u8]) -> crate::error::KeyStoreResult<usize> {
    let mut reader = bytes;
    record::read_container(&mut reader).map(|records| records.len())
}

#[cfg(test)]
mod tests;
