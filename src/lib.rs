/*!
 * QaSa Keystore
 *
 * A keystore for trust material: certificates, key pairs with their
 * certificate chains, symmetric and MAC keys, key sets and key set hashes,
 * each held under a caller-chosen alias.
 *
 * The crate is layered, leaves first:
 *
 * - `spec` describes algorithm combinations and decides which are legal
 * - `factory` runs the cryptography for the combinations it supports
 * - `certificate` models identities, signed certificates and chains
 * - `keystore` holds entries and builds, exports and imports them
 *
 * Post-quantum and hybrid signatures (ML-DSA, Falcon, SLH-DSA, and
 * composites mixing them with classical keys) are available with the
 * `post-quantum` feature.
 */

/// Common error types for the keystore
pub mod error;

/// Secure memory handling utilities
pub mod secure_memory;

/// Key derivation and keystore configuration
pub mod config;

/// Algorithm specifications and their validity rules
pub mod spec;

/// Cryptographic capabilities behind a narrow trait
pub mod factory;

/// Key material value types
pub mod keys;

/// Identities, certificates and chains
pub mod certificate;

/// The keystore, its manager and its gateway
pub mod keystore;

pub use certificate::{Certificate, DistinguishedName, KeyUsage, KeyUsageSet};
pub use config::{KeyDerivationParams, KeyStoreConfig};
pub use error::{ChainFailure, KeyStoreError, KeyStoreResult};
pub use factory::{CapabilityFactory, StandardFactory};
pub use keystore::{KeyStore, KeyStoreEntry, KeyStoreGateway, KeyStoreManager, SharedKeyStore};

/// Build a shared keystore, its manager and its gateway over a
/// [`StandardFactory`] configured from `config`.
///
/// # Example
///
/// ```
/// use qasa_keystore::prelude::*;
///
/// fn main() -> Result<(), KeyStoreError> {
///     let (manager, _gateway) = open(KeyStoreConfig::minimal())?;
///     let subject = DistinguishedName::parse("CN=Example Root")?;
///     let root = manager.create_root_key_pair(
///         &KeyPairSpec::ec(EcCurve::Secp256r1),
///         &subject,
///         "root",
///         b"password",
///     )?;
///     assert!(root.certificate().unwrap().is_self_signed(manager.validator().factory().as_ref()));
///     Ok(())
/// }
/// ```
pub fn open(config: KeyStoreConfig) -> KeyStoreResult<(KeyStoreManager, KeyStoreGateway)> {
    let factory: std::sync::Arc<dyn CapabilityFactory> = std::sync::Arc::new(StandardFactory::new(config.kdf));
    let store = KeyStore::new(factory).into_shared();
    let manager = KeyStoreManager::new(store, config)?;
    let gateway = KeyStoreGateway::new(manager.clone());
    Ok((manager, gateway))
}

/// The types most callers need
pub mod prelude {
    pub use crate::certificate::{
        verify_chain, verify_chain_now, Certificate, CertificateBuilder, CertificateRequest,
        DistinguishedName, KeyUsage, KeyUsageSet,
    };
    pub use crate::config::{KeyDerivationParams, KeyStoreConfig};
    pub use crate::error::{ChainFailure, KeyStoreError, KeyStoreResult};
    pub use crate::factory::{CapabilityFactory, StandardFactory};
    pub use crate::keys::{Key, KeyPair, KeySet, KeySetHash};
    pub use crate::keystore::{
        EntryType, KeyPairEntry, KeyStore, KeyStoreEntry, KeyStoreGateway, KeyStoreManager, Lock,
        ResolvableLock, SharedKeyStore,
    };
    pub use crate::open;
    pub use crate::secure_memory::SecureBytes;
    pub use crate::spec::{
        DigestSpec, EcCurve, KeyPairSpec, KeySetSpec, KeySpec, Length, MacSpec, SignatureSpec,
        SpecValidator, SymKeySpec,
    };
}
