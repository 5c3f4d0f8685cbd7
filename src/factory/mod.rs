//! Capability factory
//!
//! The keystore never performs cryptographic math itself. Everything from key
//! generation to signing and password wrapping goes through a
//! [`CapabilityFactory`], which also reports which specs it can actually run.

mod password;
#[cfg(feature = "post-quantum")]
mod post_quantum;
mod standard;

pub use standard::StandardFactory;

pub(crate) use password::{derive_key, generate_salt, SALT_LEN};

use crate::error::KeyStoreResult;
use crate::keys::{Key, KeyPair};
use crate::secure_memory::SecureBytes;
use crate::spec::{matches_key_pair, KeyPairSpec, KeySpec, MacSpec, SignatureSpec, SymKeySpec};

/// Supplier of concrete cryptographic operations for validated specs.
///
/// Implementations report runtime support through the `supports_*`
/// predicates and fail with `UnsupportedSpec` when asked to run anything
/// else. Signature verification returns `Ok(false)` for a signature that does
/// not verify, including a malformed one; errors are reserved for unsupported
/// specs and provider failures.
pub trait CapabilityFactory: Send + Sync {
    fn supports_key_pair_spec(&self, spec: &KeyPairSpec) -> bool;

    fn supports_signature_spec(&self, spec: &SignatureSpec) -> bool;

    fn supports_mac_spec(&self, spec: &MacSpec) -> bool;

    fn supports_sym_key_spec(&self, spec: &SymKeySpec) -> bool;

    /// Per-type matcher deciding whether a key pair can sign with a spec
    fn key_pair_supports(&self, key_pair: &KeyPairSpec, signature: &SignatureSpec) -> bool {
        matches_key_pair(key_pair, signature)
    }

    fn generate_key_pair(&self, spec: &KeyPairSpec) -> KeyStoreResult<KeyPair>;

    fn generate_key(&self, spec: &KeySpec) -> KeyStoreResult<Key>;

    fn sign(&self, key_pair: &KeyPair, spec: &SignatureSpec, message: &[u8]) -> KeyStoreResult<Vec<u8>>;

    fn verify(
        &self,
        key_pair: &KeyPair,
        spec: &SignatureSpec,
        message: &[u8],
        signature: &[u8],
    ) -> KeyStoreResult<bool>;

    fn mac(&self, key: &Key, message: &[u8]) -> KeyStoreResult<Vec<u8>>;

    /// Encrypt secret material under a password
    fn wrap_secret(&self, secret: &[u8], password: &[u8]) -> KeyStoreResult<Vec<u8>>;

    /// Reverse [`CapabilityFactory::wrap_secret`]; fails with `WrongPassword`
    fn unwrap_secret(&self, wrapped: &[u8], password: &[u8]) -> KeyStoreResult<SecureBytes>;
}
