//! Key material value types
//!
//! Public keys are plain bytes; private and symmetric material always lives in
//! [`SecureBytes`]. Encodings are opaque to the keystore and owned by the
//! capability factory that produced them.

use serde::{Deserialize, Serialize};

use crate::error::{KeyStoreError, KeyStoreResult};
use crate::factory::CapabilityFactory;
use crate::secure_memory::SecureBytes;
use crate::spec::{KeyPairSpec, KeySetSpec, KeySpec};

/// An asymmetric key pair, or just its public half
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub spec: KeyPairSpec,
    pub public_key: Vec<u8>,
    pub private_key: Option<SecureBytes>,
}

/// Encoded component keys of a composite key pair
#[derive(Serialize, Deserialize)]
pub(crate) struct CompositeEncoding {
    pub public_keys: Vec<Vec<u8>>,
    pub private_keys: Option<Vec<SecureBytes>>,
}

impl KeyPair {
    pub fn new(spec: KeyPairSpec, public_key: Vec<u8>, private_key: SecureBytes) -> Self {
        Self {
            spec,
            public_key,
            private_key: Some(private_key),
        }
    }

    pub fn public_only(spec: KeyPairSpec, public_key: Vec<u8>) -> Self {
        Self {
            spec,
            public_key,
            private_key: None,
        }
    }

    /// Copy without the private half
    pub fn to_public(&self) -> KeyPair {
        KeyPair::public_only(self.spec.clone(), self.public_key.clone())
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// Same spec and same public key; private halves are not compared
    pub fn matches_public(&self, other: &KeyPair) -> bool {
        self.spec == other.spec && self.public_key == other.public_key
    }

    /// Assemble a composite key pair from component key pairs in spec order
    pub fn composite(components: Vec<KeyPair>) -> KeyStoreResult<KeyPair> {
        let spec = KeyPairSpec::Composite(components.iter().map(|c| c.spec.clone()).collect());
        let all_private = components.iter().all(KeyPair::has_private_key);
        let mut public_keys = Vec::with_capacity(components.len());
        let mut private_keys = Vec::with_capacity(components.len());
        for component in components {
            public_keys.push(component.public_key);
            if let Some(private_key) = component.private_key {
                private_keys.push(private_key);
            }
        }
        let public_key = bincode::serialize(&public_keys)?;
        if !all_private {
            return Ok(KeyPair::public_only(spec, public_key));
        }
        let encoding = CompositeEncoding {
            public_keys,
            private_keys: Some(private_keys),
        };
        let private_key = SecureBytes::from(bincode::serialize(&encoding)?);
        Ok(KeyPair::new(spec, public_key, private_key))
    }

    /// Split a composite key pair into its component key pairs
    pub fn components(&self) -> KeyStoreResult<Vec<KeyPair>> {
        let specs = match &self.spec {
            KeyPairSpec::Composite(specs) => specs,
            _ => return Ok(vec![self.clone()]),
        };
        let (public_keys, private_keys) = match &self.private_key {
            Some(private_key) => {
                let encoding: CompositeEncoding = bincode::deserialize(private_key.as_bytes())?;
                (encoding.public_keys, encoding.private_keys)
            }
            None => (bincode::deserialize::<Vec<Vec<u8>>>(&self.public_key)?, None),
        };
        if public_keys.len() != specs.len() {
            return Err(KeyStoreError::key_error(
                "composite_components",
                "component count does not match spec",
            ));
        }
        let mut private_iter = private_keys.map(Vec::into_iter);
        let mut components = Vec::with_capacity(specs.len());
        for (spec, public_key) in specs.iter().zip(public_keys) {
            let private_key = private_iter.as_mut().and_then(|keys| keys.next());
            components.push(KeyPair {
                spec: spec.clone(),
                public_key,
                private_key,
            });
        }
        Ok(components)
    }
}

/// A symmetric or MAC key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub spec: KeySpec,
    pub material: SecureBytes,
}

impl Key {
    pub fn new(spec: KeySpec, material: SecureBytes) -> Self {
        Self { spec, material }
    }
}

/// Keys for a multi-cipher set, one per step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySet {
    pub spec: KeySetSpec,
    pub keys: Vec<Key>,
}

impl KeySet {
    /// Generate one key per cipher step of `spec`
    pub fn generate(factory: &dyn CapabilityFactory, spec: KeySetSpec) -> KeyStoreResult<KeySet> {
        if !spec.is_valid() {
            return Err(KeyStoreError::unsupported_spec(spec, "invalid key set spec"));
        }
        let keys = spec
            .sym_key_specs()
            .into_iter()
            .map(|cipher| factory.generate_key(&KeySpec::Symmetric(cipher)))
            .collect::<KeyStoreResult<Vec<_>>>()?;
        Ok(KeySet { spec, keys })
    }
}

/// A key set wrapped under a password.
///
/// The hash carries everything needed to rebuild the key set given the
/// password, and nothing that reveals it without.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySetHash {
    pub spec: KeySetSpec,
    pub hash: Vec<u8>,
}

impl KeySetHash {
    pub fn new(
        factory: &dyn CapabilityFactory,
        key_set: &KeySet,
        password: &[u8],
    ) -> KeyStoreResult<KeySetHash> {
        let encoded = SecureBytes::from(bincode::serialize(key_set)?);
        let hash = factory.wrap_secret(encoded.as_bytes(), password)?;
        Ok(KeySetHash {
            spec: key_set.spec,
            hash,
        })
    }

    /// Recover the key set; fails with `WrongPassword` on a wrong password
    pub fn resolve(&self, factory: &dyn CapabilityFactory, password: &[u8]) -> KeyStoreResult<KeySet> {
        let encoded = factory.unwrap_secret(&self.hash, password)?;
        Ok(bincode::deserialize(encoded.as_bytes())?)
    }
}
