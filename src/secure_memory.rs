//! Secure Memory Handling Utilities
//!
//! Private keys, unwrapped symmetric keys, passwords and lock keys all pass
//! through [`SecureBytes`], which zeroes its contents when dropped and never
//! prints them.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A container for sensitive byte data that is zeroed when dropped.
///
/// # Security Properties
///
/// 1. Automatically zeroes memory when dropped
/// 2. `Debug` output is redacted
/// 3. Equality is evaluated in constant time
///
/// # Example
///
/// ```
/// use qasa_keystore::secure_memory::SecureBytes;
///
/// let password = SecureBytes::from("correct horse");
/// assert_eq!(password.len(), 13);
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop, Default)]
pub struct SecureBytes {
    bytes: Vec<u8>,
}

impl SecureBytes {
    /// Create a new SecureBytes holding a copy of `data`
    pub fn new(data: &[u8]) -> Self {
        Self {
            bytes: data.to_vec(),
        }
    }

    /// Get a reference to the underlying bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the current length of the buffer in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for SecureBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl From<&[u8]> for SecureBytes {
    fn from(data: &[u8]) -> Self {
        Self::new(data)
    }
}

impl From<&str> for SecureBytes {
    fn from(data: &str) -> Self {
        Self::new(data.as_bytes())
    }
}

impl AsRef<[u8]> for SecureBytes {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq for SecureBytes {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.len() == other.bytes.len() && bool::from(self.bytes.ct_eq(&other.bytes))
    }
}

impl Eq for SecureBytes {}

impl fmt::Debug for SecureBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureBytes([REDACTED; {}])", self.bytes.len())
    }
}

impl Serialize for SecureBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.bytes)
    }
}

impl<'de> Deserialize<'de> for SecureBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SecureBytesVisitor;

        impl<'de> Visitor<'de> for SecureBytesVisitor {
            type Value = SecureBytes;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a byte array")
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<SecureBytes, E> {
                Ok(SecureBytes::new(v))
            }

            fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<SecureBytes, E> {
                Ok(SecureBytes::from(v))
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<SecureBytes, A::Error> {
                let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                Ok(SecureBytes::from(bytes))
            }
        }

        deserializer.deserialize_byte_buf(SecureBytesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecureBytes::from("hunter2");
        let printed = format!("{:?}", secret);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("REDACTED"));
    }

    #[test]
    fn test_equality() {
        assert_eq!(SecureBytes::from("abc"), SecureBytes::new(b"abc"));
        assert_ne!(SecureBytes::from("abc"), SecureBytes::from("abd"));
        assert_ne!(SecureBytes::from("abc"), SecureBytes::from("abcd"));
    }

    #[test]
    fn test_bincode_round_trip() {
        let secret = SecureBytes::new(&[1, 2, 3, 250]);
        let encoded = bincode::serialize(&secret).unwrap();
        let decoded: SecureBytes = bincode::deserialize(&encoded).unwrap();
        assert_eq!(secret, decoded);
    }
}
