//! Certificate identities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{KeyStoreError, KeyStoreResult};

/// Attribute names accepted in a distinguished name
const KNOWN_ATTRIBUTES: [&str; 10] = ["CN", "O", "OU", "C", "ST", "L", "E", "DC", "UID", "SN"];

/// An ordered distinguished name such as `CN=Root, O=Example`.
///
/// Comparison is exact and order-sensitive: two names are the same identity
/// only when every attribute matches in sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistinguishedName {
    attributes: Vec<(String, String)>,
}

impl DistinguishedName {
    /// Parse a comma-separated `ATTR=value` list
    pub fn parse(name: &str) -> KeyStoreResult<Self> {
        let mut attributes = Vec::new();
        for part in name.split(',') {
            let part = part.trim();
            let (attribute, value) = part
                .split_once('=')
                .ok_or_else(|| KeyStoreError::InvalidIdentity(format!("missing '=' in {:?}", part)))?;
            let attribute = attribute.trim().to_ascii_uppercase();
            let value = value.trim();
            if !KNOWN_ATTRIBUTES.contains(&attribute.as_str()) {
                return Err(KeyStoreError::InvalidIdentity(format!(
                    "unknown attribute {:?}",
                    attribute
                )));
            }
            if value.is_empty() {
                return Err(KeyStoreError::InvalidIdentity(format!(
                    "empty value for {}",
                    attribute
                )));
            }
            attributes.push((attribute, value.to_string()));
        }
        Ok(Self { attributes })
    }

    /// Single-attribute common name
    pub fn common_name(name: &str) -> KeyStoreResult<Self> {
        Self::parse(&format!("CN={}", name))
    }

    /// First value of an attribute
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }
}

impl FromStr for DistinguishedName {
    type Err = KeyStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (attribute, value)) in self.attributes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", attribute, value)?;
        }
        Ok(())
    }
}
