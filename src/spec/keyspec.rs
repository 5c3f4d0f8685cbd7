//! Symmetric and MAC key specifications, and multi-cipher key sets

use serde::{Deserialize, Serialize};
use std::fmt;

use super::length::Length;
use super::mac::MacSpec;
use super::symmetric::{list_sym_key_specs, SymKeySpec};

/// What a symmetric key is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeySpec {
    Symmetric(SymKeySpec),
    Mac(MacSpec),
}

impl KeySpec {
    pub fn key_length(&self) -> Length {
        match self {
            KeySpec::Symmetric(spec) => spec.key_length,
            KeySpec::Mac(spec) => spec.key_length,
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            KeySpec::Symmetric(spec) => spec.is_valid(),
            KeySpec::Mac(spec) => spec.is_valid(),
        }
    }
}

impl From<SymKeySpec> for KeySpec {
    fn from(spec: SymKeySpec) -> Self {
        KeySpec::Symmetric(spec)
    }
}

impl From<MacSpec> for KeySpec {
    fn from(spec: MacSpec) -> Self {
        KeySpec::Mac(spec)
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySpec::Symmetric(spec) => write!(f, "{}", spec),
            KeySpec::Mac(spec) => write!(f, "{}", spec),
        }
    }
}

/// A set of cipher keys applied in sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeySetSpec {
    pub key_length: Length,
    /// Number of cipher layers, 1 to 5
    pub cipher_steps: u8,
}

impl KeySetSpec {
    pub const MAX_CIPHER_STEPS: u8 = 5;

    pub fn new(key_length: Length, cipher_steps: u8) -> Self {
        Self {
            key_length,
            cipher_steps,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(
            self.key_length,
            Length::Len128 | Length::Len192 | Length::Len256
        ) && (1..=Self::MAX_CIPHER_STEPS).contains(&self.cipher_steps)
    }

    /// The cipher specs making up the set, one per step
    pub fn sym_key_specs(&self) -> Vec<SymKeySpec> {
        if !self.is_valid() {
            return Vec::new();
        }
        list_sym_key_specs(self.key_length)
            .into_iter()
            .filter(|spec| spec.block_length == Length::Len128)
            .take(self.cipher_steps as usize)
            .collect()
    }
}

impl Default for KeySetSpec {
    fn default() -> Self {
        Self::new(Length::Len256, 3)
    }
}

impl fmt::Display for KeySetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeySet-{}x{}", self.key_length, self.cipher_steps)
    }
}
