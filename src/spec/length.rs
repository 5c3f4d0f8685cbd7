//! Bit lengths shared by digest, cipher, key and MAC specs

use serde::{Deserialize, Serialize};
use std::fmt;

/// A length in bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Length {
    Len32,
    Len64,
    Len128,
    Len160,
    Len192,
    Len224,
    Len256,
    Len320,
    Len384,
    Len512,
    Len1024,
}

impl Length {
    pub const ALL: [Length; 11] = [
        Length::Len32,
        Length::Len64,
        Length::Len128,
        Length::Len160,
        Length::Len192,
        Length::Len224,
        Length::Len256,
        Length::Len320,
        Length::Len384,
        Length::Len512,
        Length::Len1024,
    ];

    /// Number of bits
    pub const fn bits(self) -> u32 {
        match self {
            Length::Len32 => 32,
            Length::Len64 => 64,
            Length::Len128 => 128,
            Length::Len160 => 160,
            Length::Len192 => 192,
            Length::Len224 => 224,
            Length::Len256 => 256,
            Length::Len320 => 320,
            Length::Len384 => 384,
            Length::Len512 => 512,
            Length::Len1024 => 1024,
        }
    }

    /// Number of whole bytes
    pub const fn bytes(self) -> usize {
        (self.bits() / 8) as usize
    }

    pub fn from_bits(bits: u32) -> Option<Length> {
        Length::ALL.iter().copied().find(|l| l.bits() == bits)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}
