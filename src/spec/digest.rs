//! Digest specifications
//!
//! A digest is identified by its family, its internal state length and its
//! output length. Each family accepts a fixed table of (state, output) pairs.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::length::Length;
use Length::*;

/// Digest families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DigestType {
    Sha1,
    Sha2,
    Sha3,
    Shake,
    Blake2,
    Blake3,
    Sm3,
    Streebog,
    Gost,
    Kupyna,
    Skein,
    RipeMd,
    Whirlpool,
    Tiger,
    Md5,
    Haraka,
}

impl DigestType {
    pub const ALL: [DigestType; 16] = [
        DigestType::Sha1,
        DigestType::Sha2,
        DigestType::Sha3,
        DigestType::Shake,
        DigestType::Blake2,
        DigestType::Blake3,
        DigestType::Sm3,
        DigestType::Streebog,
        DigestType::Gost,
        DigestType::Kupyna,
        DigestType::Skein,
        DigestType::RipeMd,
        DigestType::Whirlpool,
        DigestType::Tiger,
        DigestType::Md5,
        DigestType::Haraka,
    ];

    /// Haraka only hashes fixed 256/512-bit inputs
    pub fn supports_large_data(self) -> bool {
        !matches!(self, DigestType::Haraka)
    }

    /// Extendable-output functions
    pub fn is_xof(self) -> bool {
        matches!(self, DigestType::Shake | DigestType::Blake3)
    }

    /// Internal state lengths accepted by this family
    pub fn state_lengths(self) -> &'static [Length] {
        match self {
            DigestType::Sha1 => &[Len160],
            DigestType::Sha2 => &[Len256, Len512],
            DigestType::Sha3 => &[Len224, Len256, Len384, Len512],
            DigestType::Shake => &[Len128, Len256],
            DigestType::Blake2 => &[Len256, Len512],
            DigestType::Blake3 => &[Len256],
            DigestType::Sm3 => &[Len256],
            DigestType::Streebog => &[Len512],
            DigestType::Gost => &[Len256],
            DigestType::Kupyna => &[Len256, Len384, Len512],
            DigestType::Skein => &[Len256, Len512, Len1024],
            DigestType::RipeMd => &[Len128, Len160, Len256, Len320],
            DigestType::Whirlpool => &[Len512],
            DigestType::Tiger => &[Len192],
            DigestType::Md5 => &[Len128],
            DigestType::Haraka => &[Len256, Len512],
        }
    }

    /// Output lengths accepted for the given state length
    pub fn output_lengths(self, state: Length) -> &'static [Length] {
        match (self, state) {
            (DigestType::Sha2, Len256) => &[Len224, Len256],
            (DigestType::Sha2, Len512) => &[Len224, Len256, Len384, Len512],
            (DigestType::Shake, Len128) => &[Len256],
            (DigestType::Shake, Len256) => &[Len512],
            (DigestType::Blake2, Len256) => &[Len128, Len160, Len224, Len256],
            (DigestType::Blake2, Len512) => &[Len160, Len256, Len384, Len512],
            (DigestType::Blake3, Len256) => &[Len256, Len512],
            (DigestType::Streebog, Len512) => &[Len256, Len512],
            (DigestType::Skein, Len256) => &[Len128, Len160, Len224, Len256],
            (DigestType::Skein, Len512) => &[Len128, Len160, Len224, Len256, Len384, Len512],
            (DigestType::Skein, Len1024) => &[Len384, Len512, Len1024],
            (digest, state) if digest.state_lengths().contains(&state) => {
                // Remaining families emit exactly their state length
                match state {
                    Len128 => &[Len128],
                    Len160 => &[Len160],
                    Len192 => &[Len192],
                    Len224 => &[Len224],
                    Len256 => &[Len256],
                    Len320 => &[Len320],
                    Len384 => &[Len384],
                    Len512 => &[Len512],
                    _ => &[],
                }
            }
            _ => &[],
        }
    }

    /// State length used when only an output length is named
    fn state_for_output(self, output: Length) -> Length {
        match self {
            DigestType::Sha2 if output.bits() <= 256 => Len256,
            DigestType::Sha2 => Len512,
            DigestType::Shake if output.bits() <= 256 => Len128,
            DigestType::Shake => Len256,
            DigestType::Blake2 if output.bits() <= 256 => Len256,
            DigestType::Blake2 => Len512,
            DigestType::Blake3 => Len256,
            DigestType::Streebog => Len512,
            DigestType::Skein if output.bits() <= 256 => Len256,
            DigestType::Skein if output.bits() <= 512 => Len512,
            DigestType::Skein => Len1024,
            _ => output,
        }
    }
}

impl fmt::Display for DigestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DigestType::Sha1 => "SHA1",
            DigestType::Sha2 => "SHA2",
            DigestType::Sha3 => "SHA3",
            DigestType::Shake => "SHAKE",
            DigestType::Blake2 => "Blake2",
            DigestType::Blake3 => "Blake3",
            DigestType::Sm3 => "SM3",
            DigestType::Streebog => "Streebog",
            DigestType::Gost => "GOST3411",
            DigestType::Kupyna => "Kupyna",
            DigestType::Skein => "Skein",
            DigestType::RipeMd => "RIPEMD",
            DigestType::Whirlpool => "Whirlpool",
            DigestType::Tiger => "Tiger",
            DigestType::Md5 => "MD5",
            DigestType::Haraka => "Haraka",
        };
        f.write_str(name)
    }
}

/// A fully specified digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DigestSpec {
    pub digest_type: DigestType,
    pub state_length: Length,
    pub output_length: Length,
}

impl DigestSpec {
    pub fn new(digest_type: DigestType, state_length: Length, output_length: Length) -> Self {
        Self {
            digest_type,
            state_length,
            output_length,
        }
    }

    /// Digest with the given output length and the family's natural state length
    pub fn of(digest_type: DigestType, output_length: Length) -> Self {
        Self::new(
            digest_type,
            digest_type.state_for_output(output_length),
            output_length,
        )
    }

    pub fn sha1() -> Self {
        Self::of(DigestType::Sha1, Len160)
    }

    pub fn sha2(length: Length) -> Self {
        Self::of(DigestType::Sha2, length)
    }

    pub fn sha3(length: Length) -> Self {
        Self::of(DigestType::Sha3, length)
    }

    pub fn shake128() -> Self {
        Self::new(DigestType::Shake, Len128, Len256)
    }

    pub fn shake256() -> Self {
        Self::new(DigestType::Shake, Len256, Len512)
    }

    pub fn sm3() -> Self {
        Self::of(DigestType::Sm3, Len256)
    }

    pub fn streebog(length: Length) -> Self {
        Self::of(DigestType::Streebog, length)
    }

    pub fn gost() -> Self {
        Self::of(DigestType::Gost, Len256)
    }

    pub fn is_valid(&self) -> bool {
        self.digest_type.state_lengths().contains(&self.state_length)
            && self
                .digest_type
                .output_lengths(self.state_length)
                .contains(&self.output_length)
    }

    /// Whether the output is cut down from a wider state (e.g. SHA2-512/256)
    pub fn is_truncated(&self) -> bool {
        match self.digest_type {
            DigestType::Sha2 => self.state_length == Len512 && self.output_length.bits() < 384,
            DigestType::Skein | DigestType::Blake2 => self.output_length != self.state_length,
            _ => false,
        }
    }
}

impl fmt::Display for DigestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.digest_type {
            DigestType::Sha2 if self.state_length == Len512 && self.output_length.bits() < 384 => {
                write!(f, "SHA2-512/{}", self.output_length)
            }
            DigestType::Shake => write!(f, "SHAKE{}", self.state_length),
            DigestType::Blake2 if self.state_length == Len256 => {
                write!(f, "Blake2s-{}", self.output_length)
            }
            DigestType::Blake2 => write!(f, "Blake2b-{}", self.output_length),
            DigestType::Skein => write!(f, "Skein-{}-{}", self.state_length, self.output_length),
            DigestType::Sha1 | DigestType::Sm3 | DigestType::Gost | DigestType::Whirlpool
            | DigestType::Tiger | DigestType::Md5 => write!(f, "{}", self.digest_type),
            _ => write!(f, "{}-{}", self.digest_type, self.output_length),
        }
    }
}

/// Every valid digest spec, in a deterministic order
pub fn list_all_digest_specs() -> Vec<DigestSpec> {
    let mut specs = Vec::new();
    for digest_type in DigestType::ALL {
        for &state in digest_type.state_lengths() {
            for &output in digest_type.output_lengths(state) {
                specs.push(DigestSpec::new(digest_type, state, output));
            }
        }
    }
    specs
}
