//! MAC specifications

use serde::{Deserialize, Serialize};
use std::fmt;

use super::digest::{list_all_digest_specs, DigestType};
use super::length::Length;
use super::symmetric::{list_sym_key_specs, SymKeySpec, SymKeyType};
use super::DigestSpec;

/// MAC constructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MacType {
    Hmac,
    Gmac,
    Cmac,
    Poly1305,
    SkeinMac,
    Kalyna,
    Kmac,
    Zuc,
    CbcMac,
    CfbMac,
    SipHash,
    Gost,
    Blake2,
    Blake3,
}

impl MacType {
    pub const ALL: [MacType; 14] = [
        MacType::Hmac,
        MacType::Gmac,
        MacType::Cmac,
        MacType::Poly1305,
        MacType::SkeinMac,
        MacType::Kalyna,
        MacType::Kmac,
        MacType::Zuc,
        MacType::CbcMac,
        MacType::CfbMac,
        MacType::SipHash,
        MacType::Gost,
        MacType::Blake2,
        MacType::Blake3,
    ];
}

impl fmt::Display for MacType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MacType::Hmac => "HMac",
            MacType::Gmac => "GMac",
            MacType::Cmac => "CMac",
            MacType::Poly1305 => "Poly1305",
            MacType::SkeinMac => "SkeinMac",
            MacType::Kalyna => "KalynaMac",
            MacType::Kmac => "KMac",
            MacType::Zuc => "ZucMac",
            MacType::CbcMac => "CBCMac",
            MacType::CfbMac => "CFBMac",
            MacType::SipHash => "SipHash",
            MacType::Gost => "GOSTMac",
            MacType::Blake2 => "Blake2Mac",
            MacType::Blake3 => "Blake3Mac",
        };
        f.write_str(name)
    }
}

/// SipHash round and output variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SipHashSpec {
    SipHash24,
    SipHash48,
    SipHash128_24,
    SipHash128_48,
}

impl SipHashSpec {
    pub const ALL: [SipHashSpec; 4] = [
        SipHashSpec::SipHash24,
        SipHashSpec::SipHash48,
        SipHashSpec::SipHash128_24,
        SipHashSpec::SipHash128_48,
    ];

    pub fn output_length(self) -> Length {
        match self {
            SipHashSpec::SipHash24 | SipHashSpec::SipHash48 => Length::Len64,
            _ => Length::Len128,
        }
    }
}

/// Construction-specific data carried by a MAC spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MacPayload {
    Digest(DigestSpec),
    SymKey(SymKeySpec),
    SipHash(SipHashSpec),
    /// Output length, for Zuc
    Length(Length),
    None,
}

/// A MAC algorithm combination and its key length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacSpec {
    pub mac_type: MacType,
    pub key_length: Length,
    pub payload: MacPayload,
}

impl MacSpec {
    /// Key lengths a MAC key may be generated at
    pub const KEY_LENGTHS: [Length; 5] = [
        Length::Len128,
        Length::Len192,
        Length::Len256,
        Length::Len512,
        Length::Len1024,
    ];

    pub fn new(mac_type: MacType, key_length: Length, payload: MacPayload) -> Self {
        Self {
            mac_type,
            key_length,
            payload,
        }
    }

    pub fn hmac(digest: DigestSpec, key_length: Length) -> Self {
        Self::new(MacType::Hmac, key_length, MacPayload::Digest(digest))
    }

    pub fn cmac(cipher: SymKeySpec) -> Self {
        Self::new(MacType::Cmac, cipher.key_length, MacPayload::SymKey(cipher))
    }

    pub fn gmac(cipher: SymKeySpec) -> Self {
        Self::new(MacType::Gmac, cipher.key_length, MacPayload::SymKey(cipher))
    }

    /// Raw Poly1305 with a 256-bit one-time key
    pub fn poly1305() -> Self {
        Self::new(MacType::Poly1305, Length::Len256, MacPayload::None)
    }

    /// Poly1305 whose nonce is encrypted with a 128-bit block cipher
    pub fn poly1305_with(cipher: SymKeySpec) -> Self {
        Self::new(MacType::Poly1305, Length::Len256, MacPayload::SymKey(cipher))
    }

    pub fn siphash(spec: SipHashSpec) -> Self {
        Self::new(MacType::SipHash, Length::Len128, MacPayload::SipHash(spec))
    }

    pub fn is_valid(&self) -> bool {
        if !Self::KEY_LENGTHS.contains(&self.key_length) {
            return false;
        }
        let key_bits = self.key_length.bits();
        match (self.mac_type, self.payload) {
            (MacType::Hmac, MacPayload::Digest(d)) => {
                d.is_valid() && d.digest_type.supports_large_data() && !d.digest_type.is_xof()
            }
            (MacType::Gmac, MacPayload::SymKey(s)) => {
                s.is_valid()
                    && s.block_length == Length::Len128
                    && s.sym_key_type != SymKeyType::Rc5
                    && s.key_length == self.key_length
            }
            (MacType::Cmac, MacPayload::SymKey(s)) => {
                s.is_valid() && s.sym_key_type != SymKeyType::Rc5 && s.key_length == self.key_length
            }
            (MacType::Poly1305, MacPayload::SymKey(s)) => {
                s.is_valid()
                    && s.block_length == Length::Len128
                    && s.key_length == Length::Len128
                    && self.key_length == Length::Len256
            }
            (MacType::Poly1305, MacPayload::None) => self.key_length == Length::Len256,
            (MacType::SkeinMac, MacPayload::Digest(d)) => {
                d.is_valid() && d.digest_type == DigestType::Skein
            }
            (MacType::Kalyna, MacPayload::SymKey(s)) => {
                s.is_valid() && s.sym_key_type == SymKeyType::Kalyna && s.key_length == self.key_length
            }
            (MacType::Kmac, MacPayload::Digest(d)) => {
                d.is_valid() && d.digest_type == DigestType::Shake
            }
            (MacType::Zuc, MacPayload::Length(output)) => match self.key_length {
                Length::Len128 => output == Length::Len32,
                Length::Len256 => matches!(output, Length::Len32 | Length::Len64 | Length::Len128),
                _ => false,
            },
            (MacType::CbcMac | MacType::CfbMac, MacPayload::SymKey(s)) => {
                s.is_valid() && s.key_length == self.key_length
            }
            (MacType::SipHash, MacPayload::SipHash(_)) => self.key_length == Length::Len128,
            (MacType::Gost, MacPayload::None) => self.key_length == Length::Len256,
            (MacType::Blake2, MacPayload::Digest(d)) => {
                d.is_valid()
                    && d.digest_type == DigestType::Blake2
                    && key_bits <= d.state_length.bits()
            }
            (MacType::Blake3, MacPayload::Digest(d)) => {
                d.is_valid() && d.digest_type == DigestType::Blake3 && self.key_length == Length::Len256
            }
            _ => false,
        }
    }
}

impl fmt::Display for MacSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payload {
            MacPayload::Digest(d) => write!(f, "{}-{}({})", self.mac_type, self.key_length, d),
            MacPayload::SymKey(s) => write!(f, "{}-{}({})", self.mac_type, self.key_length, s),
            MacPayload::SipHash(s) => write!(f, "{:?}", s),
            MacPayload::Length(l) => write!(f, "{}-{}/{}", self.mac_type, self.key_length, l),
            MacPayload::None => write!(f, "{}-{}", self.mac_type, self.key_length),
        }
    }
}

/// Candidate payloads shared by every MAC listing; validity filters them
fn candidate_payloads() -> Vec<MacPayload> {
    let mut payloads = vec![MacPayload::None];
    payloads.extend(list_all_digest_specs().into_iter().map(MacPayload::Digest));
    for key_length in Length::ALL {
        payloads.extend(list_sym_key_specs(key_length).into_iter().map(MacPayload::SymKey));
    }
    payloads.extend(SipHashSpec::ALL.iter().copied().map(MacPayload::SipHash));
    payloads.extend(Length::ALL.iter().copied().map(MacPayload::Length));
    payloads
}

/// Every valid MAC spec of one construction at a key length
pub fn list_possible_macs_for_type(mac_type: MacType, key_length: Length) -> Vec<MacSpec> {
    candidate_payloads()
        .into_iter()
        .map(|payload| MacSpec::new(mac_type, key_length, payload))
        .filter(MacSpec::is_valid)
        .collect()
}

/// Every valid MAC spec at a key length
pub fn list_possible_macs(key_length: Length) -> Vec<MacSpec> {
    let payloads = candidate_payloads();
    let mut specs = Vec::new();
    for mac_type in MacType::ALL {
        for payload in &payloads {
            let spec = MacSpec::new(mac_type, key_length, *payload);
            if spec.is_valid() {
                specs.push(spec);
            }
        }
    }
    specs
}
