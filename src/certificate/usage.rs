//! Key usage flags

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyUsage {
    Sign,
    Verify,
    KeyAgreement,
    Encrypt,
    Decrypt,
    CertSign,
    KeyCertSign,
    CrlSign,
}

impl KeyUsage {
    pub const ALL: [KeyUsage; 8] = [
        KeyUsage::Sign,
        KeyUsage::Verify,
        KeyUsage::KeyAgreement,
        KeyUsage::Encrypt,
        KeyUsage::Decrypt,
        KeyUsage::CertSign,
        KeyUsage::KeyCertSign,
        KeyUsage::CrlSign,
    ];

    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

impl fmt::Display for KeyUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyUsage::Sign => "sign",
            KeyUsage::Verify => "verify",
            KeyUsage::KeyAgreement => "keyAgreement",
            KeyUsage::Encrypt => "encrypt",
            KeyUsage::Decrypt => "decrypt",
            KeyUsage::CertSign => "certSign",
            KeyUsage::KeyCertSign => "keyCertSign",
            KeyUsage::CrlSign => "crlSign",
        };
        f.write_str(name)
    }
}

/// A set of [`KeyUsage`] flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyUsageSet(u16);

impl KeyUsageSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn of(usages: &[KeyUsage]) -> Self {
        usages.iter().fold(Self::empty(), |set, usage| set.with(*usage))
    }

    /// Default usage for a root or intermediate authority
    pub fn certificate_authority() -> Self {
        Self::of(&[
            KeyUsage::CertSign,
            KeyUsage::KeyCertSign,
            KeyUsage::Sign,
            KeyUsage::Verify,
        ])
    }

    /// Usage for an end entity that only signs
    pub fn signing() -> Self {
        Self::of(&[KeyUsage::Sign, KeyUsage::Verify])
    }

    #[must_use]
    pub fn with(self, usage: KeyUsage) -> Self {
        Self(self.0 | usage.bit())
    }

    pub fn contains(&self, usage: KeyUsage) -> bool {
        self.0 & usage.bit() != 0
    }

    /// Either certificate-signing bit is present
    pub fn is_certificate_signer(&self) -> bool {
        self.contains(KeyUsage::CertSign) || self.contains(KeyUsage::KeyCertSign)
    }

    pub fn iter(&self) -> impl Iterator<Item = KeyUsage> + '_ {
        KeyUsage::ALL.into_iter().filter(move |usage| self.contains(*usage))
    }
}

impl fmt::Display for KeyUsageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, usage) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", usage)?;
        }
        write!(f, "}}")
    }
}
