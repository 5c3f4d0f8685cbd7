//! Symmetric cipher specifications

use serde::{Deserialize, Serialize};
use std::fmt;

use super::length::Length;
use Length::*;

/// Block cipher families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SymKeyType {
    Aes,
    Serpent,
    Twofish,
    Camellia,
    Aria,
    Rc6,
    Sm4,
    Seed,
    Noekeon,
    Kuznyechik,
    Kalyna,
    Rc5,
    Gost,
    DesEde,
    Blowfish,
    Threefish,
}

impl SymKeyType {
    pub const ALL: [SymKeyType; 16] = [
        SymKeyType::Aes,
        SymKeyType::Serpent,
        SymKeyType::Twofish,
        SymKeyType::Camellia,
        SymKeyType::Aria,
        SymKeyType::Rc6,
        SymKeyType::Sm4,
        SymKeyType::Seed,
        SymKeyType::Noekeon,
        SymKeyType::Kuznyechik,
        SymKeyType::Kalyna,
        SymKeyType::Rc5,
        SymKeyType::Gost,
        SymKeyType::DesEde,
        SymKeyType::Blowfish,
        SymKeyType::Threefish,
    ];

    /// Block lengths the cipher can run with
    pub fn block_lengths(self) -> &'static [Length] {
        match self {
            SymKeyType::Kalyna => &[Len128, Len256, Len512],
            SymKeyType::Rc5 => &[Len64, Len128],
            SymKeyType::Gost | SymKeyType::DesEde | SymKeyType::Blowfish => &[Len64],
            SymKeyType::Threefish => &[Len256, Len512, Len1024],
            _ => &[Len128],
        }
    }

    /// Key lengths accepted for a block length
    pub fn key_lengths(self, block: Length) -> &'static [Length] {
        if !self.block_lengths().contains(&block) {
            return &[];
        }
        match (self, block) {
            (SymKeyType::Sm4 | SymKeyType::Seed | SymKeyType::Noekeon, _) => &[Len128],
            (SymKeyType::Kuznyechik, _) => &[Len256],
            (SymKeyType::Kalyna, Len128) => &[Len128, Len256],
            (SymKeyType::Kalyna, Len256) => &[Len256, Len512],
            (SymKeyType::Kalyna, _) => &[Len512],
            (SymKeyType::Gost, _) => &[Len256],
            (SymKeyType::DesEde, _) => &[Len128, Len192],
            (SymKeyType::Threefish, Len256) => &[Len256],
            (SymKeyType::Threefish, Len512) => &[Len512],
            (SymKeyType::Threefish, _) => &[Len1024],
            _ => &[Len128, Len192, Len256],
        }
    }
}

impl fmt::Display for SymKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymKeyType::Aes => "AES",
            SymKeyType::Serpent => "Serpent",
            SymKeyType::Twofish => "Twofish",
            SymKeyType::Camellia => "Camellia",
            SymKeyType::Aria => "ARIA",
            SymKeyType::Rc6 => "RC6",
            SymKeyType::Sm4 => "SM4",
            SymKeyType::Seed => "SEED",
            SymKeyType::Noekeon => "Noekeon",
            SymKeyType::Kuznyechik => "Kuznyechik",
            SymKeyType::Kalyna => "Kalyna",
            SymKeyType::Rc5 => "RC5",
            SymKeyType::Gost => "GOST28147",
            SymKeyType::DesEde => "DESede",
            SymKeyType::Blowfish => "Blowfish",
            SymKeyType::Threefish => "Threefish",
        };
        f.write_str(name)
    }
}

/// A block cipher with fixed block and key length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymKeySpec {
    pub sym_key_type: SymKeyType,
    pub block_length: Length,
    pub key_length: Length,
}

impl SymKeySpec {
    pub fn new(sym_key_type: SymKeyType, block_length: Length, key_length: Length) -> Self {
        Self {
            sym_key_type,
            block_length,
            key_length,
        }
    }

    /// Cipher with its smallest block length
    pub fn of(sym_key_type: SymKeyType, key_length: Length) -> Self {
        let block = sym_key_type
            .block_lengths()
            .first()
            .copied()
            .unwrap_or(Len128);
        Self::new(sym_key_type, block, key_length)
    }

    pub fn aes(key_length: Length) -> Self {
        Self::new(SymKeyType::Aes, Len128, key_length)
    }

    pub fn is_valid(&self) -> bool {
        self.sym_key_type
            .key_lengths(self.block_length)
            .contains(&self.key_length)
    }
}

impl fmt::Display for SymKeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}/{}",
            self.sym_key_type, self.block_length, self.key_length
        )
    }
}

/// Every valid cipher spec with the given key length
pub fn list_sym_key_specs(key_length: Length) -> Vec<SymKeySpec> {
    let mut specs = Vec::new();
    for sym_key_type in SymKeyType::ALL {
        for &block in sym_key_type.block_lengths() {
            if sym_key_type.key_lengths(block).contains(&key_length) {
                specs.push(SymKeySpec::new(sym_key_type, block, key_length));
            }
        }
    }
    specs
}
