//! Key pair specifications
//!
//! [`KeyPairSpec`] names an asymmetric algorithm together with its parameter
//! set. Composite specs combine several signing algorithms into one hybrid
//! key pair.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::digest::DigestSpec;
use super::length::Length;

/// Asymmetric algorithm families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyPairType {
    Rsa,
    Dsa,
    Ec,
    Sm2,
    Dstu4145,
    Gost2012,
    EdDsa,
    Xdh,
    MlDsa,
    SlhDsa,
    Falcon,
    Picnic,
    Rainbow,
    Xmss,
    Lms,
    MlKem,
    Composite,
}

impl KeyPairType {
    pub const ALL: [KeyPairType; 17] = [
        KeyPairType::Rsa,
        KeyPairType::Dsa,
        KeyPairType::Ec,
        KeyPairType::Sm2,
        KeyPairType::Dstu4145,
        KeyPairType::Gost2012,
        KeyPairType::EdDsa,
        KeyPairType::Xdh,
        KeyPairType::MlDsa,
        KeyPairType::SlhDsa,
        KeyPairType::Falcon,
        KeyPairType::Picnic,
        KeyPairType::Rainbow,
        KeyPairType::Xmss,
        KeyPairType::Lms,
        KeyPairType::MlKem,
        KeyPairType::Composite,
    ];

    /// Key agreement and KEM types cannot produce signatures
    pub fn can_sign(self) -> bool {
        !matches!(self, KeyPairType::Xdh | KeyPairType::MlKem)
    }

    /// Families that always sign through a message digest
    pub fn needs_digest(self) -> bool {
        matches!(
            self,
            KeyPairType::Rsa
                | KeyPairType::Dsa
                | KeyPairType::Ec
                | KeyPairType::Sm2
                | KeyPairType::Dstu4145
                | KeyPairType::Gost2012
        )
    }
}

impl fmt::Display for KeyPairType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyPairType::Rsa => "RSA",
            KeyPairType::Dsa => "DSA",
            KeyPairType::Ec => "EC",
            KeyPairType::Sm2 => "SM2",
            KeyPairType::Dstu4145 => "DSTU4145",
            KeyPairType::Gost2012 => "GOST2012",
            KeyPairType::EdDsa => "EdDSA",
            KeyPairType::Xdh => "XDH",
            KeyPairType::MlDsa => "ML-DSA",
            KeyPairType::SlhDsa => "SLH-DSA",
            KeyPairType::Falcon => "Falcon",
            KeyPairType::Picnic => "Picnic",
            KeyPairType::Rainbow => "Rainbow",
            KeyPairType::Xmss => "XMSS",
            KeyPairType::Lms => "LMS",
            KeyPairType::MlKem => "ML-KEM",
            KeyPairType::Composite => "Composite",
        };
        f.write_str(name)
    }
}

/// RSA modulus sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RsaModulus {
    Mod1024,
    Mod2048,
    Mod3072,
    Mod4096,
}

impl RsaModulus {
    pub fn bits(self) -> usize {
        match self {
            RsaModulus::Mod1024 => 1024,
            RsaModulus::Mod2048 => 2048,
            RsaModulus::Mod3072 => 3072,
            RsaModulus::Mod4096 => 4096,
        }
    }
}

/// DSA domain parameter sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DsaKeySize {
    Bits1024,
    Bits2048,
    Bits3072,
}

/// Named prime curves for ECDSA and EC-NR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EcCurve {
    Secp256r1,
    Secp384r1,
    Secp521r1,
    Secp256k1,
    BrainpoolP256r1,
    BrainpoolP384r1,
    BrainpoolP512r1,
}

impl EcCurve {
    /// Order size of the curve
    pub fn bits(self) -> u32 {
        match self {
            EcCurve::Secp256r1 | EcCurve::Secp256k1 | EcCurve::BrainpoolP256r1 => 256,
            EcCurve::Secp384r1 | EcCurve::BrainpoolP384r1 => 384,
            EcCurve::Secp521r1 => 521,
            EcCurve::BrainpoolP512r1 => 512,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sm2Curve {
    Sm2P256v1,
    WapiP192v1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DstuCurve {
    Dstu163,
    Dstu257,
    Dstu431,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GostCurve {
    Gost256,
    Gost512,
}

impl GostCurve {
    pub fn length(self) -> Length {
        match self {
            GostCurve::Gost256 => Length::Len256,
            GostCurve::Gost512 => Length::Len512,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdwardsCurve {
    Ed25519,
    Ed448,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MontgomeryCurve {
    X25519,
    X448,
}

/// ML-DSA (Dilithium) parameter sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MlDsaLevel {
    MlDsa44,
    MlDsa65,
    MlDsa87,
}

/// SLH-DSA (SPHINCS+) parameter sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlhDsaVariant {
    Sha2_128f,
    Sha2_128s,
    Sha2_256f,
    Shake128f,
    Shake256f,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FalconLevel {
    Falcon512,
    Falcon1024,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PicnicVariant {
    L1Full,
    L3Full,
    L5Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RainbowLevel {
    Level1,
    Level3,
    Level5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MlKemLevel {
    MlKem512,
    MlKem768,
    MlKem1024,
}

/// Tree digest used by an XMSS key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XmssDigest {
    Sha256,
    Sha512,
    Shake128,
    Shake256,
}

impl XmssDigest {
    /// The digest spec a pre-hashed XMSS signature must use
    pub fn digest_spec(self) -> DigestSpec {
        match self {
            XmssDigest::Sha256 => DigestSpec::sha2(Length::Len256),
            XmssDigest::Sha512 => DigestSpec::sha2(Length::Len512),
            XmssDigest::Shake128 => DigestSpec::shake128(),
            XmssDigest::Shake256 => DigestSpec::shake256(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct XmssSpec {
    pub digest: XmssDigest,
    pub height: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LmsSpec {
    pub height: u8,
    pub winternitz: u8,
}

/// An asymmetric algorithm and its parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyPairSpec {
    Rsa(RsaModulus),
    Dsa(DsaKeySize),
    Ec(EcCurve),
    Sm2(Sm2Curve),
    Dstu4145(DstuCurve),
    Gost2012(GostCurve),
    EdDsa(EdwardsCurve),
    Xdh(MontgomeryCurve),
    MlDsa(MlDsaLevel),
    SlhDsa(SlhDsaVariant),
    Falcon(FalconLevel),
    Picnic(PicnicVariant),
    Rainbow(RainbowLevel),
    Xmss(XmssSpec),
    Lms(LmsSpec),
    MlKem(MlKemLevel),
    Composite(Vec<KeyPairSpec>),
}

impl KeyPairSpec {
    pub fn key_pair_type(&self) -> KeyPairType {
        match self {
            KeyPairSpec::Rsa(_) => KeyPairType::Rsa,
            KeyPairSpec::Dsa(_) => KeyPairType::Dsa,
            KeyPairSpec::Ec(_) => KeyPairType::Ec,
            KeyPairSpec::Sm2(_) => KeyPairType::Sm2,
            KeyPairSpec::Dstu4145(_) => KeyPairType::Dstu4145,
            KeyPairSpec::Gost2012(_) => KeyPairType::Gost2012,
            KeyPairSpec::EdDsa(_) => KeyPairType::EdDsa,
            KeyPairSpec::Xdh(_) => KeyPairType::Xdh,
            KeyPairSpec::MlDsa(_) => KeyPairType::MlDsa,
            KeyPairSpec::SlhDsa(_) => KeyPairType::SlhDsa,
            KeyPairSpec::Falcon(_) => KeyPairType::Falcon,
            KeyPairSpec::Picnic(_) => KeyPairType::Picnic,
            KeyPairSpec::Rainbow(_) => KeyPairType::Rainbow,
            KeyPairSpec::Xmss(_) => KeyPairType::Xmss,
            KeyPairSpec::Lms(_) => KeyPairType::Lms,
            KeyPairSpec::MlKem(_) => KeyPairType::MlKem,
            KeyPairSpec::Composite(_) => KeyPairType::Composite,
        }
    }

    pub fn ec(curve: EcCurve) -> Self {
        KeyPairSpec::Ec(curve)
    }

    pub fn rsa(modulus: RsaModulus) -> Self {
        KeyPairSpec::Rsa(modulus)
    }

    pub fn ed25519() -> Self {
        KeyPairSpec::EdDsa(EdwardsCurve::Ed25519)
    }

    pub fn composite(components: Vec<KeyPairSpec>) -> Self {
        KeyPairSpec::Composite(components)
    }

    /// Components of a composite spec; empty for every other spec
    pub fn components(&self) -> &[KeyPairSpec] {
        match self {
            KeyPairSpec::Composite(components) => components,
            _ => &[],
        }
    }

    pub fn can_sign(&self) -> bool {
        match self {
            KeyPairSpec::Composite(components) => components.iter().all(|c| c.can_sign()),
            other => other.key_pair_type().can_sign(),
        }
    }

    /// Structural validity of the parameter set
    pub fn is_valid(&self) -> bool {
        match self {
            KeyPairSpec::Xmss(xmss) => matches!(xmss.height, 10 | 16 | 20),
            KeyPairSpec::Lms(lms) => {
                matches!(lms.height, 5 | 10 | 15 | 20 | 25) && matches!(lms.winternitz, 1 | 2 | 4 | 8)
            }
            KeyPairSpec::Composite(components) => {
                if components.len() < 2 {
                    return false;
                }
                let mut seen = Vec::with_capacity(components.len());
                for component in components {
                    let key_type = component.key_pair_type();
                    if key_type == KeyPairType::Composite
                        || !key_type.can_sign()
                        || !component.is_valid()
                        || seen.contains(&key_type)
                    {
                        return false;
                    }
                    seen.push(key_type);
                }
                true
            }
            _ => true,
        }
    }
}

impl fmt::Display for KeyPairSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPairSpec::Rsa(m) => write!(f, "RSA:{}", m.bits()),
            KeyPairSpec::Dsa(size) => write!(f, "DSA:{:?}", size),
            KeyPairSpec::Ec(curve) => write!(f, "EC:{:?}", curve),
            KeyPairSpec::Sm2(curve) => write!(f, "SM2:{:?}", curve),
            KeyPairSpec::Dstu4145(curve) => write!(f, "DSTU4145:{:?}", curve),
            KeyPairSpec::Gost2012(curve) => write!(f, "GOST2012:{}", curve.length()),
            KeyPairSpec::EdDsa(curve) => write!(f, "{:?}", curve),
            KeyPairSpec::Xdh(curve) => write!(f, "{:?}", curve),
            KeyPairSpec::MlDsa(level) => write!(f, "{:?}", level),
            KeyPairSpec::SlhDsa(variant) => write!(f, "SLH-DSA:{:?}", variant),
            KeyPairSpec::Falcon(level) => write!(f, "{:?}", level),
            KeyPairSpec::Picnic(variant) => write!(f, "Picnic:{:?}", variant),
            KeyPairSpec::Rainbow(level) => write!(f, "Rainbow:{:?}", level),
            KeyPairSpec::Xmss(xmss) => write!(f, "XMSS:{:?}-H{}", xmss.digest, xmss.height),
            KeyPairSpec::Lms(lms) => write!(f, "LMS:H{}-W{}", lms.height, lms.winternitz),
            KeyPairSpec::MlKem(level) => write!(f, "{:?}", level),
            KeyPairSpec::Composite(components) => {
                write!(f, "Composite[")?;
                for (i, component) in components.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", component)?;
                }
                write!(f, "]")
            }
        }
    }
}
