//! Algorithm specifications
//!
//! Describes, validates and enumerates combinations of key pair type, digest,
//! symmetric cipher and signature or MAC construction. Everything here is a
//! pure function of its inputs; predicates return `false` and listings return
//! an empty vector rather than failing.

mod digest;
mod keypair;
mod keyspec;
mod length;
mod mac;
mod signature;
mod symmetric;
mod validator;

pub use digest::{list_all_digest_specs, DigestSpec, DigestType};
pub use keypair::{
    DsaKeySize, DstuCurve, EcCurve, EdwardsCurve, FalconLevel, GostCurve, KeyPairSpec,
    KeyPairType, LmsSpec, MlDsaLevel, MlKemLevel, MontgomeryCurve, PicnicVariant, RainbowLevel,
    RsaModulus, SlhDsaVariant, Sm2Curve, XmssDigest, XmssSpec,
};
pub use keyspec::{KeySetSpec, KeySpec};
pub use length::Length;
pub use mac::{list_possible_macs, list_possible_macs_for_type, MacPayload, MacSpec, MacType, SipHashSpec};
pub use signature::{
    list_possible_signatures, list_possible_signatures_for_key_pair, matches_key_pair,
    SignaturePayload, SignatureSpec, SignatureType,
};
pub use symmetric::{list_sym_key_specs, SymKeySpec, SymKeyType};
pub use validator::SpecValidator;

#[cfg(test)]
mod tests;
