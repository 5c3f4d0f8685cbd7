//! Tests for algorithm specifications

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use super::*;
use crate::config::KeyDerivationParams;
use crate::factory::StandardFactory;

fn validator() -> SpecValidator {
    SpecValidator::new(Arc::new(StandardFactory::new(KeyDerivationParams::minimal())))
}

#[test]
fn test_digest_tables() {
    assert!(DigestSpec::sha2(Length::Len256).is_valid());
    assert!(DigestSpec::new(DigestType::Sha2, Length::Len512, Length::Len224).is_valid());
    assert!(!DigestSpec::new(DigestType::Sha2, Length::Len256, Length::Len512).is_valid());
    assert!(!DigestSpec::new(DigestType::Sha1, Length::Len256, Length::Len256).is_valid());
    assert!(DigestSpec::new(DigestType::Skein, Length::Len1024, Length::Len384).is_valid());
    assert!(!DigestSpec::new(DigestType::Skein, Length::Len1024, Length::Len256).is_valid());

    assert!(!DigestType::Haraka.supports_large_data());
    assert!(DigestType::Shake.is_xof());
    assert!(!DigestType::Sha3.is_xof());

    let all = list_all_digest_specs();
    assert!(all.iter().all(|d| d.is_valid()));
    let unique: HashSet<_> = all.iter().collect();
    assert_eq!(unique.len(), all.len());
}

#[test]
fn test_sym_key_tables() {
    assert!(SymKeySpec::aes(Length::Len256).is_valid());
    assert!(!SymKeySpec::new(SymKeyType::Sm4, Length::Len128, Length::Len256).is_valid());
    assert!(SymKeySpec::new(SymKeyType::Kalyna, Length::Len256, Length::Len512).is_valid());
    assert!(!SymKeySpec::new(SymKeyType::Kalyna, Length::Len512, Length::Len256).is_valid());
    assert!(SymKeySpec::new(SymKeyType::Threefish, Length::Len1024, Length::Len1024).is_valid());

    for spec in list_sym_key_specs(Length::Len192) {
        assert!(spec.is_valid());
        assert_eq!(spec.key_length, Length::Len192);
    }
}

#[test]
fn test_composite_key_pair_rules() {
    let hybrid = KeyPairSpec::composite(vec![
        KeyPairSpec::ec(EcCurve::Secp256r1),
        KeyPairSpec::MlDsa(MlDsaLevel::MlDsa65),
    ]);
    assert!(hybrid.is_valid());

    let single = KeyPairSpec::composite(vec![KeyPairSpec::ed25519()]);
    assert!(!single.is_valid());

    let with_kem = KeyPairSpec::composite(vec![
        KeyPairSpec::ed25519(),
        KeyPairSpec::MlKem(MlKemLevel::MlKem768),
    ]);
    assert!(!with_kem.is_valid());

    let nested = KeyPairSpec::composite(vec![KeyPairSpec::ed25519(), hybrid.clone()]);
    assert!(!nested.is_valid());

    let duplicate_type = KeyPairSpec::composite(vec![
        KeyPairSpec::ec(EcCurve::Secp256r1),
        KeyPairSpec::ec(EcCurve::Secp384r1),
    ]);
    assert!(!duplicate_type.is_valid());
}

#[test]
fn test_signature_payload_rules() {
    assert!(SignatureSpec::ecdsa(DigestSpec::sha2(Length::Len256)).is_valid());
    // digest families that cannot hash arbitrary input are rejected
    let haraka = DigestSpec::new(DigestType::Haraka, Length::Len256, Length::Len256);
    assert!(!SignatureSpec::ecdsa(haraka).is_valid());
    // an EC spec without a digest is malformed
    assert!(!SignatureSpec::native(KeyPairType::Ec).is_valid());

    assert!(SignatureSpec::eddsa().is_valid());
    let eddsa_with_digest = SignatureSpec::with_digest(
        KeyPairType::EdDsa,
        SignatureType::Pure,
        DigestSpec::sha2(Length::Len512),
    );
    assert!(!eddsa_with_digest.is_valid());

    let mldsa_prehash = SignatureSpec::with_digest(
        KeyPairType::MlDsa,
        SignatureType::PreHash,
        DigestSpec::sha2(Length::Len512),
    );
    assert!(mldsa_prehash.is_valid());
    let mldsa_bad_prehash = SignatureSpec::with_digest(
        KeyPairType::MlDsa,
        SignatureType::PreHash,
        DigestSpec::sha2(Length::Len256),
    );
    assert!(!mldsa_bad_prehash.is_valid());

    let x931_truncated = SignatureSpec::with_digest(
        KeyPairType::Rsa,
        SignatureType::X931,
        DigestSpec::new(DigestType::Sha2, Length::Len512, Length::Len256),
    );
    assert!(!x931_truncated.is_valid());

    assert!(!SignatureSpec::native(KeyPairType::MlKem).is_valid());
}

#[test]
fn test_composite_signature_validity() {
    let good = SignatureSpec::composite(vec![
        SignatureSpec::ecdsa(DigestSpec::sha2(Length::Len256)),
        SignatureSpec::native(KeyPairType::MlDsa),
    ]);
    assert!(good.is_valid());

    let one_bad = SignatureSpec::composite(vec![
        SignatureSpec::ecdsa(DigestSpec::new(DigestType::Sha1, Length::Len512, Length::Len512)),
        SignatureSpec::native(KeyPairType::MlDsa),
    ]);
    assert!(!one_bad.is_valid());

    assert!(!SignatureSpec::composite(Vec::new()).is_valid());
}

#[test]
fn test_listing_round_trip() {
    for key_pair_type in KeyPairType::ALL {
        for spec in list_possible_signatures(key_pair_type) {
            assert!(spec.is_valid(), "{} listed but invalid", spec);
            assert_eq!(spec.key_pair_type, key_pair_type);
        }
    }
    assert!(list_possible_signatures(KeyPairType::Xdh).is_empty());
    assert!(list_possible_signatures(KeyPairType::Composite).is_empty());
    assert_eq!(list_possible_signatures(KeyPairType::Falcon).len(), 1);
}

#[test]
fn test_key_pair_matching() {
    let p256 = KeyPairSpec::ec(EcCurve::Secp256r1);
    let nr_512 = SignatureSpec::with_digest(
        KeyPairType::Ec,
        SignatureType::Nr,
        DigestSpec::sha2(Length::Len512),
    );
    assert!(nr_512.is_valid());
    assert!(!matches_key_pair(&p256, &nr_512));

    let rsa_small = KeyPairSpec::rsa(RsaModulus::Mod1024);
    let pss_512 = SignatureSpec::rsa_pss(DigestSpec::sha2(Length::Len512));
    // 128-byte modulus cannot hold two 64-byte hashes plus padding
    assert!(!matches_key_pair(&rsa_small, &pss_512));
    assert!(matches_key_pair(&KeyPairSpec::rsa(RsaModulus::Mod2048), &pss_512));

    let gost = KeyPairSpec::Gost2012(GostCurve::Gost512);
    let streebog_256 = SignatureSpec::with_digest(
        KeyPairType::Gost2012,
        SignatureType::Native,
        DigestSpec::streebog(Length::Len256),
    );
    assert!(!matches_key_pair(&gost, &streebog_256));

    assert!(!matches_key_pair(&p256, &SignatureSpec::eddsa()));
}

#[test]
fn test_composite_listing_is_cartesian_product() {
    let hybrid = KeyPairSpec::composite(vec![
        KeyPairSpec::ed25519(),
        KeyPairSpec::Falcon(FalconLevel::Falcon512),
    ]);
    let ed_count = list_possible_signatures_for_key_pair(&KeyPairSpec::ed25519()).len();
    let listed = list_possible_signatures_for_key_pair(&hybrid);
    assert_eq!(listed.len(), ed_count);
    for spec in &listed {
        assert!(matches_key_pair(&hybrid, spec));
        assert_eq!(spec.components().len(), 2);
    }
}

#[test]
fn test_default_specs_match_their_key_pairs() {
    let key_pairs = [
        KeyPairSpec::ec(EcCurve::Secp256r1),
        KeyPairSpec::ec(EcCurve::Secp521r1),
        KeyPairSpec::rsa(RsaModulus::Mod2048),
        KeyPairSpec::ed25519(),
        KeyPairSpec::Sm2(Sm2Curve::Sm2P256v1),
        KeyPairSpec::Gost2012(GostCurve::Gost256),
        KeyPairSpec::MlDsa(MlDsaLevel::MlDsa44),
        KeyPairSpec::composite(vec![
            KeyPairSpec::ec(EcCurve::Secp384r1),
            KeyPairSpec::SlhDsa(SlhDsaVariant::Sha2_128f),
        ]),
    ];
    for key_pair in &key_pairs {
        let spec = SignatureSpec::default_for(key_pair).unwrap();
        assert!(matches_key_pair(key_pair, &spec), "{} / {}", key_pair, spec);
    }
    assert!(SignatureSpec::default_for(&KeyPairSpec::Xdh(MontgomeryCurve::X25519)).is_none());
}

#[test]
fn test_mac_rules() {
    assert!(MacSpec::hmac(DigestSpec::sha2(Length::Len256), Length::Len256).is_valid());
    assert!(!MacSpec::hmac(DigestSpec::shake256(), Length::Len256).is_valid());

    assert!(MacSpec::cmac(SymKeySpec::aes(Length::Len128)).is_valid());
    let rc5 = SymKeySpec::new(SymKeyType::Rc5, Length::Len128, Length::Len128);
    assert!(!MacSpec::cmac(rc5).is_valid());
    assert!(!MacSpec::gmac(rc5).is_valid());
    let blowfish = SymKeySpec::new(SymKeyType::Blowfish, Length::Len64, Length::Len128);
    assert!(!MacSpec::gmac(blowfish).is_valid());

    assert!(MacSpec::poly1305().is_valid());
    assert!(MacSpec::poly1305_with(SymKeySpec::aes(Length::Len128)).is_valid());
    assert!(!MacSpec::poly1305_with(SymKeySpec::aes(Length::Len256)).is_valid());

    assert!(MacSpec::siphash(SipHashSpec::SipHash24).is_valid());
    let siphash_256 = MacSpec::new(
        MacType::SipHash,
        Length::Len256,
        MacPayload::SipHash(SipHashSpec::SipHash24),
    );
    assert!(!siphash_256.is_valid());

    let zuc_128 = MacSpec::new(MacType::Zuc, Length::Len128, MacPayload::Length(Length::Len64));
    assert!(!zuc_128.is_valid());
    let zuc_256 = MacSpec::new(MacType::Zuc, Length::Len256, MacPayload::Length(Length::Len64));
    assert!(zuc_256.is_valid());
}

#[test]
fn test_mac_listing_by_key_length() {
    let at_128 = list_possible_macs(Length::Len128);
    assert!(at_128.iter().all(|m| m.is_valid() && m.key_length == Length::Len128));
    assert!(at_128.iter().any(|m| m.mac_type == MacType::SipHash));
    assert!(!at_128.iter().any(|m| m.mac_type == MacType::Poly1305));
    assert!(!at_128.iter().any(|m| m.mac_type == MacType::Blake3));

    let at_256 = list_possible_macs(Length::Len256);
    assert!(at_256.iter().any(|m| m.mac_type == MacType::Poly1305));
    assert!(at_256.iter().any(|m| m.mac_type == MacType::Blake3));
    assert!(!at_256.iter().any(|m| m.mac_type == MacType::SipHash));

    let hmacs = list_possible_macs_for_type(MacType::Hmac, Length::Len256);
    assert!(hmacs.iter().all(|m| m.mac_type == MacType::Hmac));
    assert!(hmacs.contains(&MacSpec::hmac(DigestSpec::sha2(Length::Len512), Length::Len256)));
}

#[test]
fn test_key_set_spec() {
    let spec = KeySetSpec::new(Length::Len256, 3);
    assert!(spec.is_valid());
    let ciphers = spec.sym_key_specs();
    assert_eq!(ciphers.len(), 3);
    assert!(ciphers.iter().all(|c| c.key_length == Length::Len256));

    assert!(!KeySetSpec::new(Length::Len256, 0).is_valid());
    assert!(!KeySetSpec::new(Length::Len256, 6).is_valid());
    assert!(!KeySetSpec::new(Length::Len512, 2).is_valid());
    assert_eq!(KeySetSpec::new(Length::Len192, 5).sym_key_specs().len(), 5);
}

#[test]
fn test_validator_filters_by_factory_support() {
    let validator = validator();
    let possible = validator.list_possible_signatures(KeyPairType::Ec);
    let supported = validator.list_all_supported_signatures(KeyPairType::Ec);
    assert!(!supported.is_empty());
    assert!(supported.len() < possible.len());
    let possible: HashSet<_> = possible.into_iter().collect();
    assert!(supported.iter().all(|s| possible.contains(s)));

    assert!(validator
        .list_all_supported_signatures(KeyPairType::Dstu4145)
        .is_empty());
}

#[test]
fn test_select_signature_spec() {
    let validator = validator();
    let p256 = KeyPairSpec::ec(EcCurve::Secp256r1);
    let spec = validator.select_signature_spec(&p256).unwrap();
    assert_eq!(spec, SignatureSpec::ecdsa(DigestSpec::sha2(Length::Len256)));

    let gost = KeyPairSpec::Gost2012(GostCurve::Gost256);
    assert!(matches!(
        validator.select_signature_spec(&gost),
        Err(crate::error::KeyStoreError::UnsupportedSpec { .. })
    ));
}

fn key_pair_type_strategy() -> impl Strategy<Value = KeyPairType> {
    (0..KeyPairType::ALL.len()).prop_map(|i| KeyPairType::ALL[i])
}

proptest! {
    #[test]
    fn prop_listed_signatures_are_valid_and_distinct(key_pair_type in key_pair_type_strategy()) {
        let listed = list_possible_signatures(key_pair_type);
        let unique: HashSet<_> = listed.iter().cloned().collect();
        prop_assert_eq!(unique.len(), listed.len());
        for spec in &listed {
            prop_assert!(spec.is_valid());
            prop_assert_eq!(spec.key_pair_type, key_pair_type);
        }
    }

    #[test]
    fn prop_listed_macs_are_valid(index in 0..Length::ALL.len()) {
        let key_length = Length::ALL[index];
        for spec in list_possible_macs(key_length) {
            prop_assert!(spec.is_valid());
            prop_assert_eq!(spec.key_length, key_length);
        }
    }
}

#[test]
fn test_length_range_covers_zuc_output() {
    assert_eq!(Length::ALL.first(), Some(&Length::Len32));
    assert_eq!(Length::ALL.last(), Some(&Length::Len1024));
    assert_eq!(Length::from_bits(32), Some(Length::Len32));
    assert_eq!(Length::Len32.bytes(), 4);

    let zuc = MacSpec::new(MacType::Zuc, Length::Len128, MacPayload::Length(Length::Len32));
    assert!(zuc.is_valid());
    assert!(list_possible_macs_for_type(MacType::Zuc, Length::Len128).contains(&zuc));
}
