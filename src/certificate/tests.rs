//! Tests for certificates, chains and requests

use super::*;
use crate::config::KeyDerivationParams;
use crate::error::{ChainFailure, KeyStoreError};
use crate::factory::{CapabilityFactory, StandardFactory};
use crate::keys::KeyPair;
use crate::spec::{EcCurve, KeyPairSpec, SignatureSpec};
use chrono::{Duration, Utc};
use proptest::prelude::*;

fn factory() -> StandardFactory {
    StandardFactory::new(KeyDerivationParams::minimal())
}

fn dn(name: &str) -> DistinguishedName {
    DistinguishedName::parse(name).unwrap()
}

fn p256(factory: &StandardFactory) -> KeyPair {
    factory
        .generate_key_pair(&KeyPairSpec::ec(EcCurve::Secp256r1))
        .unwrap()
}

fn ecdsa() -> SignatureSpec {
    SignatureSpec::default_for(&KeyPairSpec::ec(EcCurve::Secp256r1)).unwrap()
}

struct Chain {
    certificates: Vec<Certificate>,
    leaf_key: KeyPair,
}

fn three_link_chain(factory: &StandardFactory) -> Chain {
    let root_key = p256(factory);
    let root = CertificateBuilder::new(dn("CN=Root, O=Test"), &root_key)
        .usage(KeyUsageSet::certificate_authority())
        .build(factory, &root_key, &ecdsa())
        .unwrap();

    let intermediate_key = p256(factory);
    let intermediate = CertificateBuilder::new(dn("CN=Intermediate, O=Test"), &intermediate_key)
        .issuer(root.subject().clone())
        .usage(KeyUsageSet::certificate_authority())
        .build(factory, &root_key, &ecdsa())
        .unwrap();

    let leaf_key = p256(factory);
    let leaf = CertificateBuilder::new(dn("CN=Leaf, O=Test"), &leaf_key)
        .issuer(intermediate.subject().clone())
        .build(factory, &intermediate_key, &ecdsa())
        .unwrap();

    Chain {
        certificates: vec![leaf, intermediate, root],
        leaf_key,
    }
}

fn chain_failure(result: crate::error::KeyStoreResult<()>) -> (usize, ChainFailure) {
    match result {
        Err(KeyStoreError::ChainValidation { index, reason }) => (index, reason),
        other => panic!("expected chain failure, got {:?}", other),
    }
}

#[test]
fn test_distinguished_name_parsing() {
    let name = dn("cn=Root,  O=Example Corp ,C=GB");
    assert_eq!(name.to_string(), "CN=Root, O=Example Corp, C=GB");
    assert_eq!(name.get("cn"), Some("Root"));
    assert_eq!(name.get("OU"), None);

    assert!(matches!(
        DistinguishedName::parse("CN="),
        Err(KeyStoreError::InvalidIdentity(_))
    ));
    assert!(DistinguishedName::parse("XX=value").is_err());
    assert!(DistinguishedName::parse("no separator").is_err());
    // order matters for identity
    assert_ne!(dn("CN=A, O=B"), dn("O=B, CN=A"));
}

proptest! {
    #[test]
    fn prop_distinguished_name_round_trip(
        cn in "[A-Za-z0-9][A-Za-z0-9 ]{0,15}[A-Za-z0-9]",
        org in proptest::option::of("[A-Za-z0-9]{1,12}"),
    ) {
        let text = match &org {
            Some(org) => format!("CN={}, O={}", cn, org),
            None => format!("CN={}", cn),
        };
        let parsed = DistinguishedName::parse(&text).unwrap();
        prop_assert_eq!(parsed.to_string(), text.clone());
        prop_assert_eq!(text.parse::<DistinguishedName>().unwrap(), parsed);
    }
}

#[test]
fn test_usage_sets() {
    let ca = KeyUsageSet::certificate_authority();
    assert!(ca.is_certificate_signer());
    assert!(ca.contains(KeyUsage::Sign));
    assert!(!ca.contains(KeyUsage::Encrypt));

    let signing = KeyUsageSet::signing();
    assert!(!signing.is_certificate_signer());
    assert_eq!(signing.to_string(), "{sign,verify}");
    assert_eq!(signing.with(KeyUsage::CrlSign).iter().count(), 3);
    assert_eq!(KeyUsageSet::empty().iter().count(), 0);
}

#[test]
fn test_self_signed_root() {
    let factory = factory();
    let key = p256(&factory);
    let root = CertificateBuilder::new(dn("CN=Root"), &key)
        .usage(KeyUsageSet::certificate_authority())
        .validity_days(10)
        .build(&factory, &key, &ecdsa())
        .unwrap();

    assert!(root.is_self_signed(&factory));
    assert!(root.key_pair().matches_public(&key));
    assert!(!root.key_pair().has_private_key());
    assert!(root.check_usage(KeyUsage::CertSign).is_ok());
    assert!(matches!(
        root.check_usage(KeyUsage::Encrypt),
        Err(KeyStoreError::Usage { .. })
    ));

    // validity window is inclusive at both ends
    assert!(root.is_valid_on_date(root.not_before()));
    assert!(root.is_valid_on_date(root.not_after()));
    assert!(!root.is_valid_on_date(root.not_after() + Duration::seconds(1)));
    assert!(!root.is_valid_on_date(root.not_before() - Duration::seconds(1)));
}

#[test]
fn test_certificate_not_self_signed_when_names_differ() {
    let factory = factory();
    let key = p256(&factory);
    let certificate = CertificateBuilder::new(dn("CN=Subject"), &key)
        .issuer(dn("CN=Someone Else"))
        .build(&factory, &key, &ecdsa())
        .unwrap();
    assert!(!certificate.is_self_signed(&factory));
}

#[test]
fn test_encoding_round_trip_preserves_identity() {
    let factory = factory();
    let chain = three_link_chain(&factory);
    let leaf = &chain.certificates[0];

    let decoded = Certificate::decode(leaf.encoded()).unwrap();
    assert_eq!(&decoded, leaf);
    assert_eq!(decoded.fingerprint(), leaf.fingerprint());
    assert_eq!(decoded.serial(), leaf.serial());
    assert_ne!(leaf.fingerprint(), chain.certificates[1].fingerprint());

    assert!(Certificate::decode(&leaf.encoded()[..10]).is_err());
}

#[test]
fn test_builder_rejects_mismatched_signer() {
    let factory = factory();
    let key = p256(&factory);
    let ed_key = factory.generate_key_pair(&KeyPairSpec::ed25519()).unwrap();
    let result = CertificateBuilder::new(dn("CN=X"), &key).build(&factory, &ed_key, &ecdsa());
    assert!(matches!(result, Err(KeyStoreError::UnsupportedSpec { .. })));

    let now = Utc::now();
    let backwards = CertificateBuilder::new(dn("CN=X"), &key)
        .not_before(now)
        .not_after(now - Duration::days(1))
        .build(&factory, &key, &ecdsa());
    assert!(matches!(backwards, Err(KeyStoreError::Key { .. })));
}

#[test]
fn test_builder_reports_validity_overflow() {
    let factory = factory();
    let key = p256(&factory);
    for days in [200_000_000, i64::MAX] {
        let result = CertificateBuilder::new(dn("CN=X"), &key)
            .validity_days(days)
            .build(&factory, &key, &ecdsa());
        assert!(matches!(result, Err(KeyStoreError::Key { .. })), "{} days", days);
    }
}

#[test]
fn test_verify_valid_chain() {
    let factory = factory();
    let chain = three_link_chain(&factory);
    verify_chain_now(&factory, &chain.certificates).unwrap();
    assert!(chain.certificates[2].is_self_signed(&factory));
    assert!(chain.certificates[0].key_pair().matches_public(&chain.leaf_key));
}

#[test]
fn test_tampered_leaf_signature_fails_at_index_zero() {
    let factory = factory();
    let chain = three_link_chain(&factory).certificates;
    let last = chain[0].signature().len() - 1;
    for index in [0, last / 2, last] {
        let mut tampered = chain.clone();
        tampered[0] = chain[0].with_signature_byte_flipped(index);
        assert_eq!(
            chain_failure(verify_chain_now(&factory, &tampered)),
            (0, ChainFailure::SignatureInvalid)
        );
    }
}

#[test]
fn test_expired_leaf_fails() {
    let factory = factory();
    let mut chain = three_link_chain(&factory).certificates;
    let mut tbs = chain[0].tbs().clone();
    tbs.not_after = Utc::now() - Duration::days(1);
    tbs.not_before = tbs.not_after - Duration::days(30);
    chain[0] = chain[0].with_tbs(tbs);
    assert_eq!(
        chain_failure(verify_chain_now(&factory, &chain)),
        (0, ChainFailure::Expired)
    );
}

#[test]
fn test_not_yet_valid_and_issuer_mismatch() {
    let factory = factory();
    let chain = three_link_chain(&factory).certificates;

    let past = Utc::now() - Duration::days(5);
    assert_eq!(
        chain_failure(verify_chain(&factory, &chain, past)),
        (0, ChainFailure::NotYetValid)
    );

    // leaf directly above the root: issuer names the intermediate
    let skipped = vec![chain[0].clone(), chain[2].clone()];
    assert_eq!(
        chain_failure(verify_chain_now(&factory, &skipped)),
        (0, ChainFailure::IssuerMismatch)
    );
}

#[test]
fn test_chain_without_root_is_untrusted() {
    let factory = factory();
    let chain = three_link_chain(&factory).certificates;
    assert_eq!(
        chain_failure(verify_chain_now(&factory, &chain[..2])),
        (1, ChainFailure::UntrustedRoot)
    );
    assert_eq!(
        chain_failure(verify_chain_now(&factory, &[])),
        (0, ChainFailure::UntrustedRoot)
    );
}

#[test]
fn test_certificate_request_proof_of_possession() {
    let factory = factory();
    let key = p256(&factory);
    let request = CertificateRequest::create(
        &factory,
        dn("CN=Requester"),
        &key,
        KeyUsageSet::signing(),
        ecdsa(),
    )
    .unwrap();
    assert!(request.verify(&factory).unwrap());
    assert!(!request.key_pair().has_private_key());

    let decoded = CertificateRequest::decode(&request.encode().unwrap()).unwrap();
    assert_eq!(decoded, request);
    assert!(decoded.verify(&factory).unwrap());

    // the signature is the trailing field of the encoding
    let mut bytes = request.encode().unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    let tampered = CertificateRequest::decode(&bytes).unwrap();
    assert!(!tampered.verify(&factory).unwrap());
}

#[test]
fn test_certificate_bundle_round_trip() {
    let factory = factory();
    let chain = three_link_chain(&factory).certificates;
    let bundle = encode_certificates(&chain).unwrap();
    assert_eq!(decode_certificates(&bundle).unwrap(), chain);

    assert!(decode_certificates(b"not a bundle").is_err());
    assert!(decode_certificates(&encode_certificates(&[]).unwrap()).is_err());
}
