//! Tests for the keystore, manager and gateway

use super::entry::{StoredEntry, StoredRecord};
use super::record::{write_header, write_record};
use super::*;
use crate::certificate::{verify_chain_now, DistinguishedName, KeyUsageSet};
use crate::config::{KeyDerivationParams, KeyStoreConfig};
use crate::error::KeyStoreError;
use crate::factory::{CapabilityFactory, StandardFactory};
use crate::keys::{Key, KeySet, KeySetHash};
use crate::secure_memory::SecureBytes;
use crate::spec::{EcCurve, KeyPairSpec, KeySetSpec, KeySpec, Length, MontgomeryCurve, SymKeySpec};
use chrono::{Duration, Utc};
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

const PASSWORD: &[u8] = b"entry password";

fn factory() -> Arc<dyn CapabilityFactory> {
    Arc::new(StandardFactory::new(KeyDerivationParams::minimal()))
}

fn manager() -> KeyStoreManager {
    KeyStoreManager::new(KeyStore::new(factory()).into_shared(), KeyStoreConfig::minimal()).unwrap()
}

fn dn(name: &str) -> DistinguishedName {
    DistinguishedName::parse(name).unwrap()
}

fn p256() -> KeyPairSpec {
    KeyPairSpec::ec(EcCurve::Secp256r1)
}

fn aes_key(factory: &dyn CapabilityFactory) -> Key {
    factory
        .generate_key(&KeySpec::Symmetric(SymKeySpec::aes(Length::Len256)))
        .unwrap()
}

fn root_and_leaf(manager: &KeyStoreManager) -> (KeyPairEntry, KeyPairEntry) {
    let root = manager
        .create_root_key_pair(&p256(), &dn("CN=Root"), "root", PASSWORD)
        .unwrap();
    let leaf = manager
        .create_key_pair(&p256(), &dn("CN=Leaf"), KeyUsageSet::signing(), &root, "leaf", PASSWORD)
        .unwrap();
    (root, leaf)
}

fn lock() -> Lock {
    Lock::derive(b"lock passphrase", &KeyDerivationParams::minimal()).unwrap()
}

// ---------------------------------------------------------------- store

#[test]
fn test_key_round_trip_and_wrong_password() {
    let factory = factory();
    let mut store = KeyStore::new(Arc::clone(&factory));
    let key = aes_key(factory.as_ref());
    store.set_key("aes", &key, PASSWORD).unwrap();

    let entry = store.get_key("aes", PASSWORD).unwrap();
    assert_eq!(entry.key, key);
    assert_eq!(Some(entry.creation_date), store.creation_date("aes"));

    match store.get_key("aes", b"wrong") {
        Err(KeyStoreError::WrongPassword { alias }) => assert_eq!(alias, "aes"),
        other => panic!("expected wrong password, got {:?}", other),
    }
}

#[test]
fn test_replace_keeps_one_entry() {
    let factory = factory();
    let mut store = KeyStore::new(Arc::clone(&factory));
    let first = aes_key(factory.as_ref());
    let second = aes_key(factory.as_ref());
    store.set_key("k", &first, PASSWORD).unwrap();
    store.set_key("k", &second, PASSWORD).unwrap();

    assert_eq!(store.size(), 1);
    assert_eq!(store.get_key("k", PASSWORD).unwrap().key, second);
}

#[test]
fn test_delete_is_idempotent() {
    let factory = factory();
    let mut store = KeyStore::new(Arc::clone(&factory));
    store.set_key("a", &aes_key(factory.as_ref()), PASSWORD).unwrap();
    store.set_key("b", &aes_key(factory.as_ref()), PASSWORD).unwrap();

    assert!(store.delete_entry("a"));
    assert_eq!(store.size(), 1);
    assert!(!store.delete_entry("a"));
    assert_eq!(store.size(), 1);
    assert!(!store.delete_entry("never there"));
    assert_eq!(store.aliases(), vec!["b".to_string()]);
}

#[test]
fn test_aliases_are_case_sensitive() {
    let factory = factory();
    let mut store = KeyStore::new(Arc::clone(&factory));
    store.set_key("Key", &aes_key(factory.as_ref()), PASSWORD).unwrap();
    assert!(store.contains_alias("Key"));
    assert!(!store.contains_alias("key"));
    assert!(matches!(
        store.get_key("key", PASSWORD),
        Err(KeyStoreError::NotFound { .. })
    ));
}

#[test]
fn test_typed_accessors_report_wrong_type() {
    let manager = manager();
    let (root, _) = root_and_leaf(&manager);
    let factory = factory();
    let mut store = KeyStore::new(Arc::clone(&factory));
    store.set_certificate("trusted", root.certificate().unwrap().clone());
    store.set_key("key", &aes_key(factory.as_ref()), PASSWORD).unwrap();

    match store.get_key_pair("key", PASSWORD) {
        Err(KeyStoreError::WrongType { expected, actual, .. }) => {
            assert_eq!(expected, EntryType::KeyPair);
            assert_eq!(actual, EntryType::Key);
        }
        other => panic!("expected wrong type, got {:?}", other),
    }
    assert!(matches!(
        store.get_key("trusted", PASSWORD),
        Err(KeyStoreError::WrongType { .. })
    ));
    assert!(matches!(
        store.get_certificate("key"),
        Err(KeyStoreError::WrongType { .. })
    ));
    assert_eq!(store.get_certificate("trusted").unwrap(), *root.certificate().unwrap());
    assert_eq!(store.entry_type("trusted"), Some(EntryType::Certificate));

    // certificate entries need no password
    match store.get_entry("trusted", b"anything").unwrap() {
        KeyStoreEntry::Certificate(entry) => assert_eq!(entry.certificate, *root.certificate().unwrap()),
        other => panic!("unexpected entry {:?}", other.entry_type()),
    }
}

#[test]
fn test_set_key_pair_requires_matching_chain() {
    let manager = manager();
    let (root, leaf) = root_and_leaf(&manager);
    let mut store = KeyStore::new(factory());

    assert!(matches!(
        store.set_key_pair("empty", &leaf.key_pair, PASSWORD, Vec::new()),
        Err(KeyStoreError::Key { .. })
    ));
    assert!(matches!(
        store.set_key_pair("mismatch", &leaf.key_pair, PASSWORD, root.chain.clone()),
        Err(KeyStoreError::Key { .. })
    ));
    assert!(matches!(
        store.set_key_pair("public", &leaf.key_pair.to_public(), PASSWORD, leaf.chain.clone()),
        Err(KeyStoreError::Key { .. })
    ));
    assert!(store.is_empty());

    store
        .set_key_pair("leaf", &leaf.key_pair, PASSWORD, leaf.chain.clone())
        .unwrap();
    let fetched = store.get_key_pair("leaf", PASSWORD).unwrap();
    assert_eq!(fetched.key_pair, leaf.key_pair);
    assert_eq!(fetched.chain, leaf.chain);
    assert_eq!(store.get_certificate_chain("leaf").unwrap().len(), 2);
}

#[test]
fn test_certificate_alias_lookup() {
    let manager = manager();
    let (root, leaf) = root_and_leaf(&manager);
    let mut store = KeyStore::new(factory());
    store.set_certificate("root-cert", root.certificate().unwrap().clone());
    store
        .set_key_pair("leaf", &leaf.key_pair, PASSWORD, leaf.chain.clone())
        .unwrap();

    assert_eq!(
        store.get_certificate_alias(root.certificate().unwrap()),
        Some("root-cert".to_string())
    );
    assert_eq!(
        store.get_certificate_alias(leaf.certificate().unwrap()),
        Some("leaf".to_string())
    );
    let (other_root, _) = root_and_leaf(&self::manager());
    assert_eq!(store.get_certificate_alias(other_root.certificate().unwrap()), None);
}

#[test]
fn test_key_set_and_hash_entries() {
    let factory = factory();
    let mut store = KeyStore::new(Arc::clone(&factory));
    let key_set = KeySet::generate(factory.as_ref(), KeySetSpec::default()).unwrap();
    store.set_key_set("set", &key_set, PASSWORD).unwrap();
    assert_eq!(store.get_key_set("set", PASSWORD).unwrap().key_set, key_set);
    assert!(matches!(
        store.get_key_set("set", b"nope"),
        Err(KeyStoreError::WrongPassword { .. })
    ));

    let hash = KeySetHash::new(factory.as_ref(), &key_set, b"hash password").unwrap();
    store.set_key_set_hash("hash", hash.clone());
    let entry = store.get_key_set_hash("hash").unwrap();
    assert_eq!(entry.hash, hash);
    assert_eq!(
        entry.hash.resolve(factory.as_ref(), b"hash password").unwrap(),
        key_set
    );
}

// ---------------------------------------------------------------- container

#[test]
fn test_container_round_trip() {
    let manager = manager();
    let (_, leaf) = root_and_leaf(&manager);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.qkst");

    let store = manager.store().read().unwrap();
    store.save(&path).unwrap();
    let loaded = KeyStore::load(factory(), &path).unwrap();

    assert_eq!(loaded.aliases(), store.aliases());
    assert_eq!(loaded.creation_date("leaf"), store.creation_date("leaf"));
    let fetched = loaded.get_key_pair("leaf", PASSWORD).unwrap();
    assert_eq!(fetched.key_pair, leaf.key_pair);
    verify_chain_now(loaded.factory().as_ref(), &fetched.chain).unwrap();
}

#[test]
fn test_append_log_last_writer_wins() {
    let factory = factory();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.qkst");

    let mut store = KeyStore::new(Arc::clone(&factory));
    let first = aes_key(factory.as_ref());
    let second = aes_key(factory.as_ref());
    store.set_key("k", &first, PASSWORD).unwrap();
    store.append_record(&path, "k").unwrap();
    store.set_key("other", &first, PASSWORD).unwrap();
    store.append_record(&path, "other").unwrap();
    store.set_key("k", &second, PASSWORD).unwrap();
    store.append_record(&path, "k").unwrap();

    let loaded = KeyStore::load(Arc::clone(&factory), &path).unwrap();
    assert_eq!(loaded.size(), 2);
    assert_eq!(loaded.get_key("k", PASSWORD).unwrap().key, second);

    assert!(matches!(
        store.append_record(&path, "missing"),
        Err(KeyStoreError::NotFound { .. })
    ));
}

#[test]
fn test_container_rejects_foreign_data() {
    assert!(decode_container(b"TKST\x01\x00").is_err());
    assert!(decode_container(b"QKST\x02\x00").is_err());
    assert_eq!(decode_container(b"QKST\x01\x00").unwrap(), 0);

    let factory = factory();
    let mut store = KeyStore::new(Arc::clone(&factory));
    store.set_key("k", &aes_key(factory.as_ref()), PASSWORD).unwrap();
    let mut bytes = Vec::new();
    store.write_to(&mut bytes).unwrap();
    assert_eq!(decode_container(&bytes).unwrap(), 1);
    assert!(decode_container(&bytes[..bytes.len() - 3]).is_err());
}

#[test]
fn test_container_rejects_leaf_for_another_key() {
    let manager = manager();
    let (root, leaf) = root_and_leaf(&manager);
    let record = StoredRecord {
        alias: "leaf".to_string(),
        creation_date: Utc::now(),
        entry: StoredEntry::KeyPair {
            spec: leaf.key_pair.spec.clone(),
            public_key: leaf.key_pair.public_key.clone(),
            wrapped_private_key: Vec::new(),
            chain: root.chain.clone(),
        },
    };
    let mut bytes = Vec::new();
    write_header(&mut bytes).unwrap();
    write_record(&mut bytes, &record).unwrap();

    assert!(matches!(
        decode_container(&bytes),
        Err(KeyStoreError::SerializationError(_))
    ));
    assert!(KeyStore::read_from(factory(), &mut Cursor::new(&bytes)).is_err());
}

// ---------------------------------------------------------------- manager

#[test]
fn test_root_and_leaf_issuance() {
    let manager = manager();
    let (root, leaf) = root_and_leaf(&manager);
    let factory = manager.validator().factory().as_ref();

    assert_eq!(root.chain.len(), 1);
    assert!(root.certificate().unwrap().usage().is_certificate_signer());
    assert_eq!(leaf.chain.len(), 2);
    assert!(leaf.chain[1].is_self_signed(factory));
    assert_eq!(leaf.certificate().unwrap().issuer(), root.certificate().unwrap().subject());
    assert!(leaf.certificate().unwrap().key_pair().matches_public(&leaf.key_pair));
    verify_chain_now(factory, &leaf.chain).unwrap();

    let store = manager.store().read().unwrap();
    assert_eq!(store.size(), 2);
    assert_eq!(store.get_key_pair("leaf", PASSWORD).unwrap(), leaf);
}

#[test]
fn test_signer_without_cert_sign_is_rejected() {
    let manager = manager();
    let (_, leaf) = root_and_leaf(&manager);
    let result = manager.create_key_pair(
        &p256(),
        &dn("CN=Grandchild"),
        KeyUsageSet::signing(),
        &leaf,
        "grandchild",
        PASSWORD,
    );
    assert!(matches!(result, Err(KeyStoreError::SignerUsage { .. })));
    assert!(!manager.store().read().unwrap().contains_alias("grandchild"));
}

#[test]
fn test_creation_rejects_duplicates_and_unsupported_specs() {
    let manager = manager();
    root_and_leaf(&manager);
    assert!(matches!(
        manager.create_root_key_pair(&p256(), &dn("CN=Again"), "root", PASSWORD),
        Err(KeyStoreError::DuplicateAlias { .. })
    ));
    assert!(matches!(
        manager.create_root_key_pair(&KeyPairSpec::ec(EcCurve::Secp256k1), &dn("CN=K"), "k1", PASSWORD),
        Err(KeyStoreError::UnsupportedSpec { .. })
    ));
    // key agreement keys cannot sign their own certificate
    assert!(matches!(
        manager.create_root_key_pair(
            &KeyPairSpec::Xdh(MontgomeryCurve::X25519),
            &dn("CN=X"),
            "x",
            PASSWORD
        ),
        Err(KeyStoreError::UnsupportedSpec { .. })
    ));

    let permissive = KeyStoreConfig {
        reject_duplicate_aliases: false,
        ..KeyStoreConfig::minimal()
    };
    let manager = KeyStoreManager::new(Arc::clone(manager.store()), permissive).unwrap();
    manager
        .create_root_key_pair(&p256(), &dn("CN=Replacement"), "root", PASSWORD)
        .unwrap();
}

#[test]
fn test_issued_certificate_never_outlives_issuer() {
    let config = KeyStoreConfig {
        root_validity_days: 10,
        leaf_validity_days: 365,
        ..KeyStoreConfig::minimal()
    };
    let manager = KeyStoreManager::new(KeyStore::new(factory()).into_shared(), config).unwrap();
    let (root, leaf) = root_and_leaf(&manager);
    assert!(leaf.certificate().unwrap().not_after() <= root.certificate().unwrap().not_after());
    assert!(root.certificate().unwrap().not_after() < Utc::now() + Duration::days(11));
}

#[test]
fn test_out_of_range_validity_is_an_error() {
    let config = KeyStoreConfig {
        root_validity_days: 200_000_000,
        ..KeyStoreConfig::minimal()
    };
    let manager = KeyStoreManager::new(KeyStore::new(factory()).into_shared(), config).unwrap();
    assert!(matches!(
        manager.create_root_key_pair(&p256(), &dn("CN=Root"), "root", PASSWORD),
        Err(KeyStoreError::Key { .. })
    ));
    assert!(!manager.store().read().unwrap().contains_alias("root"));

    let config = KeyStoreConfig {
        leaf_validity_days: 200_000_000,
        ..KeyStoreConfig::minimal()
    };
    let manager = KeyStoreManager::new(KeyStore::new(factory()).into_shared(), config).unwrap();
    let root = manager
        .create_root_key_pair(&p256(), &dn("CN=Root"), "root", PASSWORD)
        .unwrap();
    assert!(matches!(
        manager.create_key_pair(&p256(), &dn("CN=Leaf"), KeyUsageSet::signing(), &root, "leaf", PASSWORD),
        Err(KeyStoreError::Key { .. })
    ));
    assert!(!manager.store().read().unwrap().contains_alias("leaf"));
}

#[test]
fn test_signer_without_chain_is_a_key_error() {
    let manager = manager();
    let root = manager
        .create_root_key_pair(&p256(), &dn("CN=Root"), "root", PASSWORD)
        .unwrap();
    let mut orphan = root.clone();
    orphan.chain.clear();
    assert!(orphan.certificate().is_none());
    assert!(matches!(
        manager.create_key_pair(&p256(), &dn("CN=Leaf"), KeyUsageSet::signing(), &orphan, "leaf", PASSWORD),
        Err(KeyStoreError::Key { .. })
    ));

    // a chain whose leaf belongs to another key is refused the same way
    let other = manager
        .create_root_key_pair(&p256(), &dn("CN=Other"), "other", PASSWORD)
        .unwrap();
    let mismatched = KeyPairEntry {
        chain: other.chain.clone(),
        ..root
    };
    assert!(matches!(
        manager.create_key_pair(&p256(), &dn("CN=Leaf"), KeyUsageSet::signing(), &mismatched, "leaf", PASSWORD),
        Err(KeyStoreError::Key { .. })
    ));
}

#[test]
fn test_create_keys_and_key_sets() {
    let manager = manager();
    let key = manager
        .create_key(&KeySpec::Symmetric(SymKeySpec::aes(Length::Len128)), "aes", PASSWORD)
        .unwrap();
    assert_eq!(key.key.material.len(), 16);

    let spec = KeySetSpec::new(Length::Len256, 2);
    let set = manager.create_key_set(spec, "set", PASSWORD).unwrap();
    assert_eq!(set.key_set.keys.len(), 2);

    let hash = manager.create_key_set_hash(spec, "hash", PASSWORD).unwrap();
    let resolved = hash.hash.resolve(manager.validator().factory().as_ref(), PASSWORD).unwrap();
    assert_eq!(resolved.spec, spec);

    assert!(matches!(
        manager.create_key_set(KeySetSpec::new(Length::Len256, 9), "bad", PASSWORD),
        Err(KeyStoreError::UnsupportedSpec { .. })
    ));
    assert!(matches!(
        manager.create_key(&KeySpec::Symmetric(SymKeySpec::aes(Length::Len128)), "set", PASSWORD),
        Err(KeyStoreError::DuplicateAlias { .. })
    ));
    assert_eq!(manager.store().read().unwrap().size(), 3);
}

// ---------------------------------------------------------------- gateway

#[test]
fn test_export_import_with_password() {
    let manager = manager();
    let (_, leaf) = root_and_leaf(&manager);
    let gateway = KeyStoreGateway::new(manager);

    let lock = lock();
    let mut exported = Vec::new();
    gateway.export_entry("leaf", &mut exported, PASSWORD, &lock).unwrap();

    let imported = gateway
        .import_entry(&mut Cursor::new(&exported), Some(b"lock passphrase"))
        .unwrap();
    match imported {
        KeyStoreEntry::KeyPair(entry) => {
            assert_eq!(entry.key_pair, leaf.key_pair);
            assert_eq!(entry.chain, leaf.chain);
        }
        other => panic!("unexpected entry {:?}", other.entry_type()),
    }

    assert!(matches!(
        gateway.export_entry("leaf", &mut Vec::new(), b"wrong", &lock),
        Err(KeyStoreError::WrongPassword { .. })
    ));
    assert!(matches!(
        gateway.export_entry("missing", &mut Vec::new(), PASSWORD, &lock),
        Err(KeyStoreError::NotFound { .. })
    ));
}

#[test]
fn test_import_rejects_leaf_for_another_key() {
    let manager = manager();
    let (root, leaf) = root_and_leaf(&manager);
    let gateway = KeyStoreGateway::new(manager);

    let forged = KeyStoreEntry::KeyPair(KeyPairEntry {
        key_pair: leaf.key_pair.clone(),
        chain: root.chain.clone(),
        creation_date: Utc::now(),
    });
    let lock = lock();
    let envelope = lock.seal(&bincode::serialize(&forged).unwrap()).unwrap();
    let bytes = envelope.encode().unwrap();

    assert!(matches!(
        gateway.import_entry(&mut Cursor::new(&bytes), Some(b"lock passphrase")),
        Err(KeyStoreError::Key { .. })
    ));
}

#[test]
fn test_lock_refuses_costly_descriptor() {
    let descriptor = LockDescriptor {
        kdf: KeyDerivationParams {
            memory_cost: 4_000_000,
            ..KeyDerivationParams::minimal()
        },
        salt: vec![0u8; 16],
    };
    assert!(matches!(
        Lock::from_descriptor(&descriptor, b"pw"),
        Err(KeyStoreError::Lock { .. })
    ));

    // the seed length ignores the descriptor
    let lock = lock();
    let envelope = lock.seal(b"payload").unwrap();
    let stretched = LockDescriptor {
        kdf: KeyDerivationParams {
            key_length: 1 << 30,
            ..lock.descriptor().kdf
        },
        salt: lock.descriptor().salt.clone(),
    };
    let rebuilt = Lock::from_descriptor(&stretched, b"lock passphrase").unwrap();
    assert_eq!(rebuilt.open(&envelope).unwrap().as_bytes(), b"payload");
}

#[test]
fn test_import_refuses_costly_envelope() {
    let manager = manager();
    root_and_leaf(&manager);
    let gateway = KeyStoreGateway::new(manager);
    let mut exported = Vec::new();
    gateway.export_entry("leaf", &mut exported, PASSWORD, &lock()).unwrap();

    // magic and version, then the descriptor's memory cost
    exported[5..9].copy_from_slice(&4_000_000u32.to_le_bytes());
    assert!(matches!(
        gateway.import_entry(&mut Cursor::new(&exported), Some(b"lock passphrase")),
        Err(KeyStoreError::Lock { .. })
    ));
}

#[test]
fn test_import_falls_back_to_lock_resolver() {
    let manager = manager();
    manager
        .create_key(&KeySpec::Symmetric(SymKeySpec::aes(Length::Len256)), "aes", PASSWORD)
        .unwrap();
    let mut gateway = KeyStoreGateway::new(manager);

    let mut exported = Vec::new();
    gateway.export_entry("aes", &mut exported, PASSWORD, &lock()).unwrap();

    // no resolver and a wrong password
    assert!(matches!(
        gateway.import_entry(&mut Cursor::new(&exported), Some(b"wrong")),
        Err(KeyStoreError::Lock { .. })
    ));

    let calls = Arc::new(AtomicU32::new(0));
    let seen = Arc::clone(&calls);
    gateway.set_lock_resolver(move |lock: &mut ResolvableLock| {
        seen.fetch_add(1, Ordering::SeqCst);
        assert_eq!(lock.descriptor().salt.len(), 16);
        for guess in [&b"first guess"[..], b"lock passphrase"] {
            if lock.unlock(guess) {
                return Ok(());
            }
        }
        Err(KeyStoreError::lock_error("prompt", "gave up"))
    });

    let entry = gateway
        .import_entry(&mut Cursor::new(&exported), Some(b"wrong"))
        .unwrap();
    assert_eq!(entry.entry_type(), EntryType::Key);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // the direct password skips the resolver
    gateway
        .import_entry(&mut Cursor::new(&exported), Some(b"lock passphrase"))
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_resolver_that_gives_up_is_a_lock_error() {
    let manager = manager();
    manager
        .create_key(&KeySpec::Symmetric(SymKeySpec::aes(Length::Len256)), "aes", PASSWORD)
        .unwrap();
    let mut gateway = KeyStoreGateway::new(manager);
    let mut exported = Vec::new();
    gateway.export_entry("aes", &mut exported, PASSWORD, &lock()).unwrap();

    gateway.set_lock_resolver(|lock: &mut ResolvableLock| {
        let _ = lock.unlock(b"nope");
        Ok(())
    });
    assert!(matches!(
        gateway.import_entry(&mut Cursor::new(&exported), None),
        Err(KeyStoreError::Lock { .. })
    ));
    assert!(gateway.import_entry(&mut Cursor::new(b"garbage"), None).is_err());
}

#[test]
fn test_certificate_request_workflow() {
    let manager = manager();
    let (_, leaf) = root_and_leaf(&manager);
    let requester = manager
        .create_root_key_pair(&p256(), &dn("CN=Requester"), "requester", PASSWORD)
        .unwrap();
    let mut gateway = KeyStoreGateway::new(manager);

    assert!(matches!(
        gateway.set_certifier("leaf"),
        Err(KeyStoreError::SignerUsage { .. })
    ));
    gateway.set_certifier("root").unwrap();
    gateway.set_password_resolver(|alias: &str| (alias == "root").then(|| SecureBytes::from(PASSWORD)));

    let mut request_bytes = Vec::new();
    let request = gateway
        .create_certificate_request("requester", &mut request_bytes, PASSWORD)
        .unwrap();
    assert_eq!(request.subject(), requester.certificate().unwrap().subject());

    let mut bundle = Vec::new();
    let issued = gateway
        .process_certificate_request(&mut Cursor::new(&request_bytes), &mut bundle)
        .unwrap();
    assert_eq!(issued.len(), 2);
    assert!(issued[0].key_pair().matches_public(&requester.key_pair));
    assert_eq!(issued[1], leaf.chain[1]);

    let imported = gateway.import_certificates(&mut Cursor::new(&bundle)).unwrap();
    assert_eq!(imported.len(), 2);
    let certificates: Vec<_> = imported
        .iter()
        .flat_map(|entry| entry.certificates().to_vec())
        .collect();
    assert_eq!(certificates, issued);
    verify_chain_now(factory().as_ref(), &certificates).unwrap();
}

#[test]
fn test_tampered_request_is_invalid() {
    let manager = manager();
    root_and_leaf(&manager);
    let mut gateway = KeyStoreGateway::new(manager);
    gateway.set_certifier("root").unwrap();
    gateway.set_password_resolver(|_: &str| Some(SecureBytes::from(PASSWORD)));

    let mut request_bytes = Vec::new();
    gateway
        .create_certificate_request("leaf", &mut request_bytes, PASSWORD)
        .unwrap();
    let last = request_bytes.len() - 1;
    request_bytes[last] ^= 0x01;

    let mut output = Vec::new();
    assert!(matches!(
        gateway.process_certificate_request(&mut Cursor::new(&request_bytes), &mut output),
        Err(KeyStoreError::InvalidRequest(_))
    ));
    assert!(output.is_empty());
}

#[test]
fn test_trust_overlap_reports_known_certificates() {
    let manager = manager();
    let (root, leaf) = root_and_leaf(&manager);
    {
        let mut store = manager.store().write().unwrap();
        store.set_certificate("trusted-root", root.certificate().unwrap().clone());
    }
    let gateway = KeyStoreGateway::new(manager);
    let overlap = gateway.trust_overlap(&KeyStoreEntry::KeyPair(leaf)).unwrap();
    assert_eq!(
        overlap,
        vec![Some("leaf".to_string()), Some("trusted-root".to_string())]
    );
}
