#![no_main]

use libfuzzer_sys::fuzz_target;
use qasa_keystore::certificate::{decode_certificates, Certificate, CertificateRequest};

fuzz_target!(|data: &[u8]| {
    if let Ok(certificate) = Certificate::decode(data) {
        // A decoded certificate keeps its exact encoding
        assert_eq!(certificate.encoded(), data);
        assert!(!certificate.key_pair().has_private_key());
        let _ = certificate.fingerprint();
    }

    let _ = CertificateRequest::decode(data);
    let _ = decode_certificates(data);
});
