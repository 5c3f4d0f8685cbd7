#![no_main]

use libfuzzer_sys::fuzz_target;
use qasa_keystore::keystore::decode_container;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must be rejected cleanly, never panic
    let _ = decode_container(data);

    // Same again behind a valid header, so record parsing is reached
    let mut framed = b"QKST\x01\x00".to_vec();
    framed.extend_from_slice(data);
    let _ = decode_container(&framed);
});
