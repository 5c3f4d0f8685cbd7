// Password-based wrapping of secret material
//
// Wrapped layout:
//   version (1) | memory_cost (4, LE) | time_cost (4, LE) | parallelism (4, LE)
//   | salt (16) | nonce (12) | ChaCha20-Poly1305 ciphertext
//
// The derivation parameters travel with the ciphertext so a store written
// with one configuration stays readable under another.

use argon2::{Algorithm, Argon2, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key as ChaChaKey, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use crate::config::KeyDerivationParams;
use crate::error::{KeyStoreError, KeyStoreResult};
use crate::secure_memory::SecureBytes;

const WRAP_VERSION: u8 = 1;
pub(crate) const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const HEADER_LEN: usize = 1 + 12 + SALT_LEN + NONCE_LEN;
const WRAP_KEY_LEN: usize = 32;

/// Derives a key from a password with Argon2id
///
/// # Arguments
///
/// * `password` - The password to derive a key from
/// * `salt` - Salt, at least 8 bytes
/// * `params` - Parameters for key derivation
///
/// # Returns
///
/// The derived key, `params.key_length` bytes long
pub(crate) fn derive_key(
    password: &[u8],
    salt: &[u8],
    params: &KeyDerivationParams,
) -> KeyStoreResult<SecureBytes> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2()?);
    let mut key = vec![0u8; params.key_length];
    argon2
        .hash_password_into(password, salt, &mut key)
        .map_err(|e| KeyStoreError::key_error("derive_key", &format!("Failed to derive key: {}", e)))?;
    Ok(SecureBytes::from(key))
}

/// Generates a cryptographically secure random salt
pub(crate) fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Encrypt `secret` under a key derived from `password`
pub(crate) fn wrap(
    secret: &[u8],
    password: &[u8],
    params: &KeyDerivationParams,
) -> KeyStoreResult<Vec<u8>> {
    let params = KeyDerivationParams {
        key_length: WRAP_KEY_LEN,
        ..*params
    };
    if !params.within_limits() {
        return Err(KeyStoreError::key_error("wrap", "key derivation cost exceeds the supported limits"));
    }
    let salt = generate_salt();
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(password, &salt, &params)?;
    let cipher = ChaCha20Poly1305::new(ChaChaKey::from_slice(key.as_bytes()));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), secret)
        .map_err(|_| KeyStoreError::key_error("wrap", "encryption failed"))?;

    let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    out.push(WRAP_VERSION);
    out.extend_from_slice(&params.memory_cost.to_le_bytes());
    out.extend_from_slice(&params.time_cost.to_le_bytes());
    out.extend_from_slice(&params.parallelism.to_le_bytes());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt wrapped material.
///
/// Every failure, whether a bad header, a wrong password or tampered
/// ciphertext, is reported as the same `WrongPassword` error.
pub(crate) fn unwrap(wrapped: &[u8], password: &[u8]) -> KeyStoreResult<SecureBytes> {
    let failed = || KeyStoreError::wrong_password("");
    if wrapped.len() < HEADER_LEN || wrapped[0] != WRAP_VERSION {
        return Err(failed());
    }
    let read_u32 = |at: usize| {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&wrapped[at..at + 4]);
        u32::from_le_bytes(bytes)
    };
    let params = KeyDerivationParams {
        memory_cost: read_u32(1),
        time_cost: read_u32(5),
        parallelism: read_u32(9),
        key_length: WRAP_KEY_LEN,
    };
    if !params.within_limits() {
        return Err(failed());
    }
    let salt = &wrapped[13..13 + SALT_LEN];
    let nonce = &wrapped[13 + SALT_LEN..HEADER_LEN];
    let ciphertext = &wrapped[HEADER_LEN..];

    let key = derive_key(password, salt, &params).map_err(|_| failed())?;
    let cipher = ChaCha20Poly1305::new(ChaChaKey::from_slice(key.as_bytes()));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| failed())?;
    Ok(SecureBytes::from(plaintext))
}
