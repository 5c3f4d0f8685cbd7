/*!
 * Keystore configuration
 *
 * Password derivation cost and certificate lifetimes. Configuration is passed
 * explicitly to the factory, manager and lock derivation; nothing here is
 * global.
 */

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{KeyStoreError, KeyStoreResult};

/// Longest certificate lifetime a configuration may ask for (100 years)
pub const MAX_VALIDITY_DAYS: i64 = 36_500;

/// Parameters for Argon2id password derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDerivationParams {
    /// Memory cost (in KB)
    pub memory_cost: u32,
    /// Time cost (iterations)
    pub time_cost: u32,
    /// Parallelism factor
    pub parallelism: u32,
    /// Output key length in bytes
    pub key_length: usize,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            time_cost: 3,
            parallelism: 4,
            key_length: 32,
        }
    }
}

impl KeyDerivationParams {
    /// Upper bound on memory cost (1 GiB)
    pub const MAX_MEMORY_COST: u32 = 1 << 20;
    /// Upper bound on iterations
    pub const MAX_TIME_COST: u32 = 16;
    /// Upper bound on lanes
    pub const MAX_PARALLELISM: u32 = 16;

    /// Low-resource mode for constrained environments
    pub fn low_resource() -> Self {
        Self {
            memory_cost: 19456, // 19 MB
            time_cost: 2,
            parallelism: 1,
            key_length: 32,
        }
    }

    /// High-security mode for sensitive keys
    pub fn high_security() -> Self {
        Self {
            memory_cost: 262144, // 256 MB
            time_cost: 4,
            parallelism: 8,
            key_length: 32,
        }
    }

    /// Smallest parameters Argon2 accepts; for tests and throwaway stores only
    pub fn minimal() -> Self {
        Self {
            memory_cost: 64,
            time_cost: 1,
            parallelism: 1,
            key_length: 32,
        }
    }

    /// Whether these costs are affordable. Parameters read from a wrapped
    /// secret or an imported envelope are checked here before any derivation.
    pub fn within_limits(&self) -> bool {
        self.memory_cost <= Self::MAX_MEMORY_COST
            && self.time_cost <= Self::MAX_TIME_COST
            && self.parallelism <= Self::MAX_PARALLELISM
    }

    pub(crate) fn to_argon2(&self) -> KeyStoreResult<argon2::Params> {
        argon2::Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.key_length),
        )
        .map_err(|e| {
            KeyStoreError::key_error(
                "derive_key",
                &format!("Failed to build Argon2 parameters: {}", e),
            )
        })
    }
}

/// Configuration shared by the factory, manager and gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyStoreConfig {
    /// Derivation parameters for entry passwords
    pub kdf: KeyDerivationParams,
    /// Derivation parameters for export locks
    pub lock_kdf: KeyDerivationParams,
    /// Lifetime of self-signed root certificates
    pub root_validity_days: i64,
    /// Lifetime of issued certificates, clamped to the issuer's own lifetime
    pub leaf_validity_days: i64,
    /// Reject creation of an entry under an alias that is already in use
    pub reject_duplicate_aliases: bool,
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        Self {
            kdf: KeyDerivationParams::default(),
            lock_kdf: KeyDerivationParams::default(),
            root_validity_days: 3650,
            leaf_validity_days: 365,
            reject_duplicate_aliases: true,
        }
    }
}

impl KeyStoreConfig {
    /// Configuration with minimal derivation cost, for tests
    pub fn minimal() -> Self {
        Self {
            kdf: KeyDerivationParams::minimal(),
            lock_kdf: KeyDerivationParams::minimal(),
            ..Self::default()
        }
    }

    /// Parse configuration from a JSON document; missing fields take defaults
    pub fn from_json_str(json: &str) -> KeyStoreResult<Self> {
        let config: KeyStoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> KeyStoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    fn validate(&self) -> KeyStoreResult<()> {
        let validity = 1..=MAX_VALIDITY_DAYS;
        if !validity.contains(&self.root_validity_days) || !validity.contains(&self.leaf_validity_days) {
            return Err(KeyStoreError::key_error(
                "load_config",
                &format!("certificate validity must be between 1 and {} days", MAX_VALIDITY_DAYS),
            ));
        }
        for params in [&self.kdf, &self.lock_kdf] {
            if !params.within_limits() {
                return Err(KeyStoreError::key_error(
                    "load_config",
                    "key derivation cost exceeds the supported limits",
                ));
            }
            params.to_argon2()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KeyStoreConfig::default();
        assert_eq!(config.kdf.memory_cost, 65536);
        assert!(config.reject_duplicate_aliases);
        assert!(config.root_validity_days > config.leaf_validity_days);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = KeyStoreConfig::from_json_str(r#"{ "leaf_validity_days": 30 }"#).unwrap();
        assert_eq!(config.leaf_validity_days, 30);
        assert_eq!(config.root_validity_days, 3650);
    }

    #[test]
    fn test_rejects_bad_validity() {
        let result = KeyStoreConfig::from_json_str(r#"{ "root_validity_days": 0 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_validity_beyond_limit() {
        for field in ["root_validity_days", "leaf_validity_days"] {
            let json = format!(r#"{{ "{}": 200000000 }}"#, field);
            assert!(KeyStoreConfig::from_json_str(&json).is_err(), "{} accepted", field);
        }
        let json = format!(r#"{{ "leaf_validity_days": {} }}"#, MAX_VALIDITY_DAYS);
        assert!(KeyStoreConfig::from_json_str(&json).is_ok());
    }

    #[test]
    fn test_rejects_unaffordable_kdf() {
        let result = KeyStoreConfig::from_json_str(
            r#"{ "lock_kdf": { "memory_cost": 4000000, "time_cost": 1, "parallelism": 1, "key_length": 32 } }"#,
        );
        assert!(result.is_err());
        assert!(KeyDerivationParams::high_security().within_limits());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keystore.json");
        std::fs::write(&path, r#"{ "kdf": { "memory_cost": 64, "time_cost": 1, "parallelism": 1, "key_length": 32 } }"#).unwrap();
        let config = KeyStoreConfig::from_json_file(&path).unwrap();
        assert_eq!(config.kdf, KeyDerivationParams::minimal());
    }
}
