/*!
 * Error Handling for the QaSa Keystore
 *
 * Every failure the keystore can report is a value-level error the caller can
 * recover from. Provider failures coming out of the capability factory are
 * carried through unchanged as `Provider` errors.
 */

use std::fmt;
use thiserror::Error;

use crate::keystore::EntryType;

/// Reason a certificate chain failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainFailure {
    /// The certificate's issuer does not match the subject of the next certificate
    IssuerMismatch,
    /// The certificate's signature does not verify against the issuer's key
    SignatureInvalid,
    /// The certificate's validity window ended before the check date
    Expired,
    /// The certificate's validity window starts after the check date
    NotYetValid,
    /// The chain does not terminate in a self-signed root
    UntrustedRoot,
}

impl fmt::Display for ChainFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainFailure::IssuerMismatch => write!(f, "issuer-mismatch"),
            ChainFailure::SignatureInvalid => write!(f, "signature-invalid"),
            ChainFailure::Expired => write!(f, "expired"),
            ChainFailure::NotYetValid => write!(f, "not-yet-valid"),
            ChainFailure::UntrustedRoot => write!(f, "untrusted-root"),
        }
    }
}

/// Error type for all keystore operations
#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("Alias not found: {alias}")]
    NotFound { alias: String },

    #[error("Alias {alias} holds a {actual} entry, not a {expected} entry")]
    WrongType {
        alias: String,
        expected: EntryType,
        actual: EntryType,
    },

    /// Raised for a wrong password and for corrupt wrapped data alike.
    #[error("Unable to unlock entry: {alias}")]
    WrongPassword { alias: String },

    #[error("Alias already in use: {alias}")]
    DuplicateAlias { alias: String },

    #[error("Unsupported spec: {spec} - {cause}")]
    UnsupportedSpec { spec: String, cause: String },

    #[error("Signer certificate {subject} lacks certificate-signing usage")]
    SignerUsage { subject: String },

    #[error("Certificate {subject} does not permit {usage} usage")]
    Usage { subject: String, usage: String },

    #[error("Chain validation failed at index {index}: {reason}")]
    ChainValidation { index: usize, reason: ChainFailure },

    #[error("Invalid certificate request: {0}")]
    InvalidRequest(String),

    #[error("Lock error: {operation} - {cause}")]
    Lock { operation: String, cause: String },

    #[error("Key error: {operation} - {cause}")]
    Key { operation: String, cause: String },

    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Keystore unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Provider error: {operation} - {cause}")]
    Provider { operation: String, cause: String },
}

/// Error code constants for the different error categories
pub mod error_codes {
    // Store errors: 1000-1999
    pub const ENTRY_NOT_FOUND: u32 = 1001;
    pub const ENTRY_WRONG_TYPE: u32 = 1002;
    pub const WRONG_PASSWORD: u32 = 1003;
    pub const DUPLICATE_ALIAS: u32 = 1004;
    pub const STORE_UNAVAILABLE: u32 = 1005;

    // Spec errors: 2000-2999
    pub const UNSUPPORTED_SPEC: u32 = 2001;

    // Certificate errors: 3000-3999
    pub const SIGNER_USAGE: u32 = 3001;
    pub const USAGE_NOT_PERMITTED: u32 = 3002;
    pub const CHAIN_VALIDATION_FAILED: u32 = 3003;
    pub const INVALID_REQUEST: u32 = 3004;
    pub const INVALID_IDENTITY: u32 = 3005;

    // Key material errors: 4000-4999
    pub const KEY_ERROR: u32 = 4001;
    pub const LOCK_ERROR: u32 = 4002;

    // Provider errors: 7000-7999
    pub const PROVIDER_FAILURE: u32 = 7001;

    // Encoding and IO errors: 9000-9999
    pub const SERIALIZATION_FAILED: u32 = 9001;
    pub const IO_FAILED: u32 = 9002;
}

impl KeyStoreError {
    /// Get the numeric error code for this error
    pub fn error_code(&self) -> u32 {
        match self {
            KeyStoreError::NotFound { .. } => error_codes::ENTRY_NOT_FOUND,
            KeyStoreError::WrongType { .. } => error_codes::ENTRY_WRONG_TYPE,
            KeyStoreError::WrongPassword { .. } => error_codes::WRONG_PASSWORD,
            KeyStoreError::DuplicateAlias { .. } => error_codes::DUPLICATE_ALIAS,
            KeyStoreError::UnsupportedSpec { .. } => error_codes::UNSUPPORTED_SPEC,
            KeyStoreError::SignerUsage { .. } => error_codes::SIGNER_USAGE,
            KeyStoreError::Usage { .. } => error_codes::USAGE_NOT_PERMITTED,
            KeyStoreError::ChainValidation { .. } => error_codes::CHAIN_VALIDATION_FAILED,
            KeyStoreError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            KeyStoreError::Lock { .. } => error_codes::LOCK_ERROR,
            KeyStoreError::Key { .. } => error_codes::KEY_ERROR,
            KeyStoreError::InvalidIdentity(_) => error_codes::INVALID_IDENTITY,
            KeyStoreError::SerializationError(_) => error_codes::SERIALIZATION_FAILED,
            KeyStoreError::IoError(_) => error_codes::IO_FAILED,
            KeyStoreError::StoreUnavailable(_) => error_codes::STORE_UNAVAILABLE,
            KeyStoreError::Provider { .. } => error_codes::PROVIDER_FAILURE,
        }
    }

    /// Get the error category/type as a string
    pub fn error_type(&self) -> &'static str {
        match self {
            KeyStoreError::NotFound { .. } => "NotFound",
            KeyStoreError::WrongType { .. } => "WrongType",
            KeyStoreError::WrongPassword { .. } => "WrongPassword",
            KeyStoreError::DuplicateAlias { .. } => "DuplicateAlias",
            KeyStoreError::UnsupportedSpec { .. } => "UnsupportedSpec",
            KeyStoreError::SignerUsage { .. } => "SignerUsage",
            KeyStoreError::Usage { .. } => "Usage",
            KeyStoreError::ChainValidation { .. } => "ChainValidation",
            KeyStoreError::InvalidRequest(_) => "InvalidRequest",
            KeyStoreError::Lock { .. } => "Lock",
            KeyStoreError::Key { .. } => "Key",
            KeyStoreError::InvalidIdentity(_) => "InvalidIdentity",
            KeyStoreError::SerializationError(_) => "SerializationError",
            KeyStoreError::IoError(_) => "IoError",
            KeyStoreError::StoreUnavailable(_) => "StoreUnavailable",
            KeyStoreError::Provider { .. } => "Provider",
        }
    }
}

/// Convenience constructors for common error types
impl KeyStoreError {
    pub fn not_found(alias: &str) -> Self {
        KeyStoreError::NotFound {
            alias: alias.to_string(),
        }
    }

    pub fn wrong_password(alias: &str) -> Self {
        KeyStoreError::WrongPassword {
            alias: alias.to_string(),
        }
    }

    pub fn unsupported_spec(spec: impl fmt::Display, cause: &str) -> Self {
        KeyStoreError::UnsupportedSpec {
            spec: spec.to_string(),
            cause: cause.to_string(),
        }
    }

    pub fn key_error(operation: &str, cause: &str) -> Self {
        KeyStoreError::Key {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }

    pub fn lock_error(operation: &str, cause: &str) -> Self {
        KeyStoreError::Lock {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }

    pub fn provider_error(operation: &str, cause: impl fmt::Display) -> Self {
        KeyStoreError::Provider {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }

    pub fn chain_failure(index: usize, reason: ChainFailure) -> Self {
        KeyStoreError::ChainValidation { index, reason }
    }
}

impl From<std::io::Error> for KeyStoreError {
    fn from(err: std::io::Error) -> Self {
        KeyStoreError::IoError(format!("IO operation failed: {}", err))
    }
}

impl From<bincode::Error> for KeyStoreError {
    fn from(err: bincode::Error) -> Self {
        KeyStoreError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for KeyStoreError {
    fn from(err: serde_json::Error) -> Self {
        KeyStoreError::SerializationError(err.to_string())
    }
}

/// Result type alias for keystore operations
pub type KeyStoreResult<T> = Result<T, KeyStoreError>;
