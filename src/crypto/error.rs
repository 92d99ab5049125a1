// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Types
//!
//! Error taxonomy for credential sealing. Every variant carries enough context
//! for developer diagnostics (which stage, which field, why) and nothing more:
//! plaintext secrets, derived keys and private scalars never end up in an error.
//!
//! ## Error Variants
//!
//! - **UnsupportedEnvironment**: RNG, ECDH or AES-GCM unavailable; raised before any key material exists
//! - **KeyImport**: server public key malformed, wrong curve/algorithm, or expired (re-fetch the key)
//! - **KeyGeneration**: ephemeral key pair could not be generated (retry the whole call)
//! - **KeyDerivation**: ECDH or KDF step failed (retry the whole call)
//! - **Encryption**: AEAD primitive failure
//! - **Decryption**: AEAD authentication failure on the decoding side
//! - **InvalidEnvelope**: a transport field could not be decoded
//!
//! ## Usage Example
//!
//! ```rust
//! use credential_seal::crypto::{CryptoError, ErrorKind};
//!
//! let err = CryptoError::KeyImport {
//!     reason: "not a point on P-256".to_string(),
//! };
//! assert_eq!(err.kind(), ErrorKind::KeyImport);
//! assert_eq!(err.user_message(), "encryption failed, please retry");
//! ```

use thiserror::Error;

/// Message shown to end users for any sealing failure
pub const USER_FACING_MESSAGE: &str = "encryption failed, please retry";

/// Error type for all credential sealing operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Required cryptographic primitives are unavailable
    #[error("Unsupported environment: {reason}")]
    UnsupportedEnvironment { reason: String },

    /// Server public key could not be imported
    ///
    /// This error occurs when:
    /// - base64 decoding fails or the key is empty
    /// - the bytes are not SPKI/DER or a SEC1 point
    /// - the point is not on the expected curve
    /// - the declared algorithm does not match the curve
    /// - the key has expired
    #[error("Key import failed: {reason}")]
    KeyImport { reason: String },

    /// Ephemeral key pair generation failed
    #[error("Key generation failed: {reason}")]
    KeyGeneration { reason: String },

    /// ECDH or KDF derivation failed
    #[error("Key derivation failed during {operation}: {reason}")]
    KeyDerivation { operation: String, reason: String },

    /// AEAD encryption failed for a field
    #[error("Encryption failed for {field}: {reason}")]
    Encryption { field: String, reason: String },

    /// AEAD decryption or authentication failed for a field
    #[error("Decryption failed for {field}: {reason}")]
    Decryption { field: String, reason: String },

    /// A transport field is malformed
    #[error("Invalid envelope field '{field}': {reason}")]
    InvalidEnvelope { field: String, reason: String },
}

/// Copyable discriminant of [`CryptoError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedEnvironment,
    KeyImport,
    KeyGeneration,
    KeyDerivation,
    Encryption,
    Decryption,
    InvalidEnvelope,
}

impl ErrorKind {
    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedEnvironment => "UNSUPPORTED_ENVIRONMENT",
            ErrorKind::KeyImport => "KEY_IMPORT_ERROR",
            ErrorKind::KeyGeneration => "KEY_GENERATION_ERROR",
            ErrorKind::KeyDerivation => "KEY_DERIVATION_ERROR",
            ErrorKind::Encryption => "ENCRYPTION_ERROR",
            ErrorKind::Decryption => "DECRYPTION_ERROR",
            ErrorKind::InvalidEnvelope => "INVALID_ENVELOPE",
        }
    }
}

impl CryptoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CryptoError::UnsupportedEnvironment { .. } => ErrorKind::UnsupportedEnvironment,
            CryptoError::KeyImport { .. } => ErrorKind::KeyImport,
            CryptoError::KeyGeneration { .. } => ErrorKind::KeyGeneration,
            CryptoError::KeyDerivation { .. } => ErrorKind::KeyDerivation,
            CryptoError::Encryption { .. } => ErrorKind::Encryption,
            CryptoError::Decryption { .. } => ErrorKind::Decryption,
            CryptoError::InvalidEnvelope { .. } => ErrorKind::InvalidEnvelope,
        }
    }

    /// Whether retrying the whole sealing call with fresh randomness can succeed.
    ///
    /// `KeyImport` is not retryable as-is: the caller has to fetch a new server key.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CryptoError::KeyGeneration { .. } | CryptoError::KeyDerivation { .. }
        )
    }

    /// Opaque message for end users
    pub fn user_message(&self) -> &'static str {
        USER_FACING_MESSAGE
    }

    pub(crate) fn key_import(reason: impl Into<String>) -> Self {
        CryptoError::KeyImport {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_envelope(field: &str, reason: impl Into<String>) -> Self {
        CryptoError::InvalidEnvelope {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
