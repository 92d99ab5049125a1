// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! AES-GCM Field Encryption
//!
//! Authenticated encryption of individual credential fields, byte-compatible
//! with Web Crypto API's AES-GCM:
//!
//! - Nonce: 12 bytes (96 bits), freshly drawn from the OS RNG per field
//! - Output: ciphertext with the 16-byte authentication tag appended
//! - Algorithm: AES-256-GCM (AES-128-GCM for 16-byte symmetric keys)
//! - No Additional Authenticated Data (AAD)

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes128Gcm, Aes256Gcm, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use super::ecdh::SymmetricKey;
use super::{encoding, CryptoError};

/// Nonce size in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Authentication tag size in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Ciphertext (tag appended) plus the nonce it was produced under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedField {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_SIZE],
}

/// Draw a fresh 96-bit nonce from the OS RNG
pub fn generate_nonce() -> Result<[u8; NONCE_SIZE], CryptoError> {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CryptoError::Encryption {
            field: "nonce".to_string(),
            reason: format!("system RNG failure: {}", e),
        })?;
    Ok(nonce)
}

/// Encrypt one field under `key` with a fresh nonce
///
/// # Arguments
///
/// * `field` - name used in error context only (e.g. `api_key`)
/// * `key` - single-use symmetric key
/// * `plaintext` - field bytes
///
/// # Errors
///
/// `Encryption` only on RNG or AEAD primitive failure.
pub fn encrypt_field(
    field: &str,
    key: &SymmetricKey,
    plaintext: &[u8],
) -> Result<EncryptedField, CryptoError> {
    let nonce = generate_nonce()?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext,
                aad: b"",
            },
        )
        .map_err(|e| CryptoError::Encryption {
            field: field.to_string(),
            reason: format!("AES-256-GCM failure: {}", e),
        })?;

    Ok(EncryptedField { ciphertext, nonce })
}

/// Decrypt one field and verify its authentication tag
///
/// # Errors
///
/// - `InvalidEnvelope` if the nonce is not 12 bytes or the ciphertext is shorter than a tag
/// - `Decryption` if authentication fails (wrong key, tampered ciphertext or nonce)
pub fn decrypt_field(
    field: &str,
    key: &SymmetricKey,
    ciphertext: &[u8],
    nonce: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if nonce.len() != NONCE_SIZE {
        return Err(CryptoError::invalid_envelope(
            field,
            format!("nonce must be {} bytes, got {}", NONCE_SIZE, nonce.len()),
        ));
    }
    if ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::invalid_envelope(
            field,
            format!(
                "ciphertext must be at least {} bytes, got {}",
                TAG_SIZE,
                ciphertext.len()
            ),
        ));
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: b"",
            },
        )
        .map_err(|_| CryptoError::Decryption {
            field: field.to_string(),
            reason: "authentication tag mismatch (wrong key or corrupted data)".to_string(),
        })
}

/// Result of [`encrypt_with_symmetric_key`], in the same transport shape as
/// a single sealed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymmetricCiphertext {
    pub encrypted_data: String,
    pub iv: String,
    /// Always empty: no key exchange takes place
    pub ephemeral_public_key: String,
}

/// Encrypt with a symmetric key handed out by the server directly
///
/// Accepts 16-byte (AES-128-GCM) or 32-byte (AES-256-GCM) keys.
pub fn encrypt_with_symmetric_key(
    plaintext: &str,
    key_base64: &str,
) -> Result<SymmetricCiphertext, CryptoError> {
    let key = zeroize::Zeroizing::new(
        encoding::decode_field("symmetric_key", key_base64)
            .map_err(|e| CryptoError::key_import(e.to_string()))?,
    );
    let nonce = generate_nonce()?;
    let payload = Payload {
        msg: plaintext.as_bytes(),
        aad: b"",
    };

    let encrypted = match key.len() {
        16 => Aes128Gcm::new_from_slice(&key)
            .map_err(|e| CryptoError::key_import(e.to_string()))?
            .encrypt(Nonce::from_slice(&nonce), payload),
        32 => Aes256Gcm::new_from_slice(&key)
            .map_err(|e| CryptoError::key_import(e.to_string()))?
            .encrypt(Nonce::from_slice(&nonce), payload),
        other => {
            return Err(CryptoError::key_import(format!(
                "symmetric key must be 16 or 32 bytes, got {}",
                other
            )))
        }
    }
    .map_err(|e| CryptoError::Encryption {
        field: "data".to_string(),
        reason: format!("AES-GCM failure: {}", e),
    })?;

    Ok(SymmetricCiphertext {
        encrypted_data: encoding::encode(&encrypted),
        iv: encoding::encode(nonce),
        ephemeral_public_key: String::new(),
    })
}
