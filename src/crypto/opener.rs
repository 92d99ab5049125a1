// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Envelope Decryption (backend side)
//!
//! Reference implementation of what the backend does with an
//! [`EncryptionEnvelope`]: ECDH between its static private key and the
//! envelope's ephemeral public key, the same key derivation, then AES-256-GCM
//! decryption of each field under its own nonce.
//!
//! Used by the integration tests, the `credseal open` diagnostic command and
//! services that want a drop-in decoder.

use std::fmt;

use chrono::{DateTime, Utc};
use p256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::aes_gcm::decrypt_field;
use super::ecdh::{derive_symmetric_key, export_public_key, import_public_key, CurveId, KeyDerivation};
use super::envelope::{split_iv, EncryptionEnvelope, IvLayout};
use super::server_key::ServerPublicKey;
use super::{encoding, CryptoError};
use crate::config::SealerConfig;

/// Decoding parameters; must match the sealing side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenOptions {
    pub curve: CurveId,
    pub key_derivation: KeyDerivation,
    pub iv_layout: IvLayout,
}

impl From<&SealerConfig> for OpenOptions {
    fn from(config: &SealerConfig) -> Self {
        Self {
            curve: config.curve,
            key_derivation: config.key_derivation.clone(),
            iv_layout: config.iv_layout,
        }
    }
}

/// Recovered plaintext credentials, zeroed on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Decrypt an envelope with the server's private key
///
/// # Errors
///
/// - `InvalidEnvelope` if a field is not base64, the ephemeral key is not a
///   valid point, the `iv` length does not match the layout, or a plaintext
///   is not UTF-8
/// - `Decryption` if either field fails authentication
pub fn open_envelope(
    server_secret: &SecretKey,
    envelope: &EncryptionEnvelope,
    options: &OpenOptions,
) -> Result<Credentials, CryptoError> {
    let ephemeral_bytes = encoding::decode_field("ephemeral_public_key", &envelope.ephemeral_public_key)?;
    let ephemeral = import_public_key(&ephemeral_bytes, options.curve)
        .map_err(|e| CryptoError::invalid_envelope("ephemeral_public_key", e.to_string()))?;

    let iv = encoding::decode_field("iv", &envelope.iv)?;
    let nonces = split_iv(&iv, options.iv_layout)?;

    let api_ct = encoding::decode_field("encrypted_api_key", &envelope.encrypted_api_key)?;
    let secret_ct = encoding::decode_field("encrypted_secret_key", &envelope.encrypted_secret_key)?;

    let key = derive_symmetric_key(server_secret, &ephemeral, &options.key_derivation)?;
    let api_key = decrypt_field("encrypted_api_key", &key, &api_ct, &nonces.api_key)?;
    let secret_key = decrypt_field("encrypted_secret_key", &key, &secret_ct, &nonces.secret_key)?;

    Ok(Credentials {
        api_key: into_utf8("encrypted_api_key", api_key)?,
        secret_key: into_utf8("encrypted_secret_key", secret_key)?,
    })
}

fn into_utf8(field: &str, bytes: Vec<u8>) -> Result<String, CryptoError> {
    String::from_utf8(bytes).map_err(|e| {
        let mut bytes = e.into_bytes();
        bytes.zeroize();
        CryptoError::invalid_envelope(field, "decrypted data is not valid UTF-8")
    })
}

/// Static server key pair for tests, the CLI and local backends
pub struct ServerKeyPair {
    secret: SecretKey,
}

impl ServerKeyPair {
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::random(&mut OsRng),
        }
    }

    /// Load a 32-byte private key from hex (optional `0x` prefix)
    pub fn from_hex(private_key_hex: &str) -> Result<Self, CryptoError> {
        let trimmed = private_key_hex.trim();
        let hex_str = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        if hex_str.len() != 64 {
            return Err(CryptoError::key_import(format!(
                "private key must be 64 hex characters (32 bytes), got {} characters",
                hex_str.len()
            )));
        }

        let bytes = Zeroizing::new(
            hex::decode(hex_str)
                .map_err(|e| CryptoError::key_import(format!("private key is not valid hex: {}", e)))?,
        );
        let secret = SecretKey::from_slice(&bytes)
            .map_err(|_| CryptoError::key_import("private key is not a valid P-256 scalar"))?;

        Ok(Self { secret })
    }

    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.secret.to_bytes()))
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    /// base64 SPKI/DER of the public key, as the backend publishes it
    pub fn public_key_base64(&self) -> Result<String, CryptoError> {
        Ok(encoding::encode(export_public_key(&self.public_key())?))
    }

    pub fn server_public_key(
        &self,
        algorithm: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<ServerPublicKey, CryptoError> {
        Ok(ServerPublicKey::new(
            self.public_key_base64()?,
            algorithm,
            expires_at,
        ))
    }

    pub fn open(
        &self,
        envelope: &EncryptionEnvelope,
        options: &OpenOptions,
    ) -> Result<Credentials, CryptoError> {
        open_envelope(&self.secret, envelope, options)
    }
}

impl fmt::Debug for ServerKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerKeyPair")
            .field("public", &self.public_key())
            .field("secret", &"<redacted>")
            .finish()
    }
}
