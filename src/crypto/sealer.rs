// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Credential Sealing
//!
//! Runs the full client-side pipeline once per call:
//! 1. Capability check (before any key material exists)
//! 2. Import the server's public key
//! 3. Generate an ephemeral P-256 key pair and derive the AES-256 key
//! 4. Encrypt the API key and the secret key, each under its own nonce
//! 5. Assemble the transport envelope
//!
//! Any failure aborts the whole call; no partial envelope is returned and
//! nothing is retried. Nothing is retained between calls, so a sealer can be
//! shared freely across threads and tasks.

use chrono::Utc;
use tracing::{debug, warn};

use super::aes_gcm::{encrypt_field, generate_nonce};
use super::capability::check_environment;
use super::ecdh::{export_public_key, generate_ephemeral_key_pair, import_server_public_key};
use super::envelope::{assemble_envelope, EncryptionEnvelope, IvLayout};
use super::server_key::ServerPublicKey;
use super::{encoding, CryptoError};
use crate::config::SealerConfig;

/// Seal an API key/secret pair for the server with the default configuration
///
/// # Arguments
///
/// * `api_key` - plaintext exchange API key
/// * `secret_key` - plaintext exchange API secret
/// * `server_public_key_base64` - base64 SPKI of the server's ECDH public key
///
/// # Example
///
/// ```rust,ignore
/// use credential_seal::crypto::encrypt_credential_pair;
///
/// let envelope = encrypt_credential_pair("AKIA1234567890", "s3cr3tValue!", &server_key_b64)?;
/// let body = serde_json::to_string(&envelope)?;
/// ```
pub fn encrypt_credential_pair(
    api_key: &str,
    secret_key: &str,
    server_public_key_base64: &str,
) -> Result<EncryptionEnvelope, CryptoError> {
    CredentialSealer::default().seal(api_key, secret_key, server_public_key_base64)
}

/// Stateless sealer carrying only its configuration
#[derive(Debug, Clone, Default)]
pub struct CredentialSealer {
    config: SealerConfig,
}

impl CredentialSealer {
    pub fn new(config: SealerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SealerConfig {
        &self.config
    }

    /// Seal against a fetched [`ServerPublicKey`], checking its declared
    /// algorithm and (if configured) its expiry first.
    pub fn seal_for(
        &self,
        api_key: &str,
        secret_key: &str,
        server_key: &ServerPublicKey,
    ) -> Result<EncryptionEnvelope, CryptoError> {
        check_environment()?;
        server_key.validate(self.config.curve, self.config.enforce_key_expiry, Utc::now())?;
        self.seal_unchecked_environment(api_key, secret_key, &server_key.public_key)
    }

    /// Seal against a bare base64 public key
    pub fn seal(
        &self,
        api_key: &str,
        secret_key: &str,
        server_public_key_base64: &str,
    ) -> Result<EncryptionEnvelope, CryptoError> {
        check_environment()?;
        self.seal_unchecked_environment(api_key, secret_key, server_public_key_base64)
    }

    fn seal_unchecked_environment(
        &self,
        api_key: &str,
        secret_key: &str,
        server_public_key_base64: &str,
    ) -> Result<EncryptionEnvelope, CryptoError> {
        let curve = self.config.curve;

        let encoded = encoding::decode_public_key(server_public_key_base64)?;
        let server_key = import_server_public_key(&encoded, curve).map_err(|e| {
            warn!("Server public key rejected ({} bytes): {}", encoded.len(), e);
            e
        })?;

        let ephemeral = generate_ephemeral_key_pair(curve)?;
        let ephemeral_public = export_public_key(ephemeral.public_key())?;
        let key = ephemeral.into_symmetric_key(&server_key, &self.config.key_derivation)?;

        let api = encrypt_field("api_key", &key, api_key.as_bytes())?;
        let secret = encrypt_field("secret_key", &key, secret_key.as_bytes())?;
        assert_ne!(
            api.nonce, secret.nonce,
            "field nonces collided under a single derived key"
        );

        let reserved = match self.config.iv_layout {
            IvLayout::Legacy => Some(generate_nonce()?),
            IvLayout::Compact => None,
        };

        let envelope = assemble_envelope(
            &api,
            &secret,
            &ephemeral_public,
            self.config.iv_layout,
            reserved.as_ref(),
        )?;

        debug!(
            "🔐 Sealed credential pair on {} (iv layout: {}, api_key ct: {} bytes, secret_key ct: {} bytes)",
            curve,
            self.config.iv_layout,
            api.ciphertext.len(),
            secret.ciphertext.len()
        );
        Ok(envelope)
    }
}
