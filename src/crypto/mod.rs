// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Credential Sealing Module
//!
//! Client-side encryption of an exchange API key/secret pair before either
//! leaves the process:
//!
//! - **ECDH**: Ephemeral-static key exchange using NIST P-256
//! - **Encryption**: AES-256-GCM, one fresh 96-bit nonce per field
//! - **Envelope**: base64 transport structure consumed by the backend
//! - **Capability**: runtime check for RNG, ECDH and AES-GCM support
//!
//! ## Security Considerations
//!
//! - A new ephemeral key pair, and therefore a new AES key, is generated per call
//! - Ephemeral private keys and derived keys are zeroed on drop and never logged
//! - Plaintext secrets never appear in errors or log output
//! - Server keys are validated as curve points before any key material is generated
//!
//! ## Protocol Flow
//!
//! 1. Caller fetches the server's public key (see [`crate::provider`])
//! 2. Client generates an ephemeral P-256 key pair and performs ECDH with it
//! 3. The shared x-coordinate (or HKDF of it) becomes the AES-256 key
//! 4. API key and secret key are encrypted independently with AES-GCM
//! 5. Ciphertexts, nonces and the ephemeral SPKI are sent as the envelope
//! 6. Server performs ECDH with its private key and decrypts both fields

pub mod aes_gcm;
pub mod capability;
pub mod ecdh;
pub mod encoding;
pub mod envelope;
pub mod error;
pub mod opener;
pub mod sealer;
pub mod server_key;

pub use aes_gcm::{
    decrypt_field, encrypt_field, encrypt_with_symmetric_key, generate_nonce, EncryptedField,
    SymmetricCiphertext, NONCE_SIZE, TAG_SIZE,
};
pub use capability::check_environment;
pub use ecdh::{
    derive_symmetric_key, export_public_key, generate_ephemeral_key_pair, import_public_key,
    import_server_public_key, CurveId, EphemeralKeyPair, KeyDerivation, SymmetricKey,
};
pub use envelope::{assemble_envelope, split_iv, EncryptionEnvelope, FieldNonces, IvLayout};
pub use error::{CryptoError, ErrorKind};
pub use opener::{open_envelope, Credentials, OpenOptions, ServerKeyPair};
pub use sealer::{encrypt_credential_pair, CredentialSealer};
pub use server_key::ServerPublicKey;
