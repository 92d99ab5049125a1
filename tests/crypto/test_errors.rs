// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Tests
//!
//! Error kinds surfaced by each stage, diagnostic codes, retry
//! classification, and absence of secrets in error output.

use credential_seal::crypto::{
    encrypt_credential_pair, CryptoError, EncryptionEnvelope, ErrorKind, OpenOptions,
    ServerKeyPair,
};
use std::collections::HashSet;

const ALL_KINDS: [ErrorKind; 7] = [
    ErrorKind::UnsupportedEnvironment,
    ErrorKind::KeyImport,
    ErrorKind::KeyGeneration,
    ErrorKind::KeyDerivation,
    ErrorKind::Encryption,
    ErrorKind::Decryption,
    ErrorKind::InvalidEnvelope,
];

#[test]
fn test_error_codes_are_unique() {
    let codes: HashSet<&str> = ALL_KINDS.iter().map(ErrorKind::code).collect();
    assert_eq!(codes.len(), ALL_KINDS.len());
    assert_eq!(ErrorKind::KeyImport.code(), "KEY_IMPORT_ERROR");
}

#[test]
fn test_retry_classification() {
    let generation = CryptoError::KeyGeneration {
        reason: "rng".to_string(),
    };
    let derivation = CryptoError::KeyDerivation {
        operation: "ECDH".to_string(),
        reason: "zero shared secret".to_string(),
    };
    let import = CryptoError::KeyImport {
        reason: "bad point".to_string(),
    };
    let unsupported = CryptoError::UnsupportedEnvironment {
        reason: "no rng".to_string(),
    };

    assert!(generation.is_retryable());
    assert!(derivation.is_retryable());
    assert!(!import.is_retryable(), "key import needs a fresh key, not a retry");
    assert!(!unsupported.is_retryable());
}

#[test]
fn test_display_includes_stage_context() {
    let err = CryptoError::Encryption {
        field: "api_key".to_string(),
        reason: "AEAD failure".to_string(),
    };
    let message = err.to_string();
    assert!(message.contains("api_key"));
    assert!(message.contains("AEAD failure"));
}

#[test]
fn test_user_message_is_opaque_for_every_kind() {
    let errors = [
        CryptoError::UnsupportedEnvironment {
            reason: "x".to_string(),
        },
        CryptoError::KeyImport {
            reason: "x".to_string(),
        },
        CryptoError::Decryption {
            field: "encrypted_api_key".to_string(),
            reason: "x".to_string(),
        },
    ];
    for err in errors {
        assert_eq!(err.user_message(), "encryption failed, please retry");
    }
}

#[test]
fn test_invalid_envelope_names_field() {
    let server = ServerKeyPair::generate();
    let envelope = encrypt_credential_pair(
        "AKIA1234567890",
        "s3cr3tValue!",
        &server.public_key_base64().unwrap(),
    )
    .unwrap();

    let broken = EncryptionEnvelope {
        iv: "***".to_string(),
        ..envelope.clone()
    };
    match server.open(&broken, &OpenOptions::default()).unwrap_err() {
        CryptoError::InvalidEnvelope { field, .. } => assert_eq!(field, "iv"),
        other => panic!("Expected InvalidEnvelope, got {:?}", other),
    }

    let empty = EncryptionEnvelope {
        ephemeral_public_key: String::new(),
        ..envelope
    };
    let err = server.open(&empty, &OpenOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidEnvelope);
}

#[test]
fn test_decryption_error_hides_plaintext() {
    let server = ServerKeyPair::generate();
    let other = ServerKeyPair::generate();
    let envelope = encrypt_credential_pair(
        "AKIA1234567890",
        "s3cr3tValue!",
        &server.public_key_base64().unwrap(),
    )
    .unwrap();

    let err = other.open(&envelope, &OpenOptions::default()).unwrap_err();
    let rendered = format!("{} / {:?}", err, err);
    assert!(!rendered.contains("AKIA1234567890"));
    assert!(!rendered.contains("s3cr3tValue!"));
}

#[test]
fn test_error_converts_to_anyhow() {
    fn seal_with_bad_key() -> anyhow::Result<EncryptionEnvelope> {
        Ok(encrypt_credential_pair("a", "b", "")?)
    }

    let err = seal_with_bad_key().unwrap_err();
    let crypto = err.downcast_ref::<CryptoError>().unwrap();
    assert_eq!(crypto.kind(), ErrorKind::KeyImport);
}
