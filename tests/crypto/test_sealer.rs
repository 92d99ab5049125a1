// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Credential Sealing Tests
//!
//! End-to-end properties of `encrypt_credential_pair` / `CredentialSealer`:
//! - Round-trip through the reference decoder
//! - Non-determinism and nonce uniqueness across calls
//! - Tamper detection on every envelope field
//! - Rejection of malformed server keys
//! - Safe concurrent use

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Duration, Utc};
use credential_seal::config::SealerConfig;
use credential_seal::crypto::{
    encrypt_credential_pair, CredentialSealer, EncryptionEnvelope, ErrorKind, IvLayout,
    KeyDerivation, OpenOptions, ServerKeyPair, NONCE_SIZE,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

const API_KEY: &str = "AKIA1234567890";
const SECRET_KEY: &str = "s3cr3tValue!";

fn server_and_key() -> (ServerKeyPair, String) {
    let server = ServerKeyPair::generate();
    let public_key = server.public_key_base64().unwrap();
    (server, public_key)
}

fn flip_bit(value: &str, byte: usize, bit: u8) -> String {
    let mut bytes = STANDARD.decode(value).unwrap();
    bytes[byte] ^= 1 << bit;
    STANDARD.encode(bytes)
}

#[test]
fn test_scenario_roundtrip() {
    let (server, public_key) = server_and_key();

    let envelope = encrypt_credential_pair(API_KEY, SECRET_KEY, &public_key).unwrap();
    for value in [
        &envelope.encrypted_api_key,
        &envelope.encrypted_secret_key,
        &envelope.iv,
        &envelope.ephemeral_public_key,
    ] {
        assert!(!value.is_empty());
        assert!(STANDARD.decode(value).is_ok());
    }

    let credentials = server.open(&envelope, &OpenOptions::default()).unwrap();
    assert_eq!(credentials.api_key, API_KEY);
    assert_eq!(credentials.secret_key, SECRET_KEY);
}

#[test]
fn test_roundtrip_various_plaintexts() {
    let (server, public_key) = server_and_key();
    let long = "k".repeat(4096);

    let cases = [
        ("", ""),
        ("a", "b"),
        ("키-🔑-clé", "秘密/secret+=="),
        (long.as_str(), "short"),
        ("same", "same"),
    ];

    for (api_key, secret_key) in cases {
        let envelope = encrypt_credential_pair(api_key, secret_key, &public_key).unwrap();
        let credentials = server.open(&envelope, &OpenOptions::default()).unwrap();
        assert_eq!(credentials.api_key, api_key);
        assert_eq!(credentials.secret_key, secret_key);
    }
}

#[test]
fn test_roundtrip_with_hkdf_and_compact_layout() {
    let (server, public_key) = server_and_key();
    let config = SealerConfig {
        iv_layout: IvLayout::Compact,
        key_derivation: KeyDerivation::HkdfSha256 {
            salt: Some("connections".to_string()),
            info: "credential-seal v1".to_string(),
        },
        ..SealerConfig::default()
    };
    let sealer = CredentialSealer::new(config.clone());

    let envelope = sealer.seal(API_KEY, SECRET_KEY, &public_key).unwrap();
    let credentials = server.open(&envelope, &OpenOptions::from(&config)).unwrap();
    assert_eq!(credentials.api_key, API_KEY);

    // Decoder with the default (raw) derivation cannot open it
    let mismatched = OpenOptions {
        iv_layout: IvLayout::Compact,
        ..OpenOptions::default()
    };
    let err = server.open(&envelope, &mismatched).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decryption);
}

#[test]
fn test_encryption_is_non_deterministic() {
    let (_server, public_key) = server_and_key();

    let a = encrypt_credential_pair(API_KEY, SECRET_KEY, &public_key).unwrap();
    let b = encrypt_credential_pair(API_KEY, SECRET_KEY, &public_key).unwrap();

    assert_ne!(a, b);
    assert_ne!(a.ephemeral_public_key, b.ephemeral_public_key);
    assert_ne!(a.iv, b.iv);
    assert_ne!(a.encrypted_api_key, b.encrypted_api_key);
    assert_ne!(a.encrypted_secret_key, b.encrypted_secret_key);
}

fn assert_unique_ephemeral_nonce_pairs(iterations: usize) {
    let (_server, public_key) = server_and_key();
    let mut seen = HashSet::with_capacity(iterations * 2);

    for _ in 0..iterations {
        let envelope = encrypt_credential_pair(API_KEY, SECRET_KEY, &public_key).unwrap();
        let iv = STANDARD.decode(&envelope.iv).unwrap();
        let api_nonce = iv[NONCE_SIZE..2 * NONCE_SIZE].to_vec();
        let secret_nonce = iv[2 * NONCE_SIZE..].to_vec();

        assert!(seen.insert((envelope.ephemeral_public_key.clone(), api_nonce)));
        assert!(seen.insert((envelope.ephemeral_public_key, secret_nonce)));
    }
}

#[test]
fn test_ephemeral_nonce_pairs_unique() {
    assert_unique_ephemeral_nonce_pairs(500);
}

#[test]
#[ignore] // ~10k ECDH operations; run with --ignored
fn test_ephemeral_nonce_pairs_unique_10k() {
    assert_unique_ephemeral_nonce_pairs(10_000);
}

#[test]
fn test_tampered_ciphertexts_rejected() {
    let (server, public_key) = server_and_key();
    let envelope = encrypt_credential_pair(API_KEY, SECRET_KEY, &public_key).unwrap();
    let api_len = STANDARD.decode(&envelope.encrypted_api_key).unwrap().len();
    let secret_len = STANDARD.decode(&envelope.encrypted_secret_key).unwrap().len();

    for byte in 0..api_len {
        let tampered = EncryptionEnvelope {
            encrypted_api_key: flip_bit(&envelope.encrypted_api_key, byte, (byte % 8) as u8),
            ..envelope.clone()
        };
        let err = server.open(&tampered, &OpenOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decryption);
    }

    for byte in 0..secret_len {
        let tampered = EncryptionEnvelope {
            encrypted_secret_key: flip_bit(&envelope.encrypted_secret_key, byte, (byte % 8) as u8),
            ..envelope.clone()
        };
        let err = server.open(&tampered, &OpenOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decryption);
    }
}

#[test]
fn test_tampered_field_nonces_rejected() {
    let (server, public_key) = server_and_key();
    let envelope = encrypt_credential_pair(API_KEY, SECRET_KEY, &public_key).unwrap();

    // Bytes 12..36 hold the two nonces bound to ciphertexts
    for byte in NONCE_SIZE..3 * NONCE_SIZE {
        for bit in 0..8 {
            let tampered = EncryptionEnvelope {
                iv: flip_bit(&envelope.iv, byte, bit),
                ..envelope.clone()
            };
            let err = server.open(&tampered, &OpenOptions::default()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Decryption);
        }
    }
}

#[test]
fn test_reserved_nonce_is_not_bound() {
    let (server, public_key) = server_and_key();
    let envelope = encrypt_credential_pair(API_KEY, SECRET_KEY, &public_key).unwrap();

    let tampered = EncryptionEnvelope {
        iv: flip_bit(&envelope.iv, 0, 0),
        ..envelope.clone()
    };
    let credentials = server.open(&tampered, &OpenOptions::default()).unwrap();
    assert_eq!(credentials.api_key, API_KEY);
}

#[test]
fn test_tampered_ephemeral_key_rejected() {
    let (server, public_key) = server_and_key();
    let envelope = encrypt_credential_pair(API_KEY, SECRET_KEY, &public_key).unwrap();
    let key_len = STANDARD.decode(&envelope.ephemeral_public_key).unwrap().len();

    for byte in 0..key_len {
        let tampered = EncryptionEnvelope {
            ephemeral_public_key: flip_bit(&envelope.ephemeral_public_key, byte, 0),
            ..envelope.clone()
        };
        let err = server.open(&tampered, &OpenOptions::default()).unwrap_err();
        assert!(
            matches!(err.kind(), ErrorKind::InvalidEnvelope | ErrorKind::Decryption),
            "byte {}: unexpected {:?}",
            byte,
            err
        );
    }
}

#[test]
fn test_wrong_server_key_cannot_open() {
    let (_server, public_key) = server_and_key();
    let other = ServerKeyPair::generate();

    let envelope = encrypt_credential_pair(API_KEY, SECRET_KEY, &public_key).unwrap();
    let err = other.open(&envelope, &OpenOptions::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decryption);
}

#[test]
fn test_truncated_server_key_rejected() {
    let server = ServerKeyPair::generate();
    let mut spki = STANDARD.decode(server.public_key_base64().unwrap()).unwrap();
    spki.pop();

    let err = encrypt_credential_pair(API_KEY, SECRET_KEY, &STANDARD.encode(&spki)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyImport);
}

#[test]
fn test_invalid_server_keys_rejected() {
    let not_a_point = STANDARD.encode([0x04u8; 65]);
    let inputs = [
        "",
        "   ",
        "not base64!!",
        "QUJD", // "ABC"
        not_a_point.as_str(),
    ];

    for input in inputs {
        let err = encrypt_credential_pair(API_KEY, SECRET_KEY, input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeyImport, "input {:?}", input);
        assert!(!err.is_retryable());
    }
}

#[test]
fn test_errors_never_contain_plaintext() {
    let err = encrypt_credential_pair(API_KEY, SECRET_KEY, "QUJD").unwrap_err();
    let rendered = format!("{} {:?}", err, err);
    assert!(!rendered.contains(API_KEY));
    assert!(!rendered.contains(SECRET_KEY));
    assert_eq!(err.user_message(), "encryption failed, please retry");
}

#[test]
fn test_seal_for_validates_server_key() {
    let server = ServerKeyPair::generate();
    let sealer = CredentialSealer::default();

    let valid = server
        .server_public_key("ECDH-P256", Utc::now() + Duration::minutes(30))
        .unwrap();
    let envelope = sealer.seal_for(API_KEY, SECRET_KEY, &valid).unwrap();
    assert_eq!(
        server.open(&envelope, &OpenOptions::default()).unwrap().secret_key,
        SECRET_KEY
    );

    let wrong_curve = server
        .server_public_key("ECDH-secp256k1", Utc::now() + Duration::minutes(30))
        .unwrap();
    let err = sealer.seal_for(API_KEY, SECRET_KEY, &wrong_curve).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyImport);

    let expired = server
        .server_public_key("ECDH-P256", Utc::now() - Duration::seconds(1))
        .unwrap();
    let err = sealer.seal_for(API_KEY, SECRET_KEY, &expired).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyImport);
}

#[test]
fn test_expiry_enforcement_can_be_disabled() {
    let server = ServerKeyPair::generate();
    let sealer = CredentialSealer::new(SealerConfig {
        enforce_key_expiry: false,
        ..SealerConfig::default()
    });

    let expired = server
        .server_public_key("P-256", Utc::now() - Duration::hours(1))
        .unwrap();
    assert!(sealer.seal_for(API_KEY, SECRET_KEY, &expired).is_ok());
}

#[test]
fn test_concurrent_sealing() {
    let (server, public_key) = server_and_key();
    let public_key = Arc::new(public_key);
    let sealer = Arc::new(CredentialSealer::default());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let public_key = public_key.clone();
            let sealer = sealer.clone();
            thread::spawn(move || {
                (0..10)
                    .map(|j| {
                        let api_key = format!("api-{}-{}", i, j);
                        let envelope = sealer.seal(&api_key, SECRET_KEY, &public_key).unwrap();
                        (api_key, envelope)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ephemeral_keys = HashSet::new();
    for handle in handles {
        for (api_key, envelope) in handle.join().unwrap() {
            assert!(ephemeral_keys.insert(envelope.ephemeral_public_key.clone()));
            let credentials = server.open(&envelope, &OpenOptions::default()).unwrap();
            assert_eq!(credentials.api_key, api_key);
        }
    }
    assert_eq!(ephemeral_keys.len(), 80);
}
