// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Runtime capability check
//!
//! Confirms the RNG, the P-256 group arithmetic and AES-256-GCM all work
//! before any key material is generated.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use p256::{AffinePoint, PublicKey};
use rand::{rngs::OsRng, RngCore};
use tracing::debug;

use super::CryptoError;

// AES-256-GCM, all-zero key and nonce, empty plaintext (GCM spec test case 13)
const GCM_ZERO_TAG: [u8; 16] = [
    0x53, 0x0f, 0x8a, 0xfb, 0xc7, 0x45, 0x36, 0xb9, 0xa9, 0x63, 0xb4, 0xf1, 0xc4, 0xcb, 0x73, 0x8b,
];

/// Verify the environment exposes a working CSPRNG, ECDH on P-256 and AES-GCM
///
/// # Errors
///
/// `UnsupportedEnvironment` naming the first missing primitive.
pub fn check_environment() -> Result<(), CryptoError> {
    let mut probe = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut probe)
        .map_err(|e| unsupported(format!("secure random number generator unavailable: {}", e)))?;
    if probe.iter().all(|b| *b == 0) {
        return Err(unsupported("secure random number generator returned only zeros"));
    }

    PublicKey::from_affine(AffinePoint::GENERATOR)
        .map_err(|e| unsupported(format!("P-256 arithmetic unavailable: {}", e)))?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&[0u8; 32]));
    let tag = cipher
        .encrypt(
            Nonce::from_slice(&[0u8; 12]),
            Payload {
                msg: b"",
                aad: b"",
            },
        )
        .map_err(|e| unsupported(format!("AES-256-GCM unavailable: {}", e)))?;
    if tag.as_slice() != &GCM_ZERO_TAG[..] {
        return Err(unsupported("AES-256-GCM self-test produced a wrong tag"));
    }

    debug!("Capability check passed: OS RNG, P-256 ECDH, AES-256-GCM");
    Ok(())
}

fn unsupported(reason: impl Into<String>) -> CryptoError {
    CryptoError::UnsupportedEnvironment {
        reason: reason.into(),
    }
}
