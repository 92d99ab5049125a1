// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECDH Key Exchange Implementation
//!
//! Ephemeral-static Elliptic Curve Diffie-Hellman over NIST P-256. A fresh
//! ephemeral key pair is generated for every sealing call, combined with the
//! server's published public key, and the resulting shared secret becomes a
//! single-use AES-256 key.
//!
//! Public keys travel as SPKI/DER (what Web Crypto's `exportKey('spki')`
//! produces). SEC1 compressed and uncompressed points are accepted on import.

use std::fmt;
use std::str::FromStr;

use hkdf::Hkdf;
use p256::{
    ecdh::diffie_hellman,
    pkcs8::{DecodePublicKey, EncodePublicKey},
    PublicKey, SecretKey,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;
use zeroize::Zeroizing;

use super::CryptoError;

/// AES-256 key size in bytes
pub const SYMMETRIC_KEY_SIZE: usize = 32;

const SCALAR_SIZE: usize = 32;
const KEYGEN_ATTEMPTS: usize = 8;

/// Supported key agreement curves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CurveId {
    #[default]
    #[serde(rename = "P-256", alias = "p256", alias = "secp256r1", alias = "prime256v1")]
    P256,
}

impl CurveId {
    pub fn name(&self) -> &'static str {
        match self {
            CurveId::P256 => "P-256",
        }
    }

    /// Parse a server-declared algorithm identifier such as `ECDH-P256`,
    /// `ECDH_P-256` or `prime256v1`.
    pub fn from_algorithm(algorithm: &str) -> Option<Self> {
        let lowered = algorithm.to_ascii_lowercase().replace("p-256", "p256");
        lowered
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|token| matches!(token, "p256" | "secp256r1" | "prime256v1" | "ecdhp256"))
            .then_some(CurveId::P256)
    }

    pub fn matches_algorithm(&self, algorithm: &str) -> bool {
        Self::from_algorithm(algorithm) == Some(*self)
    }
}

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the ECDH shared secret becomes the AES key
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum KeyDerivation {
    /// The shared x-coordinate is the AES-256 key (Web Crypto `deriveKey` behaviour)
    #[default]
    Raw,
    /// HKDF-SHA256 over the shared x-coordinate
    HkdfSha256 {
        #[serde(default)]
        salt: Option<String>,
        #[serde(default)]
        info: String,
    },
}

impl FromStr for KeyDerivation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(KeyDerivation::Raw),
            "hkdf" | "hkdf-sha256" => Ok(KeyDerivation::HkdfSha256 {
                salt: None,
                info: String::new(),
            }),
            other => Err(format!(
                "unknown key derivation '{}'; expected 'raw' or 'hkdf-sha256'",
                other
            )),
        }
    }
}

/// Single-use AES-256 key, zeroed on drop and never printable
pub struct SymmetricKey(Zeroizing<[u8; SYMMETRIC_KEY_SIZE]>);

impl SymmetricKey {
    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// Ephemeral key pair owned by exactly one sealing call
///
/// Not `Clone`: the private scalar lives in this value only and is zeroed when
/// it is dropped.
pub struct EphemeralKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl EphemeralKeyPair {
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Consume the key pair and derive the symmetric key shared with `peer`
    pub fn into_symmetric_key(
        self,
        peer: &PublicKey,
        kdf: &KeyDerivation,
    ) -> Result<SymmetricKey, CryptoError> {
        derive_symmetric_key(&self.secret, peer, kdf)
    }
}

impl fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public", &self.public)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Import the server's public key
///
/// # Arguments
///
/// * `encoded` - base64-decoded key bytes: SPKI/DER, or a SEC1 point (33 bytes compressed, 65 bytes uncompressed)
/// * `curve` - the curve the key must lie on
///
/// # Errors
///
/// `KeyImport` if the bytes are empty, not a recognised encoding, carry a
/// different curve OID, or do not decode to a valid non-identity point.
pub fn import_server_public_key(encoded: &[u8], curve: CurveId) -> Result<PublicKey, CryptoError> {
    let key = import_public_key(encoded, curve)?;
    debug!("Imported server public key on {} ({} bytes)", curve, encoded.len());
    Ok(key)
}

/// Import any peer public key (SPKI/DER or SEC1) on `curve`
pub fn import_public_key(encoded: &[u8], curve: CurveId) -> Result<PublicKey, CryptoError> {
    if encoded.is_empty() {
        return Err(CryptoError::key_import("public key is empty"));
    }

    match curve {
        CurveId::P256 if looks_like_sec1_point(encoded) => PublicKey::from_sec1_bytes(encoded)
            .map_err(|_| {
                CryptoError::key_import(format!(
                    "{} bytes do not encode a point on {}",
                    encoded.len(),
                    curve
                ))
            }),
        CurveId::P256 => PublicKey::from_public_key_der(encoded).map_err(|e| {
            CryptoError::key_import(format!(
                "not a {} SubjectPublicKeyInfo ({} bytes): {}",
                curve,
                encoded.len(),
                e
            ))
        }),
    }
}

fn looks_like_sec1_point(bytes: &[u8]) -> bool {
    matches!(
        (bytes.len(), bytes[0]),
        (33, 0x02) | (33, 0x03) | (65, 0x04)
    )
}

/// Generate a fresh ephemeral key pair from the operating system RNG
///
/// # Errors
///
/// `KeyGeneration` if the RNG fails or, with negligible probability, no valid
/// scalar is drawn within a bounded number of attempts.
pub fn generate_ephemeral_key_pair(curve: CurveId) -> Result<EphemeralKeyPair, CryptoError> {
    match curve {
        CurveId::P256 => {}
    }

    for _ in 0..KEYGEN_ATTEMPTS {
        let mut candidate = Zeroizing::new([0u8; SCALAR_SIZE]);
        OsRng
            .try_fill_bytes(&mut candidate[..])
            .map_err(|e| CryptoError::KeyGeneration {
                reason: format!("system RNG failure: {}", e),
            })?;

        // Zero and out-of-range scalars are rejected; draw again.
        if let Ok(secret) = SecretKey::from_slice(&candidate[..]) {
            let public = secret.public_key();
            return Ok(EphemeralKeyPair { secret, public });
        }
    }

    Err(CryptoError::KeyGeneration {
        reason: format!("no valid {} scalar after {} attempts", curve, KEYGEN_ATTEMPTS),
    })
}

/// Derive the AES-256 key shared between `private_key` and `peer_public_key`
///
/// Scalar multiplication is constant-time in the private scalar. `peer_public_key`
/// is already a validated curve point (see [`import_server_public_key`]), so
/// the invalid-curve checks happened at import time.
///
/// The same function serves the decoding side with the server's static key.
pub fn derive_symmetric_key(
    private_key: &SecretKey,
    peer_public_key: &PublicKey,
    kdf: &KeyDerivation,
) -> Result<SymmetricKey, CryptoError> {
    let shared = diffie_hellman(private_key.to_nonzero_scalar(), peer_public_key.as_affine());
    let raw = shared.raw_secret_bytes();

    if raw.iter().all(|b| *b == 0) {
        return Err(CryptoError::KeyDerivation {
            operation: "ecdh".to_string(),
            reason: "shared secret is zero".to_string(),
        });
    }

    let mut key = Zeroizing::new([0u8; SYMMETRIC_KEY_SIZE]);
    match kdf {
        KeyDerivation::Raw => key.copy_from_slice(raw.as_slice()),
        KeyDerivation::HkdfSha256 { salt, info } => {
            let hkdf = Hkdf::<Sha256>::new(salt.as_deref().map(str::as_bytes), raw.as_slice());
            hkdf.expand(info.as_bytes(), &mut key[..])
                .map_err(|e| CryptoError::KeyDerivation {
                    operation: "hkdf-sha256".to_string(),
                    reason: e.to_string(),
                })?;
        }
    }

    Ok(SymmetricKey(key))
}

/// Export a public key as SPKI/DER
pub fn export_public_key(public_key: &PublicKey) -> Result<Vec<u8>, CryptoError> {
    public_key
        .to_public_key_der()
        .map(|document| document.as_bytes().to_vec())
        .map_err(|e| CryptoError::KeyGeneration {
            reason: format!("failed to export public key as SPKI: {}", e),
        })
}
