// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Envelope assembly
//!
//! Packs the two encrypted fields, their nonces and the ephemeral public key
//! into the JSON body the backend consumes:
//!
//! ```text
//! {
//!   "encrypted_api_key":    base64(ciphertext || tag),
//!   "encrypted_secret_key": base64(ciphertext || tag),
//!   "iv":                   base64(nonces, see IvLayout),
//!   "ephemeral_public_key": base64(SPKI/DER)
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::aes_gcm::{EncryptedField, NONCE_SIZE};
use super::{encoding, CryptoError};

/// Layout of the concatenated nonces in the `iv` transport field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IvLayout {
    /// `reserved || api_key_nonce || secret_key_nonce` (36 bytes). The leading
    /// nonce is random and bound to no ciphertext; existing backends skip it.
    #[default]
    Legacy,
    /// `api_key_nonce || secret_key_nonce` (24 bytes)
    Compact,
}

impl IvLayout {
    /// Decoded length of the `iv` field
    pub fn iv_len(&self) -> usize {
        match self {
            IvLayout::Legacy => 3 * NONCE_SIZE,
            IvLayout::Compact => 2 * NONCE_SIZE,
        }
    }

    fn field_offset(&self) -> usize {
        match self {
            IvLayout::Legacy => NONCE_SIZE,
            IvLayout::Compact => 0,
        }
    }
}

impl fmt::Display for IvLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IvLayout::Legacy => f.write_str("legacy"),
            IvLayout::Compact => f.write_str("compact"),
        }
    }
}

impl FromStr for IvLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "three-nonce" => Ok(IvLayout::Legacy),
            "compact" | "two-nonce" => Ok(IvLayout::Compact),
            other => Err(format!(
                "unknown iv layout '{}'; expected 'legacy' or 'compact'",
                other
            )),
        }
    }
}

/// Transport-ready sealed credential pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionEnvelope {
    pub encrypted_api_key: String,
    pub encrypted_secret_key: String,
    pub iv: String,
    pub ephemeral_public_key: String,
}

/// Nonces recovered from an `iv` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldNonces {
    pub api_key: [u8; NONCE_SIZE],
    pub secret_key: [u8; NONCE_SIZE],
}

/// Build the envelope from the two encrypted fields
///
/// `reserved_nonce` is required for [`IvLayout::Legacy`] and ignored for
/// [`IvLayout::Compact`]; the caller draws it so this stays a pure transformation.
pub fn assemble_envelope(
    api_key: &EncryptedField,
    secret_key: &EncryptedField,
    ephemeral_public_key: &[u8],
    layout: IvLayout,
    reserved_nonce: Option<&[u8; NONCE_SIZE]>,
) -> Result<EncryptionEnvelope, CryptoError> {
    let mut iv = Vec::with_capacity(layout.iv_len());
    if layout == IvLayout::Legacy {
        let reserved = reserved_nonce.ok_or_else(|| {
            CryptoError::invalid_envelope("iv", "legacy layout requires a reserved nonce")
        })?;
        iv.extend_from_slice(reserved);
    }
    iv.extend_from_slice(&api_key.nonce);
    iv.extend_from_slice(&secret_key.nonce);

    Ok(EncryptionEnvelope {
        encrypted_api_key: encoding::encode(&api_key.ciphertext),
        encrypted_secret_key: encoding::encode(&secret_key.ciphertext),
        iv: encoding::encode(&iv),
        ephemeral_public_key: encoding::encode(ephemeral_public_key),
    })
}

/// Split a decoded `iv` field into the two field nonces
pub fn split_iv(iv: &[u8], layout: IvLayout) -> Result<FieldNonces, CryptoError> {
    if iv.len() != layout.iv_len() {
        return Err(CryptoError::invalid_envelope(
            "iv",
            format!(
                "{} layout expects {} bytes, got {}",
                layout,
                layout.iv_len(),
                iv.len()
            ),
        ));
    }

    let offset = layout.field_offset();
    let mut nonces = FieldNonces {
        api_key: [0u8; NONCE_SIZE],
        secret_key: [0u8; NONCE_SIZE],
    };
    nonces
        .api_key
        .copy_from_slice(&iv[offset..offset + NONCE_SIZE]);
    nonces
        .secret_key
        .copy_from_slice(&iv[offset + NONCE_SIZE..offset + 2 * NONCE_SIZE]);
    Ok(nonces)
}
