// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Base64 transport encoding
//!
//! All transport fields use the standard alphabet with padding, which is what
//! `btoa` produces on the browser side.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::CryptoError;

/// Encode bytes for transport
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

/// Decode a transport field, naming the field in the error
pub fn decode_field(field: &str, value: &str) -> Result<Vec<u8>, CryptoError> {
    if value.is_empty() {
        return Err(CryptoError::invalid_envelope(field, "field is empty"));
    }
    STANDARD
        .decode(value.trim())
        .map_err(|e| CryptoError::invalid_envelope(field, format!("invalid base64: {}", e)))
}

/// Decode a base64 public key; every failure is a key import failure
pub fn decode_public_key(value: &str) -> Result<Vec<u8>, CryptoError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CryptoError::key_import("server public key is empty"));
    }
    STANDARD
        .decode(value)
        .map_err(|e| CryptoError::key_import(format!("server public key is not valid base64: {}", e)))
}
