// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server public key resource
//!
//! The value returned by the backend's public key endpoint:
//!
//! ```json
//! { "public_key": "<base64 SPKI>", "algorithm": "ECDH-P256", "expires_at": "2025-01-01T00:00:00Z" }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ecdh::CurveId;
use super::CryptoError;

/// Server-published ECDH public key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerPublicKey {
    /// base64 SPKI/DER (or SEC1 point)
    pub public_key: String,
    /// Declared algorithm/curve identifier
    pub algorithm: String,
    pub expires_at: DateTime<Utc>,
}

impl ServerPublicKey {
    pub fn new(
        public_key: impl Into<String>,
        algorithm: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            algorithm: algorithm.into(),
            expires_at,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Check the declared algorithm against `curve` and, if `enforce_expiry`
    /// is set, that the key is still valid at `now`.
    ///
    /// # Errors
    ///
    /// `KeyImport`: the caller must fetch a fresh key.
    pub fn validate(
        &self,
        curve: CurveId,
        enforce_expiry: bool,
        now: DateTime<Utc>,
    ) -> Result<(), CryptoError> {
        if !curve.matches_algorithm(&self.algorithm) {
            warn!(
                "Rejected server public key: algorithm '{}' does not match {}",
                self.algorithm, curve
            );
            return Err(CryptoError::key_import(format!(
                "algorithm '{}' does not match expected curve {}",
                self.algorithm, curve
            )));
        }

        if enforce_expiry && self.is_expired_at(now) {
            warn!(
                "Rejected server public key: expired at {}",
                self.expires_at.to_rfc3339()
            );
            return Err(CryptoError::key_import(format!(
                "server public key expired at {}",
                self.expires_at.to_rfc3339()
            )));
        }

        Ok(())
    }
}
