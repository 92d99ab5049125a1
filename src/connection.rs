// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Outbound connection request
//!
//! The body posted to the backend when registering an exchange connection:
//! the exchange identifier next to the flattened [`EncryptionEnvelope`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::crypto::EncryptionEnvelope;

/// Supported exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeType {
    Upbit,
    Bithumb,
    Binance,
}

impl ExchangeType {
    pub const ALL: [ExchangeType; 3] = [ExchangeType::Upbit, ExchangeType::Bithumb, ExchangeType::Binance];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeType::Upbit => "upbit",
            ExchangeType::Bithumb => "bithumb",
            ExchangeType::Binance => "binance",
        }
    }
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExchangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|exchange| exchange.as_str() == lowered)
            .ok_or_else(|| {
                format!(
                    "unsupported exchange '{}'; expected one of: upbit, bithumb, binance",
                    s
                )
            })
    }
}

/// Request body for creating (or testing) an exchange connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateConnectionRequest {
    pub exchange: ExchangeType,
    #[serde(flatten)]
    pub envelope: EncryptionEnvelope,
}

impl CreateConnectionRequest {
    pub fn new(exchange: ExchangeType, envelope: EncryptionEnvelope) -> Self {
        Self { exchange, envelope }
    }
}
