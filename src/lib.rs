// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod config;
pub mod connection;
pub mod crypto;
pub mod provider;
pub mod version;

pub use config::{AppConfig, ProviderConfig, SealerConfig};
pub use connection::{CreateConnectionRequest, ExchangeType};
pub use crypto::{
    encrypt_credential_pair, CredentialSealer, CryptoError, EncryptionEnvelope, ErrorKind,
    ServerPublicKey,
};
pub use provider::{CachedPublicKeyProvider, HttpPublicKeyProvider, PublicKeyProvider};
