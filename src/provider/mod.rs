// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server public key providers
//!
//! Fetching the server's ECDH public key is the only I/O in the sealing flow,
//! and it happens before sealing starts. [`HttpPublicKeyProvider`] talks to
//! the backend; [`CachedPublicKeyProvider`] keeps the last key until its TTL
//! or its own expiry passes.

pub mod cache;
pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::crypto::ServerPublicKey;

pub use cache::CachedPublicKeyProvider;
pub use http::HttpPublicKeyProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("public key request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("public key endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid public key response: {0}")]
    InvalidResponse(String),

    #[error("invalid provider configuration: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Source of the server's current public key
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PublicKeyProvider: Send + Sync {
    async fn fetch_public_key(&self) -> Result<ServerPublicKey, ProviderError>;
}
