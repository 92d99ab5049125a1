// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caching wrapper around a public key provider
//!
//! Serves the last fetched key until the TTL elapses or the key's own
//! `expires_at` passes. Only the public key is cached; no key material from
//! a sealing call is ever stored here.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{ProviderError, PublicKeyProvider};
use crate::crypto::ServerPublicKey;

struct CachedKey {
    key: ServerPublicKey,
    fetched_at: Instant,
}

pub struct CachedPublicKeyProvider<P> {
    inner: P,
    ttl: Duration,
    cached: RwLock<Option<CachedKey>>,
}

impl<P: PublicKeyProvider> CachedPublicKeyProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: RwLock::new(None),
        }
    }

    /// Drop the cached key, e.g. after the sealer rejected it with `KeyImport`
    pub async fn invalidate(&self) {
        let mut cached = self.cached.write().await;
        if cached.take().is_some() {
            info!("🗑️  Cached server public key invalidated");
        }
    }

    /// Currently cached key, fresh or not
    pub async fn cached(&self) -> Option<ServerPublicKey> {
        self.cached.read().await.as_ref().map(|entry| entry.key.clone())
    }

    fn is_fresh(&self, entry: &CachedKey) -> bool {
        entry.fetched_at.elapsed() < self.ttl && !entry.key.is_expired_at(Utc::now())
    }
}

#[async_trait]
impl<P: PublicKeyProvider> PublicKeyProvider for CachedPublicKeyProvider<P> {
    async fn fetch_public_key(&self) -> Result<ServerPublicKey, ProviderError> {
        {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref().filter(|entry| self.is_fresh(entry)) {
                return Ok(entry.key.clone());
            }
        }

        let mut cached = self.cached.write().await;
        // Another task may have refreshed while we waited for the write lock
        if let Some(entry) = cached.as_ref().filter(|entry| self.is_fresh(entry)) {
            return Ok(entry.key.clone());
        }

        let key = self.inner.fetch_public_key().await?;
        debug!(
            "Server public key cached (ttl: {}s, expires_at: {})",
            self.ttl.as_secs(),
            key.expires_at.to_rfc3339()
        );
        *cached = Some(CachedKey {
            key: key.clone(),
            fetched_at: Instant::now(),
        });
        Ok(key)
    }
}
