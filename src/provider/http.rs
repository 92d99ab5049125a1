// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP client for the backend public key endpoint

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{debug, info};

use super::{ProviderError, PublicKeyProvider};
use crate::config::ProviderConfig;
use crate::crypto::ServerPublicKey;

const MAX_ERROR_BODY: usize = 512;

/// Fetches `GET {api_url}{public_key_path}`
pub struct HttpPublicKeyProvider {
    client: Client,
    endpoint: url::Url,
    access_token: Option<String>,
}

impl HttpPublicKeyProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let endpoint = config.public_key_url()?;

        info!("Public key provider configured: endpoint={}", endpoint);

        Ok(Self {
            client,
            endpoint,
            access_token: config.access_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &url::Url {
        &self.endpoint
    }
}

#[async_trait]
impl PublicKeyProvider for HttpPublicKeyProvider {
    async fn fetch_public_key(&self) -> Result<ServerPublicKey, ProviderError> {
        let mut request = self
            .client
            .get(self.endpoint.clone())
            .header(header::ACCEPT, "application/json");
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY)
                .collect();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let key: ServerPublicKey = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if key.public_key.trim().is_empty() {
            return Err(ProviderError::InvalidResponse(
                "public_key is empty".to_string(),
            ));
        }

        debug!(
            "Fetched server public key: algorithm={}, expires_at={}",
            key.algorithm,
            key.expires_at.to_rfc3339()
        );
        Ok(key)
    }
}
