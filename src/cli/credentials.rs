// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use clap::Args;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::config::AppConfig;
use crate::connection::{CreateConnectionRequest, ExchangeType};
use crate::crypto::{
    check_environment, CredentialSealer, EncryptionEnvelope, ErrorKind, OpenOptions,
    ServerKeyPair,
};
use crate::provider::{CachedPublicKeyProvider, HttpPublicKeyProvider, PublicKeyProvider};
use crate::version;

/// Arguments for keygen command
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Lifetime of the published public key in seconds
    #[arg(long, default_value_t = 3600)]
    pub ttl_secs: i64,

    /// Algorithm identifier to publish with the key
    #[arg(long, default_value = "ECDH-P256")]
    pub algorithm: String,
}

/// Arguments for seal command
#[derive(Args, Debug)]
pub struct SealArgs {
    /// Exchange API key (can also be set via CREDSEAL_API_KEY env var)
    #[arg(long, env = "CREDSEAL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Exchange secret key (can also be set via CREDSEAL_SECRET_KEY env var)
    #[arg(long, env = "CREDSEAL_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// base64 SPKI server public key; fetched from the backend when omitted
    #[arg(long)]
    pub public_key: Option<String>,

    /// Wrap the envelope in a connection request for this exchange
    #[arg(long)]
    pub exchange: Option<ExchangeType>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Arguments for open command
#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Server private key as hex (can also be set via CREDSEAL_PRIVATE_KEY env var)
    #[arg(long, env = "CREDSEAL_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Envelope or connection request JSON file ("-" for stdin)
    #[arg(long, default_value = "-")]
    pub envelope: String,

    /// Print the decrypted values instead of their lengths
    #[arg(long)]
    pub reveal: bool,
}

/// Generate a server key pair
pub async fn keygen(args: KeygenArgs) -> Result<()> {
    if args.ttl_secs <= 0 {
        return Err(anyhow!("--ttl-secs must be positive"));
    }

    let server = ServerKeyPair::generate();
    let expires_at = Utc::now() + Duration::seconds(args.ttl_secs);
    let published = server.server_public_key(&args.algorithm, expires_at)?;

    println!("🔑 Generated P-256 server key pair");
    println!("Private key (hex): {}", server.private_key_hex().as_str());
    println!("Public key (base64 SPKI): {}", published.public_key);
    println!();
    println!("{}", serde_json::to_string_pretty(&published)?);

    Ok(())
}

/// Seal a credential pair and print the envelope
pub async fn seal(args: SealArgs, config: &AppConfig) -> Result<()> {
    let api_key = Zeroizing::new(args.api_key.ok_or_else(|| {
        anyhow!("API key required. Use --api-key or set CREDSEAL_API_KEY env var")
    })?);
    let secret_key = Zeroizing::new(args.secret_key.ok_or_else(|| {
        anyhow!("Secret key required. Use --secret-key or set CREDSEAL_SECRET_KEY env var")
    })?);

    let sealer = CredentialSealer::new(config.sealer.clone());

    let envelope = match args.public_key {
        Some(public_key) => sealer.seal(&api_key, &secret_key, &public_key)?,
        None => {
            let http = HttpPublicKeyProvider::new(&config.provider)?;
            info!("🌐 Fetching server public key from {}", http.endpoint());
            let provider = CachedPublicKeyProvider::new(http, config.provider.cache_ttl());
            seal_with_fetched_key(&sealer, &provider, &api_key, &secret_key).await?
        }
    };

    let output = match args.exchange {
        Some(exchange) => {
            info!("Built connection request for {}", exchange);
            serde_json::to_value(CreateConnectionRequest::new(exchange, envelope))?
        }
        None => serde_json::to_value(envelope)?,
    };

    if args.pretty {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", serde_json::to_string(&output)?);
    }

    Ok(())
}

/// Seal against the provider's current key
///
/// A `KeyImport` rejection (expired key, wrong algorithm, bad point)
/// invalidates the cached key and refetches exactly once; a second
/// rejection is returned to the caller.
pub async fn seal_with_fetched_key<P: PublicKeyProvider>(
    sealer: &CredentialSealer,
    provider: &CachedPublicKeyProvider<P>,
    api_key: &str,
    secret_key: &str,
) -> Result<EncryptionEnvelope> {
    let server_key = provider.fetch_public_key().await?;
    match sealer.seal_for(api_key, secret_key, &server_key) {
        Ok(envelope) => Ok(envelope),
        Err(e) if e.kind() == ErrorKind::KeyImport => {
            warn!("Server key rejected, refetching once: {}", e);
            provider.invalidate().await;
            let server_key = provider.fetch_public_key().await?;
            Ok(sealer.seal_for(api_key, secret_key, &server_key)?)
        }
        Err(e) => Err(e.into()),
    }
}

/// Decrypt an envelope with the server private key
pub async fn open(args: OpenArgs, config: &AppConfig) -> Result<()> {
    let private_key = Zeroizing::new(args.private_key.ok_or_else(|| {
        anyhow!("Private key required. Use --private-key or set CREDSEAL_PRIVATE_KEY env var")
    })?);
    let server = ServerKeyPair::from_hex(&private_key)?;

    let raw = read_input(&args.envelope).await?;
    // Connection requests carry the envelope fields at the top level
    let envelope: EncryptionEnvelope =
        serde_json::from_str(&raw).context("Input is not an envelope JSON document")?;

    let credentials = server.open(&envelope, &OpenOptions::from(&config.sealer))?;

    println!("✅ Envelope decrypted");
    if args.reveal {
        println!("api_key: {}", credentials.api_key);
        println!("secret_key: {}", credentials.secret_key);
    } else {
        println!("api_key: <{} bytes>", credentials.api_key.len());
        println!("secret_key: <{} bytes>", credentials.secret_key.len());
    }

    Ok(())
}

/// Probe the cryptographic primitives the sealer depends on
pub async fn check() -> Result<()> {
    check_environment()?;
    println!("✅ Secure RNG, P-256 ECDH and AES-256-GCM available");
    println!("{}", serde_json::to_string_pretty(&version::get_version_info())?);
    Ok(())
}

async fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read envelope from stdin")?;
        Ok(buf)
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read envelope file {}", source))
    }
}
