// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod credentials;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::version;

/// credseal: seal exchange API credentials for the backend
#[derive(Parser, Debug)]
#[command(name = "credseal")]
#[command(version = version::VERSION)]
#[command(about = "Encrypt exchange API credentials with ephemeral ECDH P-256 + AES-256-GCM", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "CREDSEAL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a server key pair for local development and testing
    Keygen(credentials::KeygenArgs),

    /// Encrypt an API key/secret pair into a transport envelope
    Seal(credentials::SealArgs),

    /// Decrypt an envelope with the server private key (diagnostics)
    Open(credentials::OpenArgs),

    /// Check that the required cryptographic primitives are available
    Check,
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Keygen(args) => credentials::keygen(args).await,
        Commands::Seal(args) => credentials::seal(args, &config).await,
        Commands::Open(args) => credentials::open(args, &config).await,
        Commands::Check => credentials::check().await,
    }
}
