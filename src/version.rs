// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for credential-seal

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-ecdh-p256-aes-gcm-2025-10-13";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-10-13";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "ecdh-p256",
    "ephemeral-key-per-call",
    "aes-256-gcm",
    "spki-public-keys",
    "legacy-iv-layout",
    "compact-iv-layout",
    "hkdf-sha256",
    "server-key-cache",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("credential-seal {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info as JSON
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
