use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings for a full node's RPC port.
///
/// Full nodes serve RPC over HTTPS with a self-signed certificate and
/// expect a client certificate, so both are configurable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Base URL, e.g. `https://localhost:8555`.
    pub url: String,
    /// PEM client certificate for mutual TLS.
    pub cert_path: Option<PathBuf>,
    /// PEM private key matching `cert_path`.
    pub key_path: Option<PathBuf>,
    /// Skip server certificate verification.
    pub accept_invalid_certs: bool,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl RpcConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "https://localhost:8555".into(),
            cert_path: None,
            key_path: None,
            accept_invalid_certs: true,
            timeout_secs: 30,
        }
    }
}
