//! Proxy configuration.
//!
//! Loaded from a JSON file (`config.json` by default). Only `serverUrl` is
//! required; everything else has a default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use audittrail_core::{FeePolicy, Hash256, UnspentOutput};
use serde::{Deserialize, Serialize};

use crate::error::{ProxyError, Result};

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Identifier of the output every fresh installation starts spending.
pub const GENESIS_OUTPUT_ID: Hash256 = Hash256::from_bytes([
    0x9b, 0xb3, 0x73, 0x58, 0xa4, 0x56, 0x0f, 0xd1, 0xd6, 0x36, 0x07, 0xac, 0x20, 0x25, 0xce, 0x85,
    0xf0, 0x8e, 0x73, 0xc5, 0xc5, 0xd9, 0xa3, 0xcd, 0x85, 0x70, 0x6e, 0x48, 0xe7, 0x5f, 0xf9, 0x9f,
]);

/// Value held by the genesis output.
pub const GENESIS_VALUE: i64 = 100_000_000;

/// Proxy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// Base URL of the remote ledger, including the trailing slash.
    #[serde(alias = "ServerUrl")]
    pub server_url: String,

    /// Local HTTP port (default: 8001).
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Directory holding key, nonce, and output files (default: "data").
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Timeout for one forwarding request in seconds (default: 30).
    #[serde(default = "default_forward_timeout")]
    pub forward_timeout_secs: u64,

    /// Fee and payload-value policy.
    #[serde(default)]
    pub fee: FeePolicy,

    /// Output tracked when no output file exists yet.
    #[serde(default = "default_genesis")]
    pub genesis: UnspentOutput,
}

fn default_listen_port() -> u16 {
    8001
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_forward_timeout() -> u64 {
    30
}

fn default_genesis() -> UnspentOutput {
    UnspentOutput::new(GENESIS_OUTPUT_ID, GENESIS_VALUE)
}

impl ProxyConfig {
    /// Configuration with defaults for everything but the remote URL.
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            listen_port: default_listen_port(),
            data_dir: default_data_dir(),
            forward_timeout_secs: default_forward_timeout(),
            fee: FeePolicy::default(),
            genesis: default_genesis(),
        }
    }

    /// Set the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Parse configuration from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let config: Self =
            serde_json::from_slice(bytes).map_err(|e| ProxyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| ProxyError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&bytes)
    }

    /// URL signed transactions are posted to.
    pub fn send_url(&self) -> String {
        format!("{}send", self.server_url)
    }

    /// Forwarding timeout.
    pub fn forward_timeout(&self) -> Duration {
        Duration::from_secs(self.forward_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(ProxyError::Config("serverUrl must not be empty".into()));
        }
        if self.fee.rate_per_byte < 0 || self.fee.payload_output_value < 0 {
            return Err(ProxyError::Config("fee policy values must be non-negative".into()));
        }
        if self.genesis.value < 0 {
            return Err(ProxyError::Config("genesis value must be non-negative".into()));
        }
        Ok(())
    }
}
