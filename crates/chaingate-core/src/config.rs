//! Configuration resolution for ChainGate.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Config file (JSON, passed explicitly)
//! 3. Environment variables
//! 4. CLI arguments (highest priority, applied by the binary)
//!
//! Configuration is read once at startup; nothing here is re-read later.

use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Which registry function decides access.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPolicy {
    /// `hasAccess(address)`: one verdict per identity, path ignored.
    #[default]
    Identity,
    /// `checkAccessForAddress(string,address)`: verdict per (path, identity).
    #[serde(alias = "path-scoped")]
    PathScoped,
}

impl FromStr for AccessPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "identity" => Ok(Self::Identity),
            "path_scoped" | "path-scoped" => Ok(Self::PathScoped),
            other => Err(format!(
                "unknown access policy '{other}' (expected 'identity' or 'path_scoped')"
            )),
        }
    }
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            Self::PathScoped => f.write_str("path_scoped"),
        }
    }
}

/// Complete gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address the gateway listens on.
    pub listen_addr: SocketAddr,
    /// Base URL of the protected backend.
    pub upstream_url: String,
    pub registry: RegistryConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            upstream_url: "http://127.0.0.1:8081".to_string(),
            registry: RegistryConfig::default(),
        }
    }
}

/// Permission-registry connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// JSON-RPC endpoint of the chain node.
    pub rpc_url: String,
    /// Registry contract address (20 bytes, hex).
    pub contract_address: String,
    pub policy: AccessPolicy,
    /// Per-call RPC timeout (seconds). Expiry is a transport error.
    pub request_timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            policy: AccessPolicy::Identity,
            request_timeout_secs: 10,
        }
    }
}

impl GatewayConfig {
    /// Reject settings the gateway cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.upstream_url.trim().is_empty() {
            return Err(Error::Config("upstream_url is empty".into()));
        }
        self.registry.validate()
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(Error::Config("registry.rpc_url is empty".into()));
        }
        if !is_contract_address(&self.contract_address) {
            return Err(Error::Config(format!(
                "registry.contract_address '{}' is not a 20-byte hex address",
                self.contract_address
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "registry.request_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn is_contract_address(text: &str) -> bool {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    digits.len() == 40 && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Load configuration: defaults, then the optional file, then environment.
pub fn load_config(config_file: Option<&Path>) -> Result<GatewayConfig> {
    let mut config = match config_file {
        Some(path) => load_config_file(path)?,
        None => GatewayConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

fn load_config_file(path: &Path) -> Result<GatewayConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply `CHAINGATE_*` environment variables.
pub fn apply_env_overrides(config: &mut GatewayConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary key lookup. Unparseable values are
/// logged and ignored.
pub fn apply_overrides(config: &mut GatewayConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("CHAINGATE_LISTEN_ADDR") {
        match val.parse() {
            Ok(addr) => config.listen_addr = addr,
            Err(e) => warn!(value = %val, error = %e, "Ignoring invalid CHAINGATE_LISTEN_ADDR"),
        }
    }
    if let Some(val) = lookup("CHAINGATE_UPSTREAM_URL") {
        config.upstream_url = val;
    }
    if let Some(val) = lookup("CHAINGATE_RPC_URL") {
        config.registry.rpc_url = val;
    }
    if let Some(val) = lookup("CHAINGATE_CONTRACT_ADDRESS") {
        config.registry.contract_address = val;
    }
    if let Some(val) = lookup("CHAINGATE_POLICY") {
        match val.parse() {
            Ok(policy) => config.registry.policy = policy,
            Err(e) => warn!(value = %val, error = %e, "Ignoring invalid CHAINGATE_POLICY"),
        }
    }
    if let Some(val) = lookup("CHAINGATE_RPC_TIMEOUT_SECS") {
        match val.parse() {
            Ok(secs) => config.registry.request_timeout_secs = secs,
            Err(e) => warn!(value = %val, error = %e, "Ignoring invalid CHAINGATE_RPC_TIMEOUT_SECS"),
        }
    }
}
