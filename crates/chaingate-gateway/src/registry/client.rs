//! Registry client: identity -> `eth_call` -> verdict.
//!
//! One `reqwest::Client` is built at startup and shared by every check; it
//! pools and multiplexes connections, so concurrent callers need no locking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chaingate_core::abi::{self, AbiError};
use chaingate_core::{AccessPolicy, Identity, RegistryConfig};
use reqwest::Url;
use thiserror::Error;
use tracing::{debug, warn};

use super::rpc::{CallObject, RpcRequest, RpcResponse};

/// Registry client errors.
///
/// None of these reach an HTTP caller: [`AccessDecider::check_access`]
/// collapses all of them into a denial.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to encode call data: {0}")]
    Encode(#[from] AbiError),

    #[error("RPC transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC endpoint returned HTTP {0}")]
    HttpStatus(u16),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Malformed RPC reply: {0}")]
    MalformedReply(String),
}

impl RegistryError {
    /// Short label for structured logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Encode(_) => "encode",
            Self::Transport(_) | Self::HttpStatus(_) => "transport",
            Self::Rpc { .. } => "rpc",
            Self::MalformedReply(_) => "malformed_reply",
        }
    }
}

/// A single read-only registry call, built fresh for every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionQuery {
    /// Registry contract.
    pub to: String,
    /// Nominal sender: the caller's own identity.
    pub from: String,
    /// Selector + ABI-encoded arguments.
    pub data: Vec<u8>,
}

/// Source of allow/deny verdicts for the gating middleware.
///
/// Implementations must always return; failures resolve to `false`.
#[async_trait]
pub trait AccessDecider: Send + Sync {
    async fn check_access(&self, identity: &Identity, path: &str) -> bool;
}

/// JSON-RPC client for the permission registry contract.
#[derive(Debug)]
pub struct RegistryClient {
    http: reqwest::Client,
    rpc_url: Url,
    contract_address: String,
    policy: AccessPolicy,
    next_id: AtomicU64,
}

impl RegistryClient {
    /// Build the client and its long-lived HTTP session.
    pub fn new(config: &RegistryConfig) -> Result<Self, RegistryError> {
        config
            .validate()
            .map_err(|e| RegistryError::Config(e.to_string()))?;
        let rpc_url = Url::parse(&config.rpc_url)
            .map_err(|e| RegistryError::Config(format!("invalid rpc_url: {e}")))?;

        // reqwest is built with rustls-no-provider; `Err` means a provider is
        // already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        // Direct connections only; environment proxy settings are ignored.
        let http = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            rpc_url,
            contract_address: config.contract_address.clone(),
            policy: config.policy,
            next_id: AtomicU64::new(1),
        })
    }

    pub const fn policy(&self) -> AccessPolicy {
        self.policy
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    /// Encode the registry call for `identity` (and `path` when path-scoped).
    pub fn build_query(
        &self,
        identity: &Identity,
        path: &str,
    ) -> Result<PermissionQuery, RegistryError> {
        let data = match self.policy {
            AccessPolicy::Identity => abi::encode_has_access(identity)?,
            AccessPolicy::PathScoped => abi::encode_check_access_for_address(path, identity)?,
        };
        Ok(PermissionQuery {
            to: self.contract_address.clone(),
            from: identity.as_str().to_string(),
            data,
        })
    }

    /// Run one registry check, surfacing every failure as an error.
    pub async fn query(&self, identity: &Identity, path: &str) -> Result<bool, RegistryError> {
        let query = self.build_query(identity, path)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::eth_call(
            id,
            CallObject {
                from: &query.from,
                to: &query.to,
                data: abi::to_hex_data(&query.data),
            },
        );

        let resp = self
            .http
            .post(self.rpc_url.clone())
            .json(&request)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RegistryError::HttpStatus(status.as_u16()));
        }
        let body = resp.bytes().await?;
        let reply: RpcResponse = serde_json::from_slice(&body)
            .map_err(|e| RegistryError::MalformedReply(format!("invalid JSON-RPC envelope: {e}")))?;
        check_reply_id(&reply, id)?;
        interpret_reply(reply)
    }
}

/// The reply must answer the request that was sent.
pub(crate) fn check_reply_id(reply: &RpcResponse, expected: u64) -> Result<(), RegistryError> {
    match reply.id {
        Some(id) if id == expected => Ok(()),
        Some(id) => Err(RegistryError::MalformedReply(format!(
            "reply id {id} does not match request id {expected}"
        ))),
        None => Err(RegistryError::MalformedReply("reply has no id".into())),
    }
}

/// Map a JSON-RPC reply onto a verdict.
pub(crate) fn interpret_reply(reply: RpcResponse) -> Result<bool, RegistryError> {
    if let Some(err) = reply.error {
        return Err(RegistryError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    let result = reply
        .result
        .ok_or_else(|| RegistryError::MalformedReply("reply has no result".into()))?;
    let bytes = abi::from_hex_data(&result)
        .map_err(|e| RegistryError::MalformedReply(format!("result is not hex data: {e}")))?;
    abi::decode_bool(&bytes).ok_or_else(|| {
        RegistryError::MalformedReply(format!(
            "expected a {}-byte bool word, got {} bytes",
            abi::WORD,
            bytes.len()
        ))
    })
}

#[async_trait]
impl AccessDecider for RegistryClient {
    async fn check_access(&self, identity: &Identity, path: &str) -> bool {
        match self.query(identity, path).await {
            Ok(verdict) => {
                debug!(identity = %identity, path = %path, verdict, "Registry verdict");
                verdict
            }
            Err(e) => {
                warn!(
                    identity = %identity,
                    path = %path,
                    kind = e.kind(),
                    error = %e,
                    "Registry check failed, denying"
                );
                false
            }
        }
    }
}
