//! JSON-RPC 2.0 envelopes for `eth_call`.

use serde::{Deserialize, Serialize};

/// Block tag the registry is evaluated at.
pub const LATEST_BLOCK: &str = "latest";

/// Transaction object of a read-only call.
#[derive(Debug, Clone, Serialize)]
pub struct CallObject<'a> {
    pub from: &'a str,
    pub to: &'a str,
    /// `0x`-prefixed call data.
    pub data: String,
}

/// `eth_call` request envelope. `params` serializes as `[call, block]`.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: (CallObject<'a>, &'static str),
}

impl<'a> RpcRequest<'a> {
    pub fn eth_call(id: u64, call: CallObject<'a>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: "eth_call",
            params: (call, LATEST_BLOCK),
        }
    }
}

/// Reply envelope; exactly one of `result`/`error` is expected.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    /// Echo of the request id. Ids are always numeric here.
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// Node-reported error.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}
