//! Shared helpers for gateway integration tests.
//!
//! Provides an in-process fake chain node answering `eth_call` against an
//! allow-list, plus helpers to run the protected backend on a local port.
#![allow(dead_code, clippy::unwrap_used)] // not every test binary uses every helper

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use chaingate_core::abi;
use chaingate_core::{AccessPolicy, RegistryConfig};

pub const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// How the fake node answers.
#[derive(Debug, Clone, Copy)]
pub enum NodeMode {
    /// Decode the call and answer from the grants.
    Registry,
    /// JSON-RPC error envelope.
    RpcError,
    /// 200 with a body that is not JSON.
    Garbage,
    /// Successful envelope with `"0x"` result.
    EmptyResult,
    /// HTTP 503.
    Unavailable,
    /// Sleep before answering from the grants.
    Stall(Duration),
    /// Answer from the grants under a different request id.
    WrongId,
}

/// A grant: optional path (path-scoped policy) and address word.
type Grant = (Option<String>, [u8; abi::WORD]);

#[derive(Clone)]
struct NodeState {
    mode: NodeMode,
    grants: Arc<HashSet<Grant>>,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Value>>>,
}

/// Fake JSON-RPC node serving a permission registry.
pub struct FakeNode {
    pub url: String,
    state: NodeState,
}

impl FakeNode {
    pub async fn start(mode: NodeMode, grants: &[(Option<&str>, &str)]) -> Self {
        let grants = grants
            .iter()
            .map(|(path, identity)| {
                (
                    path.map(str::to_string),
                    abi::encode_address(identity).unwrap(),
                )
            })
            .collect();
        let state = NodeState {
            mode,
            grants: Arc::new(grants),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let router = Router::new()
            .route("/", post(handle_rpc))
            .with_state(state.clone());
        let addr = serve(router).await;
        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    /// Registry granting identity-level access to `allowed`.
    pub async fn registry(allowed: &[&str]) -> Self {
        let grants: Vec<(Option<&str>, &str)> = allowed.iter().map(|a| (None, *a)).collect();
        Self::start(NodeMode::Registry, &grants).await
    }

    /// Registry granting `(path, identity)` pairs.
    pub async fn path_registry(grants: &[(&str, &str)]) -> Self {
        let grants: Vec<(Option<&str>, &str)> =
            grants.iter().map(|(p, a)| (Some(*p), *a)).collect();
        Self::start(NodeMode::Registry, &grants).await
    }

    pub async fn with_mode(mode: NodeMode) -> Self {
        Self::start(mode, &[]).await
    }

    /// Number of RPC requests received.
    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Raw JSON-RPC requests received, in arrival order.
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn config(&self, policy: AccessPolicy) -> RegistryConfig {
        registry_config(&self.url, policy)
    }
}

pub fn registry_config(rpc_url: &str, policy: AccessPolicy) -> RegistryConfig {
    RegistryConfig {
        rpc_url: rpc_url.to_string(),
        contract_address: CONTRACT.to_string(),
        policy,
        request_timeout_secs: 2,
    }
}

async fn handle_rpc(State(state): State<NodeState>, Json(req): Json<Value>) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().unwrap().push(req.clone());
    let id = req["id"].clone();

    match state.mode {
        NodeMode::RpcError => Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {"code": -32000, "message": "execution reverted"}
        }))
        .into_response(),
        NodeMode::Garbage => (StatusCode::OK, "<html>bad gateway</html>").into_response(),
        NodeMode::EmptyResult => {
            Json(json!({"jsonrpc": "2.0", "id": id, "result": "0x"})).into_response()
        }
        NodeMode::Unavailable => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        NodeMode::WrongId => {
            let other = json!(req["id"].as_u64().unwrap_or(0) + 1000);
            answer(&state, other, &req)
        }
        NodeMode::Stall(delay) => {
            tokio::time::sleep(delay).await;
            answer(&state, id, &req)
        }
        NodeMode::Registry => {
            let data = call_data(&req);
            // Vary latency per address so concurrent replies arrive out of order.
            let jitter = data.get(35).copied().unwrap_or(0) % 8;
            tokio::time::sleep(Duration::from_millis(u64::from(jitter) * 5)).await;
            answer(&state, id, &req)
        }
    }
}

fn call_data(req: &Value) -> Vec<u8> {
    req["params"][0]["data"]
        .as_str()
        .and_then(|d| abi::from_hex_data(d).ok())
        .unwrap_or_default()
}

fn answer(state: &NodeState, id: Value, req: &Value) -> Response {
    let verdict = decide(&state.grants, &call_data(req));
    let mut word = [0u8; abi::WORD];
    word[abi::WORD - 1] = u8::from(verdict);
    Json(json!({"jsonrpc": "2.0", "id": id, "result": abi::to_hex_data(&word)})).into_response()
}

/// Evaluate `hasAccess` / `checkAccessForAddress` call data against grants.
fn decide(grants: &HashSet<Grant>, data: &[u8]) -> bool {
    let Some(selector) = data.get(..4) else {
        return false;
    };
    let word_at = |offset: usize| -> Option<[u8; abi::WORD]> {
        data.get(offset..offset + abi::WORD)?.try_into().ok()
    };

    if selector == abi::selector(abi::HAS_ACCESS_SIGNATURE) {
        return word_at(4).is_some_and(|addr| grants.contains(&(None, addr)));
    }
    if selector == abi::selector(abi::CHECK_ACCESS_FOR_ADDRESS_SIGNATURE) {
        let (Some(addr), Some(len_word)) = (word_at(4 + abi::WORD), word_at(4 + 2 * abi::WORD))
        else {
            return false;
        };
        let Some(len) = word_to_usize(&len_word) else {
            return false;
        };
        let start = 4 + 3 * abi::WORD;
        let Some(path) = start
            .checked_add(len)
            .and_then(|end| data.get(start..end))
            .and_then(|b| std::str::from_utf8(b).ok())
        else {
            return false;
        };
        return grants.contains(&(Some(path.to_string()), addr));
    }
    false
}

/// Big-endian `uint256` word as a `usize`, if it fits.
fn word_to_usize(word: &[u8; abi::WORD]) -> Option<usize> {
    let (high, low) = word.split_at(abi::WORD - 8);
    if high.iter().any(|b| *b != 0) {
        return None;
    }
    usize::try_from(u64::from_be_bytes(low.try_into().ok()?)).ok()
}

/// Serve `router` on an ephemeral localhost port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A localhost URL with nothing listening behind it.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Run the protected backend and return its base URL.
pub async fn spawn_backend() -> String {
    let addr = serve(chaingate_service::routes::build_router()).await;
    format!("http://{addr}")
}
