//! Gating middleware for the protected router.
//!
//! Every request must carry `X-Web3-Address`. Missing identity is a 401,
//! a negative (or failed) registry verdict is a 403, both with empty bodies.
//! Registry failures are indistinguishable from denials.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chaingate_core::Identity;
use tracing::debug;

use crate::registry::AccessDecider;

/// Header carrying the caller identity.
pub const IDENTITY_HEADER: &str = "x-web3-address";

/// Middleware state: the verdict source.
#[derive(Clone)]
pub struct GateState {
    decider: Arc<dyn AccessDecider>,
}

impl GateState {
    pub fn new(decider: Arc<dyn AccessDecider>) -> Self {
        Self { decider }
    }
}

/// First `X-Web3-Address` value, if present, non-empty and visible ASCII.
fn extract_identity(headers: &HeaderMap) -> Option<Identity> {
    headers
        .get(IDENTITY_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(Identity::new)
}

/// Authorize the request against the registry before it reaches `next`.
///
/// Exactly one registry check per request; `next` runs only after a positive
/// verdict and sees the request unmodified.
pub async fn require_access(
    State(gate): State<GateState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(identity) = extract_identity(request.headers()) else {
        debug!(path = %request.uri().path(), "Rejecting request without identity");
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let path = request.uri().path().to_owned();
    if gate.decider.check_access(&identity, &path).await {
        next.run(request).await
    } else {
        debug!(identity = %identity, path = %path, "Access denied");
        StatusCode::FORBIDDEN.into_response()
    }
}
