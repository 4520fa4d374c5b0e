//! Router assembly.

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn_with_state;
use tower_http::trace::TraceLayer;

use crate::filter::{GateState, require_access};
use crate::proxy::{self, Upstream};
use crate::registry::AccessDecider;

/// Put `router` behind the registry gate.
///
/// The gate is the outermost layer of `router`: it runs for every route and
/// the fallback, before any handler or inner layer.
pub fn gate<S>(router: Router<S>, decider: Arc<dyn AccessDecider>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(GateState::new(decider), require_access))
}

/// Gateway router: every request is gated, then proxied to `upstream`.
pub fn build_router(decider: Arc<dyn AccessDecider>, upstream: Upstream) -> Router {
    let proxied = Router::new()
        .fallback(proxy::forward)
        .with_state(upstream);
    gate(proxied, decider).layer(TraceLayer::new_for_http())
}
