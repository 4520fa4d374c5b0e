use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Body of `GET /api/data`.
pub const PROTECTED_MESSAGE: &str =
    "This is protected data accessible only to authorized Service Owners!";

/// `GET /api/data`
pub async fn data() -> &'static str {
    PROTECTED_MESSAGE
}

pub fn build_router() -> Router {
    Router::new()
        .route("/api/data", get(data))
        .layer(TraceLayer::new_for_http())
}
