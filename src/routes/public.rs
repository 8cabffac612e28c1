use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers; touches no store.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth
        // Exchanges email and password for an `x-api-token` value.
        .route("/api/auth", post(handlers::authenticate))
}
