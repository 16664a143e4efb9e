//! Route configuration.

use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::any;
use tower_http::trace::TraceLayer;

/// Create the application router.
///
/// Both endpoints register with `any()`: the handlers gate the verb
/// themselves so that preflight and the 405 path share the per-request
/// CORS decision with every other response.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/v1/gateway", any(handlers::gateway_entry))
        .route("/v1/verify", any(handlers::verify_entry))
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes));

    let router = if state.config.server.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}
