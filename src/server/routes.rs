//! Router configuration for the web server.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the router.
///
/// Handlers read the raw request path themselves: submissions take the first
/// segment as the archive, retrievals require exactly `/{archive}/{id}`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::retrieve).post(handlers::submit))
        .route("/*path", get(handlers::retrieve).post(handlers::submit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
