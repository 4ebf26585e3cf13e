//! Route wiring.

use axum::Router;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/speech", post(handlers::speech::speak))
        .route("/health", get(handlers::health))
        .with_state(state)
}
