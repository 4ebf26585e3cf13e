//! HTTP request handlers.

pub mod speech;

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::state::AppState;

/// Liveness probe; also reports whether the primary provider is
/// credentialed so dashboards can see degraded (fallback-only) mode.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "primary_available": state.credentials.is_available(),
    }))
}
