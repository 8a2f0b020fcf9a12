use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Service status plus a liveness check of the inference backend.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let inference = if state.inference.health().await {
        "ok"
    } else {
        "unavailable"
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "tutor-api",
        "inference": inference
    }))
}
