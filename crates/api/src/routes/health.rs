use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/api/v1/health", get(health))
}

/// Liveness plus scheduler state; no auth required.
async fn health(State(state): State<AppState>) -> Json<Value> {
    let engine_state = state.engine.state().await;
    let stats = state.engine.stats();
    Json(json!({
        "status": "ok",
        "engine": engine_state.to_string(),
        "markets": state.engine.markets().await,
        "cycles_started": stats.cycles_started,
        "cycles_skipped": stats.cycles_skipped,
    }))
}
