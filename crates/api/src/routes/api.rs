use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/signals", get(get_signals))
        .route("/api/v1/positions", get(get_positions))
}

// ─── Signals ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SignalsQuery {
    market: Option<String>,
}

async fn get_signals(
    State(state): State<AppState>,
    Query(q): Query<SignalsQuery>,
) -> (StatusCode, Json<Value>) {
    match q.market.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        Some(market) => match state.engine.latest_signal(market).await {
            Some(signal) => (
                StatusCode::OK,
                Json(json!({ "success": true, "data": signal })),
            ),
            None => {
                debug!(market, "Signal requested for unknown market");
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({
                        "success": false,
                        "message": format!("Market {market} not found"),
                    })),
                )
            }
        },
        None => {
            let signals = state.engine.latest_signals().await;
            let count = signals.len();
            (
                StatusCode::OK,
                Json(json!({ "success": true, "data": signals, "count": count })),
            )
        }
    }
}

// ─── Positions ────────────────────────────────────────────────────────────────

async fn get_positions(State(state): State<AppState>) -> Json<Value> {
    let positions = state.engine.positions().await;
    let count = positions.len();
    Json(json!({ "success": true, "data": positions, "count": count }))
}
