use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /api/health: liveness plus a count of live retro connections.
pub async fn health(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "connected_clients": app.store.connected_clients(),
    }))
}
