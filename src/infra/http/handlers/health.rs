use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde_json::json;

use crate::infra::http::state::AppState;

pub async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, StatusCode> {
    if let Some(db) = &state.db
        && db.health_check().await.is_err()
    {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(json!({ "status": "ok" })))
}
