use axum::{Json, extract::State};
use serde_json::json;

use crate::SharedState;
use crate::error::ApiError;

pub async fn stats(
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let counts = state.maintenance.stats().await?;
    Ok(Json(json!({ "success": true, "data": counts })))
}

pub async fn cleanup(
    State(state): State<SharedState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let report = state.maintenance.cleanup_problematic_jobs().await;
    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Cleaned up {} jobs, validated {} jobs",
            report.cleaned, report.validated
        ),
        "data": report,
    })))
}

pub async fn pause(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, ApiError> {
    state.maintenance.pause().await?;
    Ok(Json(json!({
        "success": true,
        "message": "Queue paused successfully",
    })))
}

pub async fn resume(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, ApiError> {
    state.maintenance.resume().await?;
    Ok(Json(json!({
        "success": true,
        "message": "Queue resumed successfully",
    })))
}
