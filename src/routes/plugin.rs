use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{
    middleware::super_admin::SuperAdminAuth,
    services::{breaking_news::SWEEP_JOB, hooks::PluginHooks},
    AppState,
};

/// POST /admin/plugin/activate — seed missing settings and schedule the expiry sweep.
pub async fn activate(
    State(state): State<AppState>,
    _auth: SuperAdminAuth,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state.plugin.on_activate().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    Ok(Json(json!({
        "ok": true,
        "sweep_scheduled": state.plugin.scheduler().is_scheduled(SWEEP_JOB),
    })))
}

/// POST /admin/plugin/deactivate — cancel the expiry sweep.
pub async fn deactivate(
    State(state): State<AppState>,
    _auth: SuperAdminAuth,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    state.plugin.on_deactivate().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    Ok(Json(json!({
        "ok": true,
        "sweep_scheduled": state.plugin.scheduler().is_scheduled(SWEEP_JOB),
    })))
}
