use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::{
    models::{auth::AuthenticatedUser, settings::UpdateSettingsRequest},
    AppState,
};

/// GET /admin/settings — administrators only
pub async fn get_settings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if !user.role.can_manage_options() {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Access denied" })),
        ));
    }

    state
        .plugin
        .display_settings()
        .await
        .map(|settings| Json(json!(settings)))
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })
}

/// PUT /admin/settings — administrators only
pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if !user.role.can_manage_options() {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Access denied" })),
        ));
    }

    if body.area_title.as_deref().is_some_and(|t| t.chars().count() > 200) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Area title must be at most 200 characters" })),
        ));
    }

    state
        .plugin
        .update_display_settings(body)
        .await
        .map(|settings| Json(json!(settings)))
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })
}
