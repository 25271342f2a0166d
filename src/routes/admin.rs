use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    models::{auth::AuthenticatedUser, post::SubmittedAttrs},
    services::{
        breaking_news::{Editor, SaveError, SaveOutcome},
        hooks::PluginHooks,
    },
    AppState,
};

fn forbidden() -> (StatusCode, Json<Value>) {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "Access denied" })),
    )
}

fn internal_error(e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    tracing::error!("admin request failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}

/// GET /admin/breaking-news — current breaking news post, editors and administrators.
pub async fn get_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if !user.role.can_edit_posts() {
        return Err(forbidden());
    }

    let summary = state
        .plugin
        .summary(Utc::now())
        .await
        .map_err(internal_error)?;
    Ok(Json(json!({ "current": summary })))
}

/// GET /admin/posts/{id}/breaking-news — form data, including a pending save notice.
pub async fn get_post_attrs(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if !user.role.can_edit_posts() {
        return Err(forbidden());
    }

    match state.plugin.attrs_form(post_id, user.user_id).await {
        Ok(Some(form)) => Ok(Json(json!(form))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Post not found" })),
        )),
        Err(e) => Err(internal_error(e)),
    }
}

/// PUT /admin/posts/{id}/breaking-news — editor save.
///
/// Requests without a valid editor token are ignored (204) rather than rejected.
pub async fn save_post_attrs(
    State(state): State<AppState>,
    user: Result<AuthenticatedUser, (StatusCode, &'static str)>,
    Path(post_id): Path<i64>,
    Json(body): Json<SubmittedAttrs>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let editor = user.ok().as_ref().and_then(Editor::authorize);

    match state.plugin.on_save(editor.as_ref(), post_id, body).await {
        Ok(SaveOutcome::Skipped) => Ok(StatusCode::NO_CONTENT.into_response()),
        Ok(SaveOutcome::Saved { attrs, rejected }) => Ok(Json(json!({
            "post_id": post_id,
            "attrs": attrs,
            "notice": rejected.map(|e| e.to_string()),
        }))
        .into_response()),
        Err(SaveError::PostNotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Post not found" })),
        )),
        Err(e) => Err(internal_error(e)),
    }
}
