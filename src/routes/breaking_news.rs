use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{models::post::RenderRequest, services::hooks::PluginHooks, AppState};

fn internal_error(e: anyhow::Error) -> (StatusCode, Json<Value>) {
    tracing::error!("breaking news request failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}

/// GET /breaking-news — public endpoint, returns the active post and its banner or null.
pub async fn get_breaking_news(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let active = state.plugin.banner(Utc::now()).await.map_err(internal_error)?;
    Ok(Json(json!(active)))
}

/// GET /breaking-news/banner — the banner markup alone, 204 when there is none.
pub async fn get_banner(State(state): State<AppState>) -> Result<Response, (StatusCode, Json<Value>)> {
    let active = state.plugin.banner(Utc::now()).await.map_err(internal_error)?;
    Ok(match active {
        Some(active) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            active.html,
        )
            .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// POST /render — render hook: returns the page with the banner placed once.
pub async fn render_page(
    State(state): State<AppState>,
    Json(body): Json<RenderRequest>,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let injection = state
        .plugin
        .on_request_render(&body.html, body.current_post_id)
        .await
        .map_err(internal_error)?;

    let placement = injection.placement.map(|p| p.as_str()).unwrap_or("none");
    Ok((
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::HeaderName::from_static("x-breaking-news"), placement),
        ],
        injection.html,
    )
        .into_response())
}
