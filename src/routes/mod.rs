pub mod admin;
pub mod breaking_news;
pub mod health;
pub mod metrics;
pub mod plugin;
pub mod settings;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{middleware::auth::JwtSecret, AppState};

/// Full HTTP surface: public banner endpoints, admin endpoints, health and metrics.
pub fn router(state: AppState) -> Router {
    let jwt_secret = JwtSecret(state.config.jwt_secret.clone());

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        // Public
        .route("/breaking-news", get(breaking_news::get_breaking_news))
        .route("/breaking-news/banner", get(breaking_news::get_banner))
        .route("/render", post(breaking_news::render_page))
        // Admin
        .route("/admin/breaking-news", get(admin::get_summary))
        .route(
            "/admin/posts/{id}/breaking-news",
            get(admin::get_post_attrs).put(admin::save_post_attrs),
        )
        .route("/admin/settings", get(settings::get_settings).put(settings::update_settings))
        // Lifecycle
        .route("/admin/plugin/activate", post(plugin::activate))
        .route("/admin/plugin/deactivate", post(plugin::deactivate))
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
