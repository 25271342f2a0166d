pub mod config;
pub mod db;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use config::Config;
use services::breaking_news::BreakingNews;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub plugin: Arc<BreakingNews>,
    pub config: Arc<Config>,
}
