use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use breaking_news_api::{
    config::Config,
    db::{self, AttributeStore, MemoryStore, PgAttributeStore, PgSettingsStore, SettingsStore},
    routes,
    services::{
        breaking_news::{BreakingNews, BreakingNewsOptions},
        hooks::PluginHooks,
        notices::{MemoryTransients, RedisTransients, TransientStore},
    },
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let config = Arc::new(config);

    let (attrs, settings): (Arc<dyn AttributeStore>, Arc<dyn SettingsStore>) =
        match &config.database_url {
            Some(url) => {
                let pool = db::create_pool(url).await?;
                db::run_migrations(&pool).await?;
                info!("Database connected and migrations applied");
                let attrs: Arc<dyn AttributeStore> = Arc::new(PgAttributeStore::new(pool.clone()));
                let settings: Arc<dyn SettingsStore> = Arc::new(PgSettingsStore::new(pool));
                (attrs, settings)
            }
            None => {
                warn!("DATABASE_URL not set — using the in-memory store, data is lost on exit");
                let store = Arc::new(MemoryStore::new());
                let attrs: Arc<dyn AttributeStore> = store.clone();
                let settings: Arc<dyn SettingsStore> = store;
                (attrs, settings)
            }
        };

    let transients: Arc<dyn TransientStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            let conn = client.get_multiplexed_async_connection().await?;
            info!("Redis connected");
            Arc::new(RedisTransients::new(conn))
        }
        None => {
            warn!("REDIS_URL not set — save notices are kept in memory");
            Arc::new(MemoryTransients::new())
        }
    };

    let plugin = BreakingNews::new(
        attrs,
        settings,
        transients,
        BreakingNewsOptions::from(config.as_ref()),
    );

    // Seeds missing settings and schedules the expiry sweep if it is not running.
    plugin.on_activate().await?;

    let state = AppState {
        plugin: plugin.clone(),
        config: config.clone(),
    };
    let app = routes::router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Breaking news API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    plugin.on_deactivate().await?;
    info!("Expiry sweep stopped, bye");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
