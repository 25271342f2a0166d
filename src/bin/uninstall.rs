//! Remove every breaking news setting and per-post attribute from the database.
//! Run once when the feature is being removed for good.
//!
//! Usage: uninstall [--yes]

use std::sync::Arc;

use clap::Parser;

use breaking_news_api::{
    db::{self, PgAttributeStore, PgSettingsStore},
    models::settings,
    services::{
        breaking_news::{BreakingNews, BreakingNewsOptions},
        notices::MemoryTransients,
    },
};

#[derive(Parser)]
#[command(name = "uninstall", about = "Delete all breaking news settings and post attributes")]
struct Args {
    /// Confirm the deletion; without it the command only counts what it would remove
    #[arg(long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable not set"))?;

    let pool = db::create_pool(&database_url).await?;
    let attrs = PgAttributeStore::new(pool.clone());
    let settings_store = PgSettingsStore::new(pool);

    if !args.yes {
        tracing::info!(
            "Dry run: would remove {} setting(s) and {} attribute set(s); pass --yes to delete",
            settings_store.count(&settings::ALL_KEYS).await?,
            attrs.count_attrs().await?
        );
        return Ok(());
    }

    let plugin = BreakingNews::new(
        Arc::new(attrs),
        Arc::new(settings_store),
        Arc::new(MemoryTransients::new()),
        BreakingNewsOptions::default(),
    );

    tracing::info!("Starting breaking news uninstall...");
    plugin.uninstall().await?;
    tracing::info!("Breaking news uninstall completed");

    Ok(())
}
