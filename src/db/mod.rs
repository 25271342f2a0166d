pub mod memory;
pub mod posts;
pub mod settings;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::models::post::{BreakingNewsAttrs, Post, PostAttrs};

pub use memory::MemoryStore;
pub use posts::PgAttributeStore;
pub use settings::PgSettingsStore;

pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the migrations embedded in ./migrations/
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Per-post breaking-news attribute storage.
///
/// Every mutating method is a single atomic operation against the backend, so
/// the editor write path and the expiry sweep can run concurrently without
/// lost updates.
#[async_trait]
pub trait AttributeStore: Send + Sync {
    async fn post(&self, post_id: i64) -> anyhow::Result<Option<Post>>;

    async fn attrs(&self, post_id: i64) -> anyhow::Result<Option<BreakingNewsAttrs>>;

    /// Posts matching `active AND (NOT expire_active OR expire_date > now)`,
    /// ordered by post id.
    async fn selectable_posts(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<PostAttrs>>;

    /// Clear `active` on every post, then write `attrs` for `post_id`.
    /// Either both happen or neither does.
    async fn replace_active(&self, post_id: i64, attrs: &BreakingNewsAttrs) -> anyhow::Result<()>;

    /// Set `active = false` where `active AND expire_active AND expire_date < now`.
    /// Returns the ids of the posts that changed.
    async fn deactivate_expired(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<i64>>;

    /// Delete every attribute set. Used on uninstall only.
    async fn purge_attrs(&self) -> anyhow::Result<u64>;

    async fn ping(&self) -> anyhow::Result<()>;
}

/// Global named settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, name: &str) -> anyhow::Result<Option<String>>;

    async fn set(&self, name: &str, value: &str) -> anyhow::Result<()>;

    /// Returns false when the setting already existed (value left untouched).
    async fn add_if_missing(&self, name: &str, value: &str) -> anyhow::Result<bool>;

    async fn delete(&self, names: &[&str]) -> anyhow::Result<u64>;
}
