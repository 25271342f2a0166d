use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::AttributeStore;
use crate::models::post::{BreakingNewsAttrs, Post, PostAttrs, PostAttrsRow};

/// Transaction-scoped advisory lock held by every breaking news write.
const WRITE_LOCK_KEY: i64 = 0x6272_6b6e_7773;

/// PostgreSQL-backed [`AttributeStore`] over `posts` and `post_breaking_news`.
#[derive(Clone)]
pub struct PgAttributeStore {
    pool: PgPool,
}

impl PgAttributeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Number of stored attribute sets, active or not.
    pub async fn count_attrs(&self) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM post_breaking_news")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl AttributeStore for PgAttributeStore {
    async fn post(&self, post_id: i64) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            "SELECT id, title, slug, revision_of FROM posts WHERE id = $1",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    async fn attrs(&self, post_id: i64) -> anyhow::Result<Option<BreakingNewsAttrs>> {
        let attrs = sqlx::query_as::<_, BreakingNewsAttrs>(
            "SELECT active, custom_title, expire_active, expire_date
             FROM post_breaking_news WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attrs)
    }

    async fn selectable_posts(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<PostAttrs>> {
        let rows = sqlx::query_as::<_, PostAttrsRow>(
            r#"SELECT p.id, p.title, p.slug, p.revision_of,
                      b.active, b.custom_title, b.expire_active, b.expire_date
               FROM post_breaking_news b
               JOIN posts p ON p.id = b.post_id
               WHERE (b.active AND NOT b.expire_active)
                  OR (b.active AND b.expire_active AND b.expire_date > $1)
               ORDER BY p.id"#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PostAttrs::from).collect())
    }

    async fn replace_active(&self, post_id: i64, attrs: &BreakingNewsAttrs) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        // One writer at a time; the clear below must see every committed activation.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(WRITE_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE post_breaking_news SET active = FALSE, updated_at = NOW() WHERE active = TRUE",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"INSERT INTO post_breaking_news
                   (post_id, active, custom_title, expire_active, expire_date)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (post_id) DO UPDATE SET
                   active = EXCLUDED.active,
                   custom_title = EXCLUDED.custom_title,
                   expire_active = EXCLUDED.expire_active,
                   expire_date = EXCLUDED.expire_date,
                   updated_at = NOW()"#,
        )
        .bind(post_id)
        .bind(attrs.active)
        .bind(&attrs.custom_title)
        .bind(attrs.expire_active)
        .bind(attrs.expire_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"UPDATE post_breaking_news
               SET active = FALSE, updated_at = NOW()
               WHERE active = TRUE
                 AND expire_active = TRUE
                 AND expire_date < $1
               RETURNING post_id"#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn purge_attrs(&self) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM post_breaking_news")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
