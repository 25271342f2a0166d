use async_trait::async_trait;
use sqlx::PgPool;

use super::SettingsStore;

/// PostgreSQL-backed [`SettingsStore`] over the `settings` table.
#[derive(Clone)]
pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// How many of `names` are currently stored.
    pub async fn count(&self, names: &[&str]) -> anyhow::Result<i64> {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE name = ANY($1)")
            .bind(&names)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn get(&self, name: &str) -> anyhow::Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, name: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"INSERT INTO settings (name, value) VALUES ($1, $2)
               ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()"#,
        )
        .bind(name)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn add_if_missing(&self, name: &str, value: &str) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO settings (name, value) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, names: &[&str]) -> anyhow::Result<u64> {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        let result = sqlx::query("DELETE FROM settings WHERE name = ANY($1)")
            .bind(&names)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
