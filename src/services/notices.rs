use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use uuid::Uuid;

/// Short-lived keyed messages that survive one redirect and are read once.
#[async_trait]
pub trait TransientStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> anyhow::Result<()>;

    /// Return the value and delete it in the same step.
    async fn take(&self, key: &str) -> anyhow::Result<Option<String>>;
}

/// Key of the save-error notice for one post and one editor.
pub fn notice_key(post_id: i64, user_id: Uuid) -> String {
    format!("breakingnews_errors_{post_id}_{user_id}")
}

/// Redis-backed transients: `SETEX` to store, `GETDEL` to consume.
#[derive(Clone)]
pub struct RedisTransients {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisTransients {
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl TransientStore for RedisTransients {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SETEX")
            .arg(key)
            .arg(ttl.as_secs().max(1))
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn take(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GETDEL")
            .arg(key)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }
}

/// In-process transients, used when Redis is not configured and in tests.
#[derive(Default)]
pub struct MemoryTransients {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryTransients {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransientStore for MemoryTransients {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("transient store lock poisoned"))?;
        entries.retain(|_, (_, expires_at)| *expires_at > Instant::now());
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn take(&self, key: &str) -> anyhow::Result<Option<String>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("transient store lock poisoned"))?;
        Ok(entries
            .remove(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(value, _)| value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn take_consumes_the_value() {
        let store = MemoryTransients::new();
        store.set("k", "v", Duration::from_secs(45)).await.unwrap();
        assert_eq!(store.take("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.take("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_value_is_not_returned() {
        let store = MemoryTransients::new();
        store.set("k", "v", Duration::ZERO).await.unwrap();
        assert_eq!(store.take("k").await.unwrap(), None);
    }

    #[test]
    fn notice_key_is_scoped_to_post_and_user() {
        let user = Uuid::nil();
        assert_eq!(
            notice_key(12, user),
            "breakingnews_errors_12_00000000-0000-0000-0000-000000000000"
        );
    }
}
