use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{AttributeStore, SettingsStore};
use crate::models::post::{BreakingNewsAttrs, Post, PostAttrs};

#[derive(Default)]
struct State {
    next_id: i64,
    posts: BTreeMap<i64, Post>,
    attrs: BTreeMap<i64, BreakingNewsAttrs>,
    settings: BTreeMap<String, String>,
}

/// In-process store used when no database is configured, and by the tests.
///
/// Each trait method runs under a single lock acquisition, which gives the
/// same all-or-nothing behaviour as the transactional PostgreSQL store.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
    }

    /// Create a post row. Stands in for the host's own post editor.
    pub fn insert_post(&self, title: &str, slug: &str) -> anyhow::Result<Post> {
        self.insert(title, slug, None)
    }

    pub fn insert_revision(&self, of: i64, title: &str) -> anyhow::Result<Post> {
        let slug = format!("{of}-revision-{}", uuid::Uuid::new_v4().simple());
        self.insert(title, &slug, Some(of))
    }

    fn insert(&self, title: &str, slug: &str, revision_of: Option<i64>) -> anyhow::Result<Post> {
        let mut state = self.lock()?;
        state.next_id += 1;
        let post = Post {
            id: state.next_id,
            title: title.to_string(),
            slug: slug.to_string(),
            revision_of,
        };
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    /// Write attributes for one post without touching any other post.
    /// Lets tests reproduce states the write path never produces.
    pub fn put_attrs_unchecked(&self, post_id: i64, attrs: BreakingNewsAttrs) -> anyhow::Result<()> {
        self.lock()?.attrs.insert(post_id, attrs);
        Ok(())
    }

    pub fn active_post_ids(&self) -> anyhow::Result<Vec<i64>> {
        Ok(self
            .lock()?
            .attrs
            .iter()
            .filter(|(_, attrs)| attrs.active)
            .map(|(id, _)| *id)
            .collect())
    }
}

#[async_trait]
impl AttributeStore for MemoryStore {
    async fn post(&self, post_id: i64) -> anyhow::Result<Option<Post>> {
        Ok(self.lock()?.posts.get(&post_id).cloned())
    }

    async fn attrs(&self, post_id: i64) -> anyhow::Result<Option<BreakingNewsAttrs>> {
        Ok(self.lock()?.attrs.get(&post_id).cloned())
    }

    async fn selectable_posts(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<PostAttrs>> {
        let state = self.lock()?;
        Ok(state
            .attrs
            .iter()
            .filter(|(_, attrs)| attrs.is_selectable(now))
            .filter_map(|(id, attrs)| {
                state.posts.get(id).map(|post| PostAttrs {
                    post: post.clone(),
                    attrs: attrs.clone(),
                })
            })
            .collect())
    }

    async fn replace_active(&self, post_id: i64, attrs: &BreakingNewsAttrs) -> anyhow::Result<()> {
        let mut state = self.lock()?;
        if !state.posts.contains_key(&post_id) {
            anyhow::bail!("post {post_id} does not exist");
        }
        for existing in state.attrs.values_mut() {
            existing.active = false;
        }
        state.attrs.insert(post_id, attrs.clone());
        Ok(())
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<i64>> {
        let mut state = self.lock()?;
        let mut changed = Vec::new();
        for (id, attrs) in state.attrs.iter_mut() {
            if attrs.is_expired(now) {
                attrs.active = false;
                changed.push(*id);
            }
        }
        Ok(changed)
    }

    async fn purge_attrs(&self) -> anyhow::Result<u64> {
        let mut state = self.lock()?;
        let count = state.attrs.len() as u64;
        state.attrs.clear();
        Ok(count)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        self.lock().map(|_| ())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, name: &str) -> anyhow::Result<Option<String>> {
        Ok(self.lock()?.settings.get(name).cloned())
    }

    async fn set(&self, name: &str, value: &str) -> anyhow::Result<()> {
        self.lock()?
            .settings
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn add_if_missing(&self, name: &str, value: &str) -> anyhow::Result<bool> {
        let mut state = self.lock()?;
        if state.settings.contains_key(name) {
            return Ok(false);
        }
        state.settings.insert(name.to_string(), value.to_string());
        Ok(true)
    }

    async fn delete(&self, names: &[&str]) -> anyhow::Result<u64> {
        let mut state = self.lock()?;
        Ok(names
            .iter()
            .filter(|name| state.settings.remove(**name).is_some())
            .count() as u64)
    }
}
