use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Host-owned content row. Only the fields the banner needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    /// Set when this row is a stored revision of another post.
    pub revision_of: Option<i64>,
}

impl Post {
    pub fn permalink(&self, site_url: &str) -> String {
        format!("{}/{}", site_url.trim_end_matches('/'), self.slug)
    }
}

/// Breaking-news fields attached to a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BreakingNewsAttrs {
    pub active: bool,
    /// Empty means "use the post's own title".
    pub custom_title: String,
    pub expire_active: bool,
    pub expire_date: Option<DateTime<Utc>>,
}

impl BreakingNewsAttrs {
    /// Active and either non-expiring or expiring strictly after `now`.
    pub fn is_selectable(&self, now: DateTime<Utc>) -> bool {
        self.active
            && (!self.expire_active || self.expire_date.is_some_and(|date| date > now))
    }

    /// Active, expiring, and expired strictly before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expire_active && self.expire_date.is_some_and(|date| date < now)
    }
}

/// A post joined with its breaking-news attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostAttrs {
    pub post: Post,
    pub attrs: BreakingNewsAttrs,
}

impl PostAttrs {
    pub fn display_title(&self) -> &str {
        let custom = self.attrs.custom_title.trim();
        if custom.is_empty() {
            &self.post.title
        } else {
            custom
        }
    }
}

/// Flat row shape returned by the joined attribute queries.
#[derive(Debug, FromRow)]
pub struct PostAttrsRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub revision_of: Option<i64>,
    pub active: bool,
    pub custom_title: String,
    pub expire_active: bool,
    pub expire_date: Option<DateTime<Utc>>,
}

impl From<PostAttrsRow> for PostAttrs {
    fn from(row: PostAttrsRow) -> Self {
        Self {
            post: Post {
                id: row.id,
                title: row.title,
                slug: row.slug,
                revision_of: row.revision_of,
            },
            attrs: BreakingNewsAttrs {
                active: row.active,
                custom_title: row.custom_title,
                expire_active: row.expire_active,
                expire_date: row.expire_date,
            },
        }
    }
}

/// Body for PUT /admin/posts/{id}/breaking-news, as submitted by the editor form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmittedAttrs {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub custom_title: String,
    #[serde(default)]
    pub expire_active: bool,
    /// Free-form date string from the date picker; unparseable means unset.
    #[serde(default)]
    pub expire_date: String,
    #[serde(default)]
    pub autosave: bool,
}

/// Response for GET /admin/posts/{id}/breaking-news.
#[derive(Debug, Serialize)]
pub struct AttrsForm {
    pub post_id: i64,
    pub active: bool,
    pub custom_title: String,
    pub expire_active: bool,
    /// `YYYY-MM-DD HH:MM`, or empty when unset.
    pub expire_date: String,
    /// One-time error notice left by the previous save, if any.
    pub notice: Option<String>,
}

/// Admin summary of the current breaking news post.
#[derive(Debug, Serialize)]
pub struct ActiveSummary {
    pub post_id: i64,
    pub title: String,
    pub edit_link: String,
    pub permalink: String,
    pub custom_title: Option<String>,
    /// Only present while the expiration is honoured.
    pub expire_date: Option<String>,
}

/// Public view of the active post with its rendered banner.
#[derive(Debug, Serialize)]
pub struct ActiveBanner {
    pub post_id: i64,
    pub title: String,
    pub display_title: String,
    pub permalink: String,
    pub html: String,
}

/// Body for POST /render.
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub html: String,
    /// Id of the post the page displays, when it is a single-post page.
    pub current_post_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn post(title: &str, custom_title: &str) -> PostAttrs {
        PostAttrs {
            post: Post {
                id: 1,
                title: title.into(),
                slug: "a-post".into(),
                revision_of: None,
            },
            attrs: BreakingNewsAttrs {
                active: true,
                custom_title: custom_title.into(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn display_title_falls_back_to_native_title() {
        assert_eq!(post("Native", "").display_title(), "Native");
        assert_eq!(post("Native", "   ").display_title(), "Native");
        assert_eq!(post("Native", "X").display_title(), "X");
    }

    #[test]
    fn expiring_without_date_is_not_selectable() {
        let now = Utc::now();
        let attrs = BreakingNewsAttrs {
            active: true,
            expire_active: true,
            expire_date: None,
            ..Default::default()
        };
        assert!(!attrs.is_selectable(now));
        assert!(!attrs.is_expired(now));
    }

    #[test]
    fn boundary_instant_is_neither_selectable_nor_expired() {
        let now = Utc::now();
        let attrs = BreakingNewsAttrs {
            active: true,
            expire_active: true,
            expire_date: Some(now),
            ..Default::default()
        };
        assert!(!attrs.is_selectable(now));
        assert!(!attrs.is_expired(now));
        assert!(attrs.is_expired(now + Duration::seconds(1)));
    }

    #[test]
    fn permalink_joins_site_url_and_slug() {
        assert_eq!(
            post("T", "").post.permalink("https://news.example/"),
            "https://news.example/a-post"
        );
    }
}
