use chrono::{DateTime, Utc};

use crate::models::post::PostAttrs;

/// Pick the single breaking news post to show at `now`.
///
/// Candidates are active posts that either do not expire or expire strictly
/// after `now`. Expired posts the sweep has not reached yet are filtered here
/// too. Should more than one candidate exist, the lowest post id wins.
pub fn select_active_post(now: DateTime<Utc>, posts: &[PostAttrs]) -> Option<&PostAttrs> {
    posts
        .iter()
        .filter(|candidate| candidate.attrs.is_selectable(now))
        .min_by_key(|candidate| candidate.post.id)
}
