use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::Config,
    db::{AttributeStore, SettingsStore},
    models::{
        auth::AuthenticatedUser,
        post::{ActiveBanner, ActiveSummary, AttrsForm, BreakingNewsAttrs, PostAttrs, SubmittedAttrs},
        settings::{self, DisplaySettings, UpdateSettingsRequest},
    },
    services::{
        banner::{self, Injection},
        hooks::PluginHooks,
        metrics::{SAVES_COUNTER, SWEEP_DEACTIVATED_COUNTER, SWEEP_RUNS_COUNTER},
        notices::{notice_key, TransientStore},
        scheduler::{RecurringJob, Scheduler},
        selector::select_active_post,
    },
};

/// Name of the recurring expiry sweep.
pub const SWEEP_JOB: &str = "breakingnews_deactivate_expired";

/// Date format the admin date picker reads and writes.
const FORM_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Breaking news expiration date field is incorrect. Please choose a future date.")]
    ExpirationNotInFuture,
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("post {0} not found")]
    PostNotFound(i64),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Unauthorized caller, autosave or revision: nothing written.
    Skipped,
    Saved {
        attrs: BreakingNewsAttrs,
        /// Set when the expiration was rejected and forced off.
        rejected: Option<ValidationError>,
    },
}

/// A caller already checked for permission to edit posts.
#[derive(Debug, Clone, Copy)]
pub struct Editor {
    pub user_id: Uuid,
}

impl Editor {
    pub fn authorize(user: &AuthenticatedUser) -> Option<Self> {
        user.role.can_edit_posts().then_some(Editor {
            user_id: user.user_id,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BreakingNewsOptions {
    pub site_url: String,
    pub sweep_interval: Duration,
    pub notice_ttl: Duration,
}

impl From<&Config> for BreakingNewsOptions {
    fn from(config: &Config) -> Self {
        Self {
            site_url: config.site_url.clone(),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs.max(1)),
            notice_ttl: Duration::from_secs(config.notice_ttl_secs),
        }
    }
}

impl Default for BreakingNewsOptions {
    fn default() -> Self {
        Self {
            site_url: "http://localhost".into(),
            sweep_interval: Duration::from_secs(5),
            notice_ttl: Duration::from_secs(45),
        }
    }
}

/// Parse the editor's free-form expiration date. Anything unrecognised is unset.
///
/// Accepts RFC 3339 and `YYYY-MM-DD[( |T)HH:MM[:SS]]`; naive values are UTC.
pub fn parse_expire_date(raw: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];

    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Deactivate every post whose expiration passed before `now`.
pub async fn sweep_expired(store: &dyn AttributeStore, now: DateTime<Utc>) -> anyhow::Result<u64> {
    let ids = store.deactivate_expired(now).await?;
    if !ids.is_empty() {
        info!("Expiry sweep: deactivated post(s) {:?}", ids);
    }
    Ok(ids.len() as u64)
}

/// The recurring job registered with the [`Scheduler`]. Each tick goes
/// through [`PluginHooks::on_tick`]; the job stops doing work once the
/// service is gone.
pub struct ExpirySweep {
    hooks: Weak<dyn PluginHooks>,
}

#[async_trait]
impl RecurringJob for ExpirySweep {
    fn name(&self) -> &'static str {
        SWEEP_JOB
    }

    async fn run(&self) {
        let Some(hooks) = self.hooks.upgrade() else {
            return;
        };
        match hooks.on_tick().await {
            Ok(count) => {
                SWEEP_RUNS_COUNTER.with_label_values(&["ok"]).inc();
                SWEEP_DEACTIVATED_COUNTER.inc_by(count as f64);
            }
            Err(e) => {
                SWEEP_RUNS_COUNTER.with_label_values(&["error"]).inc();
                warn!("Expiry sweep failed, retrying next tick: {}", e);
            }
        }
    }
}

/// Breaking news selection, editing, expiry and rendering over the host stores.
pub struct BreakingNews {
    me: Weak<BreakingNews>,
    attrs: Arc<dyn AttributeStore>,
    settings: Arc<dyn SettingsStore>,
    transients: Arc<dyn TransientStore>,
    scheduler: Scheduler,
    options: BreakingNewsOptions,
}

impl BreakingNews {
    pub fn new(
        attrs: Arc<dyn AttributeStore>,
        settings: Arc<dyn SettingsStore>,
        transients: Arc<dyn TransientStore>,
        options: BreakingNewsOptions,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            attrs,
            settings,
            transients,
            scheduler: Scheduler::new(),
            options,
        })
    }

    pub fn store(&self) -> &dyn AttributeStore {
        self.attrs.as_ref()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The breaking news post to show at `now`, if any.
    pub async fn active_post(&self, now: DateTime<Utc>) -> anyhow::Result<Option<PostAttrs>> {
        let candidates = self.attrs.selectable_posts(now).await?;
        Ok(select_active_post(now, &candidates).cloned())
    }

    /// Editor write path.
    ///
    /// Clearing `active` on every other post and writing this post happen in
    /// one storage operation. A requested expiration that is unset or not in
    /// the future is forced off and leaves a one-time notice for the editor;
    /// the remaining fields are still saved.
    pub async fn save_post_attrs(
        &self,
        editor: Option<&Editor>,
        post_id: i64,
        submitted: SubmittedAttrs,
        now: DateTime<Utc>,
    ) -> Result<SaveOutcome, SaveError> {
        let Some(editor) = editor else {
            debug!("Ignoring breaking news save for post {post_id}: not authorized");
            SAVES_COUNTER.with_label_values(&["skipped"]).inc();
            return Ok(SaveOutcome::Skipped);
        };
        if submitted.autosave {
            SAVES_COUNTER.with_label_values(&["skipped"]).inc();
            return Ok(SaveOutcome::Skipped);
        }

        let post = self
            .attrs
            .post(post_id)
            .await?
            .ok_or(SaveError::PostNotFound(post_id))?;
        if post.revision_of.is_some() {
            SAVES_COUNTER.with_label_values(&["skipped"]).inc();
            return Ok(SaveOutcome::Skipped);
        }

        let expire_date = parse_expire_date(&submitted.expire_date);
        let rejected = (submitted.expire_active && !expire_date.is_some_and(|date| date > now))
            .then_some(ValidationError::ExpirationNotInFuture);

        let attrs = BreakingNewsAttrs {
            active: submitted.active,
            custom_title: submitted.custom_title,
            expire_active: submitted.expire_active && rejected.is_none(),
            expire_date,
        };
        self.attrs.replace_active(post_id, &attrs).await?;

        match &rejected {
            Some(err) => {
                SAVES_COUNTER.with_label_values(&["rejected_expiration"]).inc();
                let key = notice_key(post_id, editor.user_id);
                if let Err(e) = self
                    .transients
                    .set(&key, &err.to_string(), self.options.notice_ttl)
                    .await
                {
                    warn!("Failed to store save notice {key}: {e}");
                }
            }
            None => SAVES_COUNTER.with_label_values(&["saved"]).inc(),
        }

        info!(
            "Breaking news saved for post {} by {} (active: {}, expiring: {})",
            post_id, editor.user_id, attrs.active, attrs.expire_active
        );
        Ok(SaveOutcome::Saved { attrs, rejected })
    }

    pub async fn sweep(&self, now: DateTime<Utc>) -> anyhow::Result<u64> {
        sweep_expired(self.attrs.as_ref(), now).await
    }

    /// Form data for one post, consuming any pending notice for `user_id`.
    pub async fn attrs_form(&self, post_id: i64, user_id: Uuid) -> anyhow::Result<Option<AttrsForm>> {
        if self.attrs.post(post_id).await?.is_none() {
            return Ok(None);
        }
        let attrs = self.attrs.attrs(post_id).await?.unwrap_or_default();
        let notice = self.transients.take(&notice_key(post_id, user_id)).await?;

        Ok(Some(AttrsForm {
            post_id,
            active: attrs.active,
            custom_title: attrs.custom_title,
            expire_active: attrs.expire_active,
            expire_date: attrs
                .expire_date
                .map(|date| date.format(FORM_DATE_FORMAT).to_string())
                .unwrap_or_default(),
            notice,
        }))
    }

    /// Admin view of the current breaking news post.
    pub async fn summary(&self, now: DateTime<Utc>) -> anyhow::Result<Option<ActiveSummary>> {
        let Some(selected) = self.active_post(now).await? else {
            return Ok(None);
        };
        let custom_title = selected.attrs.custom_title.trim();

        Ok(Some(ActiveSummary {
            post_id: selected.post.id,
            title: selected.post.title.clone(),
            edit_link: format!("/admin/posts/{}/breaking-news", selected.post.id),
            permalink: selected.post.permalink(&self.options.site_url),
            custom_title: (!custom_title.is_empty()).then(|| custom_title.to_string()),
            expire_date: selected
                .attrs
                .expire_date
                .filter(|_| selected.attrs.expire_active)
                .map(|date| date.format(FORM_DATE_FORMAT).to_string()),
        }))
    }

    /// Stored display settings; missing values fall back to the defaults.
    pub async fn display_settings(&self) -> anyhow::Result<DisplaySettings> {
        let defaults = DisplaySettings::default();
        let autoinsert = match self.settings.get(settings::AUTOINSERT).await? {
            Some(value) => matches!(value.trim(), "1" | "true" | "on" | "yes"),
            None => defaults.autoinsert,
        };

        Ok(DisplaySettings {
            area_title: self
                .settings
                .get(settings::AREA_TITLE)
                .await?
                .unwrap_or(defaults.area_title),
            text_color: self
                .settings
                .get(settings::TEXT_COLOR)
                .await?
                .unwrap_or(defaults.text_color),
            bg_color: self
                .settings
                .get(settings::BG_COLOR)
                .await?
                .unwrap_or(defaults.bg_color),
            autoinsert,
        })
    }

    pub async fn update_display_settings(
        &self,
        req: UpdateSettingsRequest,
    ) -> anyhow::Result<DisplaySettings> {
        let updated = req.apply(self.display_settings().await?);
        for (name, value) in updated.to_pairs() {
            self.settings.set(name, &value).await?;
        }
        info!("Breaking news display settings updated");
        Ok(updated)
    }

    /// The active post with its banner markup.
    pub async fn banner(&self, now: DateTime<Utc>) -> anyhow::Result<Option<ActiveBanner>> {
        let Some(selected) = self.active_post(now).await? else {
            return Ok(None);
        };
        let settings = self.display_settings().await?;
        let permalink = selected.post.permalink(&self.options.site_url);
        let html = banner::render_banner(&settings, &selected, &permalink);

        Ok(Some(ActiveBanner {
            post_id: selected.post.id,
            title: selected.post.title.clone(),
            display_title: selected.display_title().to_string(),
            permalink,
            html,
        }))
    }

    /// Place the banner into a rendered page. Pages of the breaking post
    /// itself never get the banner.
    pub async fn render_page(
        &self,
        page: &str,
        current_post_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Injection> {
        let active = self
            .banner(now)
            .await?
            .filter(|active| Some(active.post_id) != current_post_id);
        let autoinsert = match &active {
            Some(_) => self.display_settings().await?.autoinsert,
            None => false,
        };
        Ok(banner::inject(
            page,
            active.as_ref().map(|a| a.html.as_str()),
            autoinsert,
        ))
    }

    /// Seed missing settings and make sure the expiry sweep is running.
    /// Safe to call on every start.
    pub async fn activate(&self) -> anyhow::Result<()> {
        for (name, value) in DisplaySettings::default().to_pairs() {
            if self.settings.add_if_missing(name, &value).await? {
                info!("Seeded default setting {name}");
            }
        }
        let hooks: Weak<dyn PluginHooks> = self.me.clone();
        let job = Arc::new(ExpirySweep { hooks });
        self.scheduler.schedule(job, self.options.sweep_interval);
        Ok(())
    }

    pub fn deactivate(&self) {
        if !self.scheduler.unschedule(SWEEP_JOB) {
            debug!("Expiry sweep was not scheduled");
        }
    }

    /// Remove every trace of breaking news: settings and all per-post attributes.
    pub async fn uninstall(&self) -> anyhow::Result<()> {
        self.deactivate();
        let settings_removed = self.settings.delete(&settings::ALL_KEYS).await?;
        let attrs_removed = self.attrs.purge_attrs().await?;
        info!(
            "Uninstalled breaking news: {} setting(s), {} attribute set(s) removed",
            settings_removed, attrs_removed
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::MemoryStore, services::notices::MemoryTransients};
    use chrono::Duration as ChronoDuration;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: Arc<BreakingNews>,
        editor: Editor,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let service = BreakingNews::new(
            store.clone(),
            store.clone(),
            Arc::new(MemoryTransients::new()),
            BreakingNewsOptions {
                site_url: "https://news.example".into(),
                ..Default::default()
            },
        );
        Fixture {
            store,
            service,
            editor: Editor {
                user_id: Uuid::new_v4(),
            },
        }
    }

    fn submit(active: bool, expire_active: bool, expire_date: &str) -> SubmittedAttrs {
        SubmittedAttrs {
            active,
            expire_active,
            expire_date: expire_date.to_string(),
            ..Default::default()
        }
    }

    fn rfc3339(date: DateTime<Utc>) -> String {
        date.to_rfc3339()
    }

    #[test]
    fn parses_picker_and_rfc3339_dates() {
        let expected = NaiveDate::from_ymd_opt(2030, 5, 17)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
            .and_utc();
        assert_eq!(parse_expire_date("2030-05-17 14:30"), Some(expected));
        assert_eq!(parse_expire_date("2030-05-17 14:30:00"), Some(expected));
        assert_eq!(parse_expire_date("2030-05-17T14:30"), Some(expected));
        assert_eq!(parse_expire_date("2030-05-17T16:30:00+02:00"), Some(expected));
        assert_eq!(
            parse_expire_date("2030-05-17"),
            Some(expected - ChronoDuration::minutes(14 * 60 + 30))
        );
    }

    #[test]
    fn unparseable_dates_are_unset() {
        assert_eq!(parse_expire_date(""), None);
        assert_eq!(parse_expire_date("   "), None);
        assert_eq!(parse_expire_date("next tuesday"), None);
        assert_eq!(parse_expire_date("2030-13-40 25:00"), None);
    }

    #[tokio::test]
    async fn saving_b_supersedes_a_and_keeps_a_fields() {
        let f = fixture();
        let now = Utc::now();
        let a = f.store.insert_post("Post A", "a").unwrap();
        let b = f.store.insert_post("Post B", "b").unwrap();

        let outcome = f
            .service
            .save_post_attrs(
                Some(&f.editor),
                a.id,
                SubmittedAttrs {
                    custom_title: "A headline".into(),
                    ..submit(true, true, &rfc3339(now + ChronoDuration::hours(1)))
                },
                now,
            )
            .await
            .unwrap();
        assert!(matches!(outcome, SaveOutcome::Saved { rejected: None, .. }));
        assert_eq!(f.service.active_post(now).await.unwrap().unwrap().post.id, a.id);
        let form = f.service.attrs_form(a.id, f.editor.user_id).await.unwrap().unwrap();
        assert_eq!(form.notice, None);

        let a_before = f.store.attrs(a.id).await.unwrap().unwrap();
        f.service
            .save_post_attrs(Some(&f.editor), b.id, submit(true, false, ""), now)
            .await
            .unwrap();

        let a_after = f.store.attrs(a.id).await.unwrap().unwrap();
        assert!(!a_after.active);
        assert_eq!(
            a_after,
            BreakingNewsAttrs {
                active: false,
                ..a_before
            }
        );
        assert_eq!(f.service.active_post(now).await.unwrap().unwrap().post.id, b.id);
    }

    #[tokio::test]
    async fn past_expiration_is_forced_off_with_one_time_notice() {
        let f = fixture();
        let now = Utc::now();
        let a = f.store.insert_post("Post A", "a").unwrap();
        let past = now - ChronoDuration::hours(1);

        let outcome = f
            .service
            .save_post_attrs(Some(&f.editor), a.id, submit(true, true, &rfc3339(past)), now)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::Saved {
                attrs: BreakingNewsAttrs {
                    active: true,
                    custom_title: String::new(),
                    expire_active: false,
                    expire_date: parse_expire_date(&rfc3339(past)),
                },
                rejected: Some(ValidationError::ExpirationNotInFuture),
            }
        );
        assert_eq!(f.service.active_post(now).await.unwrap().unwrap().post.id, a.id);

        let other_user = Uuid::new_v4();
        let form = f.service.attrs_form(a.id, other_user).await.unwrap().unwrap();
        assert_eq!(form.notice, None);

        let form = f.service.attrs_form(a.id, f.editor.user_id).await.unwrap().unwrap();
        assert_eq!(
            form.notice.as_deref(),
            Some("Breaking news expiration date field is incorrect. Please choose a future date.")
        );
        assert!(!form.expire_active);
        let again = f.service.attrs_form(a.id, f.editor.user_id).await.unwrap().unwrap();
        assert_eq!(again.notice, None);
    }

    #[tokio::test]
    async fn expiration_at_now_or_unset_is_rejected() {
        let f = fixture();
        let now = Utc::now();
        let a = f.store.insert_post("Post A", "a").unwrap();

        for raw in [rfc3339(now), "garbage".to_string()] {
            let outcome = f
                .service
                .save_post_attrs(Some(&f.editor), a.id, submit(true, true, &raw), now)
                .await
                .unwrap();
            assert!(matches!(
                outcome,
                SaveOutcome::Saved {
                    rejected: Some(ValidationError::ExpirationNotInFuture),
                    ..
                }
            ));
        }
        assert!(!f.store.attrs(a.id).await.unwrap().unwrap().expire_active);
    }

    #[tokio::test]
    async fn unauthorized_autosave_and_revision_saves_are_no_ops() {
        let f = fixture();
        let now = Utc::now();
        let a = f.store.insert_post("Post A", "a").unwrap();
        let revision = f.store.insert_revision(a.id, "Post A").unwrap();

        let skipped = [
            f.service
                .save_post_attrs(None, a.id, submit(true, false, ""), now)
                .await
                .unwrap(),
            f.service
                .save_post_attrs(
                    Some(&f.editor),
                    a.id,
                    SubmittedAttrs {
                        autosave: true,
                        ..submit(true, false, "")
                    },
                    now,
                )
                .await
                .unwrap(),
            f.service
                .save_post_attrs(Some(&f.editor), revision.id, submit(true, false, ""), now)
                .await
                .unwrap(),
        ];
        assert!(skipped.iter().all(|o| *o == SaveOutcome::Skipped));
        assert!(f.store.active_post_ids().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_post_is_an_error_and_changes_nothing() {
        let f = fixture();
        let now = Utc::now();
        let a = f.store.insert_post("Post A", "a").unwrap();
        f.service
            .save_post_attrs(Some(&f.editor), a.id, submit(true, false, ""), now)
            .await
            .unwrap();

        let err = f
            .service
            .save_post_attrs(Some(&f.editor), 404, submit(true, false, ""), now)
            .await
            .unwrap_err();
        assert!(matches!(err, SaveError::PostNotFound(404)));
        assert_eq!(f.store.active_post_ids().unwrap(), vec![a.id]);
    }

    #[tokio::test]
    async fn at_most_one_active_after_every_save() {
        let f = fixture();
        let now = Utc::now();
        let ids: Vec<i64> = (0..4)
            .map(|i| f.store.insert_post(&format!("P{i}"), &format!("p{i}")).unwrap().id)
            .collect();

        let sequence = [(0, true), (1, true), (1, false), (2, true), (3, false), (0, true), (3, true)];
        for (index, active) in sequence {
            f.service
                .save_post_attrs(Some(&f.editor), ids[index], submit(active, false, ""), now)
                .await
                .unwrap();
            let active_ids = f.store.active_post_ids().unwrap();
            assert!(active_ids.len() <= 1, "after saving {index}: {active_ids:?}");
            if active {
                assert_eq!(active_ids, vec![ids[index]]);
            }
        }
    }

    #[tokio::test]
    async fn sweep_deactivates_exactly_the_expired_post_once() {
        let f = fixture();
        let now = Utc::now();
        let c = f.store.insert_post("Post C", "c").unwrap();
        let d = f.store.insert_post("Post D", "d").unwrap();
        f.store
            .put_attrs_unchecked(
                c.id,
                BreakingNewsAttrs {
                    active: true,
                    expire_active: true,
                    expire_date: Some(now - ChronoDuration::seconds(5)),
                    ..Default::default()
                },
            )
            .unwrap();
        f.store
            .put_attrs_unchecked(
                d.id,
                BreakingNewsAttrs {
                    active: false,
                    expire_active: true,
                    expire_date: Some(now - ChronoDuration::seconds(5)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(f.service.active_post(now).await.unwrap().is_none());
        assert_eq!(f.service.sweep(now).await.unwrap(), 1);
        assert!(!f.store.attrs(c.id).await.unwrap().unwrap().active);
        assert_eq!(f.service.sweep(now).await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_tick_deactivates_expired_post() {
        let f = fixture();
        let post = f.store.insert_post("Post C", "c").unwrap();
        f.store
            .put_attrs_unchecked(
                post.id,
                BreakingNewsAttrs {
                    active: true,
                    expire_active: true,
                    expire_date: Some(Utc::now() - ChronoDuration::seconds(5)),
                    ..Default::default()
                },
            )
            .unwrap();

        f.service.activate().await.unwrap();
        assert!(f.service.scheduler().is_scheduled(SWEEP_JOB));
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(f.store.active_post_ids().unwrap().is_empty());
        f.service.deactivate();
        assert!(!f.service.scheduler().is_scheduled(SWEEP_JOB));
    }

    #[tokio::test]
    async fn on_tick_runs_one_sweep() {
        let f = fixture();
        let post = f.store.insert_post("Post C", "c").unwrap();
        f.store
            .put_attrs_unchecked(
                post.id,
                BreakingNewsAttrs {
                    active: true,
                    expire_active: true,
                    expire_date: Some(Utc::now() - ChronoDuration::seconds(5)),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(f.service.on_tick().await.unwrap(), 1);
        assert_eq!(f.service.on_tick().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sweep_job_is_idle_once_the_service_is_dropped() {
        let f = fixture();
        let post = f.store.insert_post("Post C", "c").unwrap();
        f.store
            .put_attrs_unchecked(
                post.id,
                BreakingNewsAttrs {
                    active: true,
                    expire_active: true,
                    expire_date: Some(Utc::now() - ChronoDuration::seconds(5)),
                    ..Default::default()
                },
            )
            .unwrap();

        let hooks: Weak<dyn PluginHooks> = Arc::<BreakingNews>::downgrade(&f.service);
        let job = ExpirySweep { hooks };
        drop(f.service);

        job.run().await;
        assert_eq!(f.store.active_post_ids().unwrap(), vec![post.id]);
    }

    #[tokio::test]
    async fn summary_and_banner_reflect_active_post() {
        let f = fixture();
        let now = Utc::now();
        assert!(f.service.summary(now).await.unwrap().is_none());
        assert!(f.service.banner(now).await.unwrap().is_none());

        let a = f.store.insert_post("Native title", "native").unwrap();
        let expires = now + ChronoDuration::hours(2);
        f.service
            .save_post_attrs(
                Some(&f.editor),
                a.id,
                SubmittedAttrs {
                    custom_title: "Custom".into(),
                    ..submit(true, true, &rfc3339(expires))
                },
                now,
            )
            .await
            .unwrap();

        let summary = f.service.summary(now).await.unwrap().unwrap();
        assert_eq!(summary.title, "Native title");
        assert_eq!(summary.custom_title.as_deref(), Some("Custom"));
        assert_eq!(
            summary.expire_date,
            Some(expires.format(FORM_DATE_FORMAT).to_string())
        );

        let banner = f.service.banner(now).await.unwrap().unwrap();
        assert_eq!(banner.display_title, "Custom");
        assert_eq!(banner.permalink, "https://news.example/native");
        assert!(banner.html.contains("Breaking news: "));
    }

    #[tokio::test]
    async fn banner_skipped_on_the_breaking_post_page() {
        let f = fixture();
        let now = Utc::now();
        let a = f.store.insert_post("A", "a").unwrap();
        f.service
            .save_post_attrs(Some(&f.editor), a.id, submit(true, false, ""), now)
            .await
            .unwrap();

        let page = "<header></header>[breaking_news]";
        let own = f.service.render_page(page, Some(a.id), now).await.unwrap();
        assert_eq!(own.placement, None);
        assert_eq!(own.html, "<header></header>");

        let other = f.service.render_page(page, None, now).await.unwrap();
        assert_eq!(other.placement, Some(banner::Placement::Marker));
    }

    #[tokio::test]
    async fn activate_seeds_missing_settings_only() {
        let f = fixture();
        f.store.set(settings::AREA_TITLE, "Urgent").await.unwrap();
        f.service.activate().await.unwrap();
        f.service.activate().await.unwrap();

        let current = f.service.display_settings().await.unwrap();
        assert_eq!(current.area_title, "Urgent");
        assert_eq!(current.bg_color, "#333333");
        assert!(current.autoinsert);
        assert!(f.service.scheduler().is_scheduled(SWEEP_JOB));

        f.service.deactivate();
        assert!(!f.service.scheduler().is_scheduled(SWEEP_JOB));
    }

    #[tokio::test]
    async fn uninstall_removes_settings_and_attributes() {
        let f = fixture();
        let now = Utc::now();
        f.service.activate().await.unwrap();
        let a = f.store.insert_post("A", "a").unwrap();
        f.service
            .save_post_attrs(Some(&f.editor), a.id, submit(true, false, ""), now)
            .await
            .unwrap();

        f.service.uninstall().await.unwrap();
        assert!(f.store.attrs(a.id).await.unwrap().is_none());
        assert!(f.store.get(settings::AREA_TITLE).await.unwrap().is_none());
        assert!(!f.service.scheduler().is_scheduled(SWEEP_JOB));
    }

    #[tokio::test]
    async fn settings_update_keeps_omitted_fields() {
        let f = fixture();
        f.service.activate().await.unwrap();
        let updated = f
            .service
            .update_display_settings(UpdateSettingsRequest {
                bg_color: Some(" #000 ".into()),
                autoinsert: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.bg_color, "#000");
        assert_eq!(updated.area_title, "Breaking news");
        assert!(!f.service.display_settings().await.unwrap().autoinsert);
    }
}
