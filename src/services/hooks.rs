use async_trait::async_trait;
use chrono::Utc;

use crate::{
    models::post::SubmittedAttrs,
    services::{
        banner::Injection,
        breaking_news::{BreakingNews, Editor, SaveError, SaveOutcome},
        metrics::BANNER_PLACEMENTS_COUNTER,
    },
};

/// Entry points the host calls, registered once in the application state.
#[async_trait]
pub trait PluginHooks: Send + Sync {
    /// Page render: place the banner once.
    async fn on_request_render(
        &self,
        page: &str,
        current_post_id: Option<i64>,
    ) -> anyhow::Result<Injection>;

    /// Editor saved a post.
    async fn on_save(
        &self,
        editor: Option<&Editor>,
        post_id: i64,
        submitted: SubmittedAttrs,
    ) -> Result<SaveOutcome, SaveError>;

    /// One run of the expiry sweep, outside the scheduler.
    async fn on_tick(&self) -> anyhow::Result<u64>;

    async fn on_activate(&self) -> anyhow::Result<()>;

    async fn on_deactivate(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl PluginHooks for BreakingNews {
    async fn on_request_render(
        &self,
        page: &str,
        current_post_id: Option<i64>,
    ) -> anyhow::Result<Injection> {
        let injection = self.render_page(page, current_post_id, Utc::now()).await?;
        if let Some(placement) = injection.placement {
            BANNER_PLACEMENTS_COUNTER
                .with_label_values(&[placement.as_str()])
                .inc();
        }
        Ok(injection)
    }

    async fn on_save(
        &self,
        editor: Option<&Editor>,
        post_id: i64,
        submitted: SubmittedAttrs,
    ) -> Result<SaveOutcome, SaveError> {
        self.save_post_attrs(editor, post_id, submitted, Utc::now())
            .await
    }

    async fn on_tick(&self) -> anyhow::Result<u64> {
        self.sweep(Utc::now()).await
    }

    async fn on_activate(&self) -> anyhow::Result<()> {
        self.activate().await
    }

    async fn on_deactivate(&self) -> anyhow::Result<()> {
        self.deactivate();
        Ok(())
    }
}
