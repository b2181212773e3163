//! Single-task pipeline: fetch, then merge on a blocking worker

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use super::{UpdateError, UpdateTask};
use crate::api::{AuthContext, ReaderApi};
use crate::events::ChangeNotifier;
use crate::merge::{self, MergeReport};
use crate::store::ReaderStore;

/// Collaborators shared by every pipeline of a coordinator
pub(crate) struct PipelineContext {
    pub api: Arc<dyn ReaderApi>,
    pub store: Arc<dyn ReaderStore>,
    pub notifier: Arc<dyn ChangeNotifier>,
    pub auth: Arc<dyn AuthContext>,
    pub bookmark_title: String,
}

/// Run one task to completion
///
/// A fetch failure short-circuits: nothing is persisted or published.
pub(crate) async fn run_pipeline(task: UpdateTask, ctx: Arc<PipelineContext>) -> Result<MergeReport, UpdateError> {
    debug!(%task, "run_pipeline: called");

    let fetched = match task {
        UpdateTask::Tags => ctx.api.fetch_tags().await,
        UpdateTask::FollowedBlogs => ctx.api.fetch_followed_blogs().await,
        UpdateTask::RecommendedBlogs => ctx.api.fetch_recommended_blogs().await,
    };
    let payload = fetched.inspect_err(|e| error!(%task, error = %e, "run_pipeline: fetch failed"))?;

    debug!(%task, "run_pipeline: fetched, merging");
    let worker = tokio::task::spawn_blocking(move || merge_payload(task, &ctx, &payload));
    let report = worker
        .await
        .map_err(|e| UpdateError::Worker(e.to_string()))?
        .inspect_err(|e| error!(%task, error = %e, "run_pipeline: merge failed"))?;

    debug!(%task, persisted = report.persisted, events = report.events.len(), "run_pipeline: done");
    Ok(report)
}

fn merge_payload(task: UpdateTask, ctx: &PipelineContext, payload: &Value) -> Result<MergeReport, UpdateError> {
    let store = ctx.store.as_ref();
    let notifier = ctx.notifier.as_ref();
    let report = match task {
        UpdateTask::Tags => merge::update_tags(
            store,
            notifier,
            payload,
            ctx.auth.is_authenticated(),
            &ctx.bookmark_title,
        )?,
        UpdateTask::FollowedBlogs => merge::update_followed_blogs(store, notifier, payload)?,
        UpdateTask::RecommendedBlogs => merge::update_recommended_blogs(store, notifier, payload)?,
    };
    Ok(report)
}
