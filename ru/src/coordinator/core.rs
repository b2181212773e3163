//! UpdateCoordinator - fan-out of sync pipelines, fan-in of their completions

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, error, info, warn};

use super::outcome::{RunSummary, TaskOutcome};
use super::pipeline::{PipelineContext, run_pipeline};
use super::{UpdateError, UpdateTask};
use crate::api::{AuthContext, ReaderApi};
use crate::config::DEFAULT_SAVED_FOR_LATER_TITLE;
use crate::events::ChangeNotifier;
use crate::store::ReaderStore;

type CompletionCallback = Box<dyn FnOnce() + Send>;

/// Bookkeeping for one run; shared by its pipelines
struct RunTracker {
    outstanding: BTreeSet<UpdateTask>,
    outcomes: BTreeMap<UpdateTask, TaskOutcome>,
    started_at: DateTime<Utc>,
    on_all_complete: Option<CompletionCallback>,
    summary_tx: Option<oneshot::Sender<RunSummary>>,
}

/// Handle to an in-flight run
///
/// Dropping it does not cancel anything; the pipelines and the completion
/// callback still run.
pub struct RunHandle {
    rx: oneshot::Receiver<RunSummary>,
}

impl RunHandle {
    /// Wait until every requested task has reported
    pub async fn wait(self) -> Result<RunSummary, UpdateError> {
        self.rx
            .await
            .map_err(|_| UpdateError::Worker("run ended without reporting".to_string()))
    }
}

/// Runs the requested sync tasks concurrently and reports once all are done
pub struct UpdateCoordinator {
    api: Arc<dyn ReaderApi>,
    store: Arc<dyn ReaderStore>,
    notifier: Arc<dyn ChangeNotifier>,
    auth: Arc<dyn AuthContext>,
    bookmark_title: String,
}

impl UpdateCoordinator {
    pub fn new(
        api: Arc<dyn ReaderApi>,
        store: Arc<dyn ReaderStore>,
        notifier: Arc<dyn ChangeNotifier>,
        auth: Arc<dyn AuthContext>,
    ) -> Self {
        Self {
            api,
            store,
            notifier,
            auth,
            bookmark_title: DEFAULT_SAVED_FOR_LATER_TITLE.to_string(),
        }
    }

    /// Title given to the synthetic saved-for-later tag
    pub fn with_bookmark_title(mut self, title: impl Into<String>) -> Self {
        self.bookmark_title = title.into();
        self
    }

    /// Start one pipeline per requested task and return immediately
    ///
    /// `on_all_complete` is invoked exactly once, after the last pipeline has
    /// reported, whether each one succeeded or failed. Duplicate tasks are
    /// collapsed. Must be called from within a tokio runtime.
    pub fn run<F>(&self, tasks: impl IntoIterator<Item = UpdateTask>, on_all_complete: F) -> Result<RunHandle, UpdateError>
    where
        F: FnOnce() + Send + 'static,
    {
        let tasks: BTreeSet<UpdateTask> = tasks.into_iter().collect();
        debug!(?tasks, "run: called");
        if tasks.is_empty() {
            warn!("run: no tasks requested");
            return Err(UpdateError::NoTasks);
        }

        let (summary_tx, rx) = oneshot::channel();
        let tracker = Arc::new(Mutex::new(RunTracker {
            outstanding: tasks.clone(),
            outcomes: BTreeMap::new(),
            started_at: Utc::now(),
            on_all_complete: Some(Box::new(on_all_complete)),
            summary_tx: Some(summary_tx),
        }));

        let ctx = Arc::new(PipelineContext {
            api: self.api.clone(),
            store: self.store.clone(),
            notifier: self.notifier.clone(),
            auth: self.auth.clone(),
            bookmark_title: self.bookmark_title.clone(),
        });

        // BTreeSet iterates in dispatch order, so Tags is spawned first
        for task in tasks {
            let ctx = ctx.clone();
            let tracker = tracker.clone();
            tokio::spawn(async move {
                let outcome = match tokio::spawn(run_pipeline(task, ctx)).await {
                    Ok(Ok(report)) => TaskOutcome::from(report),
                    Ok(Err(e)) => TaskOutcome::Failed(e.to_string()),
                    Err(e) => {
                        error!(%task, error = %e, "run: pipeline aborted");
                        TaskOutcome::Failed(format!("pipeline aborted: {}", e))
                    }
                };
                complete_task(&tracker, task, outcome).await;
            });
            debug!(%task, "run: pipeline spawned");
        }

        Ok(RunHandle { rx })
    }
}

/// Record one completion; the last completer fires the callback
async fn complete_task(tracker: &Mutex<RunTracker>, task: UpdateTask, outcome: TaskOutcome) {
    debug!(%task, %outcome, "complete_task: called");

    let (callback, summary_tx, summary) = {
        let mut state = tracker.lock().await;
        if !state.outstanding.remove(&task) {
            warn!(%task, "complete_task: task already reported");
            return;
        }
        state.outcomes.insert(task, outcome);
        if !state.outstanding.is_empty() {
            debug!(remaining = state.outstanding.len(), "complete_task: waiting on others");
            return;
        }

        let summary = RunSummary {
            started_at: state.started_at,
            finished_at: Utc::now(),
            outcomes: std::mem::take(&mut state.outcomes),
        };
        (state.on_all_complete.take(), state.summary_tx.take(), summary)
    };

    info!(
        tasks = summary.outcomes.len(),
        failed = summary.failed_tasks().len(),
        elapsed_ms = summary.elapsed().num_milliseconds(),
        "complete_task: all tasks complete"
    );

    if let Some(callback) = callback {
        callback();
    }
    if let Some(tx) = summary_tx {
        // Receiver may have been dropped by a caller that does not wait
        let _ = tx.send(summary);
    }
}
