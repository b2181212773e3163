//! Per-task outcomes and the run summary

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::UpdateTask;
use crate::events::ReaderEvent;
use crate::merge::MergeReport;

/// How a single pipeline ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Server data matched the store; nothing written
    Unchanged,
    /// Store updated without anything worth publishing
    Refreshed,
    /// Store updated; the events that were published
    Changed(Vec<ReaderEvent>),
    /// Fetch, store or worker failure; nothing published for this task
    Failed(String),
}

impl TaskOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn events(&self) -> &[ReaderEvent] {
        match self {
            Self::Changed(events) => events,
            _ => &[],
        }
    }
}

impl From<MergeReport> for TaskOutcome {
    fn from(report: MergeReport) -> Self {
        match report {
            MergeReport { events, .. } if !events.is_empty() => Self::Changed(events),
            MergeReport { persisted: true, .. } => Self::Refreshed,
            MergeReport { .. } => Self::Unchanged,
        }
    }
}

impl std::fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::Refreshed => write!(f, "refreshed"),
            Self::Changed(events) => {
                let names: Vec<_> = events.iter().map(ReaderEvent::event_type).collect();
                write!(f, "changed ({})", names.join(", "))
            }
            Self::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Result of one coordination run, available once every task has reported
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: BTreeMap<UpdateTask, TaskOutcome>,
}

impl RunSummary {
    pub fn outcome(&self, task: UpdateTask) -> Option<&TaskOutcome> {
        self.outcomes.get(&task)
    }

    /// Every published event, grouped by task in dispatch order
    pub fn events(&self) -> Vec<ReaderEvent> {
        self.outcomes.values().flat_map(|o| o.events().iter().copied()).collect()
    }

    pub fn failed_tasks(&self) -> Vec<UpdateTask> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(task, _)| *task)
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.values().any(TaskOutcome::is_failed)
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
