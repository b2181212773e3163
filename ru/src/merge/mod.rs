//! Diff & merge engine
//!
//! One function per sync category. Each parses the fetched payload, compares
//! it with what the store holds, persists only when something differs and
//! notifies once per changed category. Each returns a [`MergeReport`] saying
//! whether the store was written and which events were published, in
//! publication order.
//!
//! These functions block on the store and are meant to run on a blocking
//! worker, never directly on the async runtime.

mod blogs;
mod tags;

pub use blogs::{update_followed_blogs, update_recommended_blogs};
pub use tags::{server_topics, update_tags};

use crate::events::ReaderEvent;

/// What one merge did to the store and the notifier
///
/// A write without events is a silent refresh, e.g. follower counts on an
/// otherwise identical followed-blogs list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub persisted: bool,
    pub events: Vec<ReaderEvent>,
}

impl MergeReport {
    /// Nothing written, nothing published
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// Written without publishing
    pub fn refreshed() -> Self {
        Self {
            persisted: true,
            events: Vec::new(),
        }
    }

    /// Written and published
    pub fn changed(events: Vec<ReaderEvent>) -> Self {
        Self {
            persisted: true,
            events,
        }
    }

    fn record(&mut self, event: ReaderEvent) {
        self.persisted = true;
        self.events.push(event);
    }

    pub fn is_silent_write(&self) -> bool {
        self.persisted && self.events.is_empty()
    }
}
