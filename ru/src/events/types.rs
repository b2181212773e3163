//! Change events published after a sync category persisted new state

use serde::{Deserialize, Serialize};

/// One event per category whose persisted state changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReaderEvent {
    /// Default, followed, custom-list or bookmark tags were replaced
    FollowedTagsChanged,
    /// Recommended tags were replaced (authenticated users only)
    RecommendedTagsChanged,
    /// A blog was followed or unfollowed
    FollowedBlogsChanged,
    /// Recommended blogs were replaced
    RecommendedBlogsChanged,
}

impl ReaderEvent {
    /// Get the event type name as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::FollowedTagsChanged => "FollowedTagsChanged",
            Self::RecommendedTagsChanged => "RecommendedTagsChanged",
            Self::FollowedBlogsChanged => "FollowedBlogsChanged",
            Self::RecommendedBlogsChanged => "RecommendedBlogsChanged",
        }
    }
}

impl std::fmt::Display for ReaderEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event_type())
    }
}
