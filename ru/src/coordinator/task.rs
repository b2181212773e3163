//! Update task kinds and coordinator errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::FetchError;
use crate::store::StoreError;

/// One independently synchronized category
///
/// Ordering is dispatch priority: `Tags` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateTask {
    Tags,
    FollowedBlogs,
    RecommendedBlogs,
}

impl UpdateTask {
    /// Every task, in dispatch order
    pub const ALL: [UpdateTask; 3] = [Self::Tags, Self::FollowedBlogs, Self::RecommendedBlogs];
}

impl std::fmt::Display for UpdateTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tags => write!(f, "tags"),
            Self::FollowedBlogs => write!(f, "followed-blogs"),
            Self::RecommendedBlogs => write!(f, "recommended-blogs"),
        }
    }
}

impl std::str::FromStr for UpdateTask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "tags" => Ok(Self::Tags),
            "followed-blogs" => Ok(Self::FollowedBlogs),
            "recommended-blogs" => Ok(Self::RecommendedBlogs),
            _ => Err(format!(
                "Unknown task: {}. Use: tags, followed-blogs, or recommended-blogs",
                s
            )),
        }
    }
}

/// Errors from a coordination run or one of its pipelines
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("No update tasks requested")]
    NoTasks,

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Store failed: {0}")]
    Store(#[from] StoreError),

    #[error("Worker failed: {0}")]
    Worker(String),
}
