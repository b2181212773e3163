//! Local storage for reader tags, blogs and cached posts
//!
//! The merge engine only talks to the [`ReaderStore`] trait. [`SqliteStore`]
//! is the rusqlite-backed implementation used by the binary and the tests.

mod sqlite;

use thiserror::Error;

use crate::models::{BlogList, RecommendedBlogList, Tag, TagList};

pub use sqlite::SqliteStore;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Response from store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations the merge engine needs
///
/// Implementations are called from blocking worker threads and must be safe
/// to share between concurrently running pipelines.
pub trait ReaderStore: Send + Sync {
    fn get_default_tags(&self) -> StoreResult<TagList>;
    fn get_followed_tags(&self) -> StoreResult<TagList>;
    fn get_bookmark_tags(&self) -> StoreResult<TagList>;
    fn get_custom_list_tags(&self) -> StoreResult<TagList>;
    fn get_recommended_tags(&self) -> StoreResult<TagList>;

    /// Replace every default, followed, custom-list and bookmark tag
    fn replace_tags(&self, tags: &TagList) -> StoreResult<()>;
    fn set_recommended_tags(&self, tags: &TagList) -> StoreResult<()>;

    fn delete_tag(&self, tag: &Tag) -> StoreResult<()>;
    fn delete_posts_with_tag(&self, tag: &Tag) -> StoreResult<()>;

    /// Delete each tag and its posts as one unit of work: either every
    /// deletion in the batch is durable or none is
    fn delete_tags_with_posts(&self, tags: &TagList) -> StoreResult<()>;

    fn get_followed_blogs(&self) -> StoreResult<BlogList>;
    fn get_recommended_blogs(&self) -> StoreResult<RecommendedBlogList>;
    fn set_followed_blogs(&self, blogs: &BlogList) -> StoreResult<()>;
    fn set_recommended_blogs(&self, blogs: &RecommendedBlogList) -> StoreResult<()>;

    /// Recompute the follow flag denormalized onto cached posts
    fn update_followed_status_on_cached_posts(&self) -> StoreResult<()>;
}
