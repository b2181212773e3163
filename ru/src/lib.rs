//! readerupdate - Reader sync coordinator
//!
//! Fetches a reader's tags, followed blogs and recommended blogs, diffs each
//! category against the local store, persists only what changed and publishes
//! one change event per changed category.
//!
//! # Core Concepts
//!
//! - **Independent pipelines**: every category is fetched and merged on its own
//!   tokio task; a failure in one never affects the others
//! - **Exactly-once completion**: the caller's callback fires once, after the
//!   last pipeline reports, whatever each outcome was
//! - **Change-only writes**: server lists are compared with stored ones before
//!   anything is written or announced
//!
//! # Modules
//!
//! - [`coordinator`] - Fan-out/fan-in of sync pipelines
//! - [`merge`] - Per-category diff and merge policy
//! - [`api`] - Remote fetch trait, REST client and payload parsing
//! - [`store`] - Local store trait and SQLite implementation
//! - [`events`] - Change notification
//! - [`models`] - Tags, blogs and their list comparisons
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod api;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod events;
pub mod merge;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use api::{AuthContext, FetchError, ReaderApi, RestClient, StaticAuth};
pub use config::Config;
pub use coordinator::{RunHandle, RunSummary, TaskOutcome, UpdateCoordinator, UpdateError, UpdateTask};
pub use events::{ChangeNotifier, EventBus, ReaderEvent, create_event_bus};
pub use merge::MergeReport;
pub use models::{Blog, BlogList, CachedPost, RecommendedBlog, RecommendedBlogList, Tag, TagList, TagType};
pub use store::{ReaderStore, SqliteStore, StoreError};
