//! Task coordinator
//!
//! Fans out one tokio task per requested [`UpdateTask`], lets each fetch and
//! merge independently, and fans back in through a mutex-guarded outstanding
//! set. The completion callback fires exactly once, when the last pipeline
//! reports; per-task results are collected into a [`RunSummary`].

mod core;
mod outcome;
mod pipeline;
mod task;

pub use self::core::{RunHandle, UpdateCoordinator};
pub use outcome::{RunSummary, TaskOutcome};
pub use task::{UpdateError, UpdateTask};
