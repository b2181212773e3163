//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::coordinator::UpdateTask;

/// readerupdate - sync reader tags and blogs into the local store
#[derive(Parser)]
#[command(
    name = "ru",
    about = "Synchronize reader tags, followed blogs and recommendations",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one sync pass and report what changed
    Sync {
        /// Task to run (tags, followed-blogs, recommended-blogs); repeatable, defaults to all
        #[arg(short, long = "task", value_name = "TASK")]
        tasks: Vec<UpdateTask>,
    },

    /// Print what the local store holds
    Show {
        /// What to show
        #[arg(value_name = "WHAT")]
        what: ShowTarget,
    },
}

/// Persisted category to print
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowTarget {
    Tags,
    FollowedBlogs,
    RecommendedBlogs,
}

impl std::str::FromStr for ShowTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "ShowTarget::from_str: called");
        match s.parse::<UpdateTask>()? {
            UpdateTask::Tags => Ok(Self::Tags),
            UpdateTask::FollowedBlogs => Ok(Self::FollowedBlogs),
            UpdateTask::RecommendedBlogs => Ok(Self::RecommendedBlogs),
        }
    }
}

/// Resolve the tasks for `ru sync`: all of them unless some were named
pub fn resolve_tasks(requested: &[UpdateTask]) -> Vec<UpdateTask> {
    debug!(?requested, "resolve_tasks: called");
    if requested.is_empty() {
        UpdateTask::ALL.to_vec()
    } else {
        requested.to_vec()
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("readerupdate")
        .join("logs")
        .join("readerupdate.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text with the log location
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    format!("Logs are written to: {}\n", get_log_path().display())
}
