//! readerupdate - Reader sync coordinator
//!
//! CLI entry point: one-shot sync passes and store inspection.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use readerupdate::cli::{Cli, Command, ShowTarget, generate_after_help, resolve_tasks};
use readerupdate::config::Config;
use readerupdate::coordinator::{TaskOutcome, UpdateCoordinator, UpdateTask};
use readerupdate::events::create_event_bus;
use readerupdate::store::{ReaderStore, SqliteStore};
use readerupdate::RestClient;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("readerupdate")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("readerupdate.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(db = %config.storage.db_path.display(), api = %config.api.base_url, "readerupdate loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Sync { tasks } => {
            debug!(?tasks, "main: matched Sync command");
            cmd_sync(&config, resolve_tasks(&tasks)).await
        }
        Command::Show { what } => {
            debug!(?what, "main: matched Show command");
            cmd_show(&config, what)
        }
    }
}

fn open_store(config: &Config) -> Result<SqliteStore> {
    SqliteStore::open(&config.storage.db_path)
        .context(format!("Failed to open store at {}", config.storage.db_path.display()))
}

/// Run one coordination pass and print what changed
async fn cmd_sync(config: &Config, tasks: Vec<UpdateTask>) -> Result<()> {
    debug!(?tasks, "cmd_sync: called");
    let store = Arc::new(open_store(config)?);
    let client = Arc::new(RestClient::from_config(&config.api).context("Failed to create API client")?);
    let bus = create_event_bus();
    let mut events = bus.subscribe();

    let coordinator = UpdateCoordinator::new(client.clone(), store, bus.clone(), client)
        .with_bookmark_title(config.reader.saved_for_later_title.clone());

    let handle = coordinator
        .run(tasks, || info!("cmd_sync: all tasks complete"))
        .context("Failed to start sync")?;
    let summary = handle.wait().await.context("Sync did not finish")?;

    while let Ok(event) = events.try_recv() {
        println!("{} {}", "event".cyan(), event);
    }

    for (task, outcome) in &summary.outcomes {
        let status = match outcome {
            TaskOutcome::Unchanged => outcome.to_string().dimmed(),
            TaskOutcome::Refreshed => outcome.to_string().yellow(),
            TaskOutcome::Changed(_) => outcome.to_string().green(),
            TaskOutcome::Failed(_) => outcome.to_string().red(),
        };
        println!("{:<18} {}", task.to_string().bold(), status);
    }
    println!("Finished in {} ms", summary.elapsed().num_milliseconds());

    let failed = summary.failed_tasks();
    if !failed.is_empty() {
        let names: Vec<_> = failed.iter().map(ToString::to_string).collect();
        eyre::bail!("{} task(s) failed: {}", failed.len(), names.join(", "));
    }
    Ok(())
}

/// Print the persisted state of one category
fn cmd_show(config: &Config, what: ShowTarget) -> Result<()> {
    debug!(?what, "cmd_show: called");
    let store = open_store(config)?;

    match what {
        ShowTarget::Tags => {
            let mut tags = store.get_default_tags()?;
            tags.extend(store.get_custom_list_tags()?);
            tags.extend(store.get_followed_tags()?);
            tags.extend(store.get_bookmark_tags()?);
            tags.extend(store.get_recommended_tags()?);
            for tag in &tags {
                println!("{:<12} {:<24} {}", tag.tag_type.to_string().yellow(), tag.slug, tag.title);
            }
            println!("{} tags", tags.len());
        }
        ShowTarget::FollowedBlogs => {
            let blogs = store.get_followed_blogs()?;
            for blog in &blogs {
                println!(
                    "{:>10} {:>10} {:<32} {} ({} followers)",
                    blog.blog_id,
                    blog.feed_id,
                    blog.name.bold(),
                    blog.url,
                    blog.num_followers
                );
            }
            println!("{} followed blogs", blogs.len());
        }
        ShowTarget::RecommendedBlogs => {
            let blogs = store.get_recommended_blogs()?;
            for blog in &blogs {
                println!("{:>10} {:<32} {} {}", blog.blog_id, blog.title.bold(), blog.blog_url, blog.reason.dimmed());
            }
            println!("{} recommended blogs", blogs.len());
        }
    }
    Ok(())
}
