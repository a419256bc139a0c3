use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::{fs, path::Path};
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling,
};
use tracing_subscriber::{filter::FilterFn, fmt, prelude::*, EnvFilter, Registry};

use story_grouper::{
    config::{AppConfig, LoggingConfig},
    service,
};

const CRATE_TARGET: &str = "story_grouper";

#[derive(Parser)]
#[clap(
    name = "story-grouper",
    about = "Fetch news feeds and merge duplicate coverage into stories"
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the configured feeds and write the articles file
    Fetch,

    /// Group the articles file into stories and write the groups file
    Group {
        /// Minimum title overlap (0.0-1.0) for two articles to share a story
        #[clap(short, long)]
        threshold: Option<f64>,
    },

    /// Fetch, then group
    Run {
        /// Minimum title overlap (0.0-1.0) for two articles to share a story
        #[clap(short, long)]
        threshold: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("failed to load configuration")?;
    let _log_guard = setup_tracing(&config.logging)?;

    let result = match cli.command {
        Commands::Fetch => {
            service::articles::fetch_and_save(&config.fetcher, &config.paths.articles)
                .await
                .map(|_| ())
        }
        Commands::Group { threshold } => {
            if let Some(threshold) = threshold {
                config.grouping.threshold = threshold;
            }
            service::groups::group_file(
                &config.paths.articles,
                &config.paths.groups,
                &config.grouping,
            )
            .map(|_| ())
        }
        Commands::Run { threshold } => {
            if let Some(threshold) = threshold {
                config.grouping.threshold = threshold;
            }
            run(&config).await
        }
    };

    if let Err(err) = &result {
        tracing::error!(error = ?err, "run failed; previous output left in place");
    }
    result
}

async fn run(config: &AppConfig) -> anyhow::Result<()> {
    let articles =
        service::articles::fetch_and_save(&config.fetcher, &config.paths.articles).await?;
    service::groups::group_and_save(&articles, &config.grouping, &config.paths.groups)?;
    Ok(())
}

/// Console gets every event that passes the level filter; the log file only keeps this
/// crate's events. The returned guard flushes the file writer on drop.
fn setup_tracing(logging: &LoggingConfig) -> anyhow::Result<WorkerGuard> {
    let level = logging.level.as_deref().unwrap_or("info");
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level {level:?}"))?,
    };

    let (file_writer, guard) = log_file_writer(Path::new(&logging.file))?;
    let own_events = FilterFn::new(|meta| meta.target().starts_with(CRATE_TARGET));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(own_events);

    Registry::default()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .context("failed to init tracing subscriber")?;

    Ok(guard)
}

fn log_file_writer(path: &Path) -> anyhow::Result<(NonBlocking, WorkerGuard)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("log file path {path:?} has no file name"))?;
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(directory)
        .with_context(|| format!("failed to create log directory {directory:?}"))?;

    Ok(tracing_appender::non_blocking(rolling::never(
        directory, file_name,
    )))
}
