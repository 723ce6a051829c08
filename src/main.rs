use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use log::info;
use std::path::PathBuf;

mod archive;
mod config;
mod detector;
mod error;
mod fetcher;
mod matcher;
mod notifiers;
mod store;
mod watcher;

use archive::GitArchiver;
use config::{CliOverrides, FileConfig, SlackCredentials, WatchConfig};
use fetcher::HttpFetcher;
use notifiers::slack::SlackNotifier;
use store::FileSnapshotStore;
use watcher::Watcher;

/// A tool for watching a listing page and sending Slack notifications on changes
#[derive(Parser)]
#[command(name = "listing_monitor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Page URL to watch
    #[arg(short, long)]
    url: Option<String>,

    /// Check interval (seconds)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Consecutive unchanged checks before a heartbeat notification
    #[arg(long)]
    heartbeat_threshold: Option<u32>,

    /// Keyword to alert on, case-insensitive (repeatable)
    #[arg(short, long)]
    keyword: Vec<String>,

    /// CSS selector for a region to exclude from keyword scanning (repeatable)
    #[arg(short = 'x', long)]
    exclude: Vec<String>,

    /// CSS selector restricting keyword scanning to one region
    #[arg(long)]
    scan_region: Option<String>,

    /// CSS selector for one listing item
    #[arg(long)]
    item_selector: Option<String>,

    /// Snapshot file path
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Commit and push the snapshot file after each update
    #[arg(long)]
    archive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment variables and logging
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    // If a configuration file is provided, load settings from it
    let file = match &cli.config {
        Some(path) => {
            info!("Loading settings from config file: {:?}", path);
            FileConfig::load(path)?
        }
        None => FileConfig::default(),
    };

    let overrides = CliOverrides {
        url: cli.url,
        interval_secs: cli.interval,
        heartbeat_threshold: cli.heartbeat_threshold,
        keywords: cli.keyword,
        exclude_selectors: cli.exclude,
        scan_selector: cli.scan_region,
        item_selector: cli.item_selector,
        snapshot_path: cli.snapshot,
        archive: cli.archive,
    };
    let config = WatchConfig::resolve(overrides, file, SlackCredentials::from_env())?;

    info!("Starting listing monitor: {}", config.url);

    let fetcher = HttpFetcher::new(&config.url);
    let store = FileSnapshotStore::new(&config.snapshot_path);
    let notifier = SlackNotifier::new(&config.slack_token, &config.slack_channel);
    let archiver = if config.archive {
        Some(GitArchiver::new(".", &config.snapshot_path))
    } else {
        None
    };

    let mut watcher = Watcher::new(&config, fetcher, store, notifier, archiver)?;
    watcher.run().await;

    Ok(())
}
