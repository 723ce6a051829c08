use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_HEARTBEAT_THRESHOLD: u32 = 12;
pub const DEFAULT_ITEM_SELECTOR: &str = "article";
pub const DEFAULT_SNAPSHOT_PATH: &str = "data/snapshot.html";

/// Optional settings loaded from a JSON configuration file
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub url: Option<String>,
    pub interval_secs: Option<u64>,
    pub heartbeat_threshold: Option<u32>,
    pub keywords: Option<Vec<String>>,
    pub exclude_selectors: Option<Vec<String>>,
    pub scan_selector: Option<String>,
    pub item_selector: Option<String>,
    pub snapshot_path: Option<PathBuf>,
    pub archive: Option<bool>,
}

impl FileConfig {
    /// Load settings from a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {:?}", path.as_ref()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {:?}", path.as_ref()))
    }
}

/// Settings supplied on the command line; these win over the config file
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub url: Option<String>,
    pub interval_secs: Option<u64>,
    pub heartbeat_threshold: Option<u32>,
    pub keywords: Vec<String>,
    pub exclude_selectors: Vec<String>,
    pub scan_selector: Option<String>,
    pub item_selector: Option<String>,
    pub snapshot_path: Option<PathBuf>,
    pub archive: bool,
}

/// Slack credentials read from the environment
#[derive(Debug, Clone)]
pub struct SlackCredentials {
    pub token: String,
    pub channel: String,
}

impl SlackCredentials {
    /// Read credentials from SLACK_BOT_TOKEN and SLACK_CHANNEL
    pub fn from_env() -> Self {
        Self {
            token: std::env::var("SLACK_BOT_TOKEN").unwrap_or_default(),
            channel: std::env::var("SLACK_CHANNEL").unwrap_or_default(),
        }
    }
}

/// Fully resolved watcher configuration, validated once at startup.
/// Nothing here changes while the process runs.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Page URL to watch
    pub url: String,
    /// Delay between checks (seconds)
    pub interval_secs: u64,
    /// Consecutive unchanged checks before a heartbeat notification
    pub heartbeat_threshold: u32,
    /// Keywords that trigger a match notification
    pub keywords: Vec<String>,
    /// Regions excluded from keyword scanning
    pub exclude_selectors: Vec<String>,
    /// Optional region keyword scanning is restricted to
    pub scan_selector: Option<String>,
    /// Selector for one listing item
    pub item_selector: String,
    /// Snapshot file location
    pub snapshot_path: PathBuf,
    /// Whether to commit and push the snapshot after each update
    pub archive: bool,
    /// Slack bot token
    pub slack_token: String,
    /// Destination Slack channel
    pub slack_channel: String,
}

impl WatchConfig {
    /// Merge command line arguments, config file settings and environment
    /// credentials into a validated configuration
    pub fn resolve(cli: CliOverrides, file: FileConfig, credentials: SlackCredentials) -> Result<Self> {
        let keywords = if cli.keywords.is_empty() {
            file.keywords.unwrap_or_default()
        } else {
            cli.keywords
        };
        let exclude_selectors = if cli.exclude_selectors.is_empty() {
            file.exclude_selectors.unwrap_or_default()
        } else {
            cli.exclude_selectors
        };

        let config = Self {
            url: cli.url.or(file.url).unwrap_or_default(),
            interval_secs: cli.interval_secs.or(file.interval_secs).unwrap_or(DEFAULT_INTERVAL_SECS),
            heartbeat_threshold: cli
                .heartbeat_threshold
                .or(file.heartbeat_threshold)
                .unwrap_or(DEFAULT_HEARTBEAT_THRESHOLD),
            keywords,
            exclude_selectors,
            scan_selector: cli.scan_selector.or(file.scan_selector),
            item_selector: cli
                .item_selector
                .or(file.item_selector)
                .unwrap_or_else(|| DEFAULT_ITEM_SELECTOR.to_string()),
            snapshot_path: cli
                .snapshot_path
                .or(file.snapshot_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
            archive: cli.archive || file.archive.unwrap_or(false),
            slack_token: credentials.token,
            slack_channel: credentials.channel,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("no URL configured; pass --url or set \"url\" in the config file");
        }
        if self.interval_secs == 0 {
            bail!("check interval must be at least 1 second");
        }
        if self.heartbeat_threshold == 0 {
            bail!("heartbeat threshold must be at least 1");
        }
        if self.keywords.iter().any(|keyword| keyword.trim().is_empty()) {
            bail!("keywords must not be empty strings");
        }
        if self.slack_token.is_empty() {
            bail!("SLACK_BOT_TOKEN is not set");
        }
        if self.slack_channel.is_empty() {
            bail!("SLACK_CHANNEL is not set");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> SlackCredentials {
        SlackCredentials {
            token: "xoxb-test".to_string(),
            channel: "#flats".to_string(),
        }
    }

    fn cli_with_url() -> CliOverrides {
        CliOverrides {
            url: Some("https://example.test/listings".to_string()),
            ..CliOverrides::default()
        }
    }

    #[test]
    fn defaults_are_applied() {
        let config = WatchConfig::resolve(cli_with_url(), FileConfig::default(), credentials()).unwrap();
        assert_eq!(config.interval_secs, DEFAULT_INTERVAL_SECS);
        assert_eq!(config.heartbeat_threshold, DEFAULT_HEARTBEAT_THRESHOLD);
        assert_eq!(config.item_selector, DEFAULT_ITEM_SELECTOR);
        assert_eq!(config.snapshot_path, PathBuf::from(DEFAULT_SNAPSHOT_PATH));
        assert!(!config.archive);
        assert!(config.keywords.is_empty());
    }

    #[test]
    fn command_line_wins_over_config_file() {
        let file = FileConfig {
            url: Some("https://file.test".to_string()),
            interval_secs: Some(600),
            keywords: Some(vec!["Spandau".to_string()]),
            ..FileConfig::default()
        };
        let cli = CliOverrides {
            url: Some("https://cli.test".to_string()),
            keywords: vec!["Kreuzberg".to_string()],
            ..CliOverrides::default()
        };

        let config = WatchConfig::resolve(cli, file, credentials()).unwrap();
        assert_eq!(config.url, "https://cli.test");
        assert_eq!(config.keywords, vec!["Kreuzberg".to_string()]);
        // not overridden on the command line, the file value holds
        assert_eq!(config.interval_secs, 600);
    }

    #[test]
    fn missing_url_is_fatal() {
        let result = WatchConfig::resolve(CliOverrides::default(), FileConfig::default(), credentials());
        assert!(result.is_err());
    }

    #[test]
    fn zero_interval_is_fatal() {
        let cli = CliOverrides {
            interval_secs: Some(0),
            ..cli_with_url()
        };
        assert!(WatchConfig::resolve(cli, FileConfig::default(), credentials()).is_err());
    }

    #[test]
    fn zero_heartbeat_threshold_is_fatal() {
        let cli = CliOverrides {
            heartbeat_threshold: Some(0),
            ..cli_with_url()
        };
        assert!(WatchConfig::resolve(cli, FileConfig::default(), credentials()).is_err());
    }

    #[test]
    fn blank_keyword_is_fatal() {
        let cli = CliOverrides {
            keywords: vec!["Kreuzberg".to_string(), "   ".to_string()],
            ..cli_with_url()
        };
        assert!(WatchConfig::resolve(cli, FileConfig::default(), credentials()).is_err());
    }

    #[test]
    fn missing_credentials_are_fatal() {
        let empty = SlackCredentials {
            token: String::new(),
            channel: String::new(),
        };
        assert!(WatchConfig::resolve(cli_with_url(), FileConfig::default(), empty).is_err());
    }

    #[test]
    fn file_config_parses_known_fields() {
        let parsed: FileConfig = serde_json::from_str(
            r#"{
                "url": "https://example.test/listings",
                "interval_secs": 120,
                "keywords": ["Kreuzberg", "Neukölln"],
                "exclude_selectors": [".teaser"],
                "archive": true
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.url.as_deref(), Some("https://example.test/listings"));
        assert_eq!(parsed.interval_secs, Some(120));
        assert_eq!(parsed.archive, Some(true));
    }

    #[test]
    fn file_config_rejects_unknown_fields() {
        let parsed = serde_json::from_str::<FileConfig>(r#"{"intervall": 60}"#);
        assert!(parsed.is_err());
    }
}
