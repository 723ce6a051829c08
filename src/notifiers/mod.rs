pub mod slack;

use async_trait::async_trait;
use chrono::Local;
use std::fmt::Display;

use crate::error::WatchError;
use crate::matcher::Listing;

/// Kind of event an alert reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// First successful observation of the watched page
    InitialSnapshot,
    /// Page content differs from the persisted snapshot
    ContentChanged,
    /// A configured keyword appears on the current page
    KeywordMatch,
    /// Periodic confirmation that the watcher is alive with no changes
    Heartbeat,
}

/// A formatted notification ready for dispatch
#[derive(Debug, Clone)]
pub struct Alert {
    /// Event being reported
    pub kind: AlertKind,
    /// Alert summary message
    pub message: String,
    /// Alert detailed information
    pub details: String,
}

impl Alert {
    /// First successful fetch of the watched page
    pub fn initial_snapshot(url: &str, listings: &[Listing], body_len: usize) -> Self {
        let details = if listings.is_empty() {
            format!("Initial content length: {} bytes", body_len)
        } else {
            format!("Current listings:\n\n{}", join_listings(listings))
        };
        Self {
            kind: AlertKind::InitialSnapshot,
            message: format!("Started watching: {}", url),
            details,
        }
    }

    /// Page content changed since the last persisted snapshot
    pub fn content_changed(url: &str, listings: &[Listing], old_len: usize, new_len: usize) -> Self {
        let mut details = describe_length_change(old_len, new_len);
        if !listings.is_empty() {
            details.push_str(&format!("\n\nCurrent listings:\n\n{}", join_listings(listings)));
        }
        Self {
            kind: AlertKind::ContentChanged,
            message: format!("Listing page changed: {}", url),
            details,
        }
    }

    /// A configured keyword appears on the current page
    pub fn keyword_match(url: &str, listings: &[Listing]) -> Self {
        let details = if listings.is_empty() {
            String::from("A watched keyword appears on the page.")
        } else {
            format!("Current listings:\n\n{}", join_listings(listings))
        };
        Self {
            kind: AlertKind::KeywordMatch,
            message: format!("Keyword match on: {}", url),
            details,
        }
    }

    /// Periodic liveness confirmation after a run of unchanged checks
    pub fn heartbeat(url: &str, unchanged_ticks: u32) -> Self {
        Self {
            kind: AlertKind::Heartbeat,
            message: format!("Still watching: {}", url),
            details: format!(
                "No changes in the last {} checks, as of {}",
                unchanged_ticks,
                Local::now().format("%Y-%m-%d %H:%M:%S")
            ),
        }
    }
}

impl Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Describe the byte-length drift between two observations
fn describe_length_change(old_len: usize, new_len: usize) -> String {
    if new_len > old_len {
        format!(
            "Content grew: {} -> {} bytes (+{} bytes)",
            old_len, new_len, new_len - old_len
        )
    } else if new_len < old_len {
        format!(
            "Content shrank: {} -> {} bytes (-{} bytes)",
            old_len, new_len, old_len - new_len
        )
    } else {
        String::from("Content length is the same, but the content differs")
    }
}

fn join_listings(listings: &[Listing]) -> String {
    listings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Notification service trait, all messaging backends implement this
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Dispatch one alert. Failures are reported to the caller, which logs
    /// them and moves on; delivery is fire-and-forget per check.
    async fn notify(&self, alert: &Alert) -> Result<(), WatchError>;
}
