use thiserror::Error;

/// Tick-local failures. Each one is logged by the watch loop and skips only
/// the dependent downstream steps of the current check; the loop itself keeps
/// running.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Network or HTTP error while fetching the watched page
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Snapshot could not be written, replaced or archived
    #[error("persistence failed: {0}")]
    Persist(String),

    /// The messaging backend rejected or failed to deliver an alert
    #[error("notification failed: {0}")]
    Notify(String),

    /// A selector or document structure could not be parsed
    #[error("parse failed: {0}")]
    Parse(String),
}
