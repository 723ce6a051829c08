use log::{debug, error, info, warn};
use std::time::Duration;

use crate::archive::Archiver;
use crate::config::WatchConfig;
use crate::detector::{classify, ChangeEvent};
use crate::error::WatchError;
use crate::fetcher::Fetcher;
use crate::matcher::{KeywordMatcher, ListingExtractor};
use crate::notifiers::{Alert, Notifier};
use crate::store::SnapshotStore;

/// Drives the fetch -> detect -> match -> notify -> persist cycle.
/// One instance owns all per-watch state, so several watchers could run
/// side by side without interfering.
pub struct Watcher<F, S, N, A> {
    /// Page URL being watched
    url: String,
    /// Delay between checks
    interval: Duration,
    /// Consecutive unchanged checks before a heartbeat is sent
    heartbeat_threshold: u32,
    /// Unchanged checks since the last change or heartbeat
    unchanged_ticks: u32,
    /// Page retrieval backend
    fetcher: F,
    /// Snapshot persistence backend
    store: S,
    /// Notification backend
    notifier: N,
    /// Optional snapshot archival backend
    archiver: Option<A>,
    /// Keyword scanner
    matcher: KeywordMatcher,
    /// Listing extractor for notification payloads
    extractor: ListingExtractor,
}

impl<F, S, N, A> Watcher<F, S, N, A>
where
    F: Fetcher,
    S: SnapshotStore,
    N: Notifier,
    A: Archiver,
{
    /// Create a watcher from a resolved configuration and its backends
    pub fn new(
        config: &WatchConfig,
        fetcher: F,
        store: S,
        notifier: N,
        archiver: Option<A>,
    ) -> Result<Self, WatchError> {
        Ok(Self {
            url: config.url.clone(),
            interval: Duration::from_secs(config.interval_secs),
            heartbeat_threshold: config.heartbeat_threshold,
            unchanged_ticks: 0,
            fetcher,
            store,
            notifier,
            archiver,
            matcher: KeywordMatcher::new(
                &config.keywords,
                &config.exclude_selectors,
                config.scan_selector.as_deref(),
            )?,
            extractor: ListingExtractor::new(&config.item_selector)?,
        })
    }

    /// Start the watch loop; runs until the process is terminated
    pub async fn run(&mut self) {
        info!("Watching {} every {} seconds", self.url, self.interval.as_secs());
        loop {
            self.tick().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Execute one complete check cycle
    pub async fn tick(&mut self) {
        // A failed fetch is not "no change": skip detection, persistence and
        // notifications entirely and leave the heartbeat counter alone
        let current = match self.fetcher.fetch().await {
            Ok(body) => body,
            Err(e) => {
                error!("Check skipped: {}", e);
                return;
            }
        };

        let previous = self.store.load();
        match classify(&current, previous.as_deref()) {
            ChangeEvent::Initial => {
                info!("First successful check of {}: {} bytes", self.url, current.len());
                self.persist(&current).await;
                let listings = self.extractor.extract(&current);
                self.dispatch(Alert::initial_snapshot(&self.url, &listings, current.len()))
                    .await;
                self.unchanged_ticks = 0;
            }
            ChangeEvent::Changed => {
                let old_len = previous.map(|snapshot| snapshot.len()).unwrap_or(0);
                info!("Content changed: {} -> {} bytes", old_len, current.len());
                let listings = self.extractor.extract(&current);
                self.dispatch(Alert::content_changed(&self.url, &listings, old_len, current.len()))
                    .await;
                self.persist(&current).await;
                self.unchanged_ticks = 0;
            }
            ChangeEvent::Unchanged => {
                self.unchanged_ticks += 1;
                debug!("No change ({} consecutive checks)", self.unchanged_ticks);
                if self.unchanged_ticks >= self.heartbeat_threshold {
                    self.dispatch(Alert::heartbeat(&self.url, self.unchanged_ticks)).await;
                    self.unchanged_ticks = 0;
                }
            }
        }

        // The keyword scan runs on every successful check, changed or not; a
        // sustained match keeps notifying each check
        if self.matcher.matches(&current) {
            info!("Keyword match on current content of {}", self.url);
            let listings = self.extractor.extract(&current);
            self.dispatch(Alert::keyword_match(&self.url, &listings)).await;
        }
    }

    /// Persist the current content, then hand it to the archiver. Neither
    /// failure aborts the check; on a failed save the previous snapshot
    /// stays authoritative for the next comparison.
    async fn persist(&self, content: &str) {
        if let Err(e) = self.store.save(content) {
            warn!("Snapshot not persisted, keeping the previous one: {}", e);
            return;
        }
        if let Some(archiver) = &self.archiver {
            if let Err(e) = archiver.archive().await {
                warn!("Snapshot archival failed: {}", e);
            }
        }
    }

    /// Send one alert, logging delivery failures
    async fn dispatch(&self, alert: Alert) {
        if let Err(e) = self.notifier.notify(&alert).await {
            error!("Failed to send notification: {}", e);
        }
    }
}
