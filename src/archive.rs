use async_trait::async_trait;
use chrono::Local;
use log::debug;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::error::WatchError;

/// Hands a freshly persisted snapshot to an external versioning backend.
/// Archival is best-effort; the watch loop logs failures and moves on.
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Archive the current snapshot
    async fn archive(&self) -> Result<(), WatchError>;
}

/// Archiver that commits and pushes the snapshot file with git
pub struct GitArchiver {
    /// Working directory the git commands run in
    repo_dir: PathBuf,
    /// Snapshot file path, relative to the repository
    snapshot_path: PathBuf,
}

impl GitArchiver {
    /// Create a new git archiver
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(repo_dir: P, snapshot_path: Q) -> Self {
        Self {
            repo_dir: repo_dir.as_ref().to_path_buf(),
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    /// Run one git command and fail on a non-zero exit
    async fn git(&self, args: &[&str]) -> Result<(), WatchError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_dir)
            .output()
            .await
            .map_err(|e| WatchError::Persist(format!("failed to run git {}: {}", args.join(" "), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WatchError::Persist(format!(
                "git {} failed: {}",
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Archiver for GitArchiver {
    async fn archive(&self) -> Result<(), WatchError> {
        let path = self.snapshot_path.to_string_lossy();
        debug!("Archiving snapshot {}", path);

        self.git(&["add", &path]).await?;

        let message = format!("Update snapshot {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        self.git(&["commit", "-m", &message]).await?;
        self.git(&["push"]).await?;

        debug!("Snapshot archived");
        Ok(())
    }
}
