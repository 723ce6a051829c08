use log::{debug, warn};
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::WatchError;

/// Persists the last observed page content between checks
pub trait SnapshotStore {
    /// Returns the persisted snapshot, or `None` when no usable snapshot
    /// exists. An unreadable or corrupt snapshot is treated the same as a
    /// missing one, never as a fatal error.
    fn load(&self) -> Option<String>;

    /// Atomically replace the persisted snapshot with new content. On
    /// failure the previous snapshot stays authoritative.
    fn save(&self, content: &str) -> Result<(), WatchError>;
}

/// Snapshot store backed by a single file on disk
pub struct FileSnapshotStore {
    /// Snapshot file location
    path: PathBuf,
}

impl FileSnapshotStore {
    /// Create a store for the given snapshot file path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Sibling path the new snapshot is staged at before the rename
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Option<String> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot at {:?} yet", self.path);
                return None;
            }
            Err(e) => {
                warn!("Snapshot at {:?} is unreadable, treating as absent: {}", self.path, e);
                return None;
            }
        };

        let mut content = String::new();
        match file.read_to_string(&mut content) {
            Ok(_) => Some(content),
            Err(e) => {
                warn!("Snapshot at {:?} is corrupt, treating as absent: {}", self.path, e);
                None
            }
        }
    }

    fn save(&self, content: &str) -> Result<(), WatchError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| WatchError::Persist(format!("failed to create {:?}: {}", parent, e)))?;
            }
        }

        // Stage the new content in a sibling file, then rename over the old
        // snapshot. A concurrent reader sees either the old or the new file,
        // never a partial write.
        let temp = self.temp_path();
        {
            let mut file = File::create(&temp)
                .map_err(|e| WatchError::Persist(format!("failed to create {:?}: {}", temp, e)))?;
            file.write_all(content.as_bytes())
                .map_err(|e| WatchError::Persist(format!("failed to write {:?}: {}", temp, e)))?;
        }
        fs::rename(&temp, &self.path)
            .map_err(|e| WatchError::Persist(format!("failed to replace {:?}: {}", self.path, e)))?;

        debug!("Snapshot saved: {} bytes", content.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_snapshot_loads_as_none() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("snapshot.html"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn save_then_load_returns_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.html");
        let store = FileSnapshotStore::new(&path);

        store.save("<html>listings</html>").unwrap();
        assert_eq!(store.load().as_deref(), Some("<html>listings</html>"));

        // the staging file must not be left behind
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn save_fully_replaces_previous_snapshot() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("snapshot.html"));

        store.save("old content, quite long").unwrap();
        store.save("new").unwrap();
        assert_eq!(store.load().as_deref(), Some("new"));
    }

    #[test]
    fn corrupt_snapshot_loads_as_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.html");
        fs::write(&path, [0xff, 0xfe, 0x80, 0x80]).unwrap();

        let store = FileSnapshotStore::new(&path);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn save_creates_missing_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("snapshot.html");
        let store = FileSnapshotStore::new(&path);

        store.save("first").unwrap();
        assert_eq!(store.load().as_deref(), Some("first"));
    }
}
